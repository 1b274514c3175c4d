//! # Kaze Core
//!
//! Core types and traits for the Kaze routing framework.
//!
//! - [`Context`] - Per-request state: request data, extensions, response
//! - [`Handler`] / [`Next`] - The handler trait and the advance callback
//! - [`MapRouter`] - Registration API over the route table
//! - [`Endpoint`] / [`LazyRoute`] - What a route resolves to
//! - [`KazeError`] - Standard error type
//! - [`RenderEngine`] - Template engine seam

#![doc(html_root_url = "https://docs.rs/kaze-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod endpoint;
mod error;
mod handler;
mod map_router;
mod render;
mod response;

pub use context::{parse_query, Context, Cookies, RequestId};
pub use endpoint::{Endpoint, LazyRoute};
pub use error::{KazeError, KazeResult, ValidationErrors};
pub use handler::{
    handler_fn, named_handler_fn, BoxFuture, BoxedHandler, FnHandler, Handler, HandlerChain,
    HandlerResult, Next,
};
pub use map_router::{join_group_path, MapRouter, Router};
pub use render::{Passthrough, RenderContext, RenderEngine, Renderer};
pub use response::{
    error_text_to_html, mime_type_for, CookieOptions, ResponseState, SameSite, APPLICATION_JSON,
    TEXT_HTML, TEXT_PLAIN,
};

pub use kaze_router::{HttpMethod, InvalidMethod, Params};
