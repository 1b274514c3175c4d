//! # Kaze Middleware
//!
//! The dispatch pipeline and built-in middleware stages.
//!
//! [`Dispatcher`] matches a request against a [`MapRouter`](kaze_core::MapRouter),
//! runs the global middlewares followed by the route's chain, and turns
//! every failure into exactly one response through the error or validation
//! handler.
//!
//! ## Stages
//!
//! - [`stages::RequestIdMiddleware`] - Request ID generation and propagation
//! - [`stages::CookieParser`] - Cookie header parsing
//! - [`stages::params_validate`] / [`stages::query_validate`] - Schema validation

#![doc(html_root_url = "https://docs.rs/kaze-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod dispatcher;
mod failure;
pub mod stages;

pub use dispatcher::Dispatcher;
pub use failure::{
    error_handler_fn, validation_handler_fn, BoxedErrorHandler, BoxedValidationHandler,
    DefaultErrorHandler, DefaultValidationHandler, ErrorHandler, ValidationHandler,
};
