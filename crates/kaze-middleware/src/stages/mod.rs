//! Built-in middleware stages.
//!
//! - [`request_id`] - Generate or propagate the request ID
//! - [`cookies`] - Parse the `Cookie` header into the context
//! - [`validation`] - Validate params and query strings against a schema
//!
//! Stages are ordinary handlers; register them globally with
//! `middlewares` or per route in front of the terminal handler.

pub mod cookies;
pub mod request_id;
pub mod validation;

pub use cookies::CookieParser;
pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};
pub use validation::{
    params_validate, query_validate, FieldSchema, FieldSchemaBuilder, ObjectSchema,
    ObjectSchemaBuilder, Schema, ValidatedParams, ValidatedQuery,
};
