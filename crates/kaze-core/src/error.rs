//! Error types for Kaze.
//!
//! [`KazeError`] is the single error type that flows out of handlers and
//! into the dispatch boundary. Its variant decides what happens next:
//!
//! | Variant | Dispatch outcome | Status |
//! |---|---|---|
//! | `RouteNotFound` | general error handler | 404 |
//! | `Route` | general error handler | the carried code |
//! | `Validation` | validation handler | 400 |
//! | `DoubleResponse` | logged, first response kept | - |
//! | anything else | general error handler | 500 |

use std::path::PathBuf;

use http::StatusCode;
use indexmap::IndexMap;
use kaze_router::InvalidMethod;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`KazeError`].
pub type KazeResult<T> = Result<T, KazeError>;

/// Standard error type for Kaze.
///
/// # Example
///
/// ```
/// use kaze_core::{KazeError, ValidationErrors};
/// use http::StatusCode;
///
/// let err = KazeError::route(StatusCode::FORBIDDEN, "members only");
/// assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
///
/// let mut errors = ValidationErrors::new();
/// errors.add("email", "required");
/// let err = KazeError::from(errors);
/// assert!(err.is_validation());
/// ```
#[derive(Error, Debug)]
pub enum KazeError {
    /// No route (and no `*` fallback) matched the request.
    #[error("Route '{path}' not found.")]
    RouteNotFound {
        /// The request path that failed to match.
        path: String,
    },

    /// A handler rejected the request with an explicit status code.
    #[error("{message}")]
    Route {
        /// Status code reported to the client.
        status: StatusCode,
        /// Human-readable error message.
        message: String,
    },

    /// Request data failed validation.
    #[error("validation error occurred.")]
    Validation(ValidationErrors),

    /// A handler tried to write a second response.
    #[error("Trying to send more than one response")]
    DoubleResponse,

    /// The file router could not read a directory.
    #[error("Dir Read Error: Directory {}.", path.display())]
    DirectoryRead {
        /// The directory that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A method name outside the accepted set.
    #[error(transparent)]
    InvalidMethod(#[from] InvalidMethod),

    /// A validation schema was malformed.
    #[error("Invalid schema: {message}")]
    InvalidSchema {
        /// What was wrong with the schema.
        message: String,
    },

    /// A route or middleware module could not be loaded.
    #[error("failed to load module '{path}': {message}")]
    Module {
        /// Root-relative module path.
        path: String,
        /// Why loading failed.
        message: String,
    },

    /// The template engine failed.
    #[error("render error: {message}")]
    Render {
        /// What the engine reported.
        message: String,
    },

    /// I/O error while serving a file or template.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl KazeError {
    /// Creates a route-not-found error.
    #[must_use]
    pub fn route_not_found(path: impl Into<String>) -> Self {
        Self::RouteNotFound { path: path.into() }
    }

    /// Creates a route error with an explicit status code.
    #[must_use]
    pub fn route(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Route {
            status,
            message: message.into(),
        }
    }

    /// Creates a validation error for a single field.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }

    /// Creates an invalid schema error.
    #[must_use]
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates a module load error.
    #[must_use]
    pub fn module(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Module {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a render error.
    #[must_use]
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Route { status, .. } => *status,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` for validation failures.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns `true` for double-write errors.
    #[must_use]
    pub const fn is_double_response(&self) -> bool {
        matches!(self, Self::DoubleResponse)
    }

    /// Returns the field errors of a validation failure.
    #[must_use]
    pub const fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// The error message followed by each source on its own line.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = format!("{}: {self}", self.kind());
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            out.push_str("\ncaused by: ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }

    /// Short name of the variant, used in logs and error pages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RouteNotFound { .. } => "RouteNotFound",
            Self::Route { .. } => "RouteError",
            Self::Validation(_) => "ValidationError",
            Self::DoubleResponse => "DoubleResponseError",
            Self::DirectoryRead { .. } => "DirectoryReadError",
            Self::InvalidMethod(_) => "InvalidMethod",
            Self::InvalidSchema { .. } => "InvalidSchema",
            Self::Module { .. } => "ModuleError",
            Self::Render { .. } => "RenderError",
            Self::Io(_) => "IoError",
            Self::Json(_) => "JsonError",
            Self::Internal { .. } => "InternalError",
        }
    }
}

impl From<ValidationErrors> for KazeError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<anyhow::Error> for KazeError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal_with_source(err.to_string(), err)
    }
}

/// Field name to ordered validation messages.
///
/// Field order is insertion order, so serialized output lists fields in the
/// order they were checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: IndexMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Creates a new empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a message for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Messages for one field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// Iterates `(field, messages)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Returns `true` if there are no field errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl<K, V, I> FromIterator<(K, I)> for ValidationErrors
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = V>,
{
    fn from_iter<T: IntoIterator<Item = (K, I)>>(iter: T) -> Self {
        let mut errors = Self::new();
        for (field, messages) in iter {
            let field = field.into();
            for message in messages {
                errors.add(field.clone(), message);
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_not_found() {
        let err = KazeError::route_not_found("/missing");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Route '/missing' not found.");
    }

    #[test]
    fn test_route_error_keeps_status() {
        let err = KazeError::route(StatusCode::IM_A_TEAPOT, "short and stout");
        assert_eq!(err.status_code(), StatusCode::IM_A_TEAPOT);
        assert_eq!(err.to_string(), "short and stout");
    }

    #[test]
    fn test_validation_error() {
        let err = KazeError::validation("email", "required");
        assert!(err.is_validation());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.validation_errors().unwrap().get("email"),
            Some(&["required".to_string()][..])
        );
    }

    #[test]
    fn test_other_errors_are_500() {
        let errors = [
            KazeError::DoubleResponse,
            KazeError::internal("boom"),
            KazeError::render("bad template"),
            KazeError::invalid_schema("empty field name"),
            KazeError::from(InvalidMethod("BREW".into())),
        ];
        for err in errors {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR, "{err}");
        }
    }

    #[test]
    fn test_directory_read_names_path() {
        let err = KazeError::DirectoryRead {
            path: PathBuf::from("/srv/routes"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.to_string(), "Dir Read Error: Directory /srv/routes.");
        assert!(err.describe().contains("caused by: missing"));
    }

    #[test]
    fn test_validation_errors_serialize_in_order() {
        let errors: ValidationErrors = [
            ("name", vec!["too long"]),
            ("email", vec!["required", "invalid"]),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&errors).unwrap();
        assert_eq!(json, r#"{"name":["too long"],"email":["required","invalid"]}"#);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_from_anyhow() {
        let err: KazeError = anyhow::anyhow!("db down").into();
        assert!(matches!(err, KazeError::Internal { .. }));
        assert!(err.to_string().contains("db down"));
    }
}
