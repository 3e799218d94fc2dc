//! Error types for biblio

use thiserror::Error;

/// Error thrown when a search would return more entries than the API allows
#[derive(Debug, Error)]
#[error("Found {found} matches. The query fails to return more than {max} entries. Change your query such that it returns fewer entries.")]
pub struct QueryTooLargeError {
    pub found: usize,
    pub max: usize,
}

/// Error thrown when a parameter is not one of its allowed values
#[derive(Debug, Error)]
#[error("Parameter '{name}' must be one of {}.", allowed.join(", "))]
pub struct InvalidParameterError {
    pub name: String,
    pub allowed: Vec<String>,
}

/// General biblio error type
#[derive(Debug, Error)]
pub enum BiblioError {
    #[error("Bad Request (400): {0}")]
    BadRequest(String),

    #[error("Unauthorized (401): {0}")]
    Unauthorized(String),

    #[error("Forbidden (403): {0}")]
    Forbidden(String),

    #[error("Not Found (404): {0}")]
    NotFound(String),

    #[error("Proxy Authentication Required (407): {0}")]
    ProxyAuthenticationRequired(String),

    #[error("Request Entity Too Large (413): {0}")]
    EntityTooLarge(String),

    #[error("Request-URI Too Large (414): {0}")]
    UriTooLarge(String),

    #[error("Quota exceeded (429): {0}")]
    QuotaExceeded(String),

    #[error("Server error ({status}): {reason}")]
    Server { status: u16, reason: String },

    #[error("Unexpected HTTP status ({status}): {reason}")]
    UnexpectedStatus { status: u16, reason: String },

    #[error(transparent)]
    QueryTooLarge(#[from] QueryTooLargeError),

    #[error(transparent)]
    InvalidParameter(#[from] InvalidParameterError),

    #[error("Query error: {0}")]
    Query(String),

    #[error("ID type detection failed for \"{0}\".")]
    IdDetection(String),

    #[error("{0}")]
    Integrity(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No section: '{0}'")]
    MissingSection(String),

    #[error("{0}. For more information visit the configuration documentation.")]
    Credentials(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("{0}")]
    Other(String),
}

impl BiblioError {
    /// Map a non-success HTTP status to its error variant
    pub fn from_status(status: u16, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        match status {
            400 => BiblioError::BadRequest(reason),
            401 => BiblioError::Unauthorized(reason),
            403 => BiblioError::Forbidden(reason),
            404 => BiblioError::NotFound(reason),
            407 => BiblioError::ProxyAuthenticationRequired(reason),
            413 => BiblioError::EntityTooLarge(reason),
            414 => BiblioError::UriTooLarge(reason),
            429 => BiblioError::QuotaExceeded(reason),
            500..=599 => BiblioError::Server { status, reason },
            _ => BiblioError::UnexpectedStatus { status, reason },
        }
    }

    /// Whether this error wraps an HTTP status returned by the API
    pub fn is_http(&self) -> bool {
        self.status().is_some()
    }

    /// HTTP status code carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            BiblioError::BadRequest(_) => Some(400),
            BiblioError::Unauthorized(_) => Some(401),
            BiblioError::Forbidden(_) => Some(403),
            BiblioError::NotFound(_) => Some(404),
            BiblioError::ProxyAuthenticationRequired(_) => Some(407),
            BiblioError::EntityTooLarge(_) => Some(413),
            BiblioError::UriTooLarge(_) => Some(414),
            BiblioError::QuotaExceeded(_) => Some(429),
            BiblioError::Server { status, .. } | BiblioError::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Shorthand for an invalid parameter error
    pub fn invalid_parameter<S: AsRef<str>>(name: &str, allowed: &[S]) -> Self {
        InvalidParameterError {
            name: name.to_string(),
            allowed: allowed.iter().map(|s| s.as_ref().to_string()).collect(),
        }
        .into()
    }
}

pub type Result<T> = std::result::Result<T, BiblioError>;
