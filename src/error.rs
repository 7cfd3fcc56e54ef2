use std::sync::Arc;

/// Result type used throughout the crate.
///
/// The error variant is [`enum@Error`]. Note that *validation* failures are not
/// errors: validators return them as values so every violation can be surfaced
/// at once.
pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure-level errors.
///
/// These are the failures that are not part of normal flag editing or
/// evaluation: broken configuration, storage invariant violations, and I/O.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A stored filter row carries a type discriminator outside the known
    /// set. This is an invariant violation from upstream storage, not a
    /// user-facing validation failure.
    #[error("unsupported filter type: {0:?}")]
    UnsupportedFilterType(String),

    /// A stored filter row's payload does not deserialize into the fields of
    /// its declared filter type.
    #[error("malformed filter row")]
    MalformedFilterRow(#[source] Arc<serde_json::Error>),

    /// Invalid base URL configured for the remote definition backend.
    #[error("invalid base_url configuration")]
    InvalidBaseUrl(#[source] url::ParseError),

    /// The flag store backend failed.
    #[error("flag store failure: {0}")]
    Store(String),

    /// An I/O error.
    #[error(transparent)]
    // std::io::Error is not clonable, so we're wrapping it in an Arc.
    Io(Arc<std::io::Error>),

    /// Network error.
    #[error(transparent)]
    Network(Arc<reqwest::Error>),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Network(Arc::new(value.without_url()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::MalformedFilterRow(Arc::new(value))
    }
}
