//! Unified error types for the sales reporting crate.
//!
//! Errors fall into two kinds: problems with what the client asked for
//! ([`ErrorKind::InvalidArgument`]) and everything else that went wrong while
//! serving the request ([`ErrorKind::Internal`]). The api layer maps the kind
//! onto a 4xx or 5xx outcome.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A client-supplied parameter violates its contract.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Human readable description of the violation
        message: String,
    },

    /// The transaction store could not be reached or rejected the query.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A row came back in a shape the record type cannot represent.
    #[error("Row decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// The product reference file is malformed.
    #[error("Reference file error: {0}")]
    Reference(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is wrong; nothing was executed.
    InvalidArgument,
    /// The request was valid but could not be served.
    Internal,
}

impl Error {
    /// Convenience constructor for [`Error::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::Database(_)
            | Self::Decode(_)
            | Self::Config { .. }
            | Self::Reference(_)
            | Self::Io(_) => ErrorKind::Internal,
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
