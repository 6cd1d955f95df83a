//! Unified error types and result handling.
//!
//! The four domain kinds map to the ledger's propagation policy: `Validation`
//! is rejected before any write, `NotFound` targets a missing row, `Conflict`
//! signals a lost optimistic-lock race (caller re-fetches and retries), and
//! `Storage` wraps persistence failures that leave no partial state.

use thiserror::Error;

/// Unified error type for all ledger operations
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or out-of-range input, rejected before any write
    #[error("Validation error: {message}")]
    Validation {
        /// Short description of what failed validation
        message: String,
    },

    /// The operation targets a row that does not exist
    #[error("{entity} with id {id} not found")]
    NotFound {
        /// Entity kind name (e.g., "Budget")
        entity: &'static str,
        /// The missing row id
        id: i64,
    },

    /// A concurrent update already changed the row; re-fetch and retry
    #[error("{entity} with id {id} was modified concurrently")]
    Conflict {
        /// Entity kind name (e.g., "Budget")
        entity: &'static str,
        /// The contended row id
        id: i64,
    },

    /// Persistence layer failure; no partial state is left behind
    #[error("Storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),

    /// Configuration error (bad environment variable, unusable setting)
    #[error("Configuration error: {message}")]
    Config {
        /// Short description of the configuration problem
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error during audit export
    #[error("Export error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
