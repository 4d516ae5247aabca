// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Waypin location board.

use thiserror::Error;

/// The primary error type used across all Waypin adapters and client operations.
///
/// The first five variants form the user-facing taxonomy. The rest describe
/// infrastructure failures and are reported to users as generic failures.
#[derive(Debug, Error)]
pub enum WaypinError {
    /// No active session for an operation that requires one.
    #[error("not authenticated")]
    Unauthenticated,

    /// An absent row. Read paths fold this into an absent result.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Every geocoding provider failed to produce a result.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// A required parameter is missing or a value is out of range.
    #[error("validation error: {0}")]
    Validation(String),

    /// Any other caught failure.
    #[error("unknown error: {0}")]
    Unknown(String),

    /// Configuration errors (invalid TOML, bad header values, unusable URLs).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, blob IO).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Upstream HTTP provider errors (transport failure, bad status, bad payload).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Change-feed subscription could not be established or was lost.
    #[error("subscription error: {0}")]
    Subscription(String),

    /// HTTP server failures (bind, accept loop).
    #[error("server error: {message}")]
    Server {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },
}

impl WaypinError {
    /// Shorthand for a [`WaypinError::NotFound`].
    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.into(),
        }
    }

    /// Shorthand for wrapping any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }

    /// Whether this error is one the caller can show verbatim.
    ///
    /// Infrastructure variants are collapsed into a generic message instead.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated
                | Self::NotFound { .. }
                | Self::ServiceUnavailable(_)
                | Self::Validation(_)
        )
    }
}
