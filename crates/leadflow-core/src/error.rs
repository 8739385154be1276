// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Leadflow lead pipeline.

use serde::Serialize;
use strum::{Display, EnumString};
use thiserror::Error;

/// Duplicate contacts found during lead admission.
///
/// Values are the normalized forms that already exist in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateReport {
    pub duplicate_emails: Vec<String>,
    pub duplicate_phones: Vec<String>,
}

impl DuplicateReport {
    /// True when no duplicate was found for either contact kind.
    pub fn is_empty(&self) -> bool {
        self.duplicate_emails.is_empty() && self.duplicate_phones.is_empty()
    }
}

const CONCURRENT_MODIFICATION: &str = "lead was modified concurrently";

/// The primary error type used across all Leadflow operations.
#[derive(Debug, Error)]
pub enum LeadflowError {
    /// A request field failed validation.
    #[error("{message}")]
    InvalidInput { field: String, message: String },

    /// Contacts on a new lead collide with contacts already stored.
    #[error("duplicate contacts found")]
    Conflict { duplicates: DuplicateReport },

    /// The lead or user does not exist, or is not owned by the caller.
    #[error("{0}")]
    NotFoundOrNotOwned(String),

    /// The target is in the wrong stage or state for the operation.
    #[error("{0}")]
    PreconditionFailed(String),

    /// A verification review left some emails without a decision.
    #[error("Missing verification status for {missing_count} email(s)")]
    IncompleteReview { missing_count: usize },

    /// A required worker pool is empty.
    #[error("{0}")]
    ResourceExhausted(String),

    /// Missing or invalid credentials.
    #[error("{0}")]
    Unauthenticated(String),

    /// The caller's role may not invoke this operation.
    #[error("{0}")]
    Forbidden(String),

    /// Configuration errors (invalid TOML, bad offsets, short secrets).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Stable machine-readable classification of a [`LeadflowError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidInput,
    Conflict,
    NotFoundOrNotOwned,
    PreconditionFailed,
    ResourceExhausted,
    Unauthenticated,
    Forbidden,
    Internal,
}

impl LeadflowError {
    /// Builds an [`LeadflowError::InvalidInput`] for `field`.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Wraps any storage-layer error.
    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage {
            source: Box::new(source),
        }
    }

    /// Error returned when a versioned write loses a race.
    pub fn concurrent_modification() -> Self {
        Self::PreconditionFailed(CONCURRENT_MODIFICATION.into())
    }

    /// True for the error produced by [`LeadflowError::concurrent_modification`].
    pub fn is_concurrent_modification(&self) -> bool {
        matches!(self, Self::PreconditionFailed(msg) if msg == CONCURRENT_MODIFICATION)
    }

    /// Classifies this error. Config and storage failures surface as internal.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::NotFoundOrNotOwned(_) => ErrorKind::NotFoundOrNotOwned,
            Self::PreconditionFailed(_) | Self::IncompleteReview { .. } => {
                ErrorKind::PreconditionFailed
            }
            Self::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            Self::Unauthenticated(_) => ErrorKind::Unauthenticated,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Config(_) | Self::Storage { .. } | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<serde_json::Error> for LeadflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(err)
    }
}
