// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from [`LeadflowError`] to HTTP responses.
//!
//! Every failure body has the shape
//! `{ "success": false, "kind": ..., "message": ..., ...extra }`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use leadflow_core::{ErrorKind, LeadflowError};

/// A handler failure.
#[derive(Debug)]
pub struct ApiError(pub LeadflowError);

impl From<LeadflowError> for ApiError {
    fn from(err: LeadflowError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(LeadflowError::invalid("body", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(LeadflowError::invalid("query", rejection.body_text()))
    }
}

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput | ErrorKind::PreconditionFailed => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFoundOrNotOwned => StatusCode::NOT_FOUND,
        ErrorKind::ResourceExhausted => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let kind = err.kind();
        let message = if kind == ErrorKind::Internal {
            tracing::error!(error = %err, "request failed");
            "Server error".to_string()
        } else {
            err.to_string()
        };

        let mut body = json!({
            "success": false,
            "kind": kind,
            "message": message,
        });
        match &err {
            LeadflowError::InvalidInput { field, .. } => {
                body["field"] = Value::from(field.as_str());
            }
            LeadflowError::Conflict { duplicates } => {
                body["duplicateEmails"] = json!(duplicates.duplicate_emails);
                body["duplicatePhones"] = json!(duplicates.duplicate_phones);
            }
            LeadflowError::IncompleteReview { missing_count } => {
                body["missingCount"] = json!(missing_count);
            }
            _ => {}
        }

        (status_for(kind), Json(body)).into_response()
    }
}
