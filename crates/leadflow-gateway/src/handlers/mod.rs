// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers, one module per role.
//!
//! Success bodies are the operation's result with `"success": true` merged in.

pub mod dm;
pub mod manager;
pub mod qualifier;
pub mod superadmin;
pub mod verifier;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use leadflow_auth::{LoginRequest, SignupRequest};
use leadflow_core::{HealthStatus, LeadflowError, PluginAdapter};

use crate::error::ApiError;
use crate::server::GatewayState;

pub type ApiResult = Result<Response, ApiError>;

/// `{ "success": true }` merged with the fields of `body`.
pub(crate) fn success(body: impl Serialize) -> Json<Value> {
    let mut value = json!({ "success": true });
    if let (Value::Object(out), Ok(Value::Object(fields))) =
        (&mut value, serde_json::to_value(body))
    {
        out.extend(fields);
    }
    Json(value)
}

pub(crate) fn ok(body: impl Serialize) -> ApiResult {
    Ok(success(body).into_response())
}

pub(crate) fn created(body: impl Serialize) -> ApiResult {
    Ok((StatusCode::CREATED, success(body)).into_response())
}

/// Unwraps a JSON body, turning a malformed one into a 400.
pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(value) = payload?;
    Ok(value)
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<GatewayState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult {
    let user = state.accounts.signup(body(payload)?).await?;
    created(json!({
        "message": "Signup request submitted. Waiting for approval.",
        "user": {
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "status": user.status,
        },
    }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<GatewayState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult {
    let session = state.accounts.login(body(payload)?).await?;
    ok(json!({
        "message": "Login successful",
        "token": session.token,
        "expiresIn": session.expires_in,
        "user": session.user,
    }))
}

fn describe(health: &Result<HealthStatus, LeadflowError>) -> (bool, String) {
    match health {
        Ok(HealthStatus::Healthy) => (true, "healthy".to_string()),
        Ok(HealthStatus::Degraded(reason)) => (true, format!("degraded: {reason}")),
        Ok(HealthStatus::Unhealthy(reason)) => (false, format!("unhealthy: {reason}")),
        Err(err) => (false, format!("unhealthy: {err}")),
    }
}

/// GET /health
///
/// Unauthenticated. 503 when the store or token signer is down.
pub async fn health(State(state): State<GatewayState>) -> Response {
    let store = state.pipeline.store().clone();
    let signer = state.accounts.signer().clone();
    let (store_health, signer_health) = tokio::join!(store.health_check(), signer.health_check());
    let (store_up, store_detail) = describe(&store_health);
    let (signer_up, signer_detail) = describe(&signer_health);
    let up = store_up && signer_up;
    let label = if up { "ok" } else { "unavailable" };

    let body = json!({
        "status": label,
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSecs": state.started.elapsed().as_secs(),
        "components": {
            store.name(): store_detail,
            signer.name(): signer_detail,
        },
    });
    let status = if up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body)).into_response()
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError(LeadflowError::NotFoundOrNotOwned("Route not found".into()))
}
