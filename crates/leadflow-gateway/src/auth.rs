// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication and role gating for the gateway.
//!
//! [`auth_middleware`] resolves the bearer token into a [`Caller`] and
//! stores it in the request extensions. [`require_role`] then checks the
//! caller against the role list of the route group it guards.

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::debug;

use leadflow_core::{Caller, LeadflowError, Role};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Roles allowed through one route group.
pub type RoleSet = &'static [Role];

pub const DATA_MINER_ROLES: RoleSet = &[Role::DataMiner, Role::Admin, Role::SuperAdmin];
pub const VERIFIER_ROLES: RoleSet = &[Role::Verifier, Role::Admin, Role::SuperAdmin];
/// The Verifier -> LQ fan-out is not open to Super Admin.
pub const DISTRIBUTE_ROLES: RoleSet = &[Role::Verifier, Role::Admin];
pub const QUALIFIER_ROLES: RoleSet = &[Role::LeadQualifier, Role::Admin, Role::SuperAdmin];
pub const MANAGER_ROLES: RoleSet = &[Role::Manager, Role::Admin];
pub const DIRECTORY_ROLES: RoleSet = &[Role::SuperAdmin, Role::Admin];
pub const REJECTION_REVIEW_ROLES: RoleSet = &[Role::SuperAdmin];

/// Extracts the token from `Authorization: Bearer <token>`, any case.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Rejects the request unless it carries a valid token for an approved user.
pub async fn auth_middleware(
    State(state): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| LeadflowError::Unauthenticated("Not authenticated".into()))?;
    let caller = state.accounts.authenticate(token).await?;
    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

/// Lets the request through only if the caller's role is in `allowed`.
pub async fn require_role(
    State(allowed): State<RoleSet>,
    request: Request,
    next: Next,
) -> Response {
    let Some(caller) = request.extensions().get::<Caller>() else {
        return ApiError(LeadflowError::Unauthenticated(
            "Authentication required".into(),
        ))
        .into_response();
    };
    if allowed.contains(&caller.role) {
        return next.run(request).await;
    }

    debug!(caller = %caller.id, role = %caller.role, "role not allowed");
    let required: Vec<String> = allowed.iter().map(Role::to_string).collect();
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "success": false,
            "kind": "FORBIDDEN",
            "message": "Access denied - insufficient permissions",
            "requiredRoles": required,
            "yourRole": caller.role.to_string(),
        })),
    )
        .into_response()
}
