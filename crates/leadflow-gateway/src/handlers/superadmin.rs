// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Super Admin and Admin routes: signup approvals, reporting edges and
//! rejection review.

use std::str::FromStr;

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::json;

use leadflow_core::{Caller, LeadId, LeadflowError, Role, UserId};
use leadflow_pipeline::RejectionVerdict;

use super::{ApiResult, body, ok};
use crate::server::GatewayState;

#[derive(Debug, Default, Deserialize)]
pub struct ApproveBody {
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LqIdsBody {
    #[serde(default)]
    pub lq_ids: Vec<String>,
}

impl LqIdsBody {
    fn ids(self) -> Vec<UserId> {
        self.lq_ids.into_iter().map(UserId).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    pub verdict: RejectionVerdict,
}

/// GET /api/superadmin/requests/pending
pub async fn pending_requests(State(state): State<GatewayState>) -> ApiResult {
    ok(json!({ "requests": state.directory.pending_requests().await? }))
}

/// PATCH /api/superadmin/requests/{id}/approve
pub async fn approve(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<ApproveBody>, JsonRejection>,
) -> ApiResult {
    let request = body(payload)?;
    let role = Role::from_str(request.role.trim())
        .map_err(|_| LeadflowError::invalid("role", "Invalid or missing role"))?;
    let user = state.directory.approve(&caller, &UserId(id), role).await?;
    ok(json!({
        "message": "User approved",
        "userId": user.id,
        "role": role,
    }))
}

/// DELETE /api/superadmin/requests/{id}/reject
pub async fn reject(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult {
    state.directory.reject(&caller, &UserId(id)).await?;
    ok(json!({ "message": "Request rejected" }))
}

/// PATCH /api/superadmin/managers/{id}/assign-lqs
pub async fn assign_lqs(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Path(manager): Path<String>,
    payload: Result<Json<LqIdsBody>, JsonRejection>,
) -> ApiResult {
    let ids = body(payload)?.ids();
    let count = state
        .directory
        .assign_lqs(&caller, &UserId(manager), &ids)
        .await?;
    ok(json!({ "message": "Lead qualifiers assigned", "updatedCount": count }))
}

/// PATCH /api/superadmin/lead-qualifiers/unassign
pub async fn unassign_lqs(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<LqIdsBody>, JsonRejection>,
) -> ApiResult {
    let ids = body(payload)?.ids();
    let count = state.directory.unassign_lqs(&caller, &ids).await?;
    ok(json!({ "message": "Lead qualifiers unassigned", "updatedCount": count }))
}

/// GET /api/superadmin/lead-qualifiers/unassigned
pub async fn unassigned_lqs(State(state): State<GatewayState>) -> ApiResult {
    ok(json!({ "leadQualifiers": state.directory.unassigned_lqs().await? }))
}

/// GET /api/superadmin/managers/with-lqs
pub async fn managers_with_lqs(State(state): State<GatewayState>) -> ApiResult {
    ok(json!({ "managers": state.directory.managers_with_lqs().await? }))
}

/// GET /api/superadmin/managers/without-lqs
pub async fn managers_without_lqs(State(state): State<GatewayState>) -> ApiResult {
    ok(json!({ "managers": state.directory.managers_without_lqs().await? }))
}

/// GET /api/superadmin/rejections
pub async fn pending_rejections(State(state): State<GatewayState>) -> ApiResult {
    ok(json!({ "leads": state.pipeline.pending_rejections().await? }))
}

/// POST /api/superadmin/leads/{id}/rejection-review
pub async fn review_rejection(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<ReviewBody>, JsonRejection>,
) -> ApiResult {
    let review = body(payload)?;
    let stage = state
        .pipeline
        .review_rejection(&caller, &LeadId(id), review.verdict)
        .await?;
    ok(json!({ "stage": stage }))
}
