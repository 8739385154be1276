// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead Qualifier routes.

use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
};
use serde::Deserialize;
use serde_json::json;

use leadflow_core::{Caller, LeadId};
use leadflow_pipeline::{LqListQuery, Submission};

use super::{ApiResult, body, ok};
use crate::server::GatewayState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBody {
    #[serde(default)]
    pub lq_status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentBody {
    #[serde(default)]
    pub text: String,
}

/// GET /api/lq/leads
pub async fn list_leads(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    query: Result<Query<LqListQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    ok(state.pipeline.list_qualifier_leads(&caller, &query).await?)
}

/// GET /api/lq/managers
pub async fn managers(State(state): State<GatewayState>) -> ApiResult {
    ok(json!({ "managers": state.pipeline.managers().await? }))
}

/// PATCH /api/lq/leads/{id}/status
pub async fn set_status(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<StatusBody>, JsonRejection>,
) -> ApiResult {
    let update = body(payload)?;
    let status = state
        .pipeline
        .set_lq_status(&caller, &LeadId(id), &update.lq_status)
        .await?;
    ok(json!({ "lqStatus": status }))
}

/// POST /api/lq/leads/{id}/comment
pub async fn comment(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<CommentBody>, JsonRejection>,
) -> ApiResult {
    let note = body(payload)?;
    let count = state
        .pipeline
        .add_lq_comment(&caller, &LeadId(id), &note.text)
        .await?;
    ok(json!({ "message": "Comment added", "commentCount": count }))
}

/// POST /api/lq/leads/{id}/submit-to-manager
pub async fn submit_to_manager(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<Submission>, JsonRejection>,
) -> ApiResult {
    let submission = body(payload)?;
    let handoff = state
        .pipeline
        .submit_to_manager(&caller, &LeadId(id), &submission)
        .await?;
    ok(handoff)
}
