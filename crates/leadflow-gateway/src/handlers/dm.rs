// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data Miner routes.

use axum::{
    Extension, Json,
    extract::{Query, State, rejection::JsonRejection, rejection::QueryRejection},
};
use serde::Deserialize;
use serde_json::json;

use leadflow_core::Caller;
use leadflow_pipeline::LeadDraft;

use super::{ApiResult, body, created, ok};
use crate::server::GatewayState;

#[derive(Debug, Default, Deserialize)]
pub struct LiveQuery {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// GET /api/dm/stats
pub async fn stats(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult {
    ok(state.pipeline.dm_stats(&caller).await?)
}

/// GET /api/dm/duplicates/check?email=..&phone=..
pub async fn check_duplicate(
    State(state): State<GatewayState>,
    query: Result<Query<LiveQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    let check = state
        .pipeline
        .check_duplicate_live(query.email.as_deref(), query.phone.as_deref())
        .await?;
    ok(check)
}

/// POST /api/dm/leads
pub async fn create_lead(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<LeadDraft>, JsonRejection>,
) -> ApiResult {
    let draft = body(payload)?;
    let lead = state.pipeline.create_lead(&caller, &draft).await?;
    created(json!({
        "message": "Lead created",
        "leadId": lead.lead_id,
        "submittedDate": lead.submitted_date,
        "submittedTime": lead.submitted_time,
    }))
}
