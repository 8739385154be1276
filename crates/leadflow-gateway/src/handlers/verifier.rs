// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Verifier routes.

use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
};
use serde::Deserialize;
use serde_json::json;

use leadflow_core::{Caller, LeadId};
use leadflow_pipeline::{EmailDecision, PageRequest};

use super::{ApiResult, body, ok};
use crate::server::GatewayState;

#[derive(Debug, Default, Deserialize)]
pub struct ReviewBody {
    #[serde(default)]
    pub emails: Vec<EmailDecision>,
}

/// GET /api/verifier/leads
pub async fn list_leads(
    State(state): State<GatewayState>,
    query: Result<Query<PageRequest>, QueryRejection>,
) -> ApiResult {
    let Query(page) = query?;
    ok(state.pipeline.list_dm(page.resolve()).await?)
}

/// POST /api/verifier/leads/{id}/update-emails
pub async fn update_emails(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<ReviewBody>, JsonRejection>,
) -> ApiResult {
    let review = body(payload)?;
    let outcome = state
        .pipeline
        .review_emails(&caller, &LeadId(id), &review.emails)
        .await?;
    ok(outcome)
}

/// POST /api/verifier/leads/distribute-verifier-to-lq
pub async fn distribute(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult {
    let distribution = state.pipeline.distribute_to_qualifiers(&caller).await?;
    ok(json!({
        "message": format!("{} lead(s) moved to LQ", distribution.count),
        "count": distribution.count,
        "skipped": distribution.skipped,
    }))
}
