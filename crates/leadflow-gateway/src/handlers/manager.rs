// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manager routes.

use std::str::FromStr;

use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};

use leadflow_core::{Caller, LeadId, LeadflowError};
use leadflow_pipeline::{Decision, PageRequest};

use super::{ApiResult, body, ok};
use crate::server::GatewayState;

#[derive(Debug, Default, Deserialize)]
pub struct DecisionBody {
    #[serde(default)]
    pub decision: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentBody {
    #[serde(default)]
    pub comment: String,
}

/// `amount` may arrive as a number or a numeric string.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentBody {
    #[serde(default)]
    pub amount: Value,
    #[serde(default)]
    pub comment: String,
}

/// Coerces a JSON amount to `f64`; anything non-numeric becomes NaN.
fn amount(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// GET /api/manager/leads
pub async fn list_leads(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    query: Result<Query<PageRequest>, QueryRejection>,
) -> ApiResult {
    let Query(page) = query?;
    ok(state
        .pipeline
        .list_manager_leads(&caller, page.resolve())
        .await?)
}

/// POST /api/manager/leads/{id}/decision
pub async fn decide(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<DecisionBody>, JsonRejection>,
) -> ApiResult {
    let request = body(payload)?;
    let decision = Decision::from_str(request.decision.trim()).map_err(|_| {
        LeadflowError::invalid("decision", "decision must be ACCEPT or REJECT")
    })?;
    let outcome = state
        .pipeline
        .decide(&caller, &LeadId(id), decision, &request.comment)
        .await?;
    ok(outcome)
}

/// POST /api/manager/leads/{id}/reqRejection
pub async fn request_rejection(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<CommentBody>, JsonRejection>,
) -> ApiResult {
    let request = body(payload)?;
    let rejection = state
        .pipeline
        .request_rejection(&caller, &LeadId(id), &request.comment)
        .await?;
    ok(json!({
        "message": "Rejection request sent to Super Admin",
        "rejection": rejection,
    }))
}

/// POST /api/manager/leads/{id}/payment-status
pub async fn record_payment(
    State(state): State<GatewayState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    payload: Result<Json<PaymentBody>, JsonRejection>,
) -> ApiResult {
    let request = body(payload)?;
    let receipt = state
        .pipeline
        .record_payment(&caller, &LeadId(id), amount(&request.amount), &request.comment)
        .await?;
    ok(receipt)
}
