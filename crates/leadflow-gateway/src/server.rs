// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::time::Instant;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use leadflow_auth::Accounts;
use leadflow_config::GatewayConfig;
use leadflow_core::LeadflowError;
use leadflow_pipeline::{LeadPipeline, UserDirectory};

use crate::auth::{
    DATA_MINER_ROLES, DIRECTORY_ROLES, DISTRIBUTE_ROLES, MANAGER_ROLES, QUALIFIER_ROLES,
    REJECTION_REVIEW_ROLES, RoleSet, VERIFIER_ROLES, auth_middleware, require_role,
};
use crate::handlers::{self, dm, manager, qualifier, superadmin, verifier};

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: LeadPipeline,
    pub directory: UserDirectory,
    pub accounts: Accounts,
    /// Process start time for uptime calculation.
    pub started: Instant,
}

impl GatewayState {
    pub fn new(pipeline: LeadPipeline, directory: UserDirectory, accounts: Accounts) -> Self {
        Self {
            pipeline,
            directory,
            accounts,
            started: Instant::now(),
        }
    }
}

/// Listener address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl From<&GatewayConfig> for ServerConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

fn gated(roles: RoleSet, routes: Router<GatewayState>) -> Router<GatewayState> {
    routes.route_layer(axum_middleware::from_fn_with_state(roles, require_role))
}

/// Builds the full route table.
///
/// `/health` and `/api/auth/*` are public. Everything else passes the
/// bearer-token check and then the role gate of its group.
pub fn router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/auth/signup", post(handlers::signup))
        .route("/api/auth/login", post(handlers::login));

    let dm_routes = gated(
        DATA_MINER_ROLES,
        Router::new()
            .route("/api/dm/stats", get(dm::stats))
            .route("/api/dm/duplicates/check", get(dm::check_duplicate))
            .route("/api/dm/leads", post(dm::create_lead)),
    );

    let verifier_routes = gated(
        VERIFIER_ROLES,
        Router::new()
            .route("/api/verifier/leads", get(verifier::list_leads))
            .route(
                "/api/verifier/leads/{id}/update-emails",
                post(verifier::update_emails),
            ),
    );

    let distribute_routes = gated(
        DISTRIBUTE_ROLES,
        Router::new().route(
            "/api/verifier/leads/distribute-verifier-to-lq",
            post(verifier::distribute),
        ),
    );

    let qualifier_routes = gated(
        QUALIFIER_ROLES,
        Router::new()
            .route("/api/lq/leads", get(qualifier::list_leads))
            .route("/api/lq/managers", get(qualifier::managers))
            .route("/api/lq/leads/{id}/status", patch(qualifier::set_status))
            .route("/api/lq/leads/{id}/comment", post(qualifier::comment))
            .route(
                "/api/lq/leads/{id}/submit-to-manager",
                post(qualifier::submit_to_manager),
            ),
    );

    let manager_routes = gated(
        MANAGER_ROLES,
        Router::new()
            .route("/api/manager/leads", get(manager::list_leads))
            .route("/api/manager/leads/{id}/decision", post(manager::decide))
            .route(
                "/api/manager/leads/{id}/reqRejection",
                post(manager::request_rejection),
            )
            .route(
                "/api/manager/leads/{id}/payment-status",
                post(manager::record_payment),
            ),
    );

    let directory_routes = gated(
        DIRECTORY_ROLES,
        Router::new()
            .route(
                "/api/superadmin/requests/pending",
                get(superadmin::pending_requests),
            )
            .route(
                "/api/superadmin/requests/{id}/approve",
                patch(superadmin::approve),
            )
            .route(
                "/api/superadmin/requests/{id}/reject",
                delete(superadmin::reject),
            )
            .route(
                "/api/superadmin/managers/{id}/assign-lqs",
                patch(superadmin::assign_lqs),
            )
            .route(
                "/api/superadmin/lead-qualifiers/unassign",
                patch(superadmin::unassign_lqs),
            )
            .route(
                "/api/superadmin/lead-qualifiers/unassigned",
                get(superadmin::unassigned_lqs),
            )
            .route(
                "/api/superadmin/managers/with-lqs",
                get(superadmin::managers_with_lqs),
            )
            .route(
                "/api/superadmin/managers/without-lqs",
                get(superadmin::managers_without_lqs),
            ),
    );

    let review_routes = gated(
        REJECTION_REVIEW_ROLES,
        Router::new()
            .route(
                "/api/superadmin/rejections",
                get(superadmin::pending_rejections),
            )
            .route(
                "/api/superadmin/leads/{id}/rejection-review",
                post(superadmin::review_rejection),
            ),
    );

    // Role gates run after auth: the outer route_layer wraps them.
    let api_routes = Router::new()
        .merge(dm_routes)
        .merge(verifier_routes)
        .merge(distribute_routes)
        .merge(qualifier_routes)
        .merge(manager_routes)
        .merge(directory_routes)
        .merge(review_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `host:port` and serves until `shutdown` resolves.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: F,
) -> Result<(), LeadflowError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LeadflowError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| LeadflowError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_from_gateway_config() {
        let gateway = GatewayConfig {
            host: "0.0.0.0".to_string(),
            port: 8088,
            ..GatewayConfig::default()
        };
        let config = ServerConfig::from(&gateway);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8088);
        assert!(format!("{config:?}").contains("8088"));
    }
}
