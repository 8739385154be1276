// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the lead pipeline.
//!
//! Every route group maps onto a role: Data Miners create leads, Verifiers
//! review emails and fan leads out, Lead Qualifiers work their queue and
//! hand off to Managers, and the directory routes approve signups and wire
//! up reporting lines. Handlers are thin; the pipeline owns the rules.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{GatewayState, ServerConfig, router, start_server};
