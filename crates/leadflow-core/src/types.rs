// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identifiers and closed enumerations shared across the Leadflow workspace.
//!
//! Every enum serializes to the exact wire string clients already use, so
//! the same value travels unchanged through JSON bodies, SQLite columns and
//! query strings.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Unique identifier for a lead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(pub String);

impl LeadId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a user account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role held by an approved user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Role {
    #[strum(serialize = "Super Admin")]
    #[serde(rename = "Super Admin")]
    SuperAdmin,
    Admin,
    Manager,
    Verifier,
    #[strum(serialize = "Lead Qualifiers")]
    #[serde(rename = "Lead Qualifiers")]
    LeadQualifier,
    #[strum(serialize = "Data Minors")]
    #[serde(rename = "Data Minors")]
    DataMiner,
}

impl Role {
    /// Super Admin and Admin may act on any role-scoped endpoint.
    pub fn is_admin(self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin)
    }
}

/// Workflow stage of a lead.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Stage {
    #[strum(serialize = "DM")]
    #[serde(rename = "DM")]
    Dm,
    Verifier,
    #[strum(serialize = "LQ")]
    #[serde(rename = "LQ")]
    Lq,
    #[strum(serialize = "MANAGER")]
    #[serde(rename = "MANAGER")]
    Manager,
    #[strum(serialize = "REJECTED")]
    #[serde(rename = "REJECTED")]
    Rejected,
    #[strum(serialize = "DONE")]
    #[serde(rename = "DONE")]
    Done,
}

impl Stage {
    /// REJECTED and DONE accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Done)
    }
}

/// Qualification status set by the owning Lead Qualifier.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LqStatus {
    #[default]
    #[strum(serialize = "PENDING")]
    Pending,
    #[strum(to_string = "IN_CONVERSATION", serialize = "REACHED")]
    #[serde(alias = "REACHED")]
    InConversation,
    #[strum(serialize = "DEAD")]
    Dead,
    #[strum(serialize = "QUALIFIED")]
    Qualified,
}

/// Deliverability status of a single email on a lead.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailStatus {
    #[default]
    Pending,
    Active,
    Bounced,
    Dead,
}

/// Payment status of a lead.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

/// Contact channel kind used by duplicate lookups.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    Email,
    Phone,
}

/// Approval status of a user account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Authenticated identity attached to every pipeline operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}
