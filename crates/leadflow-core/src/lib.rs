// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Leadflow lead pipeline.
//!
//! This crate provides the domain entities, closed enumerations, error
//! taxonomy and storage traits used throughout the Leadflow workspace.
//! Storage backends implement the traits defined here.

pub mod error;
pub mod model;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{DuplicateReport, ErrorKind, LeadflowError};
pub use model::{
    Comment, ContactRef, Lead, LeadEmail, RejectionRequest, ResponseSource, Source, Stamp,
    Upsale, User,
};
pub use types::{
    Caller, ContactKind, EmailStatus, HealthStatus, LeadId, LqStatus, PaymentStatus, Role, Stage,
    UserId, UserStatus,
};

pub use traits::{
    LeadFilter, LeadOrder, LeadStore, Page, PluginAdapter, SequenceStore, StorageAdapter, Store,
    UserFilter, UserOrder, UserStore,
};
