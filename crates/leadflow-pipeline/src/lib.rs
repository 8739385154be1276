// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Leadflow lead pipeline.
//!
//! Leads move DM -> Verifier -> LQ -> MANAGER -> DONE/REJECTED. This crate
//! owns admission (normalization, validation, duplicate detection), the
//! round-robin fan-out to Lead Qualifiers and every stage transition. It
//! talks to persistence only through [`leadflow_core::Store`] and performs
//! no role checks of its own; callers resolve the acting [`leadflow_core::Caller`].

pub mod assignment;
pub mod clock;
pub mod directory;
pub mod duplicates;
pub mod normalize;
pub mod paging;
pub mod stage;
pub mod validation;
pub mod workflow;

pub use assignment::{LQ_POOL, RoundRobin};
pub use clock::DisplayClock;
pub use directory::{ManagerTeam, UserDirectory};
pub use duplicates::{DuplicateIndex, LiveCheck, LiveMatch};
pub use paging::{LeadPage, PageInfo, PageRequest};
pub use validation::{AdmissionRules, AdmittedLead, LeadDraft, SourceDraft};
pub use workflow::LeadPipeline;
pub use workflow::intake::{CreatedLead, DmStats};
pub use workflow::manager::{Decision, DecisionOutcome, PaymentReceipt};
pub use workflow::qualifier::{Handoff, LqListQuery, LqListing, ManagerSummary, Submission};
pub use workflow::review::RejectionVerdict;
pub use workflow::verifier::{Distribution, EmailDecision, ReviewOutcome};
