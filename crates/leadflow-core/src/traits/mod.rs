// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for Leadflow persistence backends.
//!
//! Backends implement [`PluginAdapter`] for identity and lifecycle, then the
//! narrow store traits the pipeline depends on. All traits use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod storage;

pub use adapter::PluginAdapter;
pub use storage::{
    LeadFilter, LeadOrder, LeadStore, Page, SequenceStore, StorageAdapter, Store, UserFilter,
    UserOrder, UserStore,
};
