// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Leadflow integration tests.
//!
//! [`TestHarness`] assembles a temp SQLite store, the lead pipeline, the
//! user directory and the account service, plus helpers to seed approved
//! users and leads.

pub mod harness;

pub use harness::{TEST_PASSWORD, TestHarness, TestHarnessBuilder};
