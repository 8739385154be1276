// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offset pagination for list endpoints.

use serde::{Deserialize, Serialize};

use leadflow_core::{Lead, Page};

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

/// Raw `limit`/`skip` query values. Unparseable values fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub skip: Option<String>,
}

impl PageRequest {
    pub fn new(limit: u32, skip: u32) -> Self {
        Self {
            limit: Some(limit.to_string()),
            skip: Some(skip.to_string()),
        }
    }

    /// `limit` defaults to 20 and is capped at 100; `skip` defaults to 0.
    pub fn resolve(&self) -> Page {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
        let limit = match parse(&self.limit) {
            Some(n) if n >= 1 => n.min(i64::from(MAX_LIMIT)) as u32,
            _ => DEFAULT_LIMIT,
        };
        let skip = match parse(&self.skip) {
            Some(n) if n >= 0 => n.min(i64::from(u32::MAX)) as u32,
            _ => 0,
        };
        Page { limit, skip }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub limit: u32,
    pub skip: u32,
    pub total: u64,
}

impl PageInfo {
    pub fn new(page: Page, total: u64) -> Self {
        Self {
            limit: page.limit,
            skip: page.skip,
            total,
        }
    }
}

/// One page of leads plus its window.
#[derive(Debug, Clone, Serialize)]
pub struct LeadPage {
    pub leads: Vec<Lead>,
    pub pagination: PageInfo,
}
