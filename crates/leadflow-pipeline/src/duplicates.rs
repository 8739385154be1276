// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cross-lead duplicate lookup over normalized contacts.
//!
//! The check runs before insert and is not atomic with it, so two concurrent
//! intakes of the same contact can both pass. A value reported here always
//! existed in the store when queried.

use std::sync::Arc;

use serde::Serialize;

use leadflow_core::{ContactKind, DuplicateReport, LeadflowError, Store};

use crate::normalize::{is_valid_email, normalize_email, normalize_phone};

/// Result of a single-value live check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LiveMatch {
    pub exists: bool,
    #[serde(rename = "match")]
    pub matched: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LiveCheck {
    pub email: LiveMatch,
    pub phone: LiveMatch,
}

#[derive(Clone)]
pub struct DuplicateIndex {
    store: Arc<dyn Store>,
}

impl DuplicateIndex {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn lookup(
        &self,
        kind: ContactKind,
        normalized: &[String],
    ) -> Result<Vec<String>, LeadflowError> {
        if normalized.is_empty() {
            return Ok(Vec::new());
        }
        match kind {
            ContactKind::Email => self.store.existing_emails(normalized).await,
            ContactKind::Phone => self.store.existing_phones(normalized).await,
        }
    }

    /// Which candidates already exist on any lead. Both lookups run concurrently.
    pub async fn find_duplicates(
        &self,
        emails: &[String],
        phones: &[String],
    ) -> Result<DuplicateReport, LeadflowError> {
        let (duplicate_emails, duplicate_phones) = tokio::try_join!(
            self.lookup(ContactKind::Email, emails),
            self.lookup(ContactKind::Phone, phones),
        )?;
        Ok(DuplicateReport {
            duplicate_emails,
            duplicate_phones,
        })
    }

    /// Checks one email and/or one phone as a Data Miner types them.
    pub async fn check_live(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<LiveCheck, LeadflowError> {
        let email = email.map(str::trim).filter(|v| !v.is_empty());
        let phone = phone.map(str::trim).filter(|v| !v.is_empty());
        if email.is_none() && phone.is_none() {
            return Err(LeadflowError::invalid("email,phone", "Provide email or phone"));
        }

        let email = email
            .map(|raw| {
                let normalized = normalize_email(raw);
                if is_valid_email(&normalized) {
                    Ok(normalized)
                } else {
                    Err(LeadflowError::invalid("email", "Invalid email"))
                }
            })
            .transpose()?;
        let phone = phone
            .map(|raw| {
                let normalized = normalize_phone(raw);
                if normalized.is_empty() {
                    Err(LeadflowError::invalid("phone", "Invalid phone"))
                } else {
                    Ok(normalized)
                }
            })
            .transpose()?;

        let report = self
            .find_duplicates(
                &email.into_iter().collect::<Vec<_>>(),
                &phone.into_iter().collect::<Vec<_>>(),
            )
            .await?;

        let hit = |found: Vec<String>| {
            found
                .into_iter()
                .next()
                .map(|matched| LiveMatch {
                    exists: true,
                    matched,
                })
                .unwrap_or_default()
        };
        Ok(LiveCheck {
            email: hit(report.duplicate_emails),
            phone: hit(report.duplicate_phones),
        })
    }
}
