// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead admission rules, applied in order with the first failure winning.

use serde::Deserialize;

use leadflow_config::IntakeConfig;
use leadflow_core::{LeadflowError, Source};

use crate::normalize::{dedup_by, is_valid_email, normalize_email, normalize_phone};

/// Proposed lead fields as submitted by a Data Miner.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub sources: Vec<SourceDraft>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub link: String,
}

/// A contact value in raw and normalized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub raw: String,
    pub normalized: String,
}

/// A draft that passed every admission rule.
#[derive(Debug, Clone)]
pub struct AdmittedLead {
    pub name: String,
    pub location: String,
    pub emails: Vec<Contact>,
    pub phones: Vec<Contact>,
    pub sources: Vec<Source>,
}

impl AdmittedLead {
    pub fn normalized_emails(&self) -> Vec<String> {
        self.emails.iter().map(|c| c.normalized.clone()).collect()
    }

    pub fn normalized_phones(&self) -> Vec<String> {
        self.phones.iter().map(|c| c.normalized.clone()).collect()
    }
}

/// Caps applied during admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionRules {
    pub max_emails: usize,
    pub max_phones: usize,
}

impl From<&IntakeConfig> for AdmissionRules {
    fn from(config: &IntakeConfig) -> Self {
        Self {
            max_emails: config.max_emails,
            max_phones: config.max_phones,
        }
    }
}

fn is_http_url(link: &str) -> bool {
    url::Url::parse(link)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}

impl AdmissionRules {
    /// Validates `draft`, returning deduplicated contacts with their normalized projections.
    pub fn admit(&self, draft: &LeadDraft) -> Result<AdmittedLead, LeadflowError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(LeadflowError::invalid("name", "Name is required"));
        }

        let emails = dedup_by(&draft.emails, normalize_email);
        let phones = dedup_by(&draft.phones, normalize_phone);
        if emails.is_empty() && phones.is_empty() {
            return Err(LeadflowError::invalid(
                "emails,phones",
                "At least one email or phone number is required",
            ));
        }

        if emails.len() > self.max_emails {
            return Err(LeadflowError::invalid(
                "emails",
                format!("Emails max {}", self.max_emails),
            ));
        }
        if phones.len() > self.max_phones {
            return Err(LeadflowError::invalid(
                "phones",
                format!("Phones max {}", self.max_phones),
            ));
        }

        let sources: Vec<Source> = draft
            .sources
            .iter()
            .map(|s| Source {
                name: s.name.trim().to_string(),
                link: s.link.trim().to_string(),
            })
            .filter(|s| !s.name.is_empty() && !s.link.is_empty())
            .collect();
        if sources.is_empty() {
            return Err(LeadflowError::invalid(
                "sources",
                "At least one source link is required",
            ));
        }
        if sources.iter().any(|s| !is_http_url(&s.link)) {
            return Err(LeadflowError::invalid("sources", "Invalid source link URL"));
        }

        let emails = emails
            .into_iter()
            .map(|raw| {
                let normalized = normalize_email(&raw);
                if is_valid_email(&normalized) {
                    Ok(Contact { raw, normalized })
                } else {
                    Err(LeadflowError::invalid("emails", format!("Invalid email: {raw}")))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let phones = phones
            .into_iter()
            .map(|raw| {
                let normalized = normalize_phone(&raw);
                if normalized.is_empty() {
                    Err(LeadflowError::invalid("phones", format!("Invalid phone: {raw}")))
                } else {
                    Ok(Contact { raw, normalized })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AdmittedLead {
            name: name.to_string(),
            location: draft
                .location
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            emails,
            phones,
            sources,
        })
    }
}
