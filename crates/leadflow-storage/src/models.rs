// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types bridging SQLite columns and the domain entities in `leadflow-core`.
//!
//! Query closures run on the writer thread and only deal in plain column
//! values; conversion to domain types (and its error handling) happens here,
//! outside the closure.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use leadflow_core::{Lead, LeadflowError, Role, User, UserId, UserStatus};

/// Column list matching [`UserRow::from_row`].
pub const USER_COLUMNS: &str =
    "id, name, email, role, status, password_hash, reports_to, approved_by, approved_at, created_at";

/// Fixed-width UTC timestamp so TEXT columns sort chronologically.
pub fn ts(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_ts(raw: &str) -> Result<DateTime<Utc>, LeadflowError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| LeadflowError::Internal(format!("bad timestamp `{raw}`: {e}")))
}

fn parse_enum<T: FromStr>(raw: &str, what: &str) -> Result<T, LeadflowError> {
    T::from_str(raw).map_err(|_| LeadflowError::Internal(format!("unknown {what} `{raw}`")))
}

/// A stored lead document with its version column.
#[derive(Debug)]
pub struct LeadRow {
    pub doc: String,
    pub version: i64,
}

impl LeadRow {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            doc: row.get(0)?,
            version: row.get(1)?,
        })
    }

    pub fn into_lead(self) -> Result<Lead, LeadflowError> {
        let mut lead: Lead = serde_json::from_str(&self.doc)?;
        lead.version = self.version;
        Ok(lead)
    }
}

/// Everything needed to write one lead, computed before entering the writer thread.
#[derive(Debug, Clone)]
pub struct LeadRecord {
    pub id: String,
    pub doc: String,
    pub stage: String,
    pub status: String,
    pub lq_status: String,
    pub assigned_to: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub assigned_at: Option<String>,
    pub version: i64,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
}

impl LeadRecord {
    pub fn from_lead(lead: &Lead) -> Result<Self, LeadflowError> {
        Ok(Self {
            id: lead.id.0.clone(),
            doc: serde_json::to_string(lead)?,
            stage: lead.stage.to_string(),
            status: lead.status.to_string(),
            lq_status: lead.lq_status.to_string(),
            assigned_to: lead.assigned_to.as_ref().map(|u| u.0.clone()),
            created_by: lead.created_by.0.clone(),
            created_at: ts(&lead.created_at),
            assigned_at: lead.assigned_at.as_ref().map(ts),
            version: lead.version,
            emails: lead.normalized_emails().map(str::to_string).collect(),
            phones: lead.phones_normalized.clone(),
        })
    }
}

/// Raw `users` row.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Option<String>,
    pub status: String,
    pub password_hash: String,
    pub reports_to: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<String>,
    pub created_at: String,
}

impl UserRow {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            role: row.get(3)?,
            status: row.get(4)?,
            password_hash: row.get(5)?,
            reports_to: row.get(6)?,
            approved_by: row.get(7)?,
            approved_at: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.0.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.map(|r| r.to_string()),
            status: user.status.to_string(),
            password_hash: user.password_hash.clone(),
            reports_to: user.reports_to.as_ref().map(|u| u.0.clone()),
            approved_by: user.approved_by.as_ref().map(|u| u.0.clone()),
            approved_at: user.approved_at.as_ref().map(ts),
            created_at: ts(&user.created_at),
        }
    }

    pub fn into_user(self) -> Result<User, LeadflowError> {
        Ok(User {
            id: UserId(self.id),
            name: self.name,
            email: self.email,
            role: self
                .role
                .as_deref()
                .map(|r| parse_enum::<Role>(r, "role"))
                .transpose()?,
            status: parse_enum::<UserStatus>(&self.status, "user status")?,
            password_hash: self.password_hash,
            reports_to: self.reports_to.map(UserId),
            approved_by: self.approved_by.map(UserId),
            approved_at: self.approved_at.as_deref().map(parse_ts).transpose()?,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

/// Parses a grouped `lq_status` column value.
pub fn parse_lq_status(raw: &str) -> Result<leadflow_core::LqStatus, LeadflowError> {
    parse_enum(raw, "lq status")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_are_fixed_width_and_round_trip() {
        let at = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        let raw = ts(&at);
        assert_eq!(raw, "2026-03-04T05:06:07.000Z");
        assert_eq!(parse_ts(&raw).unwrap(), at);
    }

    #[test]
    fn user_row_round_trips() {
        let user = User {
            id: UserId("u1".into()),
            name: "Lena".into(),
            email: "lena@x.com".into(),
            role: Some(Role::LeadQualifier),
            status: UserStatus::Approved,
            password_hash: "h".into(),
            reports_to: Some(UserId("m1".into())),
            approved_by: None,
            approved_at: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        };
        let row = UserRow::from_user(&user);
        assert_eq!(row.role.as_deref(), Some("Lead Qualifiers"));
        assert_eq!(row.into_user().unwrap(), user);
    }

    #[test]
    fn unknown_role_is_internal_error() {
        let row = UserRow {
            id: "u".into(),
            name: "n".into(),
            email: "e@x.com".into(),
            role: Some("Overlord".into()),
            status: "APPROVED".into(),
            password_hash: String::new(),
            reports_to: None,
            approved_by: None,
            approved_at: None,
            created_at: "2026-01-01T00:00:00.000Z".into(),
        };
        assert!(matches!(row.into_user(), Err(LeadflowError::Internal(_))));
    }
}
