// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User account operations.

use chrono::{DateTime, Utc};
use leadflow_core::{LeadflowError, Role, User, UserFilter, UserId, UserOrder, UserStatus};
use rusqlite::{OptionalExtension, params, params_from_iter};

use crate::database::{Database, map_tr_err};
use crate::models::{USER_COLUMNS, UserRow, ts};

/// Inserts `user`. Returns `false` without writing when the email is taken.
pub async fn insert_user(db: &Database, user: &User) -> Result<bool, LeadflowError> {
    let row = UserRow::from_user(user);
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let taken: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
                params![row.email],
                |r| r.get(0),
            )?;
            if taken {
                return Ok(false);
            }
            conn.execute(
                "INSERT INTO users (id, name, email, role, status, password_hash,
                                    reports_to, approved_by, approved_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    row.id,
                    row.name,
                    row.email,
                    row.role,
                    row.status,
                    row.password_hash,
                    row.reports_to,
                    row.approved_by,
                    row.approved_at,
                    row.created_at,
                ],
            )?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

async fn find_one(
    db: &Database,
    column: &'static str,
    value: String,
) -> Result<Option<User>, LeadflowError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let row = db
        .connection()
        .call(move |conn| -> Result<Option<UserRow>, rusqlite::Error> {
            conn.query_row(&sql, params![value], UserRow::from_row)
                .optional()
        })
        .await
        .map_err(map_tr_err)?;
    row.map(UserRow::into_user).transpose()
}

pub async fn get_user(db: &Database, id: &UserId) -> Result<Option<User>, LeadflowError> {
    find_one(db, "id", id.0.clone()).await
}

pub async fn find_user_by_email(db: &Database, email: &str) -> Result<Option<User>, LeadflowError> {
    find_one(db, "email", email.to_string()).await
}

pub async fn list_users(
    db: &Database,
    filter: &UserFilter,
    order: UserOrder,
) -> Result<Vec<User>, LeadflowError> {
    let mut clauses = Vec::new();
    let mut values = Vec::new();
    if let Some(role) = filter.role {
        clauses.push("role = ?");
        values.push(role.to_string());
    }
    if let Some(status) = filter.status {
        clauses.push("status = ?");
        values.push(status.to_string());
    }
    if let Some(manager) = &filter.reports_to {
        clauses.push("reports_to = ?");
        values.push(manager.0.clone());
    }
    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    let order_sql = match order {
        UserOrder::Id => "id ASC",
        UserOrder::Name => "name COLLATE NOCASE ASC, id ASC",
        UserOrder::CreatedDesc => "created_at DESC, id ASC",
    };
    let sql = format!("SELECT {USER_COLUMNS} FROM users{where_sql} ORDER BY {order_sql}");

    let rows = db
        .connection()
        .call(move |conn| -> Result<Vec<UserRow>, rusqlite::Error> {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), UserRow::from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;
    rows.into_iter().map(UserRow::into_user).collect()
}

pub async fn update_user(db: &Database, user: &User) -> Result<(), LeadflowError> {
    let row = UserRow::from_user(user);
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE users SET name = ?1, email = ?2, role = ?3, status = ?4,
                        password_hash = ?5, reports_to = ?6, approved_by = ?7, approved_at = ?8
                 WHERE id = ?9",
                params![
                    row.name,
                    row.email,
                    row.role,
                    row.status,
                    row.password_hash,
                    row.reports_to,
                    row.approved_by,
                    row.approved_at,
                    row.id,
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if changed == 0 {
        return Err(LeadflowError::NotFoundOrNotOwned("User not found".into()));
    }
    Ok(())
}

pub async fn approve_pending_user(
    db: &Database,
    id: &UserId,
    role: Role,
    approved_by: &UserId,
    at: DateTime<Utc>,
) -> Result<Option<User>, LeadflowError> {
    let id = id.0.clone();
    let role = role.to_string();
    let approved_by = approved_by.0.clone();
    let approved_at = ts(&at);
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    let row = db
        .connection()
        .call(move |conn| -> Result<Option<UserRow>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE users SET role = ?1, status = ?2, approved_by = ?3, approved_at = ?4
                 WHERE id = ?5 AND status = ?6",
                params![
                    role,
                    UserStatus::Approved.to_string(),
                    approved_by,
                    approved_at,
                    id,
                    UserStatus::Pending.to_string(),
                ],
            )?;
            let row = if changed == 1 {
                Some(tx.query_row(&sql, params![id], UserRow::from_row)?)
            } else {
                None
            };
            tx.commit()?;
            Ok(row)
        })
        .await
        .map_err(map_tr_err)?;
    row.map(UserRow::into_user).transpose()
}

pub async fn delete_pending_user(db: &Database, id: &UserId) -> Result<bool, LeadflowError> {
    let id = id.0.clone();
    let deleted = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "DELETE FROM users WHERE id = ?1 AND status = ?2",
                params![id, UserStatus::Pending.to_string()],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(deleted == 1)
}

pub async fn set_reports_to(
    db: &Database,
    ids: &[UserId],
    manager: Option<&UserId>,
) -> Result<usize, LeadflowError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let sql = format!(
        "UPDATE users SET reports_to = ? WHERE role = ? AND status = ? AND id IN ({})",
        vec!["?"; ids.len()].join(", ")
    );
    let mut values: Vec<Option<String>> = vec![
        manager.map(|m| m.0.clone()),
        Some(Role::LeadQualifier.to_string()),
        Some(UserStatus::Approved.to_string()),
    ];
    values.extend(ids.iter().map(|id| Some(id.0.clone())));

    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(&sql, params_from_iter(values.iter()))
        })
        .await
        .map_err(map_tr_err)
}

pub async fn purge_expired_pending_users(
    db: &Database,
    cutoff: DateTime<Utc>,
) -> Result<usize, LeadflowError> {
    let cutoff = ts(&cutoff);
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "DELETE FROM users WHERE status = ?1 AND created_at < ?2",
                params![UserStatus::Pending.to_string(), cutoff],
            )
        })
        .await
        .map_err(map_tr_err)
}
