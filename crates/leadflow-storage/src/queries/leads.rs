// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead document operations and the contact index.

use leadflow_core::{
    Lead, LeadFilter, LeadId, LeadOrder, LeadflowError, LqStatus, Page, Stage,
};
use rusqlite::{Transaction, params, params_from_iter};

use crate::database::{Database, map_tr_err};
use crate::models::{LeadRecord, LeadRow, parse_lq_status, ts};

/// Builds a `WHERE` clause for `filter`. Every bound value is TEXT.
fn where_clause(filter: &LeadFilter) -> (String, Vec<String>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if let Some(stage) = filter.stage {
        clauses.push("stage = ?");
        values.push(stage.to_string());
    }
    if let Some(user) = &filter.assigned_to {
        clauses.push("assigned_to = ?");
        values.push(user.0.clone());
    }
    if let Some(user) = &filter.created_by {
        clauses.push("created_by = ?");
        values.push(user.0.clone());
    }
    if let Some(status) = filter.lq_status {
        clauses.push("lq_status = ?");
        values.push(status.to_string());
    }
    if let Some(from) = &filter.created_from {
        clauses.push("created_at >= ?");
        values.push(ts(from));
    }
    if let Some(until) = &filter.created_until {
        clauses.push("created_at < ?");
        values.push(ts(until));
    }

    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

fn order_clause(order: LeadOrder) -> &'static str {
    match order {
        LeadOrder::CreatedDesc => " ORDER BY created_at DESC, id DESC",
        LeadOrder::CreatedAsc => " ORDER BY created_at ASC, id ASC",
        LeadOrder::AssignedDesc => " ORDER BY assigned_at DESC, id DESC",
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn write_contacts(tx: &Transaction<'_>, record: &LeadRecord) -> rusqlite::Result<()> {
    tx.execute("DELETE FROM lead_emails WHERE lead_id = ?1", params![record.id])?;
    tx.execute("DELETE FROM lead_phones WHERE lead_id = ?1", params![record.id])?;
    for email in &record.emails {
        tx.execute(
            "INSERT INTO lead_emails (lead_id, normalized) VALUES (?1, ?2)",
            params![record.id, email],
        )?;
    }
    for phone in &record.phones {
        tx.execute(
            "INSERT INTO lead_phones (lead_id, normalized) VALUES (?1, ?2)",
            params![record.id, phone],
        )?;
    }
    Ok(())
}

/// Versioned update of one lead row. Returns whether the guard matched.
fn update_guarded(
    tx: &Transaction<'_>,
    record: &LeadRecord,
    expected_stage: Option<&str>,
) -> rusqlite::Result<bool> {
    let changed = tx.execute(
        "UPDATE leads SET doc = ?1, stage = ?2, status = ?3, lq_status = ?4,
                assigned_to = ?5, assigned_at = ?6, version = version + 1
         WHERE id = ?7 AND version = ?8 AND (?9 IS NULL OR stage = ?9)",
        params![
            record.doc,
            record.stage,
            record.status,
            record.lq_status,
            record.assigned_to,
            record.assigned_at,
            record.id,
            record.version,
            expected_stage,
        ],
    )?;
    if changed == 1 {
        write_contacts(tx, record)?;
    }
    Ok(changed == 1)
}

pub async fn insert_lead(db: &Database, lead: &Lead) -> Result<(), LeadflowError> {
    let record = LeadRecord::from_lead(lead)?;
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO leads (id, doc, stage, status, lq_status, assigned_to,
                                    created_by, created_at, assigned_at, version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1)",
                params![
                    record.id,
                    record.doc,
                    record.stage,
                    record.status,
                    record.lq_status,
                    record.assigned_to,
                    record.created_by,
                    record.created_at,
                    record.assigned_at,
                ],
            )?;
            write_contacts(&tx, &record)?;
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_lead(db: &Database, id: &LeadId) -> Result<Option<Lead>, LeadflowError> {
    let id = id.0.clone();
    let row = db
        .connection()
        .call(move |conn| -> Result<Option<LeadRow>, rusqlite::Error> {
            match conn.query_row(
                "SELECT doc, version FROM leads WHERE id = ?1",
                params![id],
                LeadRow::from_row,
            ) {
                Ok(row) => Ok(Some(row)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;
    row.map(LeadRow::into_lead).transpose()
}

pub async fn save_lead(db: &Database, lead: &Lead) -> Result<(), LeadflowError> {
    let record = LeadRecord::from_lead(lead)?;
    let saved = db
        .connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction()?;
            let saved = update_guarded(&tx, &record, None)?;
            tx.commit()?;
            Ok(saved)
        })
        .await
        .map_err(map_tr_err)?;
    if saved {
        Ok(())
    } else {
        Err(LeadflowError::concurrent_modification())
    }
}

pub async fn save_leads_batch(
    db: &Database,
    expected: Stage,
    leads: &[Lead],
) -> Result<usize, LeadflowError> {
    let records = leads
        .iter()
        .map(LeadRecord::from_lead)
        .collect::<Result<Vec<_>, _>>()?;
    let expected = expected.to_string();
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            let tx = conn.transaction()?;
            let mut written = 0;
            for record in &records {
                if update_guarded(&tx, record, Some(expected.as_str()))? {
                    written += 1;
                }
            }
            tx.commit()?;
            Ok(written)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_leads(
    db: &Database,
    filter: &LeadFilter,
    order: LeadOrder,
    page: Option<Page>,
) -> Result<Vec<Lead>, LeadflowError> {
    let (where_sql, values) = where_clause(filter);
    let (limit, skip) = match page {
        Some(page) => (i64::from(page.limit), i64::from(page.skip)),
        None => (-1, 0),
    };
    let sql = format!(
        "SELECT doc, version FROM leads{where_sql}{} LIMIT {limit} OFFSET {skip}",
        order_clause(order)
    );

    let rows = db
        .connection()
        .call(move |conn| -> Result<Vec<LeadRow>, rusqlite::Error> {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), LeadRow::from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;
    rows.into_iter().map(LeadRow::into_lead).collect()
}

pub async fn count_leads(db: &Database, filter: &LeadFilter) -> Result<u64, LeadflowError> {
    let (where_sql, values) = where_clause(filter);
    let sql = format!("SELECT COUNT(*) FROM leads{where_sql}");
    let count = db
        .connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))
        })
        .await
        .map_err(map_tr_err)?;
    Ok(count.max(0) as u64)
}

pub async fn count_by_lq_status(
    db: &Database,
    filter: &LeadFilter,
) -> Result<Vec<(LqStatus, u64)>, LeadflowError> {
    let (where_sql, values) = where_clause(filter);
    let sql = format!(
        "SELECT lq_status, COUNT(*) FROM leads{where_sql} GROUP BY lq_status ORDER BY lq_status"
    );
    let rows = db
        .connection()
        .call(move |conn| -> Result<Vec<(String, i64)>, rusqlite::Error> {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;
    rows.into_iter()
        .map(|(status, count)| Ok((parse_lq_status(&status)?, count.max(0) as u64)))
        .collect()
}

/// Which of `candidates` exist in `table`, preserving candidate order.
async fn existing_in(
    db: &Database,
    table: &'static str,
    candidates: &[String],
) -> Result<Vec<String>, LeadflowError> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT DISTINCT normalized FROM {table} WHERE normalized IN ({})",
        placeholders(candidates.len())
    );
    let values = candidates.to_vec();
    let found = db
        .connection()
        .call(move |conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), |row| row.get(0))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;
    Ok(candidates
        .iter()
        .filter(|c| found.contains(c))
        .cloned()
        .collect())
}

pub async fn existing_emails(
    db: &Database,
    normalized: &[String],
) -> Result<Vec<String>, LeadflowError> {
    existing_in(db, "lead_emails", normalized).await
}

pub async fn existing_phones(
    db: &Database,
    normalized: &[String],
) -> Result<Vec<String>, LeadflowError> {
    existing_in(db, "lead_phones", normalized).await
}
