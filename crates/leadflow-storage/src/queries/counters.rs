// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named monotonic counters.

use leadflow_core::LeadflowError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Reserves `size` consecutive sequence numbers on `key` in one statement
/// and returns the first of them. A missing counter starts at zero.
pub async fn next_block(db: &Database, key: &str, size: u64) -> Result<u64, LeadflowError> {
    if size == 0 {
        return Err(LeadflowError::Internal(
            "counter block size must be at least 1".into(),
        ));
    }
    let step = i64::try_from(size)
        .map_err(|_| LeadflowError::Internal(format!("counter block size {size} too large")))?;
    let key = key.to_string();
    let seq = db
        .connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "INSERT INTO counters (key, seq) VALUES (?1, ?2)
                 ON CONFLICT (key) DO UPDATE SET seq = seq + excluded.seq
                 RETURNING seq",
                params![key, step],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok((seq - step).max(0) as u64)
}
