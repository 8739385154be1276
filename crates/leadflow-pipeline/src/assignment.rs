// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Round-robin distribution over a worker pool.
//!
//! Each call reserves one contiguous block from a named counter in the
//! store, so concurrent batches never share a sequence number. Item `i` of a
//! batch goes to worker `(block_start + i) mod pool_size`.

use std::sync::Arc;

use tracing::debug;

use leadflow_core::{LeadflowError, Store};

/// Counter backing the Verifier -> LQ fan-out.
pub const LQ_POOL: &str = "LQ_ASSIGN";

/// Pool indices for `count` items starting at sequence `start`.
pub fn spread(start: u64, count: usize, pool_size: usize) -> Vec<usize> {
    if pool_size == 0 {
        return Vec::new();
    }
    let k = pool_size as u64;
    (0..count as u64)
        .map(|i| (start.wrapping_add(i) % k) as usize)
        .collect()
}

#[derive(Clone)]
pub struct RoundRobin {
    store: Arc<dyn Store>,
}

impl RoundRobin {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Reserves `size` sequence numbers on `key` and returns the first.
    pub async fn next_block(&self, key: &str, size: usize) -> Result<u64, LeadflowError> {
        self.store.next_block(key, size as u64).await
    }

    /// Picks a worker for each of `count` items.
    pub async fn assign<'a, T>(
        &self,
        key: &str,
        pool: &'a [T],
        count: usize,
    ) -> Result<Vec<&'a T>, LeadflowError> {
        if pool.is_empty() {
            return Err(LeadflowError::ResourceExhausted(format!(
                "worker pool `{key}` is empty"
            )));
        }
        if count == 0 {
            return Ok(Vec::new());
        }
        let start = self.next_block(key, count).await?;
        debug!(pool = key, start, count, pool_size = pool.len(), "reserved round-robin block");
        Ok(spread(start, count, pool.len())
            .into_iter()
            .map(|i| &pool[i])
            .collect())
    }

    /// Single-item convenience over [`RoundRobin::assign`].
    pub async fn next_worker<'a, T>(&self, key: &str, pool: &'a [T]) -> Result<&'a T, LeadflowError> {
        self.assign(key, pool, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LeadflowError::Internal("empty round-robin block".into()))
    }
}
