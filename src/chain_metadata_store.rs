//! Cross-upstream aggregate: the fleet-wide maximum observed block height.
//!
//! Shared by reference between the manager and every block height checker.
//! Reads are lock-free; writes are serialized and only ever move the
//! maximum forward.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ChainMetadataStore {
    max_block_height: AtomicU64,
}

impl ChainMetadataStore {
    pub fn new() -> Self {
        Self { max_block_height: AtomicU64::new(0) }
    }

    /// Updates the global maximum iff `height` exceeds the current value.
    /// `id` is accepted for observability (future per-upstream attribution
    /// in telemetry) though the store itself tracks only the aggregate.
    pub fn record_block_height(&self, id: &str, height: u64) {
        let mut current = self.max_block_height.load(Ordering::Acquire);
        while height > current {
            match self.max_block_height.compare_exchange_weak(
                current,
                height,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    tracing::debug!(upstream = %id, height, "fleet max block height advanced");
                    break;
                }
                Err(observed) => current = observed,
            }
        }
    }

    pub fn max_block_height(&self) -> u64 {
        self.max_block_height.load(Ordering::Acquire)
    }
}
