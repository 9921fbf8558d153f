//! Per-upstream composite status: bundles the four checkers for one
//! upstream and exposes accessor methods the manager reads under a
//! per-status read guard.

use crate::block_height_checker::BlockHeightChecker;
use crate::error_latency_checker::ErrorLatencyChecker;
use crate::peer_checker::PeerChecker;
use crate::syncing_checker::SyncingChecker;
use std::sync::Arc;

/// One upstream's status bundle. Published atomically by the manager once
/// all four checkers have finished constructing; never partially visible.
#[derive(Debug)]
pub struct UpstreamStatus {
    pub id: String,
    pub group_id: Option<String>,
    pub block_height_checker: Arc<BlockHeightChecker>,
    pub peer_checker: PeerChecker,
    pub syncing_checker: SyncingChecker,
    pub error_latency_checker: ErrorLatencyChecker,
}

impl UpstreamStatus {
    /// The group this upstream belongs to for routing purposes, or its own
    /// ID when ungrouped.
    pub fn group_id(&self) -> &str {
        self.group_id.as_deref().unwrap_or(&self.id)
    }

    /// Composite predicate over peer, sync, and block-height dimensions
    /// (error/latency gating is evaluated separately via
    /// `error_latency_checker.is_passing`, since it needs the set of
    /// methods being routed).
    pub fn is_passing(&self, max_block_height: u64, max_block_height_drift: u64) -> bool {
        self.peer_checker.is_passing()
            && self.syncing_checker.is_passing()
            && self.block_height_checker.is_passing(max_block_height, max_block_height_drift)
    }
}
