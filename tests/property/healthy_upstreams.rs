//! Property tests for `HealthCheckManager::healthy_upstreams`: whatever the
//! fleet's mixed health state, the answer must be a duplicate-free,
//! order-preserving subset of the candidates asked about.

use crate::common::ScriptedClient;
use gateway_health::config::{ErrorMatchConfig, HealthCheckConfig, UpstreamConfig};
use gateway_health::{HealthCheckManager, RoutingConfig, UpstreamEntry, MIN_PEERS};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

fn routing_config() -> RoutingConfig {
    RoutingConfig {
        detection_window: Duration::from_secs(10),
        ban_window: Duration::from_secs(30),
        errors: ErrorMatchConfig { rate: 0.5, ..Default::default() },
        latency: Default::default(),
        passive_latency_checking: false,
        is_enabled: true,
        max_block_height_drift: 0,
        enhanced_routing_control_defined: false,
    }
}

fn upstream(id: &str) -> UpstreamConfig {
    UpstreamConfig {
        id: id.into(),
        group_id: None,
        http_url: format!("http://{id}"),
        ws_url: None,
        basic_auth: None,
        request_headers: HashMap::new(),
        health_check_config: HealthCheckConfig::default(),
    }
}

fn client_for(healthy: bool) -> Arc<ScriptedClient> {
    let client = Arc::new(ScriptedClient::new());
    client.peer_counts.lock().unwrap().push(Ok(if healthy { MIN_PEERS * 2 } else { 1 }));
    client.sync_progresses.lock().unwrap().push(Ok(None));
    client
}

/// Five fixed upstream ids; `flags` decides which ones answer healthy.
fn ids() -> Vec<&'static str> {
    vec!["a", "b", "c", "d", "e"]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn healthy_upstreams_is_a_stable_order_preserving_subset(
        flags in prop::collection::vec(any::<bool>(), 5),
        candidate_indices in prop::collection::vec(0usize..7, 0..12),
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let all_ids = ids();
            let entries: Vec<UpstreamEntry> = all_ids
                .iter()
                .zip(flags.iter())
                .map(|(id, healthy)| UpstreamEntry {
                    config: upstream(id),
                    client: client_for(*healthy),
                })
                .collect();

            let manager = HealthCheckManager::new(entries, routing_config()).await.unwrap();

            // indices 5 and 6 deliberately resolve to unknown ids, exercising
            // the "skip unknown candidates" rule.
            let candidates: Vec<String> = candidate_indices
                .iter()
                .map(|i| match all_ids.get(*i) {
                    Some(id) => id.to_string(),
                    None => format!("ghost-{i}"),
                })
                .collect();

            let result = manager.healthy_upstreams(&candidates);

            // Subset: every id returned was actually a candidate.
            let candidate_set: HashSet<String> = candidates.iter().cloned().collect();
            prop_assert!(result.iter().all(|id| candidate_set.contains(id)));

            // No duplicates.
            let result_set: HashSet<String> = result.iter().cloned().collect();
            prop_assert_eq!(result_set.len(), result.len());

            // Order-preserving: result is exactly candidates filtered down,
            // never reordered.
            let result_lookup: HashSet<String> = result.iter().cloned().collect();
            let filtered: Vec<String> =
                candidates.iter().filter(|id| result_lookup.contains(*id)).cloned().collect();
            prop_assert_eq!(&filtered, &result);

            // Stability: calling it again with the same candidates yields the
            // same answer (construction-time checks only run once here).
            let second = manager.healthy_upstreams(&candidates);
            prop_assert_eq!(result, second);
        });
    }
}
