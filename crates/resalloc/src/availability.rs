use chrono::{DateTime, Utc};

use crate::core::Core;
use crate::model::claim::ResourceClaim;
use crate::model::TimeWindow;
use crate::{Map, ResourceId, Set};

/// Result of a fit check over one task's whole claim batch.
#[derive(Debug, Default)]
pub struct Claimability {
    pub fits: bool,
    /// Currently-claimed claims of other tasks that stand in the way of
    /// a non-fitting requested claim. Input for preemption and for
    /// user-facing conflict reasons.
    pub blocking: Vec<ResourceClaim>,
}

/// Decide whether the requested claim batch fits, and report which
/// existing claims block it. Considers the batch as a whole: requested
/// claims of the same batch on the same resource count against each
/// other. Reads only, never writes.
pub fn get_is_claimable(core: &Core, requested: &[ResourceClaim]) -> Claimability {
    let mut by_resource: Map<ResourceId, Vec<&ResourceClaim>> = Map::default();
    for claim in requested {
        by_resource.entry(claim.resource_id).or_default().push(claim);
    }

    let mut fits = true;
    let mut blocking = Vec::new();
    let mut blocking_seen = Set::default();

    for claim in requested {
        let resource = core.catalog.get_resource(claim.resource_id);
        let window = claim.window();
        let existing = core.store.claimed_claims_overlapping(
            claim.resource_id,
            window,
            Some(claim.task_id),
        );
        let batch = &by_resource[&claim.resource_id];
        let peak = peak_usage(&existing, batch, window);
        let used = peak + core.catalog.used_capacity(claim.resource_id);
        if used > resource.total_capacity {
            log::debug!(
                "Claim {} does not fit on {}: used {} of {}",
                claim.id,
                resource.name,
                used,
                resource.total_capacity
            );
            fits = false;
            for blocker in existing {
                if blocking_seen.insert(blocker.id) {
                    blocking.push(blocker.clone());
                }
            }
        }
    }

    Claimability { fits, blocking }
}

/// Maximum concurrent usage of existing plus batch claims within the
/// window, via a boundary sweep.
fn peak_usage(existing: &[&ResourceClaim], batch: &[&ResourceClaim], window: TimeWindow) -> u64 {
    let mut events: Vec<(DateTime<Utc>, i64)> = Vec::new();
    for claim in existing.iter().chain(batch.iter()) {
        if !claim.window().overlaps(&window) {
            continue;
        }
        events.push((claim.starttime.max(window.start), claim.claim_size as i64));
        events.push((claim.endtime.min(window.end), -(claim.claim_size as i64)));
    }
    events.sort_by_key(|(time, delta)| (*time, *delta));
    let mut current: i64 = 0;
    let mut peak: i64 = 0;
    for (_, delta) in events {
        current += delta;
        peak = peak.max(current);
    }
    peak as u64
}
