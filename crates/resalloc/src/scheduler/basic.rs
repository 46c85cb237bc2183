use crate::availability::get_is_claimable;
use crate::common::error::SchedulerError;
use crate::core::Core;
use crate::model::claim::{ClaimStatus, ResourceClaim};
use crate::model::estimate::ResourceEstimate;
use crate::model::TimeWindow;
use crate::{ResourceId, TaskId};

/// Result of one atomic fit attempt at a fixed window.
#[derive(Debug)]
pub(crate) struct FitOutcome {
    pub success: bool,
    /// Claimed claims of other tasks that blocked the attempt. Empty on
    /// success.
    pub blocking: Vec<ResourceClaim>,
}

/// Build tentative claims from the estimate list. Each estimate claims
/// `resource_count` distinct resources per requested type inside its
/// root group, most available capacity first (name tiebreak, so the
/// choice is deterministic).
pub(crate) fn build_claims(
    core: &mut Core,
    task_id: TaskId,
    window: TimeWindow,
    estimates: &[ResourceEstimate],
) -> crate::Result<Vec<ResourceClaim>> {
    let mut claims = Vec::new();
    for estimate in estimates {
        estimate.validate()?;
        for (resource_type, quantity) in &estimate.resource_types {
            let mut candidates: Vec<ResourceId> = core
                .catalog
                .resources_of_type_in(&estimate.root_resource_group, *resource_type)?;
            if candidates.len() < estimate.resource_count as usize {
                return Err(SchedulerError::schedule_error(format!(
                    "Group '{}' has only {} {} resource(s), {} needed",
                    estimate.root_resource_group,
                    candidates.len(),
                    resource_type,
                    estimate.resource_count
                )));
            }
            candidates.sort_by(|a, b| {
                let free_a = free_capacity(core, *a, window);
                let free_b = free_capacity(core, *b, window);
                free_b
                    .cmp(&free_a)
                    .then_with(|| core.catalog.get_resource(*a).name.cmp(&core.catalog.get_resource(*b).name))
            });
            for resource_id in candidates.into_iter().take(estimate.resource_count as usize) {
                let claim_id = core.new_claim_id();
                claims.push(ResourceClaim::tentative(
                    claim_id,
                    resource_id,
                    task_id,
                    window,
                    *quantity,
                ));
            }
        }
    }
    Ok(claims)
}

fn free_capacity(core: &Core, resource_id: ResourceId, window: TimeWindow) -> u64 {
    let resource = core.catalog.get_resource(resource_id);
    let used = core.store.claimed_usage_in(resource_id, window, None)
        + core.catalog.used_capacity(resource_id);
    resource.total_capacity.saturating_sub(used)
}

/// One atomic allocation attempt: insert the whole batch tentatively,
/// run the availability check, then either promote everything to
/// claimed or roll the batch back. No partial success is ever left
/// visible.
pub(crate) fn try_allocate_at(
    core: &mut Core,
    task_id: TaskId,
    window: TimeWindow,
    estimates: &[ResourceEstimate],
) -> crate::Result<FitOutcome> {
    // A reschedule replaces the task's claim set wholesale
    core.store.remove_claims_for_task(task_id);

    let claims = build_claims(core, task_id, window, estimates)?;
    let batch_size = claims.len();
    core.store.insert_claims(claims.clone())?;
    let claimability = get_is_claimable(core, &claims);
    if !claimability.fits {
        log::debug!(
            "Task {}: {} claim(s) do not fit at {:?} ({} blocker(s))",
            task_id,
            batch_size,
            window,
            claimability.blocking.len()
        );
        core.store.remove_claims_for_task(task_id);
        return Ok(FitOutcome {
            success: false,
            blocking: claimability.blocking,
        });
    }

    core.store
        .set_claim_statuses_for_task(task_id, ClaimStatus::Claimed);
    log::debug!("Task {}: all claims claimed at {:?}", task_id, window);
    Ok(FitOutcome {
        success: true,
        blocking: Vec::new(),
    })
}
