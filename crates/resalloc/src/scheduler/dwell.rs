use chrono::{DateTime, Duration, Utc};

use crate::core::Core;
use crate::model::TimeWindow;
use crate::scheduler::priority::allocate_with_preemption;
use crate::scheduler::{station, AllocationOutcome, AllocationRequest, SchedulePolicy};

/// Bounds of the forward start-time search. The search never proposes a
/// start before `min_starttime`, and stops once the shifted end would
/// pass `max_starttime`.
#[derive(Copy, Clone, Debug)]
pub struct DwellBounds {
    pub min_starttime: DateTime<Utc>,
    pub max_starttime: DateTime<Utc>,
}

/// Step past the latest blocking claim's end.
fn dwell_epsilon() -> Duration {
    Duration::seconds(1)
}

/// Allocate resources for one task, running the full stage pipeline:
/// station expansion, fit check, preemption on failure (when the policy
/// carries a priority provider) and a bounded forward search over start
/// times (when the policy carries dwell bounds).
///
/// Each dwell iteration is a fresh attempt: blocking and preemption
/// bookkeeping from earlier iterations never carries over, so later
/// passes cannot see a stale, capacity-starved view.
pub fn allocate_resources(
    core: &mut Core,
    request: &AllocationRequest,
    policy: &SchedulePolicy,
    now: DateTime<Utc>,
) -> crate::Result<AllocationOutcome> {
    let estimates = station::expand_estimates(&core.catalog, request)?;
    let duration = request.window.duration();

    let mut start = match &policy.dwell {
        Some(bounds) => request.window.start.max(bounds.min_starttime),
        None => request.window.start,
    };
    let mut changed_tasks = Vec::new();
    let mut blocked = false;

    loop {
        let window = TimeWindow::new(start, start + duration);
        if let Some(bounds) = &policy.dwell {
            if window.end > bounds.max_starttime {
                log::debug!(
                    "Task {}: no feasible start before {}",
                    request.task_id,
                    bounds.max_starttime
                );
                return Ok(AllocationOutcome {
                    success: false,
                    changed_tasks,
                    window: request.window,
                    blocked,
                });
            }
        }

        // Blocking state is rebuilt from scratch every iteration
        let outcome = allocate_with_preemption(
            core,
            request.task_id,
            window,
            &estimates,
            policy.preemption,
            now,
            &mut changed_tasks,
        )?;
        if outcome.success {
            return Ok(AllocationOutcome {
                success: true,
                changed_tasks,
                window,
                blocked: false,
            });
        }
        blocked |= !outcome.blocking.is_empty();

        if policy.dwell.is_none() {
            return Ok(AllocationOutcome {
                success: false,
                changed_tasks,
                window: request.window,
                blocked,
            });
        }

        // The next candidate steps past the blocking *claims*, whose
        // end may lie beyond their task's nominal end.
        let next_start = outcome
            .blocking
            .iter()
            .map(|claim| claim.endtime)
            .max()
            .map(|end| end + dwell_epsilon());
        match next_start {
            Some(next) if next > start => {
                log::debug!(
                    "Task {}: dwelling from {} to {}",
                    request.task_id,
                    start,
                    next
                );
                start = next;
            }
            // Nothing blocks, or no forward progress: shifting in time
            // cannot help
            _ => {
                return Ok(AllocationOutcome {
                    success: false,
                    changed_tasks,
                    window: request.window,
                    blocked,
                });
            }
        }
    }
}
