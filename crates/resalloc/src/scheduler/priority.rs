use chrono::{DateTime, Utc};

use crate::core::Core;
use crate::model::estimate::ResourceEstimate;
use crate::model::task::{Task, TaskStatus};
use crate::model::TimeWindow;
use crate::scheduler::basic::{try_allocate_at, FitOutcome};
use crate::{Priority, Set, TaskId};

/// External project-priority lookup. Higher number wins. Implementors
/// return [`crate::DEFAULT_PRIORITY`] when the task's project is
/// unknown.
pub trait PriorityProvider {
    fn priority_of(&self, task: &Task) -> Priority;
}

/// Fit attempt with preemption: when the plain fit fails because of
/// claims held by strictly-lower-priority tasks, displace those tasks
/// and retry. A task that has not started is unscheduled (claims
/// deleted, status conflict); a task already running is aborted with
/// its endtime truncated to now. Equal priority never displaces.
///
/// Bounded by the blocking set of one batch: each round must preempt at
/// least one previously untouched task, otherwise the attempt fails.
pub(crate) fn allocate_with_preemption(
    core: &mut Core,
    task_id: TaskId,
    window: TimeWindow,
    estimates: &[ResourceEstimate],
    provider: Option<&dyn PriorityProvider>,
    now: DateTime<Utc>,
    changed_tasks: &mut Vec<TaskId>,
) -> crate::Result<FitOutcome> {
    let mut preempted: Set<TaskId> = Set::default();
    loop {
        let outcome = try_allocate_at(core, task_id, window, estimates)?;
        let Some(provider) = provider else {
            return Ok(outcome);
        };
        if outcome.success {
            return Ok(outcome);
        }

        let requester_priority = provider.priority_of(core.store.get_task(task_id));
        let mut preemptable: Vec<TaskId> = Vec::new();
        for claim in &outcome.blocking {
            if preempted.contains(&claim.task_id) || preemptable.contains(&claim.task_id) {
                continue;
            }
            let blocker = core.store.get_task(claim.task_id);
            let blocker_priority = provider.priority_of(blocker);
            if blocker_priority < requester_priority {
                preemptable.push(claim.task_id);
            } else {
                log::debug!(
                    "Task {} (priority {}) may not preempt task {} (priority {})",
                    task_id,
                    requester_priority,
                    claim.task_id,
                    blocker_priority
                );
            }
        }
        if preemptable.is_empty() {
            return Ok(outcome);
        }
        for blocker_id in preemptable {
            preempt_task(core, blocker_id, now);
            preempted.insert(blocker_id);
            changed_tasks.push(blocker_id);
        }
    }
}

/// Displace one lower-priority task to free its capacity.
fn preempt_task(core: &mut Core, task_id: TaskId, now: DateTime<Utc>) {
    let task = core.store.get_task(task_id);
    if task.has_started(now) {
        log::info!("Aborting running task {} (preempted)", task_id);
        core.store.remove_claims_for_task(task_id);
        let task = core.store.get_task_mut(task_id);
        task.endtime = now;
        task.status = TaskStatus::Aborted;
    } else {
        log::info!("Unscheduling task {} (preempted)", task_id);
        core.store.remove_claims_for_task(task_id);
        core.store.set_task_status(task_id, TaskStatus::Conflict);
    }
}
