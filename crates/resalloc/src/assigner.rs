use chrono::{DateTime, Utc};

use crate::common::error::SchedulerError;
use crate::core::Core;
use crate::events::{EventProcessor, TaskRef};
use crate::model::estimate::{ResourceEstimate, StationRequirement};
use crate::model::task::{Task, TaskStatus};
use crate::model::TimeWindow;
use crate::scheduler::{
    allocate_resources, AllocationRequest, DwellBounds, PriorityProvider, SchedulePolicy,
};
use crate::{MomId, OtdbId, TaskId};

/// The fields the assigner reads from an externally supplied
/// specification tree. Everything else in the tree is opaque here.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TaskSpecification {
    pub mom_id: MomId,
    pub otdb_id: OtdbId,
    pub window: TimeWindow,
    /// Dwell bounds; default to the nominal window when absent.
    pub min_starttime: Option<DateTime<Utc>>,
    pub max_starttime: Option<DateTime<Utc>>,
    pub station_requirements: Vec<StationRequirement>,
    /// Predecessors by their external id, resolved against the store.
    pub predecessors: Vec<OtdbId>,
}

/// Output shape of the external resource estimator.
#[derive(Clone, Debug, Default)]
pub struct EstimatedResources {
    pub estimates: Vec<ResourceEstimate>,
    /// Templates instantiated once per selected station.
    pub station_estimates: Vec<ResourceEstimate>,
}

/// External estimator seam: turns a specification into resource
/// quantities. Failures are estimation errors; the task goes to error
/// and no claims are touched.
pub trait ResourceEstimator {
    fn estimate_resources(&self, spec: &TaskSpecification) -> crate::Result<EstimatedResources>;
}

/// Run one assignment request end-to-end: validate the task status,
/// fetch estimates, run the full scheduling pipeline, persist the
/// resulting statuses and emit one notification per affected task.
///
/// Infrastructure failures (persistence) unwind as `Err`; every
/// algorithmic failure is absorbed into the task's status.
pub fn assign_resources(
    core: &mut Core,
    events: &mut dyn EventProcessor,
    estimator: &dyn ResourceEstimator,
    priorities: &dyn PriorityProvider,
    spec: &TaskSpecification,
    now: DateTime<Utc>,
) -> crate::Result<TaskId> {
    let existing = core
        .store
        .find_task_by_otdb(spec.otdb_id)
        .map(|task| (task.id, task.status));
    let task_id = match existing {
        Some((task_id, status)) => {
            if !status.is_assignable() {
                log::warn!(
                    "Task {} cannot be assigned from status {:?}; ignoring request",
                    task_id,
                    status
                );
                return Ok(task_id);
            }
            task_id
        }
        None => {
            let task_id = core.new_task_id();
            core.store.insert_task(Task::new(
                task_id,
                spec.mom_id,
                spec.otdb_id,
                spec.window,
                TaskStatus::Approved,
            ));
            task_id
        }
    };

    let content = serde_json::to_string(spec)
        .map_err(|error| SchedulerError::PersistenceError(error.to_string()))?;
    core.store.get_task_mut(task_id).specification = Some(content);

    let estimated = match estimator.estimate_resources(spec) {
        Ok(estimated) => estimated,
        Err(error) => {
            log::warn!("Estimation failed for task {}: {}", task_id, error);
            return fail_task(core, events, task_id, TaskStatus::Error);
        }
    };

    let request = AllocationRequest {
        task_id,
        window: spec.window,
        estimates: estimated.estimates,
        station_requirements: spec.station_requirements.clone(),
        station_estimates: estimated.station_estimates,
    };
    // The full pipeline is used uniformly; fit check, station
    // expansion, preemption and dwelling are stages, not alternatives.
    let policy = SchedulePolicy {
        preemption: Some(priorities),
        dwell: Some(DwellBounds {
            min_starttime: spec.min_starttime.unwrap_or(spec.window.start),
            max_starttime: spec.max_starttime.unwrap_or(spec.window.end),
        }),
    };

    let outcome = match allocate_resources(core, &request, &policy, now) {
        Ok(outcome) => outcome,
        Err(error @ SchedulerError::PersistenceError(_)) => return Err(error),
        Err(error) => {
            log::warn!("Allocation failed for task {}: {}", task_id, error);
            return fail_task(core, events, task_id, TaskStatus::Error);
        }
    };

    for changed_id in &outcome.changed_tasks {
        notify_changed(core, events, *changed_id);
    }

    if outcome.success {
        let task = core.store.get_task_mut(task_id);
        task.starttime = outcome.window.start;
        task.endtime = outcome.window.end;
        core.store.set_task_status(task_id, TaskStatus::Scheduled);
        link_predecessors(core, task_id, &spec.predecessors);
        events.on_task_scheduled(TaskRef::of(core.store.get_task(task_id)));
        Ok(task_id)
    } else if outcome.blocked {
        fail_task(core, events, task_id, TaskStatus::Conflict)
    } else {
        fail_task(core, events, task_id, TaskStatus::Error)
    }
}

fn fail_task(
    core: &mut Core,
    events: &mut dyn EventProcessor,
    task_id: TaskId,
    status: TaskStatus,
) -> crate::Result<TaskId> {
    core.store.set_task_status(task_id, status);
    let task_ref = TaskRef::of(core.store.get_task(task_id));
    match status {
        TaskStatus::Conflict => events.on_task_conflict(task_ref),
        _ => events.on_task_error(task_ref),
    }
    Ok(task_id)
}

/// Resolve and insert predecessor links. Links already present are
/// no-ops; predecessors not (yet) known to the store are skipped.
fn link_predecessors(core: &mut Core, task_id: TaskId, predecessors: &[OtdbId]) {
    for otdb_id in predecessors {
        let Some(predecessor_id) = core.store.find_task_by_otdb(*otdb_id).map(|t| t.id) else {
            log::warn!(
                "Task {}: predecessor otdb={} not known, skipping link",
                task_id,
                otdb_id
            );
            continue;
        };
        if let Err(error) = core.store.insert_predecessor_link(task_id, predecessor_id) {
            log::warn!("Task {}: {}", task_id, error);
        }
    }
}

/// Emit the notification matching a displaced task's persisted status.
fn notify_changed(core: &Core, events: &mut dyn EventProcessor, task_id: TaskId) {
    let task_ref = TaskRef::of(core.store.get_task(task_id));
    match task_ref.status {
        TaskStatus::Aborted => events.on_task_aborted(task_ref),
        TaskStatus::Conflict => events.on_task_conflict(task_ref),
        status => {
            log::debug!(
                "Changed task {} left in status {:?}; no notification",
                task_id,
                status
            );
        }
    }
}
