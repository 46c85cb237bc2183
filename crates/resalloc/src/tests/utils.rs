use chrono::{DateTime, TimeZone, Utc};
use smallvec::smallvec;

use crate::assigner::{EstimatedResources, ResourceEstimator, TaskSpecification};
use crate::core::Core;
use crate::events::{EventProcessor, TaskRef};
use crate::model::claim::ClaimStatus;
use crate::model::estimate::ResourceEstimate;
use crate::model::resource::ResourceType;
use crate::model::task::{Task, TaskStatus};
use crate::model::TimeWindow;
use crate::scheduler::PriorityProvider;
use crate::{Map, Priority, TaskId, DEFAULT_PRIORITY};

pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn hour(h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, h, 0, 0).unwrap()
}

pub fn window(h0: u32, h1: u32) -> TimeWindow {
    TimeWindow::new(hour(h0), hour(h1))
}

/// A core with the station tree used throughout the tests:
/// ALL > CORE > {CS001, CS002}, ALL > REMOTE > {RS106}, each station
/// carrying one bandwidth resource `<name>bw0` of the given capacity.
pub fn station_core(bandwidth_capacity: u64) -> Core {
    let mut core = Core::default();
    let all = core.catalog.add_group("ALL");
    let core_group = core.catalog.add_group("CORE");
    let remote = core.catalog.add_group("REMOTE");
    core.catalog.add_group_child(all, core_group);
    core.catalog.add_group_child(all, remote);
    for (parent, name) in [(core_group, "CS001"), (core_group, "CS002"), (remote, "RS106")] {
        let station = core.catalog.add_group(name);
        core.catalog.add_group_child(parent, station);
        let bw = core.catalog.add_resource(
            format!("{name}bw0"),
            ResourceType::Bandwidth,
            bandwidth_capacity,
        );
        core.catalog.add_group_resource(station, bw);
    }
    core
}

pub fn submit_task(core: &mut Core, w: TimeWindow, status: TaskStatus) -> TaskId {
    let task_id = core.new_task_id();
    let task = Task::new(
        task_id,
        task_id.as_num().into(),
        task_id.as_num().into(),
        w,
        status,
    );
    core.store.insert_task(task);
    task_id
}

pub fn bandwidth_estimate(group: &str, size: u64) -> ResourceEstimate {
    ResourceEstimate {
        resource_types: smallvec![(ResourceType::Bandwidth, size)],
        resource_count: 1,
        root_resource_group: group.to_string(),
        station: None,
    }
}

pub fn claimed_claim_count(core: &Core, task_id: TaskId) -> usize {
    core.store
        .claims_for_task(task_id)
        .filter(|claim| claim.status == ClaimStatus::Claimed)
        .count()
}

/// Checks the capacity invariant at every claim boundary of every
/// resource: claimed usage never exceeds total capacity.
pub fn check_capacity_invariant(core: &Core) {
    let horizon = TimeWindow::new(hour(0), hour(0) + chrono::Duration::days(365));
    for resource in core.catalog.resources() {
        let peak = core.store.claimed_usage_in(resource.id, horizon, None);
        assert!(
            peak + core.catalog.used_capacity(resource.id) <= resource.total_capacity,
            "Capacity of {} exceeded: {} > {}",
            resource.name,
            peak,
            resource.total_capacity
        );
    }
}

/// Event collector for tests.
#[derive(Default, Debug)]
pub struct TestEvents {
    pub scheduled: Vec<TaskRef>,
    pub conflict: Vec<TaskRef>,
    pub error: Vec<TaskRef>,
    pub aborted: Vec<TaskRef>,
}

impl EventProcessor for TestEvents {
    fn on_task_scheduled(&mut self, task: TaskRef) {
        self.scheduled.push(task);
    }
    fn on_task_conflict(&mut self, task: TaskRef) {
        self.conflict.push(task);
    }
    fn on_task_error(&mut self, task: TaskRef) {
        self.error.push(task);
    }
    fn on_task_aborted(&mut self, task: TaskRef) {
        self.aborted.push(task);
    }
}

/// Fixed priority table; unknown tasks get the default priority.
#[derive(Default)]
pub struct TestPriorities {
    priorities: Map<TaskId, Priority>,
}

impl TestPriorities {
    pub fn with(mut self, task_id: TaskId, priority: Priority) -> Self {
        self.priorities.insert(task_id, priority);
        self
    }
}

impl PriorityProvider for TestPriorities {
    fn priority_of(&self, task: &Task) -> Priority {
        self.priorities
            .get(&task.id)
            .copied()
            .unwrap_or(DEFAULT_PRIORITY)
    }
}

/// Estimator returning a canned answer, or an estimation error.
pub struct TestEstimator {
    pub result: crate::Result<EstimatedResources>,
}

impl TestEstimator {
    pub fn ok(estimated: EstimatedResources) -> Self {
        TestEstimator {
            result: Ok(estimated),
        }
    }

    pub fn failing() -> Self {
        TestEstimator {
            result: Err(crate::Error::estimation_error("broken specification")),
        }
    }
}

impl ResourceEstimator for TestEstimator {
    fn estimate_resources(&self, _spec: &TaskSpecification) -> crate::Result<EstimatedResources> {
        match &self.result {
            Ok(estimated) => Ok(estimated.clone()),
            Err(error) => Err(crate::Error::EstimationError(error.to_string())),
        }
    }
}

pub fn spec(otdb: u64, w: TimeWindow) -> TaskSpecification {
    TaskSpecification {
        mom_id: otdb.into(),
        otdb_id: otdb.into(),
        window: w,
        min_starttime: None,
        max_starttime: None,
        station_requirements: Vec::new(),
        predecessors: Vec::new(),
    }
}
