pub mod basic;
pub mod dwell;
pub mod priority;
pub mod station;

use crate::model::estimate::{ResourceEstimate, StationRequirement};
use crate::model::TimeWindow;
use crate::TaskId;

pub use dwell::{allocate_resources, DwellBounds};
pub use priority::PriorityProvider;
pub use station::{requirements_satisfied_without, select_stations};

/// One allocation request: everything needed to claim resources for a
/// single task at (or after) its nominal window.
#[derive(Debug)]
pub struct AllocationRequest {
    pub task_id: TaskId,
    /// Nominal window; dwelling may shift it forward, keeping duration.
    pub window: TimeWindow,
    /// Estimates claimed against their own root resource group.
    pub estimates: Vec<ResourceEstimate>,
    /// Abstract station requirements, expanded and greedily satisfied
    /// before claim building.
    pub station_requirements: Vec<StationRequirement>,
    /// Per-station estimate templates, instantiated once for every
    /// selected station.
    pub station_estimates: Vec<ResourceEstimate>,
}

/// What a scheduling attempt did, beyond the requesting task's own
/// claims. `changed_tasks` lists every task displaced by preemption;
/// the orchestrator persists and notifies about each of them.
#[derive(Debug)]
pub struct AllocationOutcome {
    pub success: bool,
    pub changed_tasks: Vec<TaskId>,
    /// The window actually used (equals the nominal window unless
    /// dwelling shifted it).
    pub window: TimeWindow,
    /// A failed attempt was blocked by other tasks' claims, as opposed
    /// to failing on its own input.
    pub blocked: bool,
}

/// Composition of the scheduling stages. The fit check always runs;
/// preemption and dwelling are switched on by the caller.
#[derive(Default)]
pub struct SchedulePolicy<'a> {
    pub preemption: Option<&'a dyn PriorityProvider>,
    pub dwell: Option<DwellBounds>,
}
