use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thin_vec::ThinVec;

use crate::model::TimeWindow;
use crate::{MomId, OtdbId, TaskId};

#[derive(Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum TaskStatus {
    Approved,
    Prescheduled,
    Scheduled,
    Queued,
    Active,
    Completed,
    Conflict,
    Error,
    Aborted,
}

impl TaskStatus {
    /// Only tasks in these statuses may be handed to the assigner.
    #[inline]
    pub fn is_assignable(&self) -> bool {
        matches!(self, TaskStatus::Approved | TaskStatus::Prescheduled)
    }
}

impl fmt::Debug for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Approved => write!(f, "approved"),
            TaskStatus::Prescheduled => write!(f, "prescheduled"),
            TaskStatus::Scheduled => write!(f, "scheduled"),
            TaskStatus::Queued => write!(f, "queued"),
            TaskStatus::Active => write!(f, "active"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Conflict => write!(f, "conflict"),
            TaskStatus::Error => write!(f, "error"),
            TaskStatus::Aborted => write!(f, "aborted"),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub mom_id: MomId,
    pub otdb_id: OtdbId,
    pub starttime: DateTime<Utc>,
    pub endtime: DateTime<Utc>,
    pub status: TaskStatus,
    /// Serialized content of the specification this task was assigned
    /// from, kept next to the window for reporting.
    pub specification: Option<String>,
    pub predecessors: ThinVec<TaskId>,
    pub successors: ThinVec<TaskId>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("status", &self.status)
            .finish()
    }
}

impl Task {
    pub fn new(
        id: TaskId,
        mom_id: MomId,
        otdb_id: OtdbId,
        window: TimeWindow,
        status: TaskStatus,
    ) -> Self {
        log::debug!("New task {} ({:?}, window {:?})", id, status, window);
        Task {
            id,
            mom_id,
            otdb_id,
            starttime: window.start,
            endtime: window.end,
            status,
            specification: None,
            predecessors: Default::default(),
            successors: Default::default(),
        }
    }

    #[inline]
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.starttime, self.endtime)
    }

    #[inline]
    pub fn duration(&self) -> chrono::Duration {
        self.endtime - self.starttime
    }

    /// Whether the task has started relative to the injected clock.
    /// A task whose window is entirely in the future can be displaced by
    /// unscheduling; a started one has to be aborted.
    #[inline]
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.starttime <= now
    }
}
