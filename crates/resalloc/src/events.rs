use serde::{Deserialize, Serialize};

use crate::model::task::{Task, TaskStatus};
use crate::{MomId, OtdbId, TaskId};

/// Identification of a task in an outgoing notification: the internal
/// id plus the external ids the rest of the system knows it by.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TaskRef {
    pub task_id: TaskId,
    pub mom_id: MomId,
    pub otdb_id: OtdbId,
    pub status: TaskStatus,
}

impl TaskRef {
    pub fn of(task: &Task) -> Self {
        TaskRef {
            task_id: task.id,
            mom_id: task.mom_id,
            otdb_id: task.otdb_id,
            status: task.status,
        }
    }
}

/// Seam to the external publish mechanism. One callback fires per task
/// whose status changed as a side effect of an assignment.
pub trait EventProcessor {
    fn on_task_scheduled(&mut self, task: TaskRef);
    fn on_task_conflict(&mut self, task: TaskRef);
    fn on_task_error(&mut self, task: TaskRef);
    fn on_task_aborted(&mut self, task: TaskRef);
}
