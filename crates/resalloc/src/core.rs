use crate::catalog::Catalog;
use crate::common::WrappedRcRefCell;
use crate::store::ClaimStore;
use crate::{ClaimId, TaskId};

/// Shared state of the scheduling engine: the resource catalog plus the
/// claim/task store.
///
/// Mutations to claims and tasks must be serialized; one mutable borrow
/// of the core spans one allocate-and-commit cycle, which is exactly
/// that serialization. Reads used purely for reporting can go through
/// an immutable borrow.
#[derive(Default)]
pub struct Core {
    pub catalog: Catalog,
    pub store: ClaimStore,

    task_id_counter: u64,
    claim_id_counter: u64,
}

pub type CoreRef = WrappedRcRefCell<Core>;

impl Core {
    pub fn new_task_id(&mut self) -> TaskId {
        self.task_id_counter += 1;
        TaskId::new(self.task_id_counter)
    }

    pub fn new_claim_id(&mut self) -> ClaimId {
        self.claim_id_counter += 1;
        ClaimId::new(self.claim_id_counter)
    }
}
