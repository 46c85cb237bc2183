use crate::common::error::SchedulerError;
use crate::model::claim::{ClaimStatus, ResourceClaim};
use crate::model::task::{Task, TaskStatus};
use crate::model::TimeWindow;
use crate::{ClaimId, Map, ResourceId, Set, TaskId};

/// Persisted claims and tasks. All claim mutation is bulk and
/// per-task: a task's claim set is replaced wholesale on reschedule,
/// never patched incrementally.
#[derive(Default)]
pub struct ClaimStore {
    tasks: Map<TaskId, Task>,
    claims: Map<ClaimId, ResourceClaim>,
    claims_by_task: Map<TaskId, Set<ClaimId>>,
    claims_by_resource: Map<ResourceId, Set<ClaimId>>,
}

impl ClaimStore {
    // Tasks

    pub fn insert_task(&mut self, task: Task) {
        let task_id = task.id;
        assert!(
            self.tasks.insert(task_id, task).is_none(),
            "Duplicate task id={task_id}"
        );
    }

    #[inline]
    pub fn get_task(&self, task_id: TaskId) -> &Task {
        self.tasks.get(&task_id).unwrap_or_else(|| {
            panic!("Asking for invalid task id={task_id}");
        })
    }

    #[inline]
    pub fn get_task_mut(&mut self, task_id: TaskId) -> &mut Task {
        self.tasks.get_mut(&task_id).unwrap_or_else(|| {
            panic!("Asking for invalid task id={task_id}");
        })
    }

    #[inline]
    pub fn find_task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.get(&task_id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn find_task_by_otdb(&self, otdb_id: crate::OtdbId) -> Option<&Task> {
        self.tasks.values().find(|task| task.otdb_id == otdb_id)
    }

    pub fn set_task_status(&mut self, task_id: TaskId, status: TaskStatus) {
        let task = self.get_task_mut(task_id);
        if task.status != status {
            log::debug!("Task {} status {:?} -> {:?}", task_id, task.status, status);
            task.status = status;
        }
    }

    /// Insert a predecessor link. Re-inserting an existing link is a
    /// no-op, so re-assignment of successor tasks stays idempotent.
    /// A link that would close a cycle is rejected.
    pub fn insert_predecessor_link(
        &mut self,
        task_id: TaskId,
        predecessor_id: TaskId,
    ) -> crate::Result<()> {
        if self.get_task(task_id).predecessors.contains(&predecessor_id) {
            return Ok(());
        }
        if task_id == predecessor_id || self.is_transitive_predecessor(predecessor_id, task_id) {
            return Err(SchedulerError::schedule_error(format!(
                "Predecessor link {predecessor_id} -> {task_id} would create a cycle"
            )));
        }
        self.get_task_mut(task_id).predecessors.push(predecessor_id);
        self.get_task_mut(predecessor_id).successors.push(task_id);
        Ok(())
    }

    /// Is `ancestor` reachable from `task_id` by walking predecessors?
    fn is_transitive_predecessor(&self, task_id: TaskId, ancestor: TaskId) -> bool {
        let mut stack = vec![task_id];
        let mut visited: Set<TaskId> = Set::default();
        while let Some(id) = stack.pop() {
            if id == ancestor {
                return true;
            }
            if !visited.insert(id) {
                continue;
            }
            if let Some(task) = self.find_task(id) {
                stack.extend(task.predecessors.iter().copied());
            }
        }
        false
    }

    /// Remove a task together with its claims and its graph links.
    pub fn remove_task(&mut self, task_id: TaskId) -> Option<Task> {
        let task = self.tasks.remove(&task_id)?;
        self.remove_claims_for_task(task_id);
        for pred in &task.predecessors {
            if let Some(p) = self.tasks.get_mut(pred) {
                p.successors.retain(|id| *id != task_id);
            }
        }
        for succ in &task.successors {
            if let Some(s) = self.tasks.get_mut(succ) {
                s.predecessors.retain(|id| *id != task_id);
            }
        }
        Some(task)
    }

    // Claims

    /// Bulk insert, all-or-nothing: if any record is invalid, nothing
    /// is inserted.
    pub fn insert_claims(&mut self, claims: Vec<ResourceClaim>) -> crate::Result<()> {
        for claim in &claims {
            claim.validate()?;
            if !self.tasks.contains_key(&claim.task_id) {
                return Err(SchedulerError::PersistenceError(format!(
                    "Claim {} references unknown task {}",
                    claim.id, claim.task_id
                )));
            }
            if self.claims.contains_key(&claim.id) {
                return Err(SchedulerError::PersistenceError(format!(
                    "Duplicate claim id={}",
                    claim.id
                )));
            }
        }
        log::debug!("Inserting {} claim(s)", claims.len());
        for claim in claims {
            self.claims_by_task
                .entry(claim.task_id)
                .or_default()
                .insert(claim.id);
            self.claims_by_resource
                .entry(claim.resource_id)
                .or_default()
                .insert(claim.id);
            self.claims.insert(claim.id, claim);
        }
        Ok(())
    }

    /// Bulk delete of a task's whole claim set.
    pub fn remove_claims_for_task(&mut self, task_id: TaskId) -> usize {
        let Some(claim_ids) = self.claims_by_task.remove(&task_id) else {
            return 0;
        };
        let count = claim_ids.len();
        for claim_id in claim_ids {
            if let Some(claim) = self.claims.remove(&claim_id) {
                if let Some(ids) = self.claims_by_resource.get_mut(&claim.resource_id) {
                    ids.remove(&claim_id);
                }
            }
        }
        log::debug!("Removed {} claim(s) of task {}", count, task_id);
        count
    }

    /// Bulk status update of a task's whole claim set.
    pub fn set_claim_statuses_for_task(&mut self, task_id: TaskId, status: ClaimStatus) {
        if let Some(claim_ids) = self.claims_by_task.get(&task_id) {
            for claim_id in claim_ids {
                let claim = self.claims.get_mut(claim_id).expect("Claim index broken");
                claim.status = status;
            }
        }
    }

    pub fn claims_for_task(&self, task_id: TaskId) -> impl Iterator<Item = &ResourceClaim> {
        self.claims_by_task
            .get(&task_id)
            .into_iter()
            .flat_map(|ids| ids.iter().map(|id| &self.claims[id]))
    }

    /// Claimed claims on one resource overlapping the window,
    /// optionally ignoring one task's own claims (reschedule case).
    pub fn claimed_claims_overlapping(
        &self,
        resource_id: ResourceId,
        window: TimeWindow,
        exclude_task: Option<TaskId>,
    ) -> Vec<&ResourceClaim> {
        self.claims_by_resource
            .get(&resource_id)
            .into_iter()
            .flat_map(|ids| ids.iter().map(|id| &self.claims[id]))
            .filter(|claim| {
                claim.status == ClaimStatus::Claimed
                    && claim.window().overlaps(&window)
                    && exclude_task != Some(claim.task_id)
            })
            .collect()
    }

    /// Maximum concurrently claimed usage of a resource within the
    /// window, via a sweep over claim boundaries.
    pub fn claimed_usage_in(
        &self,
        resource_id: ResourceId,
        window: TimeWindow,
        exclude_task: Option<TaskId>,
    ) -> u64 {
        let overlapping = self.claimed_claims_overlapping(resource_id, window, exclude_task);
        let mut events: Vec<(chrono::DateTime<chrono::Utc>, i64)> = Vec::new();
        for claim in overlapping {
            events.push((claim.starttime.max(window.start), claim.claim_size as i64));
            events.push((claim.endtime.min(window.end), -(claim.claim_size as i64)));
        }
        // Ends sort before starts at the same instant: [a, b) and [b, c)
        // never overlap.
        events.sort_by_key(|(time, delta)| (*time, *delta));
        let mut current: i64 = 0;
        let mut peak: i64 = 0;
        for (_, delta) in events {
            current += delta;
            peak = peak.max(current);
        }
        peak as u64
    }
}

#[cfg(test)]
mod tests {
    use super::ClaimStore;
    use crate::model::claim::{ClaimStatus, ResourceClaim};
    use crate::model::task::{Task, TaskStatus};
    use crate::model::TimeWindow;
    use crate::{ClaimId, MomId, OtdbId, ResourceId, TaskId};
    use chrono::{TimeZone, Utc};

    fn window(h0: u32, h1: u32) -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2020, 1, 1, h0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 1, h1, 0, 0).unwrap(),
        )
    }

    fn task(id: u64) -> Task {
        Task::new(
            TaskId::new(id),
            MomId::new(id),
            OtdbId::new(id),
            window(0, 4),
            TaskStatus::Approved,
        )
    }

    fn claim(id: u64, task_id: u64, w: TimeWindow, size: u64) -> ResourceClaim {
        let mut c = ResourceClaim::tentative(
            ClaimId::new(id),
            ResourceId::new(1),
            TaskId::new(task_id),
            w,
            size,
        );
        c.status = ClaimStatus::Claimed;
        c
    }

    #[test]
    fn test_usage_sweep_counts_concurrency() {
        let mut store = ClaimStore::default();
        store.insert_task(task(1));
        store.insert_task(task(2));
        store
            .insert_claims(vec![
                claim(1, 1, window(0, 2), 40),
                claim(2, 2, window(1, 3), 30),
            ])
            .unwrap();
        assert_eq!(store.claimed_usage_in(ResourceId::new(1), window(0, 4), None), 70);
        // Half-open: [0,1) and [1,2) do not add up at the boundary
        assert_eq!(store.claimed_usage_in(ResourceId::new(1), window(0, 1), None), 40);
        assert_eq!(store.claimed_usage_in(ResourceId::new(1), window(2, 3), None), 30);
        assert_eq!(
            store.claimed_usage_in(ResourceId::new(1), window(0, 4), Some(TaskId::new(1))),
            30
        );
    }

    #[test]
    fn test_insert_claims_is_all_or_nothing() {
        let mut store = ClaimStore::default();
        store.insert_task(task(1));
        let bad = claim(2, 1, window(2, 2), 10); // empty window
        let result = store.insert_claims(vec![claim(1, 1, window(0, 1), 10), bad]);
        assert!(result.is_err());
        assert_eq!(store.claims_for_task(TaskId::new(1)).count(), 0);
    }

    #[test]
    fn test_predecessor_links_idempotent_and_acyclic() {
        let mut store = ClaimStore::default();
        store.insert_task(task(1));
        store.insert_task(task(2));
        store.insert_task(task(3));
        let (t1, t2, t3) = (TaskId::new(1), TaskId::new(2), TaskId::new(3));
        store.insert_predecessor_link(t2, t1).unwrap();
        // Idempotent re-insert
        store.insert_predecessor_link(t2, t1).unwrap();
        assert_eq!(store.get_task(t2).predecessors.len(), 1);
        assert_eq!(store.get_task(t1).successors.len(), 1);
        store.insert_predecessor_link(t3, t2).unwrap();
        // 1 -> 2 -> 3 -> 1 would close a cycle
        assert!(store.insert_predecessor_link(t1, t3).is_err());
        assert!(store.insert_predecessor_link(t1, t1).is_err());
    }

    #[test]
    fn test_remove_task_cascades() {
        let mut store = ClaimStore::default();
        store.insert_task(task(1));
        store.insert_task(task(2));
        store.insert_predecessor_link(TaskId::new(2), TaskId::new(1)).unwrap();
        store
            .insert_claims(vec![claim(1, 1, window(0, 2), 40)])
            .unwrap();
        store.remove_task(TaskId::new(1));
        assert_eq!(store.claimed_usage_in(ResourceId::new(1), window(0, 4), None), 0);
        assert!(store.get_task(TaskId::new(2)).predecessors.is_empty());
    }
}
