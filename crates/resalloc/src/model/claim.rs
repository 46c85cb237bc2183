use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::error::SchedulerError;
use crate::model::TimeWindow;
use crate::{ClaimId, ResourceId, TaskId};

#[derive(Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum ClaimStatus {
    /// Proposed by a scheduling attempt, not yet checked.
    Tentative,
    /// Committed; counts against the resource's capacity.
    Claimed,
    /// Blocked by insufficient capacity.
    Conflict,
    Error,
}

impl fmt::Debug for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimStatus::Tentative => write!(f, "T"),
            ClaimStatus::Claimed => write!(f, "C"),
            ClaimStatus::Conflict => write!(f, "X"),
            ClaimStatus::Error => write!(f, "E"),
        }
    }
}

/// A reservation of `claim_size` units of one resource for one task
/// over the half-open window `[starttime, endtime)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceClaim {
    pub id: ClaimId,
    pub resource_id: ResourceId,
    pub task_id: TaskId,
    pub starttime: DateTime<Utc>,
    pub endtime: DateTime<Utc>,
    pub claim_size: u64,
    pub status: ClaimStatus,
}

impl ResourceClaim {
    pub fn tentative(
        id: ClaimId,
        resource_id: ResourceId,
        task_id: TaskId,
        window: TimeWindow,
        claim_size: u64,
    ) -> Self {
        ResourceClaim {
            id,
            resource_id,
            task_id,
            starttime: window.start,
            endtime: window.end,
            claim_size,
            status: ClaimStatus::Tentative,
        }
    }

    #[inline]
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.starttime, self.endtime)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.claim_size == 0 {
            return Err(SchedulerError::estimation_error(format!(
                "Claim {} on resource {} has zero size",
                self.id, self.resource_id
            )));
        }
        if self.endtime <= self.starttime {
            return Err(SchedulerError::estimation_error(format!(
                "Claim {} has an empty window ({} >= {})",
                self.id, self.starttime, self.endtime
            )));
        }
        Ok(())
    }
}
