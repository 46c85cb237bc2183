pub mod claim;
pub mod estimate;
pub mod group;
pub mod resource;
pub mod task;

pub use claim::{ClaimStatus, ResourceClaim};
pub use estimate::{ResourceEstimate, StationRequirement};
pub use group::ResourceGroup;
pub use resource::{Resource, ResourceType};
pub use task::{Task, TaskStatus};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Half-open time interval `[start, end)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    #[inline]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        TimeWindow { start, end }
    }

    #[inline]
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    #[inline]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    #[inline]
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::TimeWindow;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_window_overlap_is_half_open() {
        let t = |h| Utc.with_ymd_and_hms(2020, 1, 1, h, 0, 0).unwrap();
        let a = TimeWindow::new(t(1), t(2));
        let b = TimeWindow::new(t(2), t(3));
        let c = TimeWindow::new(t(1), t(3));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
        assert!(!a.contains(t(2)));
        assert!(a.contains(t(1)));
    }
}
