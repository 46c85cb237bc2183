#[macro_use]
pub mod common;

pub mod assigner;
pub mod availability;
pub mod catalog;
pub mod core;
pub mod events;
pub mod model;
pub mod scheduler;
pub mod store;

#[cfg(test)]
mod tests;

pub use crate::common::WrappedRcRefCell;
pub use crate::common::ids::{ClaimId, GroupId, MomId, OtdbId, ResourceId, TaskId};
pub use crate::common::{Map, Set};

// Priority: Bigger number -> Higher priority
pub type Priority = i32;

/// Priority assumed for a task whose project has no entry in the
/// external priority lookup.
pub const DEFAULT_PRIORITY: Priority = 0;

pub type Error = common::error::SchedulerError;
pub type Result<T> = std::result::Result<T, Error>;
