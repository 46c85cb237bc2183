use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::common::error::SchedulerError;
use crate::model::resource::ResourceType;

/// One record of the estimator's output: how much of which resource
/// types is needed, how many independent instances to claim, and where
/// to look for them. Produced by an external estimator; the scheduler
/// treats it as opaque input apart from validation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceEstimate {
    pub resource_types: SmallVec<[(ResourceType, u64); 2]>,
    pub resource_count: u32,
    pub root_resource_group: String,
    pub station: Option<String>,
}

impl ResourceEstimate {
    pub fn validate(&self) -> crate::Result<()> {
        if self.resource_count == 0 {
            return Err(SchedulerError::estimation_error(format!(
                "Estimate for group '{}' requests zero instances",
                self.root_resource_group
            )));
        }
        if self.resource_types.is_empty() {
            return Err(SchedulerError::estimation_error(format!(
                "Estimate for group '{}' requests no resource types",
                self.root_resource_group
            )));
        }
        for (rtype, quantity) in &self.resource_types {
            if *quantity == 0 {
                return Err(SchedulerError::estimation_error(format!(
                    "Estimate for group '{}' requests zero {}",
                    self.root_resource_group, rtype
                )));
            }
        }
        Ok(())
    }
}

/// An abstract station requirement: at least `min_count` stations out
/// of the named group ("ALL", "CORE", "REMOTE" or a concrete station).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StationRequirement {
    pub group: String,
    pub min_count: u32,
}

impl StationRequirement {
    pub fn new(group: impl Into<String>, min_count: u32) -> Self {
        StationRequirement {
            group: group.into(),
            min_count,
        }
    }
}
