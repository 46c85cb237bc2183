use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ResourceId;

#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ResourceType {
    Bandwidth,
    Storage,
    Rcu,
    Rsp,
    ProcessingSlot,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResourceType::Bandwidth => write!(f, "bandwidth"),
            ResourceType::Storage => write!(f, "storage"),
            ResourceType::Rcu => write!(f, "rcu"),
            ResourceType::Rsp => write!(f, "rsp"),
            ResourceType::ProcessingSlot => write!(f, "processing_slot"),
        }
    }
}

/// A single claimable resource. Identity is immutable; capacity figures
/// are a snapshot fed from the monitoring side, not transactionally
/// owned by the scheduler.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    pub resource_type: ResourceType,
    pub total_capacity: u64,
}

impl Resource {
    pub fn new(
        id: ResourceId,
        name: impl Into<String>,
        resource_type: ResourceType,
        total_capacity: u64,
    ) -> Self {
        Resource {
            id,
            name: name.into(),
            resource_type,
            total_capacity,
        }
    }
}
