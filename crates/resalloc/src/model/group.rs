use serde::{Deserialize, Serialize};

use crate::{GroupId, ResourceId};

/// A named set of resources, possibly nested (e.g. "CORE" contains the
/// core stations, each station contains its bandwidth/rcu resources).
/// Purely a lookup structure; a group has no capacity of its own beyond
/// the union of its members'.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub id: GroupId,
    pub name: String,
    pub children: Vec<GroupId>,
    pub resources: Vec<ResourceId>,
}

impl ResourceGroup {
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        ResourceGroup {
            id,
            name: name.into(),
            children: Vec::new(),
            resources: Vec::new(),
        }
    }
}
