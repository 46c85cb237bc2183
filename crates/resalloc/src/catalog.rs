use crate::common::error::SchedulerError;
use crate::model::{Resource, ResourceGroup, ResourceType};
use crate::{GroupId, Map, ResourceId, Set};

/// Read-only-ish view of resources, their group memberships and their
/// capacities. Name/id mappings are owned here and passed by reference,
/// never cached globally.
#[derive(Default)]
pub struct Catalog {
    resources: Map<ResourceId, Resource>,
    groups: Map<GroupId, ResourceGroup>,
    resource_names: Map<String, ResourceId>,
    group_names: Map<String, GroupId>,

    /// Capacity already in use according to the monitoring subsystem.
    /// A snapshot; not owned transactionally by the scheduler.
    used_capacities: Map<ResourceId, u64>,

    resource_id_counter: u32,
    group_id_counter: u32,
}

impl Catalog {
    pub fn add_resource(
        &mut self,
        name: impl Into<String>,
        resource_type: ResourceType,
        total_capacity: u64,
    ) -> ResourceId {
        let name = name.into();
        self.resource_id_counter += 1;
        let id = ResourceId::new(self.resource_id_counter);
        assert!(
            self.resource_names.insert(name.clone(), id).is_none(),
            "Duplicate resource name {name}"
        );
        self.resources
            .insert(id, Resource::new(id, name, resource_type, total_capacity));
        id
    }

    pub fn add_group(&mut self, name: impl Into<String>) -> GroupId {
        let name = name.into();
        self.group_id_counter += 1;
        let id = GroupId::new(self.group_id_counter);
        assert!(
            self.group_names.insert(name.clone(), id).is_none(),
            "Duplicate group name {name}"
        );
        self.groups.insert(id, ResourceGroup::new(id, name));
        id
    }

    pub fn add_group_child(&mut self, parent: GroupId, child: GroupId) {
        self.groups
            .get_mut(&parent)
            .expect("Unknown parent group")
            .children
            .push(child);
    }

    pub fn add_group_resource(&mut self, group: GroupId, resource: ResourceId) {
        self.groups
            .get_mut(&group)
            .expect("Unknown group")
            .resources
            .push(resource);
    }

    #[inline]
    pub fn get_resource(&self, resource_id: ResourceId) -> &Resource {
        self.resources.get(&resource_id).unwrap_or_else(|| {
            panic!("Asking for invalid resource id={resource_id}");
        })
    }

    #[inline]
    pub fn find_resource_by_name(&self, name: &str) -> Option<&Resource> {
        self.resource_names.get(name).map(|id| &self.resources[id])
    }

    pub fn find_group(&self, name: &str) -> Option<&ResourceGroup> {
        self.group_names.get(name).map(|id| &self.groups[id])
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// All resources reachable from the named group, including those of
    /// nested subgroups. Unknown names are a schedule error, matching
    /// the behavior required for station expansion.
    pub fn expand_group_resources(&self, name: &str) -> crate::Result<Vec<ResourceId>> {
        let group = self.find_group(name).ok_or_else(|| {
            SchedulerError::schedule_error(format!("Unknown resource group '{name}'"))
        })?;
        let mut result = Vec::new();
        let mut seen = Set::default();
        self.collect_resources(group, &mut result, &mut seen);
        Ok(result)
    }

    fn collect_resources(
        &self,
        group: &ResourceGroup,
        result: &mut Vec<ResourceId>,
        seen: &mut Set<GroupId>,
    ) {
        if !seen.insert(group.id) {
            return;
        }
        result.extend(group.resources.iter().copied());
        for child in &group.children {
            self.collect_resources(&self.groups[child], result, seen);
        }
    }

    /// Names of the leaf groups (stations) under the named group. A
    /// group without subgroups is itself a station.
    pub fn member_stations(&self, name: &str) -> crate::Result<Vec<String>> {
        let group = self.find_group(name).ok_or_else(|| {
            SchedulerError::schedule_error(format!("Unknown station group '{name}'"))
        })?;
        let mut result = Vec::new();
        let mut seen = Set::default();
        self.collect_stations(group, &mut result, &mut seen);
        Ok(result)
    }

    fn collect_stations(
        &self,
        group: &ResourceGroup,
        result: &mut Vec<String>,
        seen: &mut Set<GroupId>,
    ) {
        if !seen.insert(group.id) {
            return;
        }
        if group.children.is_empty() {
            result.push(group.name.clone());
            return;
        }
        for child in &group.children {
            self.collect_stations(&self.groups[child], result, seen);
        }
    }

    /// Concrete claim targets: resources of the requested type inside
    /// the named group.
    pub fn resources_of_type_in(
        &self,
        name: &str,
        resource_type: ResourceType,
    ) -> crate::Result<Vec<ResourceId>> {
        Ok(self
            .expand_group_resources(name)?
            .into_iter()
            .filter(|id| self.resources[id].resource_type == resource_type)
            .collect())
    }

    pub fn set_used_capacity(&mut self, resource_id: ResourceId, used: u64) {
        self.used_capacities.insert(resource_id, used);
    }

    #[inline]
    pub fn used_capacity(&self, resource_id: ResourceId) -> u64 {
        self.used_capacities.get(&resource_id).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::Catalog;
    use crate::model::ResourceType;

    #[test]
    fn test_nested_group_expansion() {
        let mut catalog = Catalog::default();
        let all = catalog.add_group("ALL");
        let core = catalog.add_group("CORE");
        let cs001 = catalog.add_group("CS001");
        let cs002 = catalog.add_group("CS002");
        catalog.add_group_child(all, core);
        catalog.add_group_child(core, cs001);
        catalog.add_group_child(core, cs002);
        let bw1 = catalog.add_resource("CS001bw0", ResourceType::Bandwidth, 100);
        let bw2 = catalog.add_resource("CS002bw0", ResourceType::Bandwidth, 100);
        let rcu = catalog.add_resource("CS001rcu", ResourceType::Rcu, 96);
        catalog.add_group_resource(cs001, bw1);
        catalog.add_group_resource(cs001, rcu);
        catalog.add_group_resource(cs002, bw2);

        let mut resources = catalog.expand_group_resources("ALL").unwrap();
        resources.sort();
        assert_eq!(resources, vec![bw1, bw2, rcu]);

        let stations = catalog.member_stations("CORE").unwrap();
        assert_eq!(stations, vec!["CS001".to_string(), "CS002".to_string()]);
        assert_eq!(catalog.member_stations("CS001").unwrap(), vec!["CS001"]);

        let bws = catalog
            .resources_of_type_in("CORE", ResourceType::Bandwidth)
            .unwrap();
        assert_eq!(bws.len(), 2);

        assert!(catalog.expand_group_resources("NOPE").is_err());
    }
}
