use crate::catalog::Catalog;
use crate::common::error::SchedulerError;
use crate::model::estimate::{ResourceEstimate, StationRequirement};
use crate::scheduler::AllocationRequest;
use crate::{Map, Set};

/// Expand the request's abstract station requirements into concrete
/// per-station estimates, appended to the plain estimates. Fails
/// without mutating anything when the requirements cannot be met.
pub(crate) fn expand_estimates(
    catalog: &Catalog,
    request: &AllocationRequest,
) -> crate::Result<Vec<ResourceEstimate>> {
    let mut estimates = request.estimates.clone();
    if request.station_requirements.is_empty() {
        return Ok(estimates);
    }
    let stations = select_stations(catalog, &request.station_requirements)?;
    log::debug!(
        "Task {}: selected stations {:?}",
        request.task_id,
        stations
    );
    for station in stations {
        for template in &request.station_estimates {
            let mut estimate = template.clone();
            estimate.root_resource_group = station.clone();
            estimate.station = Some(station.clone());
            estimates.push(estimate);
        }
    }
    Ok(estimates)
}

/// Can the requirements still be met if the given stations were
/// unavailable? Every requirement must keep at least `min_count`
/// members outside the excluded set.
pub fn requirements_satisfied_without(
    catalog: &Catalog,
    requirements: &[StationRequirement],
    excluded: &[String],
) -> crate::Result<bool> {
    for requirement in requirements {
        let members = catalog.member_stations(&requirement.group)?;
        let available = members
            .iter()
            .filter(|station| !excluded.contains(station))
            .count();
        if available < requirement.min_count as usize {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Greedily pick stations satisfying all requirements' minimum counts,
/// preferring the station that serves the most still-unsatisfied
/// requirements. Deterministic (name tiebreak), not globally optimal.
pub fn select_stations(
    catalog: &Catalog,
    requirements: &[StationRequirement],
) -> crate::Result<Vec<String>> {
    let mut members: Vec<Set<String>> = Vec::with_capacity(requirements.len());
    for requirement in requirements {
        members.push(
            catalog
                .member_stations(&requirement.group)?
                .into_iter()
                .collect(),
        );
    }
    let mut needed: Vec<u32> = requirements.iter().map(|r| r.min_count).collect();
    let mut selected: Vec<String> = Vec::new();
    let mut selected_set: Set<String> = Set::default();

    while needed.iter().any(|n| *n > 0) {
        // How many unsatisfied requirements would each candidate serve?
        let mut scores: Map<&String, usize> = Map::default();
        for (index, station_set) in members.iter().enumerate() {
            if needed[index] == 0 {
                continue;
            }
            for station in station_set {
                if !selected_set.contains(station) {
                    *scores.entry(station).or_default() += 1;
                }
            }
        }
        let best = scores
            .into_iter()
            .max_by(|(a_name, a_score), (b_name, b_score)| {
                a_score.cmp(b_score).then(b_name.cmp(a_name))
            })
            .map(|(name, _)| name.clone());
        let Some(station) = best else {
            return Err(SchedulerError::schedule_error(format!(
                "Station requirements cannot be satisfied: {requirements:?}"
            )));
        };
        for (index, station_set) in members.iter().enumerate() {
            if needed[index] > 0 && station_set.contains(&station) {
                needed[index] -= 1;
            }
        }
        selected_set.insert(station.clone());
        selected.push(station);
    }
    selected.sort();
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::{requirements_satisfied_without, select_stations};
    use crate::catalog::Catalog;
    use crate::model::estimate::StationRequirement;

    fn station_catalog() -> Catalog {
        let mut catalog = Catalog::default();
        let all = catalog.add_group("ALL");
        let core = catalog.add_group("CORE");
        let remote = catalog.add_group("REMOTE");
        catalog.add_group_child(all, core);
        catalog.add_group_child(all, remote);
        for name in ["CS001", "CS002", "CS003"] {
            let station = catalog.add_group(name);
            catalog.add_group_child(core, station);
        }
        for name in ["RS106", "RS205"] {
            let station = catalog.add_group(name);
            catalog.add_group_child(remote, station);
        }
        catalog
    }

    #[test]
    fn test_select_prefers_shared_stations() {
        let catalog = station_catalog();
        let requirements = vec![
            StationRequirement::new("CORE", 2),
            StationRequirement::new("ALL", 2),
        ];
        // Core stations serve both requirements, so two of them suffice
        let selected = select_stations(&catalog, &requirements).unwrap();
        assert_eq!(selected, vec!["CS001".to_string(), "CS002".to_string()]);
    }

    #[test]
    fn test_select_unsatisfiable() {
        let catalog = station_catalog();
        let requirements = vec![StationRequirement::new("REMOTE", 3)];
        assert!(select_stations(&catalog, &requirements).is_err());
        assert!(select_stations(&catalog, &[StationRequirement::new("NOPE", 1)]).is_err());
    }

    #[test]
    fn test_requirements_satisfied_without() {
        let catalog = station_catalog();
        let requirements = vec![
            StationRequirement::new("CORE", 3),
            StationRequirement::new("REMOTE", 1),
        ];
        assert!(requirements_satisfied_without(&catalog, &requirements, &[]).unwrap());
        assert!(
            !requirements_satisfied_without(&catalog, &requirements, &["CS002".to_string()])
                .unwrap()
        );
        assert!(
            requirements_satisfied_without(&catalog, &requirements, &["RS106".to_string()])
                .unwrap()
        );
    }

    #[test]
    fn test_specific_station_requirement() {
        let catalog = station_catalog();
        let selected =
            select_stations(&catalog, &[StationRequirement::new("CS002", 1)]).unwrap();
        assert_eq!(selected, vec!["CS002".to_string()]);
    }
}
