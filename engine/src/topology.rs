use crate::error::{self, Result};
use log::warn;
use model::{InstanceGroup, Role, Topology};
use snafu::ensure;

/// The node group's default size when `nodeCount` is not given.
const DEFAULT_NODE_COUNT: i32 = 2;

/// Draft instance groups with role, zones and size bounds populated. Machine type, image and
/// volume sizing are left unset for the defaults applier.
#[derive(Clone, Debug)]
pub struct TopologyPlan {
    pub instance_groups: Vec<InstanceGroup>,
    /// Non-fatal diagnostics, e.g. the even-zone-count master reduction.
    pub notes: Vec<String>,
}

/// Decide master and node placement.
///
/// Masters: one single-zone Master group per master zone. When `master_zones` is given it is
/// taken literally (and must be an odd-cardinality subset of the cluster zones — explicit
/// configuration is never silently rewritten). When derived, all cluster zones are used; an even
/// count greater than one is reduced to the largest odd subset with a warning note.
///
/// Nodes: one Node group named `nodes` spanning every cluster zone. With the private topology
/// and `bastion` requested, one single-instance Bastion group is added in the first zone.
pub fn synthesize(
    cluster_name: &str,
    zones: &[String],
    master_zones: Option<&[String]>,
    node_count: Option<i32>,
    topology: Topology,
    bastion: bool,
) -> Result<TopologyPlan> {
    ensure!(
        !zones.is_empty(),
        error::InvalidZoneSnafu {
            reason: "at least one zone is required"
        }
    );
    let mut notes = Vec::new();

    let selected: Vec<String> = match master_zones {
        Some(explicit) => {
            ensure!(
                !explicit.is_empty(),
                error::UnsupportedConfigurationSnafu {
                    reason: "masterZones may not be empty"
                }
            );
            for zone in explicit {
                ensure!(
                    zones.contains(zone),
                    error::UnsupportedConfigurationSnafu {
                        reason: format!(
                            "masterZones names '{}', which is not one of the cluster zones",
                            zone
                        )
                    }
                );
            }
            ensure!(
                explicit.len() % 2 == 1,
                error::UnsupportedConfigurationSnafu {
                    reason: format!(
                        "masterZones has {} zones; control-plane quorum requires an odd count",
                        explicit.len()
                    )
                }
            );
            let mut sorted = explicit.to_vec();
            sorted.sort();
            sorted
        }
        None => {
            let selected = largest_odd_prefix(zones);
            if selected.len() < zones.len() {
                let note = format!(
                    "an even zone count cannot form a control-plane quorum; placing masters in {} of {} zones (dropping '{}')",
                    selected.len(),
                    zones.len(),
                    zones[zones.len() - 1]
                );
                warn!("{}", note);
                notes.push(note);
            }
            selected.to_vec()
        }
    };

    let mut instance_groups = Vec::new();
    for zone in &selected {
        let mut master = InstanceGroup::new(cluster_name, format!("master-{}", zone), Role::Master);
        master.spec.zones = vec![zone.clone()];
        master.spec.min_size = Some(1);
        master.spec.max_size = Some(1);
        instance_groups.push(master);
    }

    let count = node_count.unwrap_or(DEFAULT_NODE_COUNT);
    ensure!(
        count >= 0,
        error::UnsupportedConfigurationSnafu {
            reason: format!("nodeCount may not be negative (got {})", count)
        }
    );
    let mut nodes = InstanceGroup::new(cluster_name, "nodes", Role::Node);
    nodes.spec.zones = zones.to_vec();
    nodes.spec.min_size = Some(count);
    nodes.spec.max_size = Some(count);
    instance_groups.push(nodes);

    if bastion {
        ensure!(
            topology == Topology::Private,
            error::UnsupportedConfigurationSnafu {
                reason: "a bastion requires the private topology"
            }
        );
        let mut group = InstanceGroup::new(cluster_name, "bastions", Role::Bastion);
        // One bastion in the first zone is enough; it only forwards SSH.
        group.spec.zones = vec![zones[0].clone()];
        group.spec.min_size = Some(1);
        group.spec.max_size = Some(1);
        instance_groups.push(group);
    }

    Ok(TopologyPlan {
        instance_groups,
        notes,
    })
}

/// The largest odd-length prefix of `zones`: the whole slice when its length is odd, otherwise
/// everything but the lexicographically-last zone (the slice is sorted, so "last" is
/// well-defined). This is the single place the even-count tie-break policy lives.
fn largest_odd_prefix(zones: &[String]) -> &[String] {
    if zones.len() % 2 == 1 || zones.is_empty() {
        zones
    } else {
        &zones[..zones.len() - 1]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use model::ObjectExt;

    const CLUSTER: &str = "minimal.example.com";

    fn zones(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_zone_yields_one_master_and_nodes() {
        let plan = synthesize(
            CLUSTER,
            &zones(&["us-test-1a"]),
            None,
            None,
            Topology::Public,
            false,
        )
        .unwrap();
        assert_eq!(plan.instance_groups.len(), 2);
        assert!(plan.notes.is_empty());
        let master = &plan.instance_groups[0];
        assert_eq!(master.object_name(), "master-us-test-1a");
        assert_eq!(master.spec.role, Role::Master);
        assert_eq!(master.spec.zones, vec!["us-test-1a"]);
        assert_eq!(master.spec.min_size, Some(1));
        assert_eq!(master.spec.max_size, Some(1));
        let nodes = &plan.instance_groups[1];
        assert_eq!(nodes.object_name(), "nodes");
        assert_eq!(nodes.spec.min_size, Some(2));
    }

    #[test]
    fn three_zones_yield_three_masters() {
        let plan = synthesize(
            CLUSTER,
            &zones(&["us-test-1a", "us-test-1b", "us-test-1c"]),
            None,
            None,
            Topology::Public,
            false,
        )
        .unwrap();
        assert_eq!(plan.instance_groups.len(), 4);
        assert!(plan.notes.is_empty());
        let master_zones: Vec<&str> = plan
            .instance_groups
            .iter()
            .filter(|ig| ig.spec.role == Role::Master)
            .flat_map(|ig| ig.spec.zones.iter().map(|z| z.as_str()))
            .collect();
        assert_eq!(master_zones, vec!["us-test-1a", "us-test-1b", "us-test-1c"]);
        let nodes = plan.instance_groups.last().unwrap();
        assert_eq!(nodes.spec.zones.len(), 3);
    }

    #[test]
    fn even_zone_count_drops_the_last_zone_with_a_note() {
        let plan = synthesize(
            CLUSTER,
            &zones(&["us-test-1a", "us-test-1b"]),
            None,
            None,
            Topology::Public,
            false,
        )
        .unwrap();
        let masters: Vec<&InstanceGroup> = plan
            .instance_groups
            .iter()
            .filter(|ig| ig.spec.role == Role::Master)
            .collect();
        assert_eq!(masters.len(), 1);
        assert_eq!(masters[0].spec.zones, vec!["us-test-1a"]);
        assert_eq!(plan.notes.len(), 1);
        assert!(plan.notes[0].contains("us-test-1b"));
        // Nodes still span both zones.
        let nodes = plan.instance_groups.last().unwrap();
        assert_eq!(nodes.spec.zones.len(), 2);
    }

    #[test]
    fn explicit_even_master_zones_are_an_error() {
        let err = synthesize(
            CLUSTER,
            &zones(&["us-test-1a", "us-test-1b"]),
            Some(&zones(&["us-test-1a", "us-test-1b"])),
            None,
            Topology::Public,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, crate::Error::UnsupportedConfiguration { .. }));
    }

    #[test]
    fn explicit_master_zones_must_be_cluster_zones() {
        let err = synthesize(
            CLUSTER,
            &zones(&["us-test-1a"]),
            Some(&zones(&["us-test-1d"])),
            None,
            Topology::Public,
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("us-test-1d"));
    }

    #[test]
    fn bastion_requires_private_topology() {
        let err = synthesize(
            CLUSTER,
            &zones(&["us-test-1a"]),
            None,
            None,
            Topology::Public,
            true,
        )
        .unwrap_err();
        assert!(matches!(err, crate::Error::UnsupportedConfiguration { .. }));

        let plan = synthesize(
            CLUSTER,
            &zones(&["us-test-1a"]),
            None,
            None,
            Topology::Private,
            true,
        )
        .unwrap();
        let bastion = plan.instance_groups.last().unwrap();
        assert_eq!(bastion.object_name(), "bastions");
        assert_eq!(bastion.spec.role, Role::Bastion);
        assert_eq!(bastion.spec.zones, vec!["us-test-1a"]);
    }

    #[test]
    fn node_count_is_configurable() {
        let plan = synthesize(
            CLUSTER,
            &zones(&["us-test-1a"]),
            None,
            Some(5),
            Topology::Public,
            false,
        )
        .unwrap();
        let nodes = plan.instance_groups.last().unwrap();
        assert_eq!(nodes.spec.min_size, Some(5));
        assert_eq!(nodes.spec.max_size, Some(5));
    }
}
