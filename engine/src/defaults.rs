use crate::error::{self, Result};
use model::{Channel, Cluster, InstanceGroup, NetworkingMode, Role, Topology};
use snafu::OptionExt;

/// The kubernetes version pinned by table V1 when the user does not request one.
pub const DEFAULT_KUBERNETES_VERSION: &str = "1.24.0";

/// The pod/service range that is never NAT'd by nodes.
pub const DEFAULT_NON_MASQUERADE_CIDR: &str = "100.64.0.0/10";

/// Unrestricted access, the table V1 default for SSH and the API endpoint.
pub const DEFAULT_ACCESS_CIDR: &str = "0.0.0.0/0";

const DEFAULT_IMAGE: &str = "kope.io/k8s-1.24-debian-11-amd64";

/// Per-role machine sizing defaults.
#[derive(Clone, Copy, Debug)]
struct RoleDefaults {
    machine_type: &'static str,
    root_volume_size: i32,
}

/// A declarative table of (role, field) → default value. The table is versioned so that changing
/// a default is a new table, never a silent change to completed clusters.
///
/// Applying the table fills only unset fields and is idempotent: applying it twice never changes
/// a once-completed object.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DefaultsTable {
    V1,
}

impl DefaultsTable {
    /// The table used for new completions.
    pub fn current() -> Self {
        DefaultsTable::V1
    }

    fn role_entries(&self) -> &'static [(Role, RoleDefaults)] {
        match self {
            DefaultsTable::V1 => &[
                (
                    Role::Master,
                    RoleDefaults {
                        machine_type: "m3.medium",
                        root_volume_size: 64,
                    },
                ),
                (
                    Role::Node,
                    RoleDefaults {
                        machine_type: "t2.medium",
                        root_volume_size: 128,
                    },
                ),
                (
                    Role::Bastion,
                    RoleDefaults {
                        machine_type: "t2.micro",
                        root_volume_size: 32,
                    },
                ),
            ],
        }
    }

    /// Fill every unset scalar on the cluster spec.
    pub fn apply_cluster(&self, cluster: &mut Cluster) -> Result<()> {
        let spec = &mut cluster.spec;
        if spec.channel.is_none() {
            spec.channel = Some(Channel::Stable);
        }
        if spec.networking.is_none() {
            spec.networking = Some(NetworkingMode::Kubenet);
        }
        if spec.topology.is_none() {
            spec.topology = Some(Topology::Public);
        }
        if spec.kubernetes_version.is_none() {
            spec.kubernetes_version = Some(DEFAULT_KUBERNETES_VERSION.to_string());
        }
        if spec.non_masquerade_cidr.is_none() {
            spec.non_masquerade_cidr = Some(DEFAULT_NON_MASQUERADE_CIDR.to_string());
        }
        if spec.ssh_access.is_none() {
            spec.ssh_access = Some(vec![DEFAULT_ACCESS_CIDR.to_string()]);
        }
        if spec.kubernetes_api_access.is_none() {
            spec.kubernetes_api_access = Some(vec![DEFAULT_ACCESS_CIDR.to_string()]);
        }
        if spec.master_public_name.is_none() {
            if let Some(dns_name) = &spec.dns_name {
                spec.master_public_name = Some(format!("api.{}", dns_name));
            }
        }
        Ok(())
    }

    /// Fill every unset sizing field on an instance group, per its role.
    pub fn apply_instance_group(&self, instance_group: &mut InstanceGroup) -> Result<()> {
        let role = instance_group.spec.role;
        let defaults = self
            .role_entries()
            .iter()
            .find(|(entry_role, _)| *entry_role == role)
            .map(|(_, defaults)| *defaults)
            .context(error::UnsupportedConfigurationSnafu {
                reason: format!("defaults table V1 has no entry for role '{}'", role),
            })?;
        let spec = &mut instance_group.spec;
        if spec.machine_type.is_none() {
            spec.machine_type = Some(defaults.machine_type.to_string());
        }
        if spec.root_volume_size.is_none() {
            spec.root_volume_size = Some(defaults.root_volume_size);
        }
        if spec.image.is_none() {
            spec.image = Some(DEFAULT_IMAGE.to_string());
        }
        if spec.min_size.is_none() {
            spec.min_size = Some(1);
        }
        if spec.max_size.is_none() {
            spec.max_size = spec.min_size;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fills_unset_cluster_fields() {
        let mut cluster = Cluster::new("minimal.example.com");
        cluster.spec.dns_name = Some("minimal.example.com".to_string());
        DefaultsTable::current().apply_cluster(&mut cluster).unwrap();
        assert_eq!(cluster.spec.channel, Some(Channel::Stable));
        assert_eq!(cluster.spec.networking, Some(NetworkingMode::Kubenet));
        assert_eq!(cluster.spec.topology, Some(Topology::Public));
        assert_eq!(
            cluster.spec.kubernetes_version.as_deref(),
            Some(DEFAULT_KUBERNETES_VERSION)
        );
        assert_eq!(
            cluster.spec.master_public_name.as_deref(),
            Some("api.minimal.example.com")
        );
    }

    #[test]
    fn never_overwrites_user_set_fields() {
        let mut cluster = Cluster::new("minimal.example.com");
        cluster.spec.networking = Some(NetworkingMode::Calico);
        cluster.spec.kubernetes_version = Some("1.23.9".to_string());
        DefaultsTable::current().apply_cluster(&mut cluster).unwrap();
        assert_eq!(cluster.spec.networking, Some(NetworkingMode::Calico));
        assert_eq!(cluster.spec.kubernetes_version.as_deref(), Some("1.23.9"));
    }

    #[test]
    fn applying_twice_changes_nothing() {
        let mut cluster = Cluster::new("minimal.example.com");
        cluster.spec.dns_name = Some("minimal.example.com".to_string());
        let mut ig = InstanceGroup::new("minimal.example.com", "nodes", Role::Node);
        let table = DefaultsTable::current();
        table.apply_cluster(&mut cluster).unwrap();
        table.apply_instance_group(&mut ig).unwrap();
        let cluster_once = cluster.clone();
        let ig_once = ig.clone();
        table.apply_cluster(&mut cluster).unwrap();
        table.apply_instance_group(&mut ig).unwrap();
        assert_eq!(cluster, cluster_once);
        assert_eq!(ig, ig_once);
    }

    #[test]
    fn role_sizing_differs() {
        let table = DefaultsTable::current();
        let mut master = InstanceGroup::new("c.example.com", "master-a", Role::Master);
        let mut node = InstanceGroup::new("c.example.com", "nodes", Role::Node);
        let mut bastion = InstanceGroup::new("c.example.com", "bastions", Role::Bastion);
        table.apply_instance_group(&mut master).unwrap();
        table.apply_instance_group(&mut node).unwrap();
        table.apply_instance_group(&mut bastion).unwrap();
        assert_eq!(master.spec.machine_type.as_deref(), Some("m3.medium"));
        assert_eq!(node.spec.machine_type.as_deref(), Some("t2.medium"));
        assert_eq!(bastion.spec.machine_type.as_deref(), Some("t2.micro"));
        assert_eq!(master.spec.root_volume_size, Some(64));
        assert_eq!(node.spec.root_volume_size, Some(128));
    }
}
