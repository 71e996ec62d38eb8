use crate::constants::{API_VERSION, KIND_CLUSTER};
use crate::error::{self, Result};
use crate::metadata::{ObjectExt, ObjectMeta};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_plain::{derive_display_from_serialize, derive_fromstr_from_deserialize};
use snafu::ResultExt;

/// The top-level desired-state object for one cluster. The completion engine constructs these
/// fresh on every run; once completed they are never mutated in place.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ClusterSpec,
}

impl Cluster {
    /// A new, empty cluster object with only its name set.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND_CLUSTER.to_string(),
            metadata: ObjectMeta {
                name: Some(name.into()),
                ..ObjectMeta::default()
            },
            spec: ClusterSpec::default(),
        }
    }

    pub fn from_yaml(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s).context(error::YamlDeserializationSnafu {
            what: KIND_CLUSTER.to_string(),
        })?)
    }
}

impl Default for Cluster {
    fn default() -> Self {
        Self::new("")
    }
}

impl ObjectExt for Cluster {
    fn object_meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn object_meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self).context(error::YamlSerializationSnafu {
            what: KIND_CLUSTER.to_string(),
        })?)
    }
}

/// The specification half of a [`Cluster`]. Every `Option` field is filled by the completion
/// engine; `None` fields are elided from the serialized document.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// The release channel that supplies version pins and image defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    /// The registry location where this cluster's configuration is stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_base: Option<String>,
    /// The domain under which the cluster's service records are created. Derived from the
    /// cluster name unless overridden.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
    /// The id of the DNS provider hosted zone that owns `dns_name`. Resolved by longest-suffix
    /// match against the provider catalog, unless explicitly pinned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosted_zone_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,
    /// The DNS name of the API server endpoint, e.g. `api.<dns_name>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_public_name: Option<String>,
    /// The cluster-wide address block. Subnets are carved from this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_cidr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub networking: Option<NetworkingMode>,
    /// The range used for pod and service addresses, which is never NAT'd by the nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_masquerade_cidr: Option<String>,
    /// The cloud region every zone belongs to. Derived from the zone list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_access: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubernetes_api_access: Option<Vec<String>>,
    /// One subnet per zone, disjoint and contained within `network_cidr`, in zone-sorted order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<SubnetSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topology: Option<Topology>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub zones: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpec {
    pub zone: String,
    pub cidr: String,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Stable,
    Alpha,
}

impl Default for Channel {
    fn default() -> Self {
        Channel::Stable
    }
}

derive_display_from_serialize!(Channel);
derive_fromstr_from_deserialize!(Channel);

#[derive(Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkingMode {
    Kubenet,
    Calico,
    Cilium,
}

impl Default for NetworkingMode {
    fn default() -> Self {
        NetworkingMode::Kubenet
    }
}

derive_display_from_serialize!(NetworkingMode);
derive_fromstr_from_deserialize!(NetworkingMode);

#[derive(Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    Public,
    Private,
}

impl Default for Topology {
    fn default() -> Self {
        Topology::Public
    }
}

derive_display_from_serialize!(Topology);
derive_fromstr_from_deserialize!(Topology);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn yaml_elides_unset_fields() {
        let cluster = Cluster::new("minimal.example.com");
        let yaml = cluster.to_yaml().unwrap();
        assert!(yaml.contains("kind: Cluster"));
        assert!(yaml.contains("name: minimal.example.com"));
        assert!(!yaml.contains("creationTimestamp"));
        assert!(!yaml.contains("networkCidr"));
    }

    #[test]
    fn yaml_round_trip() {
        let mut cluster = Cluster::new("minimal.example.com");
        cluster.spec.zones = vec!["us-test-1a".to_string()];
        cluster.spec.network_cidr = Some("172.20.0.0/16".to_string());
        cluster.spec.subnets = vec![SubnetSpec {
            zone: "us-test-1a".to_string(),
            cidr: "172.20.0.0/19".to_string(),
        }];
        cluster.spec.networking = Some(NetworkingMode::Kubenet);
        let yaml = cluster.to_yaml().unwrap();
        let parsed = Cluster::from_yaml(&yaml).unwrap();
        assert_eq!(cluster, parsed);
    }

    #[test]
    fn enum_string_forms() {
        assert_eq!(NetworkingMode::Kubenet.to_string(), "kubenet");
        assert_eq!("calico".parse::<NetworkingMode>().unwrap(), NetworkingMode::Calico);
        assert_eq!(Topology::Public.to_string(), "public");
        assert_eq!(Channel::Stable.to_string(), "stable");
    }
}
