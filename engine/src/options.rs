use crate::error::{self, Result};
use model::{Channel, NetworkingMode, Topology};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

/// The user-authored, partial cluster description. Everything here is optional except the
/// cluster name and zone list, which the orchestrator checks up front; all other fields are
/// filled by the pipeline. Unrecognized keys in an options document are a hard error so that
/// typos are caught early rather than silently ignored.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase", default)]
pub struct ClusterOptions {
    pub cluster_name: Option<String>,
    /// Zone identifiers, e.g. `us-test-1a`. All zones must belong to one region.
    pub zones: Vec<String>,
    /// The domain for cluster service records. Defaults to the cluster name.
    pub dns_name: Option<String>,
    /// Pins the hosted zone id, skipping the DNS provider lookup entirely.
    pub hosted_zone_id: Option<String>,
    pub network_cidr: Option<String>,
    /// Explicit master zone placement. Must be a subset of `zones` with odd cardinality; when
    /// absent, placement is derived (one master per zone, reduced to an odd count if needed).
    pub master_zones: Option<Vec<String>>,
    pub master_size: Option<String>,
    pub node_size: Option<String>,
    pub node_count: Option<i32>,
    pub image: Option<String>,
    pub kubernetes_version: Option<String>,
    pub networking: Option<NetworkingMode>,
    pub channel: Option<Channel>,
    pub topology: Option<Topology>,
    /// Create a bastion instance group. Only meaningful with the private topology.
    pub bastion: Option<bool>,
    pub ssh_access: Option<Vec<String>>,
    /// CIDRs allowed to reach the Kubernetes API.
    pub admin_access: Option<Vec<String>>,
    /// The registry location recorded on the cluster as `configBase`.
    pub config_base: Option<String>,
}

impl ClusterOptions {
    /// Parse an options document, typically the contents of an `options.yaml` file.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).context(error::OptionsYamlSnafu)
    }
}
