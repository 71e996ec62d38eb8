use crate::constants::{API_VERSION, KIND_INSTANCE_GROUP, LABEL_CLUSTER_NAME, LABEL_ROLE};
use crate::error::{self, Result};
use crate::metadata::{ObjectExt, ObjectMeta};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_plain::{derive_display_from_serialize, derive_fromstr_from_deserialize};
use snafu::ResultExt;
use std::collections::BTreeMap;

/// A named, homogeneous pool of machines sharing role, zone placement and sizing. Owned by a
/// [`crate::Cluster`], which is recorded in the `clusterup.io/cluster` label.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceGroup {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: InstanceGroupSpec,
}

impl InstanceGroup {
    /// A new, empty instance group labeled with its owning cluster and role.
    pub fn new<S1, S2>(cluster_name: S1, name: S2, role: Role) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        let mut labels = BTreeMap::new();
        labels.insert(LABEL_CLUSTER_NAME.to_string(), cluster_name.into());
        labels.insert(LABEL_ROLE.to_string(), role.to_string());
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND_INSTANCE_GROUP.to_string(),
            metadata: ObjectMeta {
                name: Some(name.into()),
                creation_timestamp: None,
                labels: Some(labels),
            },
            spec: InstanceGroupSpec {
                role,
                ..InstanceGroupSpec::default()
            },
        }
    }

    /// The name of the cluster that owns this group, from the `clusterup.io/cluster` label.
    pub fn cluster_name(&self) -> Option<&str> {
        self.label(LABEL_CLUSTER_NAME)
    }

    pub fn from_yaml(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s).context(error::YamlDeserializationSnafu {
            what: KIND_INSTANCE_GROUP.to_string(),
        })?)
    }
}

impl Default for InstanceGroup {
    fn default() -> Self {
        Self::new("", "", Role::Node)
    }
}

impl ObjectExt for InstanceGroup {
    fn object_meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn object_meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self).context(error::YamlSerializationSnafu {
            what: KIND_INSTANCE_GROUP.to_string(),
        })?)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceGroupSpec {
    #[serde(default)]
    pub role: Role,
    /// A non-empty subset of the owning cluster's zones. Master groups carry exactly one zone so
    /// that control-plane member identity stays stable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub zones: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_size: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Root volume size in GB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_volume_size: Option<i32>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, JsonSchema, PartialEq, Serialize)]
pub enum Role {
    Master,
    Node,
    Bastion,
}

impl Default for Role {
    fn default() -> Self {
        Role::Node
    }
}

derive_display_from_serialize!(Role);
derive_fromstr_from_deserialize!(Role);
