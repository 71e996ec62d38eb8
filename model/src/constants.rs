/// Helper macro to avoid retyping the base domain-like name of our system when creating further
/// string constants from it. When given no parameters, this returns the base domain-like name of
/// the system. When given a string literal parameter it adds `/parameter` to the end.
macro_rules! clusterup {
    () => {
        "clusterup.io"
    };
    ($s:literal) => {
        concat!(clusterup!(), "/", $s)
    };
}

// System identifiers
pub const API_VERSION: &str = clusterup!("v1");
pub const CLUSTERUP: &str = clusterup!();

// Object kinds
pub const KIND_CLUSTER: &str = "Cluster";
pub const KIND_INSTANCE_GROUP: &str = "InstanceGroup";

// Label keys
pub const LABEL_CLUSTER_NAME: &str = clusterup!("cluster");
pub const LABEL_ROLE: &str = clusterup!("role");

// Registry layout
pub const CLUSTER_FILE: &str = "cluster.yaml";
pub const INSTANCE_GROUP_DIR: &str = "instancegroup";
