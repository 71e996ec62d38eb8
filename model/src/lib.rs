/*!

This library provides the clusterup API object model (`Cluster` and
`InstanceGroup`) and the registry clients used to persist and list those
objects.

!*/

#![deny(
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::panicking_unwrap,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]

pub use cluster::{Channel, Cluster, ClusterSpec, NetworkingMode, SubnetSpec, Topology};
pub use error::{Error, Result};
pub use instance_group::{InstanceGroup, InstanceGroupSpec, Role};
pub use metadata::{ObjectExt, ObjectMeta};

mod cluster;
pub mod clients;
pub mod constants;
mod error;
mod instance_group;
mod metadata;
