/*!

The clusterup completion engine: a deterministic, one-shot transformation from a minimal,
user-authored cluster description to a fully specified, internally consistent set of objects — a
`Cluster` and its `InstanceGroup`s — ready to hand to a provisioning backend.

The pipeline runs in a fixed order, each stage consuming the prior stage's validated output:

zone resolution → DNS hosted-zone matching → network planning → topology synthesis → defaults →
validation. The engine performs no persistence; completed objects are handed to a
`model::clients::Registry` by the caller only after validation succeeds.

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

pub use completion::{CompletedCluster, Completer};
pub use error::{Error, Result};
pub use options::ClusterOptions;

mod completion;
pub mod defaults;
pub mod dns;
mod error;
mod options;
pub mod network;
pub mod topology;
pub mod zones;
