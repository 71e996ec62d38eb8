/*!

Registry clients. The completion engine persists objects through the narrow [`Registry`]
contract; two implementations are provided, an in-memory store for tests and dry-runs and a
file-backed store keeping one YAML document per object.

!*/

mod error;
mod file;
mod memory;

pub use error::{Error, Result};
pub use file::FileRegistry;
pub use memory::MemoryRegistry;

use crate::{Cluster, InstanceGroup};

/// The persistence contract the engine depends on. `upsert` is idempotent keyed by name:
/// re-writing identical content is a no-op, while a name collision with *different* content is a
/// conflict error. `list` returns objects in insertion order. The first successful upsert stamps
/// the object's creation timestamp if the caller has not pinned one.
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    async fn upsert_cluster(&self, cluster: Cluster) -> Result<Cluster>;
    async fn get_cluster(&self, name: &str) -> Result<Option<Cluster>>;
    async fn list_clusters(&self) -> Result<Vec<Cluster>>;
    async fn upsert_instance_group(&self, instance_group: InstanceGroup) -> Result<InstanceGroup>;
    async fn get_instance_group(
        &self,
        cluster_name: &str,
        name: &str,
    ) -> Result<Option<InstanceGroup>>;
    async fn list_instance_groups(&self, cluster_name: &str) -> Result<Vec<InstanceGroup>>;
}

/// Two objects are the same stored content when everything except the creation timestamp is
/// equal. The timestamp is identity metadata stamped by the registry, not user content, so it is
/// excluded from conflict detection.
pub(crate) fn same_content<T>(existing: &T, incoming: &T) -> bool
where
    T: crate::ObjectExt + Clone + PartialEq,
{
    let mut a = existing.clone();
    let mut b = incoming.clone();
    a.object_meta_mut().creation_timestamp = None;
    b.object_meta_mut().creation_timestamp = None;
    a == b
}
