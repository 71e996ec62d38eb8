use super::error::{self, Result};
use super::{same_content, Registry};
use crate::constants::{KIND_CLUSTER, KIND_INSTANCE_GROUP, LABEL_CLUSTER_NAME};
use crate::{Cluster, InstanceGroup, ObjectExt};
use chrono::{DateTime, Utc};
use log::trace;
use snafu::ensure;
use tokio::sync::Mutex;

/// An in-memory registry. Each instance is an isolated store scoped to the run that constructed
/// it; there is no process-wide state.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    inner: Mutex<Inner>,
    /// When set, newly stored objects are stamped with this fixed timestamp instead of the wall
    /// clock, for reproducible output.
    pinned_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Inner {
    clusters: Vec<Cluster>,
    instance_groups: Vec<InstanceGroup>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pinned_timestamp(timestamp: DateTime<Utc>) -> Self {
        Self {
            inner: Mutex::default(),
            pinned_timestamp: Some(timestamp),
        }
    }

    fn stamp<T: ObjectExt>(&self, object: &mut T) {
        if object.object_meta().creation_timestamp.is_none() {
            object.object_meta_mut().creation_timestamp =
                Some(self.pinned_timestamp.unwrap_or_else(Utc::now));
        }
    }
}

#[async_trait::async_trait]
impl Registry for MemoryRegistry {
    async fn upsert_cluster(&self, mut cluster: Cluster) -> Result<Cluster> {
        ensure!(
            cluster.metadata.name.is_some(),
            error::MissingNameSnafu { kind: KIND_CLUSTER }
        );
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner
            .clusters
            .iter()
            .find(|c| c.object_name() == cluster.object_name())
        {
            ensure!(
                same_content(existing, &cluster),
                error::ConflictSnafu {
                    kind: KIND_CLUSTER,
                    name: cluster.object_name()
                }
            );
            trace!("cluster '{}' unchanged, upsert is a no-op", cluster.object_name());
            return Ok(existing.clone());
        }
        self.stamp(&mut cluster);
        inner.clusters.push(cluster.clone());
        Ok(cluster)
    }

    async fn get_cluster(&self, name: &str) -> Result<Option<Cluster>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .clusters
            .iter()
            .find(|c| c.object_name() == name)
            .cloned())
    }

    async fn list_clusters(&self) -> Result<Vec<Cluster>> {
        let inner = self.inner.lock().await;
        Ok(inner.clusters.clone())
    }

    async fn upsert_instance_group(
        &self,
        mut instance_group: InstanceGroup,
    ) -> Result<InstanceGroup> {
        ensure!(
            instance_group.metadata.name.is_some(),
            error::MissingNameSnafu {
                kind: KIND_INSTANCE_GROUP
            }
        );
        let cluster_name = instance_group
            .cluster_name()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                error::MissingClusterLabelSnafu {
                    name: instance_group.object_name(),
                    label: LABEL_CLUSTER_NAME,
                }
                .build()
            })?;
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner.instance_groups.iter().find(|ig| {
            ig.object_name() == instance_group.object_name()
                && ig.cluster_name() == Some(cluster_name.as_str())
        }) {
            ensure!(
                same_content(existing, &instance_group),
                error::ConflictSnafu {
                    kind: KIND_INSTANCE_GROUP,
                    name: instance_group.object_name()
                }
            );
            return Ok(existing.clone());
        }
        self.stamp(&mut instance_group);
        inner.instance_groups.push(instance_group.clone());
        Ok(instance_group)
    }

    async fn get_instance_group(
        &self,
        cluster_name: &str,
        name: &str,
    ) -> Result<Option<InstanceGroup>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .instance_groups
            .iter()
            .find(|ig| ig.object_name() == name && ig.cluster_name() == Some(cluster_name))
            .cloned())
    }

    async fn list_instance_groups(&self, cluster_name: &str) -> Result<Vec<InstanceGroup>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .instance_groups
            .iter()
            .filter(|ig| ig.cluster_name() == Some(cluster_name))
            .cloned()
            .collect())
    }
}
