use super::error::{self, Result};
use super::{same_content, Registry};
use crate::constants::{
    CLUSTER_FILE, INSTANCE_GROUP_DIR, KIND_CLUSTER, KIND_INSTANCE_GROUP, LABEL_CLUSTER_NAME,
};
use crate::{Cluster, InstanceGroup, ObjectExt};
use chrono::{DateTime, Utc};
use log::debug;
use snafu::{ensure, ResultExt};
use std::path::{Path, PathBuf};
use tokio::fs;

/// A file-backed registry keeping one YAML document per object:
///
/// ```text
/// <base>/<cluster-name>/cluster.yaml
/// <base>/<cluster-name>/instancegroup/<group-name>.yaml
/// ```
///
/// Listing returns creation order (oldest first, by the `creationTimestamp` stamped at first
/// persistence), with ties broken by name so listings are deterministic.
#[derive(Debug)]
pub struct FileRegistry {
    base: PathBuf,
    pinned_timestamp: Option<DateTime<Utc>>,
}

impl FileRegistry {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base: base.into(),
            pinned_timestamp: None,
        }
    }

    pub fn with_pinned_timestamp<P: Into<PathBuf>>(base: P, timestamp: DateTime<Utc>) -> Self {
        Self {
            base: base.into(),
            pinned_timestamp: Some(timestamp),
        }
    }

    fn cluster_dir(&self, cluster_name: &str) -> PathBuf {
        self.base.join(cluster_name)
    }

    fn cluster_path(&self, cluster_name: &str) -> PathBuf {
        self.cluster_dir(cluster_name).join(CLUSTER_FILE)
    }

    fn instance_group_path(&self, cluster_name: &str, name: &str) -> PathBuf {
        self.cluster_dir(cluster_name)
            .join(INSTANCE_GROUP_DIR)
            .join(format!("{}.yaml", name))
    }

    fn stamp<T: ObjectExt>(&self, object: &mut T) {
        if object.object_meta().creation_timestamp.is_none() {
            object.object_meta_mut().creation_timestamp =
                Some(self.pinned_timestamp.unwrap_or_else(Utc::now));
        }
    }

    async fn read_yaml(path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Ok(Err(e).context(error::IoSnafu {
                operation: "read",
                path,
            })?),
        }
    }

    async fn write_yaml(path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.context(error::IoSnafu {
                operation: "create directory",
                path: parent,
            })?;
        }
        Ok(fs::write(path, contents).await.context(error::IoSnafu {
            operation: "write",
            path,
        })?)
    }

    /// Name-sorted entries of `dir`, or empty when the directory does not exist yet. Each entry
    /// carries whether it is a directory so callers can skip strays of the wrong kind.
    async fn sorted_entries(dir: &Path) -> Result<Vec<(PathBuf, bool)>> {
        let mut read_dir = match fs::read_dir(dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Ok(Err(e).context(error::IoSnafu {
                    operation: "read directory",
                    path: dir,
                })?)
            }
        };
        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.context(error::IoSnafu {
            operation: "read directory",
            path: dir,
        })? {
            let is_dir = entry
                .file_type()
                .await
                .context(error::IoSnafu {
                    operation: "read directory",
                    path: dir,
                })?
                .is_dir();
            entries.push((entry.path(), is_dir));
        }
        entries.sort();
        Ok(entries)
    }
}

#[async_trait::async_trait]
impl Registry for FileRegistry {
    async fn upsert_cluster(&self, mut cluster: Cluster) -> Result<Cluster> {
        ensure!(
            cluster.metadata.name.is_some(),
            error::MissingNameSnafu { kind: KIND_CLUSTER }
        );
        let path = self.cluster_path(cluster.object_name());
        if let Some(contents) = Self::read_yaml(&path).await? {
            let existing = Cluster::from_yaml(&contents)?;
            ensure!(
                same_content(&existing, &cluster),
                error::ConflictSnafu {
                    kind: KIND_CLUSTER,
                    name: cluster.object_name()
                }
            );
            return Ok(existing);
        }
        self.stamp(&mut cluster);
        Self::write_yaml(&path, &cluster.to_yaml()?).await?;
        debug!("stored cluster '{}' at {}", cluster.object_name(), path.display());
        Ok(cluster)
    }

    async fn get_cluster(&self, name: &str) -> Result<Option<Cluster>> {
        match Self::read_yaml(&self.cluster_path(name)).await? {
            Some(contents) => Ok(Some(Cluster::from_yaml(&contents)?)),
            None => Ok(None),
        }
    }

    async fn list_clusters(&self) -> Result<Vec<Cluster>> {
        let mut clusters = Vec::new();
        for (dir, is_dir) in Self::sorted_entries(&self.base).await? {
            if !is_dir {
                continue;
            }
            if let Some(contents) = Self::read_yaml(&dir.join(CLUSTER_FILE)).await? {
                clusters.push(Cluster::from_yaml(&contents)?);
            }
        }
        clusters.sort_by_key(|cluster| {
            (
                cluster.metadata.creation_timestamp,
                cluster.object_name().to_string(),
            )
        });
        Ok(clusters)
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
        let path = self.instance_group_path(&cluster_name, instance_group.object_name());
        if let Some(contents) = Self::read_yaml(&path).await? {
            let existing = InstanceGroup::from_yaml(&contents)?;
            ensure!(
                same_content(&existing, &instance_group),
                error::ConflictSnafu {
                    kind: KIND_INSTANCE_GROUP,
                    name: instance_group.object_name()
                }
            );
            return Ok(existing);
        }
        self.stamp(&mut instance_group);
        Self::write_yaml(&path, &instance_group.to_yaml()?).await?;
        Ok(instance_group)
    }

    async fn get_instance_group(
        &self,
        cluster_name: &str,
        name: &str,
    ) -> Result<Option<InstanceGroup>> {
        match Self::read_yaml(&self.instance_group_path(cluster_name, name)).await? {
            Some(contents) => Ok(Some(InstanceGroup::from_yaml(&contents)?)),
            None => Ok(None),
        }
    }

    async fn list_instance_groups(&self, cluster_name: &str) -> Result<Vec<InstanceGroup>> {
        let dir = self.cluster_dir(cluster_name).join(INSTANCE_GROUP_DIR);
        let mut groups = Vec::new();
        for (path, is_dir) in Self::sorted_entries(&dir).await? {
            if is_dir {
                continue;
            }
            if let Some(contents) = Self::read_yaml(&path).await? {
                groups.push(InstanceGroup::from_yaml(&contents)?);
            }
        }
        groups.sort_by_key(|group| {
            (
                group.metadata.creation_timestamp,
                group.object_name().to_string(),
            )
        });
        Ok(groups)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Role;
    use chrono::TimeZone;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "clusterup-file-registry-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[tokio::test]
    async fn round_trip_and_layout() {
        let base = scratch_dir("round-trip");
        let registry = FileRegistry::with_pinned_timestamp(
            &base,
            Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap(),
        );
        let mut cluster = Cluster::new("minimal.example.com");
        cluster.spec.zones = vec!["us-test-1a".to_string()];
        let stored = registry.upsert_cluster(cluster).await.unwrap();
        assert!(stored.metadata.creation_timestamp.is_some());
        assert!(base.join("minimal.example.com").join("cluster.yaml").is_file());

        let ig = InstanceGroup::new("minimal.example.com", "nodes", Role::Node);
        registry.upsert_instance_group(ig).await.unwrap();
        assert!(base
            .join("minimal.example.com")
            .join("instancegroup")
            .join("nodes.yaml")
            .is_file());

        let listed = registry.list_instance_groups("minimal.example.com").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].object_name(), "nodes");

        let fetched = registry.get_cluster("minimal.example.com").await.unwrap();
        assert_eq!(fetched, Some(stored));
        let _ = std::fs::remove_dir_all(&base);
    }

    #[tokio::test]
    async fn conflict_on_changed_content() {
        let base = scratch_dir("conflict");
        let registry = FileRegistry::new(&base);
        let cluster = Cluster::new("minimal.example.com");
        registry.upsert_cluster(cluster.clone()).await.unwrap();
        let mut changed = cluster;
        changed.spec.region = Some("us-test-1".to_string());
        let err = registry.upsert_cluster(changed).await.unwrap_err();
        assert!(err.is_conflict());
        let _ = std::fs::remove_dir_all(&base);
    }

    #[tokio::test]
    async fn list_returns_creation_order() {
        let base = scratch_dir("creation-order");
        let registry = FileRegistry::new(&base);
        let mut first = Cluster::new("b.example.com");
        first.metadata.creation_timestamp =
            Some(Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap());
        let mut second = Cluster::new("a.example.com");
        second.metadata.creation_timestamp =
            Some(Utc.with_ymd_and_hms(2017, 1, 2, 0, 0, 0).unwrap());
        registry.upsert_cluster(first).await.unwrap();
        registry.upsert_cluster(second).await.unwrap();

        let names: Vec<String> = registry
            .list_clusters()
            .await
            .unwrap()
            .iter()
            .map(|cluster| cluster.object_name().to_string())
            .collect();
        assert_eq!(names, vec!["b.example.com", "a.example.com"]);
        let _ = std::fs::remove_dir_all(&base);
    }

    #[tokio::test]
    async fn stray_file_in_base_is_ignored() {
        let base = scratch_dir("stray-file");
        let registry = FileRegistry::new(&base);
        registry
            .upsert_cluster(Cluster::new("minimal.example.com"))
            .await
            .unwrap();
        std::fs::write(base.join("README"), "not a registry object").unwrap();

        let listed = registry.list_clusters().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].object_name(), "minimal.example.com");
        let _ = std::fs::remove_dir_all(&base);
    }

    #[tokio::test]
    async fn listing_empty_registry_is_empty() {
        let registry = FileRegistry::new(scratch_dir("empty"));
        assert!(registry.list_clusters().await.unwrap().is_empty());
        assert!(registry
            .list_instance_groups("nope.example.com")
            .await
            .unwrap()
            .is_empty());
    }
}
