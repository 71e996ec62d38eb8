use anyhow::{Context, Result};
use clap::Parser;
use engine::dns::{HostedZone, StaticDnsProvider};
use engine::{ClusterOptions, Completer};
use log::warn;
use model::clients::Registry;
use model::{Channel, NetworkingMode, ObjectExt, Topology};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Complete a cluster specification from a few high-level options and store the resulting
/// objects in the registry. Nothing is written unless the whole object graph validates.
#[derive(Debug, Parser)]
pub(crate) struct CreateCluster {
    /// Name of the cluster, e.g. `minimal.example.com`. Overrides `clusterName` from the options
    /// file.
    #[clap(long)]
    name: Option<String>,

    /// Comma-separated list of zones, e.g. `us-test-1a,us-test-1b`.
    #[clap(long, use_value_delimiter = true)]
    zones: Vec<String>,

    /// Path to an options file with the full set of recognized keys.
    #[clap(long = "filename", short = 'f')]
    filename: Option<PathBuf>,

    /// Path to a YAML catalog of DNS hosted zones (entries with `name` and `id`). Without a
    /// catalog the hosted zone must be pinned with `hostedZoneId` in the options file.
    #[clap(long = "dns-catalog")]
    dns_catalog: Option<PathBuf>,

    /// The CIDR block for the cluster network.
    #[clap(long = "network-cidr")]
    network_cidr: Option<String>,

    /// Comma-separated zones for master placement; must have odd cardinality.
    #[clap(long = "master-zones", use_value_delimiter = true)]
    master_zones: Option<Vec<String>>,

    /// Number of nodes in the node instance group.
    #[clap(long = "node-count")]
    node_count: Option<i32>,

    /// Machine type for nodes.
    #[clap(long = "node-size")]
    node_size: Option<String>,

    /// Machine type for masters.
    #[clap(long = "master-size")]
    master_size: Option<String>,

    /// Machine image for all instance groups.
    #[clap(long)]
    image: Option<String>,

    #[clap(long = "kubernetes-version")]
    kubernetes_version: Option<String>,

    /// Networking mode [kubenet|calico|cilium].
    #[clap(long)]
    networking: Option<NetworkingMode>,

    /// Cluster topology [public|private].
    #[clap(long)]
    topology: Option<Topology>,

    /// Release channel [stable|alpha].
    #[clap(long)]
    channel: Option<Channel>,

    /// Also create a bastion instance group (private topology only).
    #[clap(long)]
    bastion: bool,

    /// Complete and print the objects without writing to the registry.
    #[clap(long = "dry-run")]
    dry_run: bool,

    /// Print the completed objects as a YAML stream.
    #[clap(long, short = 'o')]
    output: bool,
}

/// One entry of the `--dns-catalog` file.
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    name: String,
    id: String,
}

impl CreateCluster {
    pub(crate) async fn run<R: Registry>(self, registry: R, registry_path: &Path) -> Result<()> {
        let mut options = match &self.filename {
            Some(path) => {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .context(format!("Unable to read options file '{}'", path.display()))?;
                ClusterOptions::from_yaml(&raw)
                    .context(format!("Unable to parse options file '{}'", path.display()))?
            }
            None => ClusterOptions::default(),
        };
        self.merge_flags(&mut options);

        if options.config_base.is_none() {
            if let Some(name) = &options.cluster_name {
                options.config_base =
                    Some(registry_path.join(name).display().to_string());
            }
        }

        let provider = self.load_catalog().await?;
        let completed = Completer::new(provider)
            .complete(&options)
            .await
            .context("Cluster completion failed")?;

        for note in &completed.notes {
            warn!("{}", note);
        }

        if !self.dry_run {
            self.warn_on_network_overlap(&registry, &completed.cluster)
                .await?;
            registry
                .upsert_cluster(completed.cluster.clone())
                .await
                .context("Unable to store the cluster")?;
            for instance_group in &completed.instance_groups {
                registry
                    .upsert_instance_group(instance_group.clone())
                    .await
                    .context(format!(
                        "Unable to store instance group '{}'",
                        instance_group.object_name()
                    ))?;
            }
            println!(
                "Created cluster '{}' with {} instance group(s)",
                completed.cluster.object_name(),
                completed.instance_groups.len()
            );
        }

        if self.output || self.dry_run {
            print!("{}", completed.cluster.to_yaml()?);
            for instance_group in &completed.instance_groups {
                print!("{}", instance_group.to_yaml()?);
            }
        }
        Ok(())
    }

    /// Command line flags win over the options file.
    fn merge_flags(&self, options: &mut ClusterOptions) {
        if self.name.is_some() {
            options.cluster_name = self.name.clone();
        }
        if !self.zones.is_empty() {
            options.zones = self.zones.clone();
        }
        if self.network_cidr.is_some() {
            options.network_cidr = self.network_cidr.clone();
        }
        if self.master_zones.is_some() {
            options.master_zones = self.master_zones.clone();
        }
        if self.node_count.is_some() {
            options.node_count = self.node_count;
        }
        if self.node_size.is_some() {
            options.node_size = self.node_size.clone();
        }
        if self.master_size.is_some() {
            options.master_size = self.master_size.clone();
        }
        if self.image.is_some() {
            options.image = self.image.clone();
        }
        if self.kubernetes_version.is_some() {
            options.kubernetes_version = self.kubernetes_version.clone();
        }
        if self.networking.is_some() {
            options.networking = self.networking;
        }
        if self.topology.is_some() {
            options.topology = self.topology;
        }
        if self.channel.is_some() {
            options.channel = self.channel;
        }
        if self.bastion {
            options.bastion = Some(true);
        }
    }

    /// Other clusters in the same registry may legitimately share address space, but it is
    /// usually a mistake, so call it out before writing anything.
    async fn warn_on_network_overlap<R: Registry>(
        &self,
        registry: &R,
        cluster: &model::Cluster,
    ) -> Result<()> {
        let network = match cluster.spec.network_cidr.as_deref() {
            Some(network) => network,
            None => return Ok(()),
        };
        for sibling in registry
            .list_clusters()
            .await
            .context("Unable to list clusters")?
        {
            if sibling.object_name() == cluster.object_name() {
                continue;
            }
            if let Some(sibling_network) = sibling.spec.network_cidr.as_deref() {
                if engine::network::cidrs_overlap(network, sibling_network) == Some(true) {
                    warn!(
                        "network {} overlaps {} used by cluster '{}'",
                        network,
                        sibling_network,
                        sibling.object_name()
                    );
                }
            }
        }
        Ok(())
    }

    async fn load_catalog(&self) -> Result<StaticDnsProvider> {
        let entries = match &self.dns_catalog {
            None => Vec::new(),
            Some(path) => {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .context(format!("Unable to read DNS catalog '{}'", path.display()))?;
                let entries: Vec<CatalogEntry> = serde_yaml::from_str(&raw)
                    .context(format!("Unable to parse DNS catalog '{}'", path.display()))?;
                entries
            }
        };
        Ok(StaticDnsProvider::new(
            entries
                .into_iter()
                .map(|entry| HostedZone::new(entry.name, entry.id))
                .collect(),
        ))
    }
}
