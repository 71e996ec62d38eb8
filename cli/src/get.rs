use anyhow::{Context, Result};
use clap::Parser;
use model::clients::Registry;
use model::{Cluster, InstanceGroup, ObjectExt};
use std::str::FromStr;
use tabled::{Table, Tabled};

/// List objects from the registry.
#[derive(Debug, Parser)]
pub(crate) struct Get {
    #[clap(subcommand)]
    target: GetTarget,
}

#[derive(Debug, Parser)]
enum GetTarget {
    /// List all clusters.
    Clusters {
        /// Output format [table|yaml].
        #[clap(long, short = 'o', default_value = "table")]
        output: OutputFormat,
    },
    /// List the instance groups of one cluster.
    InstanceGroups {
        /// The name of the cluster whose instance groups should be listed.
        cluster_name: String,
        /// Output format [table|yaml].
        #[clap(long, short = 'o', default_value = "table")]
        output: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug)]
enum OutputFormat {
    Table,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "table" => Ok(OutputFormat::Table),
            "yaml" => Ok(OutputFormat::Yaml),
            other => Err(anyhow::anyhow!(
                "unknown output format '{}', expected 'table' or 'yaml'",
                other
            )),
        }
    }
}

#[derive(Tabled)]
struct ClusterRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "REGION")]
    region: String,
    #[tabled(rename = "ZONES")]
    zones: usize,
    #[tabled(rename = "NETWORK")]
    network: String,
}

#[derive(Tabled)]
struct InstanceGroupRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "ROLE")]
    role: String,
    #[tabled(rename = "MACHINETYPE")]
    machine_type: String,
    #[tabled(rename = "MIN")]
    min: String,
    #[tabled(rename = "MAX")]
    max: String,
    #[tabled(rename = "ZONES")]
    zones: String,
}

impl Get {
    pub(crate) async fn run<R: Registry>(self, registry: R) -> Result<()> {
        match self.target {
            GetTarget::Clusters { output } => {
                let clusters = registry
                    .list_clusters()
                    .await
                    .context("Unable to list clusters")?;
                match output {
                    OutputFormat::Yaml => print_yaml_stream(&clusters)?,
                    OutputFormat::Table => {
                        let rows: Vec<ClusterRow> = clusters.iter().map(ClusterRow::from).collect();
                        println!("{}", Table::new(rows));
                    }
                }
            }
            GetTarget::InstanceGroups {
                cluster_name,
                output,
            } => {
                let instance_groups = registry
                    .list_instance_groups(&cluster_name)
                    .await
                    .context(format!(
                        "Unable to list instance groups for '{}'",
                        cluster_name
                    ))?;
                match output {
                    OutputFormat::Yaml => print_yaml_stream(&instance_groups)?,
                    OutputFormat::Table => {
                        let rows: Vec<InstanceGroupRow> =
                            instance_groups.iter().map(InstanceGroupRow::from).collect();
                        println!("{}", Table::new(rows));
                    }
                }
            }
        }
        Ok(())
    }
}

fn optional_size(size: Option<i32>) -> String {
    size.map(|s| s.to_string()).unwrap_or_default()
}

fn print_yaml_stream<T: ObjectExt>(objects: &[T]) -> Result<()> {
    for object in objects {
        print!("{}", object.to_yaml()?);
    }
    Ok(())
}

impl From<&Cluster> for ClusterRow {
    fn from(cluster: &Cluster) -> Self {
        ClusterRow {
            name: cluster.object_name().to_string(),
            region: cluster.spec.region.clone().unwrap_or_default(),
            zones: cluster.spec.zones.len(),
            network: cluster.spec.network_cidr.clone().unwrap_or_default(),
        }
    }
}

impl From<&InstanceGroup> for InstanceGroupRow {
    fn from(ig: &InstanceGroup) -> Self {
        InstanceGroupRow {
            name: ig.object_name().to_string(),
            role: ig.spec.role.to_string(),
            machine_type: ig.spec.machine_type.clone().unwrap_or_default(),
            min: optional_size(ig.spec.min_size),
            max: optional_size(ig.spec.max_size),
            zones: ig.spec.zones.join(","),
        }
    }
}
