use crate::defaults::DefaultsTable;
use crate::dns::{self, DnsProvider};
use crate::error::{self, Result};
use crate::options::ClusterOptions;
use crate::{network, topology, zones};
use chrono::{DateTime, Utc};
use ipnetwork::Ipv4Network;
use log::{debug, info};
use model::{Cluster, InstanceGroup, ObjectExt, Role, SubnetSpec};
use std::collections::BTreeSet;
use std::time::Duration;

const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_secs(30);

/// The result of a successful completion run: the fully populated cluster, its instance groups
/// in deterministic order (masters in zone order, then nodes, then bastions), and any non-fatal
/// diagnostics. Nothing has been persisted; that is the caller's next step.
#[derive(Clone, Debug)]
pub struct CompletedCluster {
    pub cluster: Cluster,
    pub instance_groups: Vec<InstanceGroup>,
    pub notes: Vec<String>,
}

/// The completion orchestrator. Sequences the pipeline stages over one immutable options
/// snapshot and validates the assembled object graph. Holds no mutable state; one `Completer`
/// can serve many runs.
#[derive(Debug)]
pub struct Completer<D> {
    dns_provider: D,
    defaults: DefaultsTable,
    /// When set, completed objects carry this fixed creation timestamp (for reproducible
    /// output). Otherwise the registry stamps objects at first persistence.
    clock: Option<DateTime<Utc>>,
    dns_timeout: Duration,
}

impl<D: DnsProvider> Completer<D> {
    pub fn new(dns_provider: D) -> Self {
        Self {
            dns_provider,
            defaults: DefaultsTable::current(),
            clock: None,
            dns_timeout: DEFAULT_DNS_TIMEOUT,
        }
    }

    pub fn with_clock(mut self, timestamp: DateTime<Utc>) -> Self {
        self.clock = Some(timestamp);
        self
    }

    pub fn with_dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = timeout;
        self
    }

    /// Run the whole pipeline: resolve zones, match the hosted zone, plan the network,
    /// synthesize the topology, apply defaults, then validate everything at once.
    pub async fn complete(&self, options: &ClusterOptions) -> Result<CompletedCluster> {
        let cluster_name = options
            .cluster_name
            .as_deref()
            .ok_or_else(|| {
                error::OptionsSnafu {
                    reason: "clusterName is required",
                }
                .build()
            })?
            .to_string();
        validate_dns_compatible_name(&cluster_name)?;

        let resolved = zones::resolve_zones(&options.zones)?;
        debug!(
            "resolved region '{}' from {} zone(s)",
            resolved.region,
            resolved.zones.len()
        );

        let dns_name = options
            .dns_name
            .clone()
            .unwrap_or_else(|| cluster_name.clone());
        validate_dns_compatible_name(&dns_name)?;

        let hosted_zone_id = match &options.hosted_zone_id {
            Some(pinned) => {
                debug!("hosted zone pinned to '{}', skipping provider lookup", pinned);
                pinned.clone()
            }
            None => {
                let catalog = self.list_hosted_zones().await?;
                let hosted_zone = dns::find_hosted_zone(&dns_name, &catalog)?;
                debug!(
                    "matched '{}' to hosted zone '{}' ({})",
                    dns_name, hosted_zone.name, hosted_zone.id
                );
                hosted_zone.id
            }
        };

        let requested_network = parse_requested_network(options.network_cidr.as_deref())?;
        let plan = network::plan_network(requested_network, &resolved.zones)?;

        let topology_plan = topology::synthesize(
            &cluster_name,
            &resolved.zones,
            options.master_zones.as_deref(),
            options.node_count,
            options.topology.unwrap_or_default(),
            options.bastion.unwrap_or(false),
        )?;

        let mut cluster = Cluster::new(&cluster_name);
        cluster.metadata.creation_timestamp = self.clock;
        cluster.spec.channel = options.channel;
        cluster.spec.config_base = options.config_base.clone();
        cluster.spec.dns_name = Some(dns_name);
        cluster.spec.hosted_zone_id = Some(hosted_zone_id);
        cluster.spec.kubernetes_version = options.kubernetes_version.clone();
        cluster.spec.network_cidr = Some(plan.network_cidr.to_string());
        cluster.spec.networking = options.networking;
        cluster.spec.region = Some(resolved.region.clone());
        cluster.spec.ssh_access = options.ssh_access.clone();
        cluster.spec.kubernetes_api_access = options.admin_access.clone();
        cluster.spec.subnets = plan
            .subnets
            .iter()
            .map(|subnet| SubnetSpec {
                zone: subnet.zone.clone(),
                cidr: subnet.cidr.to_string(),
            })
            .collect();
        cluster.spec.topology = options.topology;
        cluster.spec.zones = resolved.zones.clone();
        self.defaults.apply_cluster(&mut cluster)?;

        let mut instance_groups = topology_plan.instance_groups;
        for instance_group in &mut instance_groups {
            instance_group.metadata.creation_timestamp = self.clock;
            let spec = &mut instance_group.spec;
            if spec.machine_type.is_none() {
                spec.machine_type = match spec.role {
                    Role::Master => options.master_size.clone(),
                    Role::Node => options.node_size.clone(),
                    Role::Bastion => None,
                };
            }
            if spec.image.is_none() {
                spec.image = options.image.clone();
            }
            self.defaults.apply_instance_group(instance_group)?;
        }

        validate(&cluster, &instance_groups)?;
        info!(
            "completed cluster '{}' with {} instance group(s)",
            cluster.object_name(),
            instance_groups.len()
        );

        Ok(CompletedCluster {
            cluster,
            instance_groups,
            notes: topology_plan.notes,
        })
    }

    /// The one outbound read of the pipeline, bounded by the configured timeout. A timeout or a
    /// transport error both mean the provider was unavailable, which is a different failure than
    /// a catalog with no matching zone.
    async fn list_hosted_zones(&self) -> Result<Vec<dns::HostedZone>> {
        match tokio::time::timeout(self.dns_timeout, self.dns_provider.list_hosted_zones()).await {
            Ok(Ok(catalog)) => Ok(catalog),
            Ok(Err(e)) => error::DnsProviderUnavailableSnafu {
                reason: e.to_string(),
            }
            .fail(),
            Err(_) => error::DnsProviderUnavailableSnafu {
                reason: format!(
                    "the hosted zone listing did not complete within {:?}",
                    self.dns_timeout
                ),
            }
            .fail(),
        }
    }
}

/// Every invariant on the assembled object graph, checked in one pass. All violations are
/// collected and reported together so callers see the complete picture, not just the first
/// problem.
fn validate(cluster: &Cluster, instance_groups: &[InstanceGroup]) -> Result<()> {
    let mut problems = Vec::new();

    let cluster_zones: BTreeSet<&str> = cluster.spec.zones.iter().map(|z| z.as_str()).collect();

    let mut names = BTreeSet::new();
    for instance_group in instance_groups {
        let name = instance_group.object_name();
        if !names.insert(name) {
            problems.push(format!("duplicate instance group name '{}'", name));
        }
        if instance_group.spec.zones.is_empty() {
            problems.push(format!("instance group '{}' has no zones", name));
        }
        for zone in &instance_group.spec.zones {
            if !cluster_zones.contains(zone.as_str()) {
                problems.push(format!(
                    "instance group '{}' uses zone '{}', which is not a cluster zone",
                    name, zone
                ));
            }
        }
        match (instance_group.spec.min_size, instance_group.spec.max_size) {
            (Some(min), Some(max)) => {
                if min > max {
                    problems.push(format!(
                        "instance group '{}' has minSize {} greater than maxSize {}",
                        name, min, max
                    ));
                }
                if instance_group.spec.role == Role::Master && min < 1 {
                    problems.push(format!(
                        "master instance group '{}' must have at least one instance",
                        name
                    ));
                }
            }
            _ => problems.push(format!("instance group '{}' is missing size bounds", name)),
        }
    }

    let quorum: BTreeSet<&str> = instance_groups
        .iter()
        .filter(|ig| ig.spec.role == Role::Master)
        .flat_map(|ig| ig.spec.zones.iter().map(|z| z.as_str()))
        .collect();
    if quorum.is_empty() {
        problems.push("no master instance groups were produced".to_string());
    } else if quorum.len() % 2 == 0 {
        problems.push(format!(
            "control-plane quorum of {} master zones is even; an odd count is required",
            quorum.len()
        ));
    }

    validate_subnets(cluster, &mut problems);

    if problems.is_empty() {
        Ok(())
    } else {
        error::ValidationSnafu { problems }.fail()
    }
}

fn validate_subnets(cluster: &Cluster, problems: &mut Vec<String>) {
    let network = match &cluster.spec.network_cidr {
        Some(raw) => match raw.parse::<Ipv4Network>() {
            Ok(network) => Some(network),
            Err(e) => {
                problems.push(format!("network CIDR '{}' is not valid: {}", raw, e));
                None
            }
        },
        None => {
            problems.push("the cluster has no network CIDR".to_string());
            None
        }
    };

    let mut parsed: Vec<(&str, Ipv4Network)> = Vec::new();
    for subnet in &cluster.spec.subnets {
        match subnet.cidr.parse::<Ipv4Network>() {
            Ok(cidr) => parsed.push((subnet.zone.as_str(), cidr)),
            Err(e) => problems.push(format!(
                "subnet CIDR '{}' for zone '{}' is not valid: {}",
                subnet.cidr, subnet.zone, e
            )),
        }
    }

    let subnet_zones: BTreeSet<&str> = parsed.iter().map(|(zone, _)| *zone).collect();
    for zone in &cluster.spec.zones {
        if !subnet_zones.contains(zone.as_str()) {
            problems.push(format!("zone '{}' has no subnet", zone));
        }
    }

    if let Some(network) = network {
        for (zone, cidr) in &parsed {
            if !network.contains(cidr.network()) || !network.contains(cidr.broadcast()) {
                problems.push(format!(
                    "subnet {} for zone '{}' is not contained in network {}",
                    cidr, zone, network
                ));
            }
        }
    }

    for (i, (zone_a, a)) in parsed.iter().enumerate() {
        for (zone_b, b) in parsed.iter().skip(i + 1) {
            if a.contains(b.network()) || b.contains(a.network()) {
                problems.push(format!(
                    "subnets for zones '{}' and '{}' overlap ({} and {})",
                    zone_a, zone_b, a, b
                ));
            }
        }
    }
}

fn parse_requested_network(raw: Option<&str>) -> Result<Option<Ipv4Network>> {
    match raw {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|e| {
            error::OptionsSnafu {
                reason: format!("invalid networkCidr '{}': {}", raw, e),
            }
            .build()
        }),
    }
}

/// Cluster and DNS names must be DNS-compatible: dot-separated labels of lowercase alphanumerics
/// and hyphens, neither starting nor ending with a hyphen.
fn validate_dns_compatible_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.split('.').all(|label| {
            !label.is_empty()
                && label
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
                && !label.starts_with('-')
                && !label.ends_with('-')
        });
    if valid {
        Ok(())
    } else {
        error::OptionsSnafu {
            reason: format!("'{}' is not a valid DNS-compatible name", name),
        }
        .fail()
    }
}
