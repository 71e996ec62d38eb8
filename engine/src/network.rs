use crate::error::{self, Result};
use ipnetwork::Ipv4Network;
use snafu::ensure;
use std::net::Ipv4Addr;

/// The default cluster network when the user does not supply one: a private /16.
pub const DEFAULT_NETWORK_CIDR: &str = "172.20.0.0/16";

/// Each zone subnet is a fixed 1/8th partition of the network block (prefix + 3), so a /16
/// network yields /19 subnets. The partition size does not depend on the zone count: adding a
/// zone later never re-numbers existing subnets.
const SUBNET_PREFIX_STEP: u8 = 3;

/// Subnets smaller than /28 are too small to be useful.
const MAX_SUBNET_PREFIX: u8 = 28;

/// The number of partitions a network block is divided into.
pub const MAX_ZONES_PER_NETWORK: usize = 1 << SUBNET_PREFIX_STEP;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NetworkPlan {
    pub network_cidr: Ipv4Network,
    /// One subnet per zone, in the zones' sorted order, starting at the base of the block.
    pub subnets: Vec<ZoneSubnet>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ZoneSubnet {
    pub zone: String,
    pub cidr: Ipv4Network,
}

/// Allocate the cluster network and one subnet per zone. `zones` must already be sorted (the
/// zone resolver guarantees this); assignment order is what makes the plan deterministic. Pure
/// function, no I/O.
pub fn plan_network(requested: Option<Ipv4Network>, zones: &[String]) -> Result<NetworkPlan> {
    let network_cidr = match requested {
        Some(requested) => normalize(requested)?,
        None => parse_default()?,
    };

    let subnet_prefix = network_cidr.prefix() + SUBNET_PREFIX_STEP;
    ensure!(
        zones.len() <= MAX_ZONES_PER_NETWORK && subnet_prefix <= MAX_SUBNET_PREFIX,
        error::InsufficientAddressSpaceSnafu {
            needed: zones.len(),
            subnet_prefix: u32::from(subnet_prefix),
            network: network_cidr.to_string(),
        }
    );

    let subnet_size: u32 = 1 << (32 - subnet_prefix);
    let base = u32::from(network_cidr.network());
    let mut subnets = Vec::with_capacity(zones.len());
    for (index, zone) in zones.iter().enumerate() {
        let address = Ipv4Addr::from(base + index as u32 * subnet_size);
        let cidr = Ipv4Network::new(address, subnet_prefix).map_err(|_| {
            error::InsufficientAddressSpaceSnafu {
                needed: zones.len(),
                subnet_prefix: u32::from(subnet_prefix),
                network: network_cidr.to_string(),
            }
            .build()
        })?;
        subnets.push(ZoneSubnet {
            zone: zone.clone(),
            cidr,
        });
    }

    Ok(NetworkPlan {
        network_cidr,
        subnets,
    })
}

/// Whether two serialized CIDR blocks share any addresses. `None` when either string does not
/// parse. Used to warn about clusters whose networks collide with a sibling's.
pub fn cidrs_overlap(a: &str, b: &str) -> Option<bool> {
    let a: Ipv4Network = a.parse().ok()?;
    let b: Ipv4Network = b.parse().ok()?;
    Some(a.contains(b.network()) || b.contains(a.network()))
}

/// Rebase the requested block on its true network address, so `172.20.1.2/16` and
/// `172.20.0.0/16` describe the same plan.
fn normalize(requested: Ipv4Network) -> Result<Ipv4Network> {
    Ipv4Network::new(requested.network(), requested.prefix()).map_err(|e| {
        error::OptionsSnafu {
            reason: format!("invalid network CIDR '{}': {}", requested, e),
        }
        .build()
    })
}

fn parse_default() -> Result<Ipv4Network> {
    DEFAULT_NETWORK_CIDR.parse().map_err(|e| {
        error::OptionsSnafu {
            reason: format!("invalid default network CIDR: {}", e),
        }
        .build()
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Error;

    fn zone_names(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!("us-test-1{}", (b'a' + i as u8) as char))
            .collect()
    }

    #[test]
    fn default_network_and_first_subnet() {
        let plan = plan_network(None, &zone_names(1)).unwrap();
        assert_eq!(plan.network_cidr.to_string(), "172.20.0.0/16");
        assert_eq!(plan.subnets.len(), 1);
        assert_eq!(plan.subnets[0].zone, "us-test-1a");
        assert_eq!(plan.subnets[0].cidr.to_string(), "172.20.0.0/19");
    }

    #[test]
    fn three_zones_get_adjacent_slices() {
        let plan = plan_network(None, &zone_names(3)).unwrap();
        let cidrs: Vec<String> = plan.subnets.iter().map(|s| s.cidr.to_string()).collect();
        assert_eq!(
            cidrs,
            vec!["172.20.0.0/19", "172.20.32.0/19", "172.20.64.0/19"]
        );
    }

    #[test]
    fn subnets_are_disjoint_and_contained_for_all_supported_zone_counts() {
        for n in 1..=MAX_ZONES_PER_NETWORK {
            let plan = plan_network(None, &zone_names(n)).unwrap();
            assert_eq!(plan.subnets.len(), n);
            for (i, a) in plan.subnets.iter().enumerate() {
                assert!(plan.network_cidr.contains(a.cidr.network()));
                assert!(plan.network_cidr.contains(a.cidr.broadcast()));
                for b in plan.subnets.iter().skip(i + 1) {
                    assert!(
                        !a.cidr.contains(b.cidr.network()) && !b.cidr.contains(a.cidr.network()),
                        "subnets {} and {} overlap",
                        a.cidr,
                        b.cidr
                    );
                }
            }
        }
    }

    #[test]
    fn too_many_zones_fail() {
        let err = plan_network(None, &zone_names(9)).unwrap_err();
        assert!(matches!(err, Error::InsufficientAddressSpace { .. }));
    }

    #[test]
    fn networks_too_small_to_partition_fail() {
        let requested: Ipv4Network = "10.0.0.0/28".parse().unwrap();
        let err = plan_network(Some(requested), &zone_names(1)).unwrap_err();
        assert!(matches!(err, Error::InsufficientAddressSpace { .. }));
    }

    #[test]
    fn user_supplied_network_is_rebased() {
        let requested: Ipv4Network = "10.1.2.3/16".parse().unwrap();
        let plan = plan_network(Some(requested), &zone_names(2)).unwrap();
        assert_eq!(plan.network_cidr.to_string(), "10.1.0.0/16");
        assert_eq!(plan.subnets[1].cidr.to_string(), "10.1.32.0/19");
    }

    #[test]
    fn overlap_detection() {
        assert_eq!(cidrs_overlap("172.20.0.0/16", "172.20.128.0/17"), Some(true));
        assert_eq!(cidrs_overlap("172.20.0.0/16", "172.21.0.0/16"), Some(false));
        assert_eq!(cidrs_overlap("not-a-cidr", "172.20.0.0/16"), None);
    }
}
