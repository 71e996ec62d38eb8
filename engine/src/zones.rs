use crate::error::{self, Result};
use snafu::ensure;
use std::collections::BTreeSet;

/// The outcome of zone resolution: the one region every zone belongs to, and the validated zone
/// set in sorted order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedZones {
    pub region: String,
    pub zones: Vec<String>,
}

/// Derive the region from a list of zone identifiers and validate the list. A zone identifier is
/// a region name with a single trailing letter, e.g. `us-test-1a` is zone `a` of region
/// `us-test-1`. The list must be non-empty, free of duplicates, and all zones must share exactly
/// one region. Zones come back sorted so that downstream assignment is deterministic.
pub fn resolve_zones(zones: &[String]) -> Result<ResolvedZones> {
    ensure!(
        !zones.is_empty(),
        error::InvalidZoneSnafu {
            reason: "at least one zone is required"
        }
    );

    let mut region: Option<String> = None;
    let mut seen = BTreeSet::new();
    for zone in zones {
        let zone_region = region_of(zone)?;
        ensure!(
            seen.insert(zone.clone()),
            error::InvalidZoneSnafu {
                reason: format!("zone '{}' is listed more than once", zone)
            }
        );
        match &region {
            None => region = Some(zone_region),
            Some(expected) => ensure!(
                expected == &zone_region,
                error::InvalidZoneSnafu {
                    reason: format!(
                        "zones span more than one region ('{}' and '{}')",
                        expected, zone_region
                    )
                }
            ),
        }
    }

    let region = match region {
        Some(region) => region,
        // Unreachable: the list was checked non-empty above.
        None => {
            return error::InvalidZoneSnafu {
                reason: "at least one zone is required",
            }
            .fail()
        }
    };

    Ok(ResolvedZones {
        region,
        zones: seen.into_iter().collect(),
    })
}

/// The region of a single zone identifier: the identifier minus its trailing zone letter.
fn region_of(zone: &str) -> Result<String> {
    let mut chars = zone.chars();
    let last = chars.next_back();
    let region: String = chars.collect();
    let valid = matches!(last, Some(c) if c.is_ascii_lowercase())
        && region
            .chars()
            .last()
            .map(|c| c.is_ascii_digit())
            .unwrap_or(false);
    ensure!(
        valid,
        error::InvalidZoneSnafu {
            reason: format!(
                "'{}' is not a valid zone identifier (expected a region name with a trailing zone letter, e.g. 'us-test-1a')",
                zone
            )
        }
    );
    Ok(region)
}
