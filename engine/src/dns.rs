use crate::error::{self, Result};
use async_trait::async_trait;

/// A DNS provider's record of authority over a domain name, as returned by the provider's "list
/// hosted zones" operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HostedZone {
    /// The zone's domain name, e.g. `example.com.` (with or without the trailing dot).
    pub name: String,
    /// The provider-assigned identifier, e.g. `/hostedzone/Z1AFAKE1ZON3YO`.
    pub id: String,
}

impl HostedZone {
    pub fn new<S1: Into<String>, S2: Into<String>>(name: S1, id: S2) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// The one read capability the engine needs from a DNS provider. Implementations may block on
/// network I/O; the orchestrator bounds the call with a timeout. Any error is treated as a
/// transport failure, distinct from "no matching zone".
#[async_trait]
pub trait DnsProvider: Send + Sync {
    async fn list_hosted_zones(
        &self,
    ) -> std::result::Result<Vec<HostedZone>, Box<dyn std::error::Error + Send + Sync>>;
}

/// A fixed, in-memory hosted zone catalog. Serves as the test double for the provider interface,
/// and backs catalogs loaded from files.
#[derive(Clone, Debug, Default)]
pub struct StaticDnsProvider {
    zones: Vec<HostedZone>,
}

impl StaticDnsProvider {
    pub fn new(zones: Vec<HostedZone>) -> Self {
        Self { zones }
    }
}

#[async_trait]
impl DnsProvider for StaticDnsProvider {
    async fn list_hosted_zones(
        &self,
    ) -> std::result::Result<Vec<HostedZone>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.zones.clone())
    }
}

/// Find the hosted zone that owns `dns_name`: among catalog entries whose name is a suffix of
/// `dns_name` on a label boundary, the longest (most specific) name wins. Matching is
/// case-insensitive and trailing-dot normalized. Ties on length are broken by the
/// lexicographically smaller name so the result is deterministic.
///
/// Failing to find a match is a hard error; DNS record creation has no fallback.
pub fn find_hosted_zone(dns_name: &str, catalog: &[HostedZone]) -> Result<HostedZone> {
    let normalized = normalize(dns_name);
    let mut best: Option<(&HostedZone, String)> = None;
    for candidate in catalog {
        let zone_name = normalize(&candidate.name);
        let matches = normalized == zone_name
            || normalized.ends_with(&format!(".{}", zone_name));
        if !matches {
            continue;
        }
        let better = match &best {
            None => true,
            Some((_, best_name)) => {
                zone_name.len() > best_name.len()
                    || (zone_name.len() == best_name.len() && zone_name < *best_name)
            }
        };
        if better {
            best = Some((candidate, zone_name));
        }
    }
    match best {
        Some((zone, _)) => Ok(zone.clone()),
        None => error::NoMatchingHostedZoneSnafu { dns_name }.fail(),
    }
}

/// Lowercase with exactly one trailing dot.
fn normalize(name: &str) -> String {
    let mut normalized = name.trim_end_matches('.').to_ascii_lowercase();
    normalized.push('.');
    normalized
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Error;

    fn catalog(names: &[&str]) -> Vec<HostedZone> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| HostedZone::new(*name, format!("/hostedzone/Z{}", i)))
            .collect()
    }

    #[test]
    fn most_specific_suffix_wins() {
        let zones = catalog(&["example.com.", "dev.example.com."]);
        let found = find_hosted_zone("foo.dev.example.com", &zones).unwrap();
        assert_eq!(found.name, "dev.example.com.");
    }

    #[test]
    fn single_suffix_matches() {
        let zones = catalog(&["example.com."]);
        let found = find_hosted_zone("foo.dev.example.com", &zones).unwrap();
        assert_eq!(found.name, "example.com.");
    }

    #[test]
    fn exact_name_matches() {
        let zones = catalog(&["example.com."]);
        let found = find_hosted_zone("example.com", &zones).unwrap();
        assert_eq!(found.name, "example.com.");
    }

    #[test]
    fn no_match_is_an_error() {
        let zones = catalog(&["other.org."]);
        let err = find_hosted_zone("foo.dev.example.com", &zones).unwrap_err();
        assert!(matches!(err, Error::NoMatchingHostedZone { .. }));
    }

    #[test]
    fn suffix_must_fall_on_a_label_boundary() {
        // "badexample.com" must not match the "example.com" zone.
        let zones = catalog(&["example.com."]);
        assert!(find_hosted_zone("foo.badexample.com", &zones).is_err());
    }

    #[test]
    fn matching_ignores_case_and_trailing_dots() {
        let zones = catalog(&["Example.COM"]);
        let found = find_hosted_zone("FOO.example.com.", &zones).unwrap();
        assert_eq!(found.id, "/hostedzone/Z0");
    }

    #[test]
    fn length_ties_break_deterministically() {
        // Contrived: two same-length names, only one of which can match a given cluster name, but
        // when both match (identical names under different ids) the smaller name/first entry is
        // stable.
        let zones = vec![
            HostedZone::new("example.com.", "/hostedzone/Zb"),
            HostedZone::new("example.com.", "/hostedzone/Za"),
        ];
        let found = find_hosted_zone("foo.example.com", &zones).unwrap();
        assert_eq!(found.id, "/hostedzone/Zb");
    }
}
