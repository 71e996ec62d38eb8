use snafu::Snafu;

pub type Result<T> = std::result::Result<T, Error>;

/// The errors produced by the completion pipeline. Callers need to distinguish kinds (for
/// example, an unreachable DNS provider from a DNS name with no matching hosted zone), so this
/// enum is public rather than an opaque wrapper.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Invalid zone configuration: {}", reason))]
    InvalidZone { reason: String },

    #[snafu(display(
        "No hosted zone found matching '{}'; DNS records cannot be created without one",
        dns_name
    ))]
    NoMatchingHostedZone { dns_name: String },

    #[snafu(display("The DNS provider could not be queried: {}", reason))]
    DnsProviderUnavailable { reason: String },

    #[snafu(display(
        "Cannot carve {} /{} subnets out of network {}",
        needed,
        subnet_prefix,
        network
    ))]
    InsufficientAddressSpace {
        needed: usize,
        subnet_prefix: u32,
        network: String,
    },

    #[snafu(display("Unsupported configuration: {}", reason))]
    UnsupportedConfiguration { reason: String },

    #[snafu(display("Invalid options: {}", reason))]
    Options { reason: String },

    #[snafu(display("Unable to parse options: {}", source))]
    OptionsYaml { source: serde_yaml::Error },

    #[snafu(display(
        "The completed specification is not valid:\n  - {}",
        problems.join("\n  - ")
    ))]
    Validation { problems: Vec<String> },
}
