use snafu::Snafu;

#[derive(Debug, Snafu)]
pub struct Error(OpaqueError);
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum OpaqueError {
    #[snafu(display("Error serializing {} to YAML: {}", what, source))]
    YamlSerialization {
        what: String,
        source: serde_yaml::Error,
    },

    #[snafu(display("Error deserializing {} from YAML: {}", what, source))]
    YamlDeserialization {
        what: String,
        source: serde_yaml::Error,
    },
}
