use crate::Error as ModelError;
use snafu::Snafu;
use std::path::PathBuf;

/// The `Result` type returned by `clients`.
pub type Result<T> = std::result::Result<T, Error>;

/// The public error type returned by `clients`.
#[derive(Debug, Snafu)]
pub struct Error(InnerError);

impl Error {
    /// True when the error is a registry conflict: an object with this name already exists with
    /// different content. Callers treat this as a completion failure, never a silent overwrite.
    pub fn is_conflict(&self) -> bool {
        matches!(self.0, InnerError::Conflict { .. })
    }
}

/// The private error type returned by `clients`.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub(crate) enum InnerError {
    #[snafu(display(
        "A {} named '{}' already exists in the registry with different content",
        kind,
        name
    ))]
    Conflict { kind: String, name: String },

    #[snafu(display("Unable to {} '{}': {}", operation, path.display(), source))]
    Io {
        operation: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display(
        "The instance group '{}' does not carry the '{}' label naming its cluster",
        name,
        label
    ))]
    MissingClusterLabel { name: String, label: String },

    #[snafu(display("Cannot store a {} with no name", kind))]
    MissingName { kind: String },

    #[snafu(display("{}", source))]
    Serde { source: ModelError },
}

impl From<ModelError> for Error {
    fn from(e: ModelError) -> Self {
        Error(InnerError::Serde { source: e })
    }
}
