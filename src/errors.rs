use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VmError {
    #[error("VMCTLDIR is not set, export it before managing vms")]
    ConfigurationMissing,

    #[error("failed to create directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid vm name {0:?}, names must be a single path component")]
    InvalidName(String),

    #[error("vm named {0} does not exist")]
    NotFound(String),

    #[error("provider with name {0} does not exist, check the spelling and try again")]
    ProviderNotFound(String),

    #[error(transparent)]
    AssetFetch(#[from] AssetFetchError),

    #[error("vm named {0} is already running")]
    AlreadyRunning(String),

    #[error("unable to use vm named {0}, vm.conf could not be read")]
    ConfigUnreadable(String),

    #[error("unable to use vm named {0}, mac address could not be retrieved")]
    MacUnavailable(String),

    #[error("unable to reach vm named {0}, ip address could not be retrieved")]
    IpUnavailable(String),

    #[error("unsupported cpu architecture: {0}")]
    UnsupportedArch(String),
}

/// Failure modes of a single asset download.
#[derive(Debug, Error)]
pub enum AssetFetchError {
    #[error("invalid asset url: {0}")]
    Url(String),

    #[error("server error while fetching {url}: {message}")]
    Server { url: String, message: String },

    #[error("failed to decode {url}: {message}")]
    Decoding { url: String, message: String },

    #[error("filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AssetFetchError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}
