use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::utils::checksum::ChecksumError;
use crate::utils::download::FetchError;
use crate::utils::extract::ExtractError;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("could not download plan info from \"{url}\": {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("plan info from \"{url}\" failed its checksum: {source}")]
    Checksum {
        url: String,
        #[source]
        source: ChecksumError,
    },
    #[error("plan info from \"{url}\" is not valid UTF-8")]
    NotUtf8 { url: String },
    #[error("could not parse plan info: {0}")]
    Decode(#[source] serde_json::Error),
    #[error(transparent)]
    Transport(#[from] FetchError),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("invalid url \"{url}\": {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid daemon name \"{0}\"")]
    InvalidDaemonName(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Checksum(#[from] ChecksumError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("downloaded artifact has no executable named \"{daemon_name}\" in {}", .root.display())]
    MissingBinary { daemon_name: String, root: PathBuf },
    #[error("{} is not a regular file", .0.display())]
    NotRegularFile(PathBuf),
    #[error("{} is not executable", .0.display())]
    NotExecutable(PathBuf),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("no \"binaries\" entries found")]
    NoBinaries,
    #[error("invalid os/arch format in key \"{key}\"")]
    InvalidPlatform { key: String },
    #[error("invalid url \"{url}\" in binaries[{key}]: {source}")]
    InvalidUrl {
        key: String,
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("url \"{url}\" in binaries[{key}] has no checksum")]
    MissingChecksum { key: String, url: String },
    #[error("invalid checksum in binaries[{key}]: {source}")]
    InvalidChecksum {
        key: String,
        #[source]
        source: ChecksumError,
    },
    #[error("{}", join_messages(.0))]
    Multiple(Vec<ValidationError>),
    #[error("could not create temp directory: {0}")]
    ScratchDir(#[source] io::Error),
    #[error("error downloading binary for os/arch {platform}: {source}")]
    Artifact {
        platform: String,
        #[source]
        source: DownloadError,
    },
}

impl ValidationError {
    /// Every individual violation, flattening [`ValidationError::Multiple`].
    pub fn violations(&self) -> Vec<&ValidationError> {
        match self {
            ValidationError::Multiple(all) => all.iter().collect(),
            single => vec![single],
        }
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    let mut out = format!("{} problems found in plan info:", errors.len());
    for err in errors {
        out.push_str("\n  - ");
        out.push_str(&err.to_string());
    }
    out
}

/// Failure of [`check_plan_info`](super::check_plan_info): the plan either did not parse or did not validate.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
