//! Optional checksum pinning for downloaded content.
//!
//! A URL may carry `?checksum=<algorithm>:<hex digest>`. The parameter is
//! removed before the request is sent and the downloaded bytes are checked
//! against it afterwards.

use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;
use url::Url;

const CHECKSUM_PARAM: &str = "checksum";
const BUF_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum ChecksumError {
    #[error("malformed checksum \"{0}\", expected <algorithm>:<hex digest>")]
    Malformed(String),
    #[error("unsupported checksum algorithm \"{0}\"")]
    Unsupported(String),
    #[error("{algorithm} checksum mismatch: expected {expected}, got {actual}")]
    Mismatch {
        algorithm: Algorithm,
        expected: String,
        actual: String,
    },
    #[error("could not hash {}: {source}", .path.display())]
    Io {
        path: std::path::PathBuf,
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sha256,
    Sha512,
}

impl Algorithm {
    fn digest_len(self) -> usize {
        match self {
            Algorithm::Sha256 => 32,
            Algorithm::Sha512 => 64,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Sha256 => f.write_str("sha256"),
            Algorithm::Sha512 => f.write_str("sha512"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    pub algorithm: Algorithm,
    /// Lowercase hex digest.
    pub digest: String,
}

impl Checksum {
    pub fn parse(value: &str) -> Result<Self, ChecksumError> {
        let (algorithm, digest) = value
            .split_once(':')
            .ok_or_else(|| ChecksumError::Malformed(value.to_string()))?;

        let algorithm = match algorithm.to_ascii_lowercase().as_str() {
            "sha256" => Algorithm::Sha256,
            "sha512" => Algorithm::Sha512,
            _ => return Err(ChecksumError::Unsupported(algorithm.to_string())),
        };

        let bytes = hex::decode(digest).map_err(|_| ChecksumError::Malformed(value.to_string()))?;
        if bytes.len() != algorithm.digest_len() {
            return Err(ChecksumError::Malformed(value.to_string()));
        }

        Ok(Self {
            algorithm,
            digest: hex::encode(bytes),
        })
    }

    /// Reads the `checksum` query parameter of `url`, if there is one.
    pub fn from_url(url: &Url) -> Result<Option<Self>, ChecksumError> {
        url.query_pairs()
            .find(|(key, _)| key == CHECKSUM_PARAM)
            .map(|(_, value)| Self::parse(&value))
            .transpose()
    }

    pub fn verify_bytes(&self, bytes: &[u8]) -> Result<(), ChecksumError> {
        let actual = match self.algorithm {
            Algorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
            Algorithm::Sha512 => hex::encode(Sha512::digest(bytes)),
        };
        self.compare(actual)
    }

    pub fn verify_file(&self, path: &Path) -> Result<(), ChecksumError> {
        let actual = match self.algorithm {
            Algorithm::Sha256 => hash_file::<Sha256>(path)?,
            Algorithm::Sha512 => hash_file::<Sha512>(path)?,
        };
        self.compare(actual)
    }

    fn compare(&self, actual: String) -> Result<(), ChecksumError> {
        if actual == self.digest {
            Ok(())
        } else {
            Err(ChecksumError::Mismatch {
                algorithm: self.algorithm,
                expected: self.digest.clone(),
                actual,
            })
        }
    }
}

/// Returns `url` without its `checksum` query parameter.
pub fn strip_checksum(url: &Url) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != CHECKSUM_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut stripped = url.clone();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(kept);
    }
    stripped
}

fn hash_file<D: Digest>(path: &Path) -> Result<String, ChecksumError> {
    let io_err = |source| ChecksumError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut f = File::open(path).map_err(io_err)?;
    let mut hasher = D::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f.read(&mut buf).map_err(io_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
