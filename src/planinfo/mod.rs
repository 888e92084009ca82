//! Plan info documents: `{"binaries": {"<os>/<arch>" | "any": "<url>", ...}}`.
//!
//! [`PlanInfo::parse`] accepts either the JSON document itself or a URL that
//! serves it. [`Verifier`] validates a parsed plan, cheaply with
//! [`Verifier::validate_basic`] or fully with [`Verifier::validate_full`],
//! which also downloads every artifact.

mod error;
mod upgrade;
mod validate;
mod verify;

pub use error::{CheckError, DownloadError, ParseError, ValidationError};
pub use upgrade::{download_upgrade, ensure_binary};
pub use validate::{is_valid_platform_key, ANY_PLATFORM};
pub use verify::{ValidationMode, Verifier};

use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};
use url::Url;

use crate::config::Config;
use crate::utils::checksum::{self, Checksum};
use crate::utils::download::{HttpTransport, Transport};

/// The structured form of an upgrade plan's info string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanInfo {
    #[serde(default)]
    pub binaries: BinaryDownloadUrls,
}

/// Platform key (`os/arch` or `any`) to the URL its upgrade binary is downloaded from.
///
/// Iteration is in ascending key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BinaryDownloadUrls(BTreeMap<String, String>);

impl BinaryDownloadUrls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, platform: &str) -> Option<&str> {
        self.0.get(platform).map(String::as_str)
    }

    pub fn insert(&mut self, platform: impl Into<String>, url: impl Into<String>) -> Option<String> {
        self.0.insert(platform.into(), url.into())
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }

    /// The URL that applies to `platform`: its own entry, else the `any` entry.
    pub fn url_for(&self, platform: &str) -> Option<&str> {
        self.entry_for(platform).map(|(_, url)| url)
    }

    /// Like [`url_for`](Self::url_for), also returning the key that matched.
    pub fn entry_for(&self, platform: &str) -> Option<(&str, &str)> {
        [platform, ANY_PLATFORM]
            .into_iter()
            .find_map(|key| self.0.get_key_value(key))
            .map(|(key, url)| (key.as_str(), url.as_str()))
    }
}

impl FromIterator<(String, String)> for BinaryDownloadUrls {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a BinaryDownloadUrls {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl PlanInfo {
    /// Parses an info string into a plan.
    ///
    /// Surrounding whitespace is ignored. If what remains parses as an absolute
    /// URL, the document is downloaded from it and parsed instead.
    pub fn parse(raw: &str, transport: &dyn Transport) -> Result<Self, ParseError> {
        let raw = raw.trim();

        let downloaded;
        let document = match Url::parse(raw) {
            Ok(url) => {
                downloaded = download_plan_info(&url, transport)?;
                downloaded.as_str()
            }
            Err(_) => raw,
        };

        serde_json::from_str(document).map_err(ParseError::Decode)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn validate_basic(&self) -> Result<(), ValidationError> {
        self.binaries.validate_basic()
    }
}

/// Fetches a plan info document, honouring a `checksum` query parameter.
pub fn download_plan_info(url: &Url, transport: &dyn Transport) -> Result<String, ParseError> {
    tracing::info!(%url, "downloading plan info");

    let pinned = Checksum::from_url(url).map_err(|source| ParseError::Checksum {
        url: url.to_string(),
        source,
    })?;
    let fetch_url = checksum::strip_checksum(url);

    let mut body = Vec::new();
    transport
        .fetch(&fetch_url, &mut body)
        .map_err(|source| ParseError::Fetch {
            url: url.to_string(),
            source,
        })?;

    if let Some(pinned) = pinned {
        pinned
            .verify_bytes(&body)
            .map_err(|source| ParseError::Checksum {
                url: url.to_string(),
                source,
            })?;
    }

    String::from_utf8(body).map_err(|_| ParseError::NotUtf8 {
        url: url.to_string(),
    })
}

/// Parses `raw` fetching over HTTP with the given config.
pub fn parse_plan_info(raw: &str, config: &Config) -> Result<PlanInfo, ParseError> {
    let transport = HttpTransport::new(config)?;
    PlanInfo::parse(raw, &transport)
}

/// Parses and validates an info string in one go.
///
/// With [`ValidationMode::Skip`] the string is not even parsed and `Ok(None)`
/// is returned; otherwise the parsed plan is returned once it validates.
pub fn check_plan_info(
    raw: &str,
    daemon_name: &str,
    mode: ValidationMode,
    verifier: &Verifier<'_>,
) -> Result<Option<PlanInfo>, CheckError> {
    if mode == ValidationMode::Skip {
        tracing::warn!("plan info validation skipped");
        return Ok(None);
    }

    let plan = PlanInfo::parse(raw, verifier.transport())?;
    verifier.validate(&plan, daemon_name, mode)?;
    Ok(Some(plan))
}
