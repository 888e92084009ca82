use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use super::error::ValidationError;
use super::BinaryDownloadUrls;
use crate::utils::checksum::Checksum;

/// Platform key that applies to every os/arch pair.
pub const ANY_PLATFORM: &str = "any";

static OS_ARCH_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+/[a-zA-Z0-9]+$").expect("static regex"));

/// True for `any` and for keys shaped like `linux/amd64`.
pub fn is_valid_platform_key(key: &str) -> bool {
    key == ANY_PLATFORM || OS_ARCH_RX.is_match(key)
}

impl BinaryDownloadUrls {
    /// Stateless checks: at least one entry, `os/arch` or `any` keys, parseable URLs.
    ///
    /// URLs must be absolute: a relative value such as `relative/path` is
    /// rejected with [`ValidationError::InvalidUrl`].
    ///
    /// Every violation is reported, in key order. A single violation comes back
    /// as itself; several come back as [`ValidationError::Multiple`].
    pub fn validate_basic(&self) -> Result<(), ValidationError> {
        self.validate_basic_with(false)
    }

    /// Like [`validate_basic`](Self::validate_basic), and when `require_checksum`
    /// is set every URL must also pin a `checksum` query parameter.
    pub fn validate_basic_with(&self, require_checksum: bool) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::NoBinaries);
        }

        let mut violations = Vec::new();
        for (key, val) in self.iter() {
            if !is_valid_platform_key(key) {
                violations.push(ValidationError::InvalidPlatform { key: key.clone() });
            }

            let url = match Url::parse(val) {
                Ok(url) => url,
                Err(source) => {
                    violations.push(ValidationError::InvalidUrl {
                        key: key.clone(),
                        url: val.clone(),
                        source,
                    });
                    continue;
                }
            };

            match Checksum::from_url(&url) {
                Ok(Some(_)) => {}
                Ok(None) if require_checksum => violations.push(ValidationError::MissingChecksum {
                    key: key.clone(),
                    url: val.clone(),
                }),
                Ok(None) => {}
                Err(source) => violations.push(ValidationError::InvalidChecksum {
                    key: key.clone(),
                    source,
                }),
            }
        }

        match violations.len() {
            0 => Ok(()),
            1 => Err(violations.remove(0)),
            _ => Err(ValidationError::Multiple(violations)),
        }
    }
}
