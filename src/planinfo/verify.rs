use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use super::error::ValidationError;
use super::upgrade::download_upgrade;
use super::{BinaryDownloadUrls, PlanInfo};
use crate::config::Config;
use crate::utils::download::Transport;
use crate::utils::platform_dir_name;

const SCRATCH_PREFIX: &str = "os-arch-downloads";

/// How much checking a caller wants before trusting a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Basic checks, then download and inspect every artifact.
    #[default]
    Full,
    /// Basic checks only, no network access.
    BasicOnly,
    /// Accept the plan without looking at it.
    Skip,
}

/// Runs basic and artifact checks against plans, downloading through `transport`.
pub struct Verifier<'a> {
    transport: &'a dyn Transport,
    concurrency: usize,
    require_checksum: bool,
    scratch_parent: Option<PathBuf>,
}

impl<'a> Verifier<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self {
            transport,
            concurrency: 1,
            require_checksum: false,
            scratch_parent: None,
        }
    }

    pub fn from_config(transport: &'a dyn Transport, config: &Config) -> Self {
        Self::new(transport)
            .concurrency(config.concurrency)
            .require_checksum(config.require_checksum)
            .scratch_parent(config.scratch_parent.clone())
    }

    pub fn concurrency(mut self, workers: usize) -> Self {
        self.concurrency = workers.max(1);
        self
    }

    pub fn require_checksum(mut self, required: bool) -> Self {
        self.require_checksum = required;
        self
    }

    pub fn scratch_parent(mut self, parent: Option<PathBuf>) -> Self {
        self.scratch_parent = parent;
        self
    }

    pub fn transport(&self) -> &'a dyn Transport {
        self.transport
    }

    pub fn validate_basic(&self, plan: &PlanInfo) -> Result<(), ValidationError> {
        plan.binaries.validate_basic_with(self.require_checksum)
    }

    /// Basic validation, then the artifact check. Nothing is downloaded unless
    /// the basic validation passes.
    ///
    /// Warning: this downloads every artifact in the plan.
    pub fn validate_full(&self, plan: &PlanInfo, daemon_name: &str) -> Result<(), ValidationError> {
        self.validate_basic(plan)?;
        self.check_urls(&plan.binaries, daemon_name)
    }

    pub fn validate(
        &self,
        plan: &PlanInfo,
        daemon_name: &str,
        mode: ValidationMode,
    ) -> Result<(), ValidationError> {
        match mode {
            ValidationMode::Full => self.validate_full(plan, daemon_name),
            ValidationMode::BasicOnly => self.validate_basic(plan),
            ValidationMode::Skip => Ok(()),
        }
    }

    /// Downloads every entry into its own subdirectory of a fresh scratch
    /// directory and checks it holds an executable named `daemon_name`.
    ///
    /// Stops at the first failure. When several entries fail, the one earliest
    /// in key order is reported. The scratch directory is gone when this returns.
    pub fn check_urls(
        &self,
        binaries: &BinaryDownloadUrls,
        daemon_name: &str,
    ) -> Result<(), ValidationError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        let scratch = match &self.scratch_parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(ValidationError::ScratchDir)?;
        tracing::debug!(path = %scratch.path().display(), "created scratch directory");

        let result = if self.concurrency <= 1 || binaries.len() <= 1 {
            self.check_sequential(scratch.path(), binaries, daemon_name)
        } else {
            self.check_parallel(scratch.path(), binaries, daemon_name)
        };

        let scratch_path = scratch.path().to_path_buf();
        if let Err(err) = scratch.close() {
            tracing::warn!(path = %scratch_path.display(), "could not remove scratch directory: {}", err);
        }

        result
    }

    fn check_sequential(
        &self,
        scratch: &Path,
        binaries: &BinaryDownloadUrls,
        daemon_name: &str,
    ) -> Result<(), ValidationError> {
        for (platform, url) in binaries.iter() {
            self.check_one(scratch, platform, url, daemon_name)?;
        }
        Ok(())
    }

    fn check_parallel(
        &self,
        scratch: &Path,
        binaries: &BinaryDownloadUrls,
        daemon_name: &str,
    ) -> Result<(), ValidationError> {
        let entries: Vec<(&String, &String)> = binaries.iter().collect();
        let workers = self.concurrency.min(entries.len());
        let next = AtomicUsize::new(0);
        let failed = AtomicBool::new(false);

        let entries = &entries;
        let next = &next;
        let failed = &failed;

        let mut failures: Vec<(usize, ValidationError)> = thread::scope(|s| {
            let mut handles = Vec::with_capacity(workers);
            for _ in 0..workers {
                handles.push(s.spawn(move || {
                    let mut errors = Vec::new();
                    while !failed.load(Ordering::SeqCst) {
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        let Some((platform, url)) = entries.get(index) else {
                            break;
                        };
                        if let Err(err) = self.check_one(scratch, platform, url, daemon_name) {
                            failed.store(true, Ordering::SeqCst);
                            errors.push((index, err));
                        }
                    }
                    errors
                }));
            }

            let mut failures = Vec::new();
            for handle in handles {
                match handle.join() {
                    Ok(mut errors) => failures.append(&mut errors),
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
            failures
        });

        failures.sort_by_key(|(index, _)| *index);
        match failures.into_iter().next() {
            Some((_, err)) => Err(err),
            None => Ok(()),
        }
    }

    fn check_one(
        &self,
        scratch: &Path,
        platform: &str,
        url: &str,
        daemon_name: &str,
    ) -> Result<(), ValidationError> {
        let dst_root = scratch.join(platform_dir_name(platform));
        tracing::info!(%platform, %url, "checking upgrade binary");

        match download_upgrade(&dst_root, url, daemon_name, self.transport) {
            Ok(binary) => {
                tracing::info!(%platform, binary = %binary.display(), "upgrade binary verified");
                Ok(())
            }
            Err(source) => {
                tracing::warn!(%platform, "upgrade binary check failed: {}", source);
                Err(ValidationError::Artifact {
                    platform: platform.to_string(),
                    source,
                })
            }
        }
    }
}
