//! Upgrade plan info parsing and validation.
//!
//! A plan info document maps `os/arch` platform keys (or `any`) to the URL of
//! the upgrade binary for that platform. [`planinfo`] parses such documents and
//! checks them, from cheap syntactic checks up to downloading every artifact
//! and confirming it contains the expected executable.

pub mod config;
pub mod logging;
pub mod planinfo;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use planinfo::{
    check_plan_info, parse_plan_info, BinaryDownloadUrls, CheckError, DownloadError, ParseError,
    PlanInfo, ValidationError, ValidationMode, Verifier,
};
