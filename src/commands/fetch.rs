use anyhow::{Context, Result};
use colored::Colorize;
use plan_check::config;
use plan_check::planinfo::download_upgrade;
use plan_check::utils::download::HttpTransport;
use std::path::Path;

use crate::commands::resolve_daemon_name;

pub fn execute(url: &str, dest: &Path, daemon_name: Option<String>) -> Result<()> {
    let config = config::load_config()?;
    let daemon_name = resolve_daemon_name(daemon_name);
    let transport = HttpTransport::new(&config).context("Failed to set up HTTP client")?;

    println!("Downloading {} from {}", daemon_name.bright_white(), url);
    let binary = download_upgrade(dest, url, &daemon_name, &transport)
        .with_context(|| format!("Failed to fetch upgrade from {}", url))?;

    println!("Verified executable at {}", binary.display().to_string().green());
    Ok(())
}
