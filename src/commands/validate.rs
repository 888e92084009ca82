use anyhow::{Context, Result};
use colored::Colorize;
use plan_check::config::{self, Config};
use plan_check::utils::download::HttpTransport;
use plan_check::{check_plan_info, ValidationMode, Verifier};

use crate::commands::resolve_daemon_name;
use crate::options::ValidateArgs;

pub fn execute(args: &ValidateArgs) -> Result<()> {
    let config = apply_overrides(config::load_config()?, args);
    let daemon_name = resolve_daemon_name(args.daemon_name.clone());

    let mode = if args.no_validate {
        ValidationMode::Skip
    } else if args.basic {
        ValidationMode::BasicOnly
    } else {
        ValidationMode::Full
    };

    let transport = HttpTransport::new(&config).context("Failed to set up HTTP client")?;
    let verifier = Verifier::from_config(&transport, &config);

    match check_plan_info(&args.info, &daemon_name, mode, &verifier)? {
        None => println!("{}", "Validation skipped".yellow()),
        Some(plan) => {
            let checked = match mode {
                ValidationMode::BasicOnly => "syntax checked",
                _ => "verified",
            };
            println!(
                "Plan info {}: {} {} for {}",
                checked.green(),
                plan.binaries.len(),
                if plan.binaries.len() == 1 { "binary" } else { "binaries" },
                daemon_name.bright_white()
            );
        }
    }

    Ok(())
}

fn apply_overrides(mut config: Config, args: &ValidateArgs) -> Config {
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    if args.require_checksum {
        config.require_checksum = true;
    }
    if args.no_progress {
        config.show_progress = false;
    }
    config
}
