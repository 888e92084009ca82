use anyhow::Result;
use colored::Colorize;
use plan_check::config;
use plan_check::planinfo::{is_valid_platform_key, parse_plan_info};
use plan_check::utils::current_platform_key;

pub fn execute(info: &str) -> Result<()> {
    let config = config::load_config()?;
    let plan = parse_plan_info(info, &config)?;

    if plan.binaries.is_empty() {
        println!("  No binaries listed");
        return Ok(());
    }

    let host = current_platform_key();
    let applies = plan.binaries.entry_for(&host).map(|(key, _)| key);

    println!("Binaries (this host is {}):", host.bright_blue());
    for (platform, url) in plan.binaries.iter() {
        let marker = if applies == Some(platform.as_str()) { "*" } else { " " };

        if is_valid_platform_key(platform) {
            println!("{} {} {}", marker, platform.green(), url);
        } else {
            println!("{} {} {} (invalid key)", marker, platform.red(), url);
        }
    }

    if applies.is_none() {
        println!("{}", "No binary applies to this host".yellow());
    }

    Ok(())
}
