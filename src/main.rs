mod commands;
mod options;

use clap::{CommandFactory, Parser};

fn main() -> anyhow::Result<()> {
    let cli = options::Cli::parse();

    plan_check::logging::init_logging(cli.verbose);

    if cli.version {
        options::version::show();
        return Ok(());
    }

    match cli.command {
        Some(options::Commands::Validate(args)) => {
            commands::validate::execute(&args)?;
        }
        Some(options::Commands::Show { info }) => {
            commands::show::execute(&info)?;
        }
        Some(options::Commands::Fetch {
            url,
            dest,
            daemon_name,
        }) => {
            commands::fetch::execute(&url, &dest, daemon_name)?;
        }
        None => {
            let mut cmd = options::Cli::command();
            cmd.print_help()?;
            println!();
        }
    }

    Ok(())
}
