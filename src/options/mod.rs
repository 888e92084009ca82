pub mod version;

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short = 'V', long, action = ArgAction::SetTrue)]
    pub version: bool,

    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse plan info and check every binary it points to
    Validate(ValidateArgs),

    /// Parse plan info and list its binaries
    Show {
        /// Plan info JSON, or a URL serving it
        info: String,
    },

    /// Download one upgrade artifact and check it holds the daemon binary
    Fetch {
        url: String,

        #[arg(short, long)]
        dest: PathBuf,

        /// Executable expected in the artifact [default: $DAEMON_NAME or this program's name]
        #[arg(long)]
        daemon_name: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Plan info JSON, or a URL serving it
    pub info: String,

    /// Executable expected in every artifact [default: $DAEMON_NAME or this program's name]
    #[arg(long)]
    pub daemon_name: Option<String>,

    /// Only run the offline checks, download nothing
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "no_validate")]
    pub basic: bool,

    /// Skip validation of the upgrade info
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_validate: bool,

    /// Number of artifacts downloaded at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Require a checksum query parameter on every binary URL
    #[arg(long, action = ArgAction::SetTrue)]
    pub require_checksum: bool,

    #[arg(long, action = ArgAction::SetTrue)]
    pub no_progress: bool,
}
