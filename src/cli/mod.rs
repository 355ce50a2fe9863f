//! Command-line surface for clod.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

pub use commands::Commands;

#[derive(Parser, Debug)]
#[command(name = "clod", version, about = "Sound packs for Claude Code and Opencode")]
pub struct Cli {
    /// Emit machine-readable JSON on stdout
    #[arg(long, global = true)]
    pub robot: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file to use instead of the global one
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["clod", "pack", "list", "--robot", "-vv"]).unwrap();
        assert!(cli.robot);
        assert_eq!(cli.verbose, 2);
    }
}
