//! CLI command implementations
//!
//! Each subcommand has its own module with an Args type and a `run()`
//! function; all pack logic lives in `SoundPackManager`.

use clap::Subcommand;

pub mod pack;
pub mod sfx;

use crate::app::AppContext;
use crate::error::Result;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install, enable and remove sound packs
    Pack(pack::PackArgs),

    /// Inspect and edit individual Claude Code sound hooks
    Sfx(sfx::SfxArgs),
}

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Pack(args) => pack::run(ctx, args),
        Commands::Sfx(args) => sfx::run(ctx, args),
    }
}
