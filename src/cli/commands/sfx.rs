//! clod sfx - individual Claude Code sound hooks

use clap::{Args, Subcommand};
use serde_json::json;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_ok};
use crate::error::{ClodError, Result};
use crate::hooks::HookRegistry;
use crate::soundpack::taxonomy;

#[derive(Args, Debug)]
pub struct SfxArgs {
    #[command(subcommand)]
    pub command: SfxCommand,
}

#[derive(Subcommand, Debug)]
pub enum SfxCommand {
    /// List sound hooks and the sounds directory
    List,

    /// Play FILE (from the sounds directory) on HOOK for MATCHER
    Set {
        hook: String,
        matcher: String,
        file: String,
    },

    /// Remove the sound hook for HOOK and MATCHER
    Remove { hook: String, matcher: String },
}

pub fn run(ctx: &AppContext, args: &SfxArgs) -> Result<()> {
    match &args.command {
        SfxCommand::List => run_list(ctx),
        SfxCommand::Set {
            hook,
            matcher,
            file,
        } => run_set(ctx, hook, matcher, file),
        SfxCommand::Remove { hook, matcher } => run_remove(ctx, hook, matcher),
    }
}

fn run_list(ctx: &AppContext) -> Result<()> {
    let registry = ctx.registry();
    let mappings = registry.current_mappings()?;
    let files: Vec<String> = registry
        .sound_files()?
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .collect();

    if ctx.robot_mode {
        return emit_robot(&robot_ok(json!({
            "sounds_dir": registry.sounds_dir(),
            "mappings": mappings,
            "sounds": files,
        })));
    }

    let mut layout = HumanLayout::new();
    layout.section("Sound hooks");
    if mappings.is_empty() {
        layout.push_line("(none)");
    }
    for mapping in &mappings {
        layout.bullet(&format!(
            "{}|{} -> {}",
            mapping.hook_type, mapping.matcher, mapping.sound
        ));
    }
    layout
        .blank()
        .section(&format!("Sounds in {}", registry.sounds_dir().display()));
    if files.is_empty() {
        layout.push_line("(none)");
    }
    for file in &files {
        layout.bullet(file);
    }
    emit_human(layout);
    Ok(())
}

fn run_set(ctx: &AppContext, hook: &str, matcher: &str, file: &str) -> Result<()> {
    let registry = ctx.registry();
    if !registry.set_sound_mapping(hook, matcher, file)? {
        let reason = if taxonomy::is_claude_hook(hook) {
            format!("{file} is not in {}", registry.sounds_dir().display())
        } else {
            let known: Vec<&str> = taxonomy::claude_hooks().collect();
            format!("unknown hook type {hook} (expected one of {})", known.join(", "))
        };
        return Err(ClodError::Config(format!("cannot map {hook}|{matcher}: {reason}")));
    }

    if ctx.robot_mode {
        return emit_robot(&robot_ok(json!({
            "hook_type": hook,
            "matcher": matcher,
            "sound": file,
        })));
    }
    println!("{hook}|{matcher} -> {file}");
    Ok(())
}

fn run_remove(ctx: &AppContext, hook: &str, matcher: &str) -> Result<()> {
    let removed = ctx.registry().remove_sound_mapping(hook, matcher)?;

    if ctx.robot_mode {
        return emit_robot(&robot_ok(json!({
            "hook_type": hook,
            "matcher": matcher,
            "removed": removed,
        })));
    }
    if removed {
        println!("Removed sound hook {hook}|{matcher}");
    } else {
        println!("No sound hook for {hook}|{matcher}");
    }
    Ok(())
}
