//! clod pack - sound pack lifecycle

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::app::AppContext;
use crate::cli::output::{
    HumanLayout, emit_human, emit_json, emit_robot, robot_ok, robot_partial, yes_no,
};
use crate::compile::claude::{apply_bindings, render_hooks};
use crate::compile::opencode::install_template;
use crate::compile::{CompileReport, UnifiedPack};
use crate::error::{ClodError, Result};

#[derive(Args, Debug)]
pub struct PackArgs {
    #[command(subcommand)]
    pub command: PackCommand,
}

#[derive(Subcommand, Debug)]
pub enum PackCommand {
    /// Install a pack from a directory or .zip bundle
    Install(InstallArgs),

    /// List installed packs
    List,

    /// Show a pack's manifest and stored assets
    Show(SlugArgs),

    /// Show where a pack is enabled
    Status(SlugArgs),

    /// Enable a pack for Claude Code and/or Opencode (both by default)
    Enable(EnableArgs),

    /// Disable a pack for Claude Code and/or Opencode (both by default)
    Disable(DisableArgs),

    /// Disable a pack everywhere and delete it
    Uninstall(SlugArgs),

    /// Write the bundled Opencode plugin template to its configured location
    InitTemplate(InitTemplateArgs),

    /// Apply a unified (baseDir) sound pack straight to Claude Code hooks
    ApplyUnified(ApplyUnifiedArgs),
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Bundle directory or .zip archive
    pub source: PathBuf,

    /// Slug to install under instead of the one derived from the pack name
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args, Debug)]
pub struct SlugArgs {
    pub slug: String,
}

#[derive(Args, Debug)]
pub struct EnableArgs {
    pub slug: String,

    #[arg(long)]
    pub claude: bool,

    #[arg(long)]
    pub opencode: bool,

    /// Claude Code tool matcher (defaults to claude.default_matcher)
    #[arg(long)]
    pub matcher: Option<String>,
}

#[derive(Args, Debug)]
pub struct DisableArgs {
    pub slug: String,

    #[arg(long)]
    pub claude: bool,

    #[arg(long)]
    pub opencode: bool,
}

#[derive(Args, Debug)]
pub struct InitTemplateArgs {
    /// Overwrite an existing template
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ApplyUnifiedArgs {
    /// Candidate files; the first readable JSON object is used
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Print the rendered hooks instead of writing settings
    #[arg(long)]
    pub print: bool,
}

pub fn run(ctx: &AppContext, args: &PackArgs) -> Result<()> {
    match &args.command {
        PackCommand::Install(args) => run_install(ctx, args),
        PackCommand::List => run_list(ctx),
        PackCommand::Show(args) => run_show(ctx, &args.slug),
        PackCommand::Status(args) => run_status(ctx, &args.slug),
        PackCommand::Enable(args) => run_enable(ctx, args),
        PackCommand::Disable(args) => run_disable(ctx, args),
        PackCommand::Uninstall(args) => run_uninstall(ctx, &args.slug),
        PackCommand::InitTemplate(args) => run_init_template(ctx, args),
        PackCommand::ApplyUnified(args) => run_apply_unified(ctx, args),
    }
}

/// Neither flag means both hosts.
const fn hosts(claude: bool, opencode: bool) -> (bool, bool) {
    if claude || opencode {
        (claude, opencode)
    } else {
        (true, true)
    }
}

fn run_install(ctx: &AppContext, args: &InstallArgs) -> Result<()> {
    let manager = ctx.manager()?;
    let pack = manager.install(&args.source, args.name.as_deref())?;

    if ctx.robot_mode {
        return emit_robot(&robot_ok(json!({
            "slug": pack.slug,
            "name": pack.manifest.name,
            "version": pack.manifest.version,
            "pack_dir": pack.dir,
            "assets": pack.asset_files(),
        })));
    }

    let mut layout = HumanLayout::new();
    layout
        .ok(&format!("Installed {} ({})", pack.manifest.name, pack.slug))
        .kv("Version", &pack.manifest.version)
        .kv("Location", &pack.dir.display().to_string())
        .kv("Assets", &pack.asset_files().len().to_string());
    emit_human(layout);
    Ok(())
}

fn run_list(ctx: &AppContext) -> Result<()> {
    let packs = ctx.manager()?.list()?;
    debug!(target: "pack", count = packs.len(), "listing packs");

    if ctx.robot_mode {
        return emit_robot(&robot_ok(json!({ "count": packs.len(), "packs": packs })));
    }

    if packs.is_empty() {
        println!("No sound packs installed.");
        return Ok(());
    }
    let mut layout = HumanLayout::new();
    layout.title("Installed sound packs");
    for pack in &packs {
        let mut line = format!("{} {} ({})", pack.slug, pack.version, pack.name);
        if !pack.description.is_empty() {
            line.push_str(&format!(" - {}", pack.description));
        }
        layout.bullet(&line);
    }
    emit_human(layout);
    Ok(())
}

fn run_show(ctx: &AppContext, slug: &str) -> Result<()> {
    let manager = ctx.manager()?;
    let pack = manager
        .get(slug)?
        .ok_or_else(|| ClodError::PackNotFound(slug.to_string()))?;
    let status = manager.status(slug)?;

    if ctx.robot_mode {
        return emit_robot(&robot_ok(json!({
            "slug": pack.slug,
            "pack_dir": pack.dir,
            "manifest": pack.manifest,
            "assets": pack.asset_files(),
            "status": status,
        })));
    }

    let manifest = &pack.manifest;
    let mut layout = HumanLayout::new();
    layout
        .title(&manifest.name)
        .kv("Slug", &pack.slug)
        .kv("Version", &manifest.version);
    if !manifest.author.is_empty() {
        layout.kv("Author", &manifest.author);
    }
    if !manifest.description.is_empty() {
        layout.kv("Description", &manifest.description);
    }
    if !manifest.tags.is_empty() {
        let tags: Vec<&str> = manifest.tags.iter().map(String::as_str).collect();
        layout.kv("Tags", &tags.join(", "));
    }
    layout
        .kv("Claude Code", &yes_no(status.claude_enabled))
        .kv("Opencode", &yes_no(status.opencode_enabled))
        .blank()
        .section("Events");
    for (event_name, event) in &manifest.events {
        let present = pack.asset_path(event).is_some();
        let mut line = format!("{event_name} -> {} (volume {})", event.sound_file, event.volume);
        if !event.enabled {
            line.push_str(" [disabled]");
        }
        if present {
            layout.ok(&line);
        } else {
            layout.fail(&format!("{line} [missing]"));
        }
    }
    emit_human(layout);
    Ok(())
}

fn run_status(ctx: &AppContext, slug: &str) -> Result<()> {
    let status = ctx.manager()?.status(slug)?;

    if ctx.robot_mode {
        return emit_robot(&robot_ok(json!({ "slug": slug, "status": status })));
    }

    let mut layout = HumanLayout::new();
    layout
        .title(slug)
        .kv("Installed", &yes_no(status.installed))
        .kv("Claude Code", &yes_no(status.claude_enabled))
        .kv("Opencode", &yes_no(status.opencode_enabled));
    emit_human(layout);
    Ok(())
}

#[derive(Debug, Default, Serialize)]
struct EnableOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    claude: Option<CompileReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    opencode_plugin: Option<PathBuf>,
}

fn run_enable(ctx: &AppContext, args: &EnableArgs) -> Result<()> {
    let manager = ctx.manager()?;
    let (claude, opencode) = hosts(args.claude, args.opencode);
    let mut outcome = EnableOutcome::default();

    if claude {
        let matcher = args
            .matcher
            .as_deref()
            .unwrap_or(&ctx.config.claude.default_matcher);
        outcome.claude = Some(manager.enable_for_claude(&args.slug, matcher)?);
    }
    if opencode {
        outcome.opencode_plugin = Some(manager.enable_for_opencode(&args.slug)?);
    }

    if ctx.robot_mode {
        return match &outcome.claude {
            Some(report) if !report.is_success() => {
                let warnings = report
                    .failed
                    .iter()
                    .map(|label| format!("not enabled: {label}"))
                    .collect();
                let (completed, failed) = (report.applied.len(), report.failed.len());
                emit_robot(&robot_partial(&outcome, completed, failed, warnings))
            }
            _ => emit_robot(&robot_ok(&outcome)),
        };
    }

    let mut layout = HumanLayout::new();
    if let Some(report) = &outcome.claude {
        layout.section("Claude Code");
        for label in &report.applied {
            layout.ok(label);
        }
        for label in &report.failed {
            layout.fail(label);
        }
    }
    if let Some(path) = &outcome.opencode_plugin {
        layout
            .section("Opencode")
            .ok(&format!("plugin written to {}", path.display()));
    }
    emit_human(layout);
    Ok(())
}

fn run_disable(ctx: &AppContext, args: &DisableArgs) -> Result<()> {
    let manager = ctx.manager()?;
    let (claude, opencode) = hosts(args.claude, args.opencode);

    let claude = if claude {
        Some(manager.disable_for_claude(&args.slug)?)
    } else {
        None
    };
    let opencode = if opencode {
        Some(manager.disable_for_opencode(&args.slug)?)
    } else {
        None
    };

    if ctx.robot_mode {
        return emit_robot(&robot_ok(json!({
            "slug": args.slug,
            "claude": claude,
            "opencode": opencode,
        })));
    }

    let mut layout = HumanLayout::new();
    match claude {
        Some(true) => {
            layout.ok("Claude Code sounds removed");
        }
        Some(false) => {
            layout.fail("Claude Code sounds directory not found; hook entries cleared");
        }
        None => {}
    }
    match opencode {
        Some(true) => {
            layout.ok("Opencode plugin removed");
        }
        Some(false) => {
            layout.fail("no Opencode plugin to remove");
        }
        None => {}
    }
    emit_human(layout);
    Ok(())
}

fn run_uninstall(ctx: &AppContext, slug: &str) -> Result<()> {
    let removed = ctx.manager()?.uninstall(slug)?;

    if ctx.robot_mode {
        return emit_robot(&robot_ok(json!({ "slug": slug, "removed": removed })));
    }
    if removed {
        println!("Uninstalled {slug}");
    } else {
        println!("{slug} is not installed");
    }
    Ok(())
}

fn run_init_template(ctx: &AppContext, args: &InitTemplateArgs) -> Result<()> {
    let path = &ctx.config.paths.opencode_template;
    let written = install_template(path, args.force)?;

    if ctx.robot_mode {
        return emit_robot(&robot_ok(json!({ "path": path, "written": written })));
    }
    if written {
        println!("Template written to {}", path.display());
    } else {
        println!(
            "Template already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    Ok(())
}

fn run_apply_unified(ctx: &AppContext, args: &ApplyUnifiedArgs) -> Result<()> {
    let Some((path, pack)) = UnifiedPack::load_from_paths(&args.files) else {
        return Err(ClodError::Config(format!(
            "no readable unified sound pack among {} candidate(s)",
            args.files.len()
        )));
    };
    let bindings = pack.bindings();
    debug!(target: "pack", path = %path.display(), bindings = bindings.len(), "applying unified pack");

    if args.print {
        let table = render_hooks(
            &bindings,
            &ctx.config.paths.claude_sounds_dir,
            &ctx.config.claude.player,
        )?;
        let hooks = json!({ "hooks": table });
        return if ctx.robot_mode {
            emit_robot(&robot_ok(hooks))
        } else {
            emit_json(&hooks)
        };
    }

    let registry = ctx.registry();
    let report = apply_bindings(&bindings, registry.sounds_dir(), &registry)?;

    if ctx.robot_mode {
        let data = json!({ "source": path, "report": report });
        return if report.is_success() {
            emit_robot(&robot_ok(data))
        } else {
            let (completed, failed) = (report.applied.len(), report.failed.len());
            emit_robot(&robot_partial(data, completed, failed, Vec::new()))
        };
    }

    let mut layout = HumanLayout::new();
    layout.section(&format!("Applied {}", path.display()));
    for label in &report.applied {
        layout.ok(label);
    }
    for label in &report.failed {
        layout.fail(label);
    }
    emit_human(layout);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_host_flag_means_both() {
        assert_eq!(hosts(false, false), (true, true));
        assert_eq!(hosts(true, false), (true, false));
        assert_eq!(hosts(false, true), (false, true));
    }
}
