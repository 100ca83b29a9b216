//! CLI entry point for modbinds
//!
//! Provides command-line access to parsing mod text files, previewing
//! binding conflicts, and installing or uninstalling a mod's input and
//! user settings.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use modbinds::config::{ConfigManager, GameVersion, Installer, TargetFile};
use modbinds::core::{
    conflict::{ConflictResolver, FixedResolver, MergeEngine, Resolution},
    parser::parse_input_settings,
    Key, ModSettings,
};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "modbinds")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct Target {
    /// Game settings directory (holds input.settings and user.settings)
    #[arg(short, long, default_value = "~/Documents/The Witcher 3")]
    settings_dir: PathBuf,

    /// Game version: classic or ng
    #[arg(short, long, default_value = "classic")]
    game_version: GameVersion,

    /// Menu configuration directory (holds input.xml and hidden.xml)
    #[arg(short, long)]
    menu_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the bindings and settings found in mod text files
    List {
        /// Mod text files to scan
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show which mod bindings conflict with the installed ones
    Check {
        #[command(flatten)]
        target: Target,

        /// Mod text files to scan
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Merge a mod's bindings and settings into the game settings
    Install {
        #[command(flatten)]
        target: Target,

        /// Replace every conflicting binding without asking
        #[arg(long, conflicts_with = "reject_all")]
        accept_all: bool,

        /// Keep every installed binding without asking
        #[arg(long)]
        reject_all: bool,

        /// Mod text files to scan
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Remove a mod's bindings and settings from the game settings
    Uninstall {
        #[command(flatten)]
        target: Target,

        /// Mod text files to scan
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modbinds=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List { files } => list_records(&files)?,
        Commands::Check { target, files } => check_conflicts(&target, &files)?,
        Commands::Install {
            target,
            accept_all,
            reject_all,
            files,
        } => {
            let mut resolver: Box<dyn ConflictResolver> = if accept_all {
                Box::new(FixedResolver(Resolution::AcceptAll))
            } else if reject_all {
                Box::new(FixedResolver(Resolution::RejectAll))
            } else {
                Box::new(PromptResolver::new())
            };
            install(&target, &files, resolver.as_mut())?
        }
        Commands::Uninstall { target, files } => uninstall(&target, &files)?,
    }

    Ok(())
}

/// Asks on the terminal how to resolve each conflict.
struct PromptResolver {
    stdin: io::Stdin,
}

impl PromptResolver {
    fn new() -> Self {
        Self { stdin: io::stdin() }
    }
}

impl ConflictResolver for PromptResolver {
    fn decide(&mut self, existing: &Key, incoming: &Key, context: &str, just_modifiers: bool) -> Resolution {
        println!("{} {}", "Conflict in".yellow().bold(), context.cyan());
        if just_modifiers {
            println!("  Same key, different parameters:");
        } else {
            println!("  Same action, different key:");
        }
        println!("  {} {}", "installed:".dimmed(), existing.to_string().red());
        println!("  {} {}", "mod:      ".dimmed(), incoming.to_string().green());

        loop {
            print!("  Use the mod's binding? [y]es / [n]o / [Y]es to all / [N]o to all: ");
            // A failed flush only delays the prompt text
            let _ = io::stdout().flush();

            let mut answer = String::new();
            match self.stdin.lock().read_line(&mut answer) {
                // Closed stdin: keep what is installed
                Ok(0) | Err(_) => return Resolution::RejectAll,
                Ok(_) => {}
            }

            match answer.trim() {
                "y" | "yes" => return Resolution::Accept,
                "n" | "no" => return Resolution::Reject,
                "Y" => return Resolution::AcceptAll,
                "N" => return Resolution::RejectAll,
                _ => println!("  {}", "Please answer y, n, Y or N".yellow()),
            }
        }
    }
}

/// Expand `~` in a user supplied path
fn expand_path(path: &Path) -> anyhow::Result<PathBuf> {
    let expanded = shellexpand::tilde(
        path.to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid path encoding"))?,
    );
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Read and parse every mod file, reporting files that fail
fn collect_mod_settings(files: &[PathBuf]) -> anyhow::Result<ModSettings> {
    let mut blobs = Vec::new();
    for file in files {
        let path = expand_path(file)?;
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        blobs.push((path.display().to_string(), text));
    }

    let (mod_settings, errors) =
        ModSettings::collect(blobs.iter().map(|(name, text)| (name.as_str(), text.as_str())));

    for error in &errors {
        eprintln!("{} {}", "✗".red(), error);
    }
    if !errors.is_empty() {
        anyhow::bail!("{} file(s) could not be parsed", errors.len());
    }

    Ok(mod_settings)
}

fn open_manager(target: &Target) -> anyhow::Result<ConfigManager> {
    let settings_dir = expand_path(&target.settings_dir)?;
    let manager = ConfigManager::new(settings_dir, target.game_version)
        .context("Failed to open settings directory")?;

    match &target.menu_dir {
        Some(menu_dir) => manager
            .with_menu_dir(expand_path(menu_dir)?)
            .context("Failed to open menu directory"),
        None => Ok(manager),
    }
}

/// List everything the mod files contain
fn list_records(files: &[PathBuf]) -> anyhow::Result<()> {
    let mod_settings = collect_mod_settings(files)?;

    println!("{}", "Input settings:".bold());
    let mut context = None;
    for key in &mod_settings.input_keys {
        if context != Some(&key.context) {
            context = Some(&key.context);
            println!("{}", key.context.cyan().bold());
        }
        if !key.is_placeholder() {
            println!("  {}", key);
        }
    }

    println!("\n{}", "User settings:".bold());
    for setting in &mod_settings.user_settings {
        println!("  {} {}", format!("[{}]", setting.context).cyan(), setting);
    }

    if !mod_settings.xml_vars.is_empty() || !mod_settings.hidden_vars.is_empty() {
        println!("\n{}", "Menu vars:".bold());
        for var in &mod_settings.xml_vars {
            println!("  {}", var);
        }
        for var in &mod_settings.hidden_vars {
            println!("  {} {}", "hidden".dimmed(), var);
        }
    }

    if !mod_settings.menus.is_empty() {
        println!("\n{}", "Menu files:".bold());
        for menu in &mod_settings.menus {
            println!("  {}", menu);
        }
    }

    println!(
        "\n{} Total: {} bindings, {} settings, {} menu vars",
        "✓".green(),
        mod_settings.input_keys.iter().filter(|k| k.is_binding()).count(),
        mod_settings.user_settings.len(),
        mod_settings.xml_vars.len() + mod_settings.hidden_vars.len()
    );

    Ok(())
}

/// Preview conflicts without writing anything
fn check_conflicts(target: &Target, files: &[PathBuf]) -> anyhow::Result<()> {
    let manager = open_manager(target)?;
    let mod_settings = collect_mod_settings(files)?;

    let existing = match manager.read_target(TargetFile::InputSettings)? {
        Some(text) => parse_input_settings(&text).context("Failed to parse input.settings")?,
        None => Vec::new(),
    };

    let mut engine = MergeEngine::new(existing);
    let conflicts = engine.scan(&mod_settings.input_keys);

    if conflicts.is_empty() {
        println!("{} {}", "✓".green().bold(), "No conflicts detected!".bold());
        return Ok(());
    }

    println!(
        "{} Found {} conflict{}:\n",
        "✗".red().bold(),
        conflicts.len(),
        if conflicts.len() == 1 { "" } else { "s" }
    );

    for (i, conflict) in conflicts.iter().enumerate() {
        println!(
            "{} {} {}",
            format!("Conflict {}", i + 1).yellow().bold(),
            conflict.incoming.context.cyan(),
            conflict.incoming.to_string().green()
        );
        for (idx, existing) in conflict.conflicting.iter().enumerate() {
            println!("  {} {}", format!("{}.", idx + 1).dimmed(), existing.to_string().red());
        }
        println!();
    }

    std::process::exit(1);
}

fn install(target: &Target, files: &[PathBuf], resolver: &mut dyn ConflictResolver) -> anyhow::Result<()> {
    let manager = open_manager(target)?;
    let mod_settings = collect_mod_settings(files)?;
    let installer = Installer::new(&manager);

    let report = installer
        .install(&mod_settings, resolver)
        .context("Failed to install mod")?;

    println!(
        "{} {} binding{} added, {} skipped, {} user setting{} applied",
        "✓".green(),
        report.input.added,
        if report.input.added == 1 { "" } else { "s" },
        report.input.skipped,
        report.user_settings,
        if report.user_settings == 1 { "" } else { "s" }
    );
    if report.xml_vars > 0 || report.menus > 0 {
        println!(
            "{} {} menu var(s) and {} menu file entr{} added",
            "✓".green(),
            report.xml_vars,
            report.menus,
            if report.menus == 1 { "y" } else { "ies" }
        );
    }

    Ok(())
}

fn uninstall(target: &Target, files: &[PathBuf]) -> anyhow::Result<()> {
    let manager = open_manager(target)?;
    let mod_settings = collect_mod_settings(files)?;
    let installer = Installer::new(&manager);

    let report = installer
        .uninstall(&mod_settings)
        .context("Failed to uninstall mod")?;

    println!(
        "{} {} binding(s), {} user setting(s) and {} menu var(s) removed",
        "✓".green(),
        report.bindings,
        report.user_settings,
        report.xml_vars
    );

    Ok(())
}
