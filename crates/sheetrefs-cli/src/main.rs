//! SheetRefs CLI
//!
//! Opens rulebook page references (e.g. "B102, CI45") from the command line.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use sheetrefs::references::{
    split_citation_list, Citation, CommandViewer, FileLocator, NoFileLocator,
    OpenMode, OpenPageReferenceCommand, PageViewer, ReferenceResolver, ReferenceRow,
    RegistryBackendSetting, ResolverSettings, RfdFileLocator, RowKind, SourceRef, ViewerSession,
    ViewerSessions,
};

/// SheetRefs - open rulebook page references
#[derive(Parser)]
#[command(name = "pageref")]
#[command(
    author,
    version,
    about = "SheetRefs - open rulebook page references in a PDF viewer"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (defaults to settings.json in the app data folder)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Source registry file, overriding the settings
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// Use the SQLite registry instead of the JSON one
    #[arg(long, global = true)]
    sqlite: bool,

    /// Print what would be shown instead of launching a viewer
    #[arg(long, global = true)]
    dry_run: bool,

    /// Never show the locate-file dialog; unknown prefixes are skipped
    #[arg(long, global = true)]
    no_prompt: bool,

    /// More logging (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the page(s) a reference field points at
    Open {
        /// Reference field, e.g. "B102, CI45"
        reference: String,

        /// Open every citation instead of only the first
        #[arg(short, long)]
        each: bool,

        /// Text to highlight on the page (usually the row name)
        #[arg(long)]
        highlight: Option<String>,
    },

    /// Show how a reference field splits into citations
    Split {
        /// Reference field, e.g. "B102, CI45"
        reference: String,
    },

    /// Manage prefix -> file registrations
    Registry {
        #[command(subcommand)]
        action: RegistryAction,
    },

    /// Show the effective settings
    Settings {
        /// Write the effective settings back to the settings file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Subcommand)]
enum RegistryAction {
    /// List registered sources
    List,

    /// Register a file for a prefix
    Set {
        prefix: String,
        path: PathBuf,

        /// Added to printed page numbers to get the PDF page
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        offset: i32,
    },

    /// Forget the file registered for a prefix
    Remove { prefix: String },
}

// ============================================================================
// Dry-run viewer
// ============================================================================

/// Prints sessions instead of showing them.
struct PrintViewer;

impl PrintViewer {
    fn print(action: &str, session: &ViewerSession) {
        let highlight = session
            .highlight
            .as_deref()
            .map(|h| format!(" (highlight {})", h.yellow()))
            .unwrap_or_default();
        println!(
            "{} {} {} {}{}",
            action.bold().white(),
            format!("#{}", session.id).dimmed(),
            session.path.display().to_string().green(),
            format!("page {}", session.page).cyan().bold(),
            highlight
        );
    }
}

impl PageViewer for PrintViewer {
    fn open(&mut self, session: &ViewerSession) -> Result<(), String> {
        Self::print("Open", session);
        Ok(())
    }

    fn go_to_page(&mut self, session: &ViewerSession) -> Result<(), String> {
        Self::print("Go to", session);
        Ok(())
    }

    fn bring_to_front(&mut self, session: &ViewerSession) -> Result<(), String> {
        Self::print("Front", session);
        Ok(())
    }
}

// ============================================================================
// Main
// ============================================================================

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(cli: &Cli) -> Result<(ResolverSettings, PathBuf), String> {
    let path = match &cli.settings {
        Some(p) => p.clone(),
        None => ResolverSettings::default_path()?,
    };
    let mut settings = ResolverSettings::load_from(&path)?;

    if cli.sqlite {
        settings.registry_backend = RegistryBackendSetting::Sqlite;
    }
    if let Some(registry) = &cli.registry {
        settings.registry_path = Some(registry.clone());
    }
    Ok((settings, path))
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    match &cli.command {
        Commands::Split { reference } => {
            display_split(reference);
            Ok(())
        }
        Commands::Open {
            reference,
            each,
            highlight,
        } => {
            let (settings, _) = load_settings(cli)?;
            open_reference(cli, &settings, reference, *each, highlight.as_deref())
        }
        Commands::Registry { action } => {
            let (settings, _) = load_settings(cli)?;
            run_registry(&settings, action)
        }
        Commands::Settings { save } => {
            let (settings, path) = load_settings(cli)?;
            display_settings(&settings, &path)?;
            if *save {
                settings.save_to(&path)?;
                println!("{} {}", "Saved".green().bold(), path.display());
            }
            Ok(())
        }
    }
}

fn open_reference(
    cli: &Cli,
    settings: &ResolverSettings,
    reference: &str,
    each: bool,
    highlight: Option<&str>,
) -> Result<(), String> {
    let command = OpenPageReferenceCommand::new(if each {
        OpenMode::Each
    } else {
        OpenMode::First
    });

    let row = ReferenceRow::new(RowKind::Other, highlight.unwrap_or(""), reference);
    if !command.is_enabled(Some(&row)) {
        println!("{}", "No page references to open.".yellow());
        return Ok(());
    }

    let mut registry = settings.open_registry()?;
    let mut rfd_locator = RfdFileLocator;
    let mut no_locator = NoFileLocator;
    let locator: &mut dyn FileLocator = if cli.no_prompt {
        &mut no_locator
    } else {
        &mut rfd_locator
    };
    let mut sessions = if cli.dry_run {
        ViewerSessions::new(PrintViewer)
    } else {
        ViewerSessions::new(CommandViewer::new(settings.viewer_command.clone()))
    };

    let mut resolver = ReferenceResolver::new(registry.as_mut(), locator, Some(&mut sessions))
        .with_settings(settings);
    let report = command.perform(Some(&row), &mut resolver);

    println!("\n{}", "═══════════════════════════════════════".cyan());
    println!("{}", command.title().bold().yellow());
    for opened in &report.opened {
        let reused = if opened.reused { " (reused)" } else { "" };
        println!(
            "{} {} -> {} page {}{}",
            "Opened:".bold().white(),
            opened.citation.to_string().green().bold(),
            opened.path.display(),
            opened.page.to_string().cyan(),
            reused.dimmed()
        );
    }
    for (citation, reason) in &report.skipped {
        println!(
            "{} {} ({})",
            "Skipped:".bold().white(),
            citation.red(),
            reason.to_string().dimmed()
        );
    }
    println!("{}", "═══════════════════════════════════════".cyan());
    Ok(())
}

fn display_split(reference: &str) {
    let citations = split_citation_list(reference);
    if citations.is_empty() {
        println!("{}", "No citations.".yellow());
        return;
    }

    for (i, citation) in citations.iter().enumerate() {
        match Citation::parse(citation) {
            Ok(c) => println!(
                "{:>3}. {} {} {} {}",
                i + 1,
                "prefix".dimmed(),
                c.prefix.green().bold(),
                "page".dimmed(),
                c.page.to_string().cyan().bold()
            ),
            Err(e) => println!(
                "{:>3}. {} {}",
                i + 1,
                citation.red(),
                format!("({})", e).dimmed()
            ),
        }
    }
}

fn run_registry(settings: &ResolverSettings, action: &RegistryAction) -> Result<(), String> {
    let mut registry = settings.open_registry()?;

    match action {
        RegistryAction::List => {
            let entries = registry.entries()?;
            if entries.is_empty() {
                println!("{}", "No sources registered.".yellow());
            }
            for entry in entries {
                let offset = if entry.page_offset != 0 {
                    format!(" (offset {:+})", entry.page_offset)
                } else {
                    String::new()
                };
                let missing = if entry.path.is_file() {
                    String::new()
                } else {
                    " [missing]".red().to_string()
                };
                println!(
                    "{:>6} {}{}{}",
                    entry.id.green().bold(),
                    entry.path.display(),
                    offset.cyan(),
                    missing
                );
            }
        }
        RegistryAction::Set {
            prefix,
            path,
            offset,
        } => {
            let path = std::path::absolute(path)
                .map_err(|e| format!("Failed to resolve {:?}: {}", path, e))?;
            if !settings.file_filter.matches(&path) {
                println!(
                    "{} {} is not a {} file",
                    "Warning:".yellow().bold(),
                    path.display(),
                    settings.file_filter.name
                );
            }
            registry.put(SourceRef::new(prefix.as_str(), path.clone()).with_page_offset(*offset))?;
            println!(
                "{} {} -> {}",
                "Registered".green().bold(),
                prefix.bold(),
                path.display()
            );
        }
        RegistryAction::Remove { prefix } => {
            if registry.remove(prefix)? {
                println!("{} {}", "Removed".green().bold(), prefix.bold());
            } else {
                println!("{} {}", "Not registered:".yellow(), prefix);
            }
        }
    }
    Ok(())
}

fn display_settings(settings: &ResolverSettings, path: &std::path::Path) -> Result<(), String> {
    println!("{} {}", "Settings file:".bold().white(), path.display());
    println!(
        "{} {} ({})",
        "Registry:".bold().white(),
        settings.resolved_registry_path()?.display(),
        settings.registry_backend.label()
    );
    println!(
        "{} {} {:?}",
        "File filter:".bold().white(),
        settings.file_filter.name,
        settings.file_filter.extensions
    );
    println!(
        "{} {}",
        "Require existing files:".bold().white(),
        settings.require_existing_files
    );
    println!(
        "{} {}",
        "Viewer command:".bold().white(),
        settings.viewer_command.join(" ")
    );
    Ok(())
}
