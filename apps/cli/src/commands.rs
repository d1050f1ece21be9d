//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use tracing::info;

use interbuild_core::{CompositeContextBuilder, DiagnosticSink, print_context};
use interbuild_launcher::{BuildRequestContext, ManifestBackend, OutputListener};
use interbuild_registry::CompositeBuildContext;
use interbuild_shared::{
    LaunchParameters, LogLevel, ParticipantBuild, config_file_path, init_config, load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// interbuild — combine independent builds into one composite session.
#[derive(Parser)]
#[command(
    name = "interbuild",
    version,
    about = "Build a shared project-component registry across independent build trees.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build the composite context across the configured participants.
    Build {
        /// Participant root directory (repeatable; overrides config entries).
        #[arg(short, long)]
        participant: Vec<PathBuf>,

        /// Replace earlier registrations on duplicate component ids.
        #[arg(long)]
        overwrite: bool,

        /// Base log verbosity: quiet, warn, info, or debug.
        #[arg(long)]
        log_level: Option<String>,

        /// Emit the resulting context as JSON instead of text lines.
        #[arg(long)]
        json: bool,
    },

    /// List the participants registered in the config file.
    List,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "interbuild=info",
        1 => "interbuild=debug",
        _ => "interbuild=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build {
            participant,
            overwrite,
            log_level,
            json,
        } => cmd_build(participant, overwrite, log_level.as_deref(), json).await,
        Command::List => cmd_list().await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Console sinks
// ---------------------------------------------------------------------------

/// Forwards participant output lines to stdout.
struct StdoutListener;

impl OutputListener for StdoutListener {
    fn on_line(&self, line: &str) {
        println!("{line}");
    }
}

/// Forwards participant error lines to stderr.
struct StderrListener;

impl OutputListener for StderrListener {
    fn on_line(&self, line: &str) {
        eprintln!("{line}");
    }
}

/// Prints orchestrator diagnostics to stdout.
struct ConsoleSink;

impl DiagnosticSink for ConsoleSink {
    fn line(&self, message: &str) {
        println!("{message}");
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_build(
    participant_flags: Vec<PathBuf>,
    overwrite: bool,
    log_level: Option<&str>,
    json: bool,
) -> Result<()> {
    let config = load_config()?;

    let roots: Vec<PathBuf> = if participant_flags.is_empty() {
        config
            .participants
            .iter()
            .map(|entry| PathBuf::from(&entry.path))
            .collect()
    } else {
        participant_flags
    };

    if roots.is_empty() {
        return Err(eyre!(
            "no participants given; pass --participant or register [[participants]] in the config"
        ));
    }

    let participants: Vec<ParticipantBuild> =
        roots.into_iter().map(ParticipantBuild::new).collect();

    let mut base = LaunchParameters::from(&config);
    base.project_dir = std::env::current_dir()
        .map_err(|e| eyre!("cannot determine working directory: {e}"))?;
    if let Some(level) = log_level {
        base.log_level = level
            .parse::<LogLevel>()
            .map_err(|e| eyre!("invalid --log-level: {e}"))?;
    }

    let backend = ManifestBackend::new(config.discovery.clone());
    let request =
        BuildRequestContext::new(Arc::new(StdoutListener), Arc::new(StderrListener));
    let mut registry =
        CompositeBuildContext::new(overwrite || config.defaults.overwrite_duplicates);

    let builder = CompositeContextBuilder::new(&backend, participants)
        .with_diagnostics(Arc::new(ConsoleSink));

    builder
        .build_composite_context(&base, &request, &mut registry)
        .await?;

    info!(components = registry.len(), "composite context ready");

    if json {
        let rendered = serde_json::to_string_pretty(&registry.snapshot())?;
        println!("{rendered}");
    } else {
        let mut stdout = std::io::stdout().lock();
        print_context(&registry, &mut stdout)?;
    }

    Ok(())
}

async fn cmd_list() -> Result<()> {
    let config = load_config()?;

    if config.participants.is_empty() {
        println!("No participants registered. Add [[participants]] entries to the config.");
        return Ok(());
    }

    for entry in &config.participants {
        println!("{}\t{}", entry.name, entry.path);
    }
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Created {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let rendered = toml::to_string_pretty(&config)?;
    println!("# {}", config_file_path()?.display());
    print!("{rendered}");
    Ok(())
}
