//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::generate;
use super::output::{Output, OutputFormat};
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "toolspec")]
#[command(author, version, about = "Turns command-line tool descriptions into specification documents")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project config file (defaults to the nearest toolspec.toml)
    #[arg(long, short = 'c', global = true, env = "TOOLSPEC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new toolspec project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// List configured tools
    List,

    /// Generate specification documents
    Generate {
        /// Tool to generate (repeatable, defaults to all)
        #[arg(long = "tool", short = 't')]
        tools: Vec<String>,

        /// Output folder (overrides the configured one)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

/// Installs the stderr log subscriber; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format = match cli.format {
        Some(format) => format,
        None => Config::load_global()
            .map(|global| OutputFormat::from(global.default_format))
            .unwrap_or_default(),
    };
    let output = Output::new(format, cli.verbose);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing project at: {}", path));
            let project = Project::init(&path)?;
            output.success(&format!("Initialized toolspec project at {}", project.root().display()));
        }

        Commands::List => generate::list(&output, config)?,

        Commands::Generate { tools, output: output_dir } => {
            generate::generate(&output, config, &tools, output_dir)?
        }
    }

    output.verbose_ctx("run", "Command completed successfully");
    Ok(())
}
