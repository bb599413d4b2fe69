//! Lunabind CLI - run Lua scripts against the lunabind engine

use anyhow::Result;
use clap::{Parser, Subcommand};
use lunabind_engine::Engine;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{call, demo, eval, run};

#[derive(Parser)]
#[command(name = "lunabind")]
#[command(about = "Run Lua scripts through the lunabind engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to an engine configuration file (JSON)
    #[arg(long, global = true, env = "LUNABIND_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Lua file and print what it returns
    Run {
        /// Path to the Lua file
        file: PathBuf,
    },

    /// Evaluate a Lua chunk and print what it returns
    Eval {
        /// Lua source
        source: String,
    },

    /// Load a Lua file, then call one of its global functions
    Call {
        /// Path to the Lua file
        file: PathBuf,

        /// Global function name
        function: String,

        /// Arguments as JSON values; anything that is not JSON is passed as a string
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Walk through the engine features
    Demo,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.debug);

    // Load configuration
    let config = config::load_config(cli.config.as_deref(), cli.debug)?;
    let engine = Engine::with_config(config)?;

    // Handle commands
    let code = match cli.command {
        Commands::Run { file } => run::run_file(&engine, &file),
        Commands::Eval { source } => eval::eval_source(&engine, &source),
        Commands::Call {
            file,
            function,
            args,
        } => call::call_function(&engine, &file, &function, &args),
        Commands::Demo => demo::run_demo(&engine)?,
    };

    Ok(code)
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
