mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::ProvisionerSettings;
use datastore_army_core::ModuleConfig;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "datastore-army",
    version,
    about = "Provision batches of identical datastore services in an enclave"
)]
struct Cli {
    /// Path to the module config file (default: ~/.config/datastore-army/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Provisioner backend to use (docker or mock). Overrides the config file.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Enclave to provision services into. Overrides the config file.
    #[arg(long, global = true)]
    enclave: Option<String>,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run execute requests, e.g. '{"numDatastores": 3}'.
    ///
    /// All payloads run in order against one module instance, so service ids
    /// keep counting up from one payload to the next.
    Execute {
        /// JSON request payloads.
        #[arg(required = true)]
        params: Vec<String>,
    },
    /// Check that the selected provisioner backend is usable.
    Check {
        /// Output results as structured JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("DATASTORE_ARMY_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let settings = || -> Result<ProvisionerSettings, String> {
        let config =
            ModuleConfig::load_or_default(cli.config.as_deref()).map_err(|e| e.to_string())?;
        Ok(ProvisionerSettings::resolve(
            &config,
            cli.backend.as_deref(),
            cli.enclave.as_deref(),
        ))
    };

    let result = match cli.command {
        Commands::Execute { params } => {
            settings().and_then(|s| commands::execute::run(&s, &params))
        }
        Commands::Check { json } => settings().and_then(|s| commands::check::run(&s, json)),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(commands::exit_code_for(&msg))
        }
    }
}
