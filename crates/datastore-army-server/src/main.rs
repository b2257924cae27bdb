use clap::Parser;
use datastore_army_core::ModuleConfig;
use datastore_army_runtime::select_provisioner;
use datastore_army_server::Module;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(
    name = "datastore-army-server",
    about = "Serve datastore-army execute requests over HTTP"
)]
struct Cli {
    /// Path to the module config file (default: ~/.config/datastore-army/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on. Overrides the config file.
    #[arg(long)]
    listen: Option<String>,

    /// Provisioner backend to use (docker or mock). Overrides the config file.
    #[arg(long)]
    backend: Option<String>,

    /// Enclave to provision services into. Overrides the config file.
    #[arg(long)]
    enclave: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match ModuleConfig::load_or_default(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let backend = cli.backend.unwrap_or(config.provisioner.backend);
    let enclave = cli.enclave.unwrap_or(config.provisioner.enclave);
    let addr = cli.listen.unwrap_or(config.server.listen);

    let provisioner = match select_provisioner(&backend, &enclave) {
        Ok(p) => p,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if !provisioner.available() {
        warn!("{backend} provisioner is not available; execute requests will fail");
    }

    info!("starting datastore-army-server on {addr}");
    info!("provisioning into enclave '{enclave}' via {backend}");

    let module = Arc::new(Module::new(provisioner));
    match datastore_army_server::run_server(&module, &addr) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
