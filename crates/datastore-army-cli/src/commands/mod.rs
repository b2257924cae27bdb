pub mod check;
pub mod completions;
pub mod execute;

use datastore_army_core::ModuleConfig;
use datastore_army_runtime::{select_provisioner, ServiceProvisioner};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MALFORMED_REQUEST: u8 = 2;
pub const EXIT_PROVISIONING_FAILED: u8 = 3;

/// Exit code for a command that failed with `msg`.
///
/// Matches on the leading text of the `CoreError` display strings, since
/// commands hand errors back as rendered messages.
pub fn exit_code_for(msg: &str) -> u8 {
    if msg.starts_with("malformed request:") {
        EXIT_MALFORMED_REQUEST
    } else if msg.starts_with("failed to provision datastore service") {
        EXIT_PROVISIONING_FAILED
    } else {
        EXIT_FAILURE
    }
}

/// Provisioner backend and enclave after applying CLI overrides to the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionerSettings {
    pub backend: String,
    pub enclave: String,
}

impl ProvisionerSettings {
    pub fn resolve(config: &ModuleConfig, backend: Option<&str>, enclave: Option<&str>) -> Self {
        Self {
            backend: backend.unwrap_or(&config.provisioner.backend).to_owned(),
            enclave: enclave.unwrap_or(&config.provisioner.enclave).to_owned(),
        }
    }

    pub fn provisioner(&self) -> Result<Box<dyn ServiceProvisioner>, String> {
        select_provisioner(&self.backend, &self.enclave).map_err(|e| e.to_string())
    }
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}
