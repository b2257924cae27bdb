//! Service provisioning backends for datastore-army enclaves.
//!
//! This crate implements the enclave side of provisioning: the pluggable
//! `ServiceProvisioner` trait, the declarative `ContainerSpec` handed to it,
//! a docker-CLI backend that maps an enclave onto a docker network, and an
//! in-memory mock backend used by tests and dry runs.

pub mod docker;
pub mod mock;
pub mod provisioner;
pub mod spec;
pub mod types;

pub use docker::DockerProvisioner;
pub use mock::MockProvisioner;
pub use provisioner::{select_provisioner, ServiceInfo, ServiceProvisioner};
pub use spec::{ContainerSpec, PortProtocol, PortSpec};
pub use types::{PortId, ServiceId};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionerError {
    #[error("provisioner I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend '{0}' is not available on this system")]
    BackendUnavailable(String),
    #[error("service '{0}' already exists in the enclave")]
    AlreadyExists(String),
    #[error("image not found: {0}")]
    ImageNotFound(String),
    #[error("provisioner command failed: {0}")]
    ExecFailed(String),
    #[error("service creation rejected: {0}")]
    Rejected(String),
}
