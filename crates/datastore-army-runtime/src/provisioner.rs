use crate::spec::{ContainerSpec, PortSpec};
use crate::types::{PortId, ServiceId};
use crate::ProvisionerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A service that a provisioner has started inside the enclave.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInfo {
    pub service_id: ServiceId,
    /// Address of the service on the enclave network.
    pub ip_address: String,
    pub ports: BTreeMap<PortId, PortSpec>,
}

pub trait ServiceProvisioner: Send + Sync {
    fn name(&self) -> &str;

    fn available(&self) -> bool;

    /// Create a running, network-reachable service named `service_id` from
    /// `spec`. Returns once the container has been started and assigned an
    /// address; no readiness probing is done.
    fn create_service(
        &self,
        service_id: &ServiceId,
        spec: &ContainerSpec,
    ) -> Result<ServiceInfo, ProvisionerError>;
}

pub fn select_provisioner(
    name: &str,
    enclave: &str,
) -> Result<Box<dyn ServiceProvisioner>, ProvisionerError> {
    match name {
        "docker" => Ok(Box::new(crate::docker::DockerProvisioner::new(enclave))),
        "mock" => Ok(Box::new(crate::mock::MockProvisioner::new())),
        other => Err(ProvisionerError::BackendUnavailable(other.to_owned())),
    }
}
