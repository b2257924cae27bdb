use crate::provisioner::{ServiceInfo, ServiceProvisioner};
use crate::spec::ContainerSpec;
use crate::types::ServiceId;
use crate::ProvisionerError;
use std::process::{Command, Output};
use tracing::{debug, info, warn};

const ENCLAVE_LABEL: &str = "datastore-army.enclave";
const SERVICE_ID_LABEL: &str = "datastore-army.service-id";

/// Provisions services as docker containers on a per-enclave docker network.
///
/// Each service becomes a detached container named `<enclave>--<service-id>`,
/// reachable from the other services of the enclave under its service id.
pub struct DockerProvisioner {
    enclave: String,
    docker_bin: String,
}

impl DockerProvisioner {
    pub fn new(enclave: &str) -> Self {
        Self {
            enclave: enclave.to_owned(),
            docker_bin: "docker".to_owned(),
        }
    }

    #[must_use]
    pub fn with_docker_bin(mut self, bin: &str) -> Self {
        self.docker_bin = bin.to_owned();
        self
    }

    pub fn enclave(&self) -> &str {
        &self.enclave
    }

    fn container_name(&self, service_id: &ServiceId) -> String {
        format!("{}--{}", self.enclave, service_id)
    }

    fn docker(&self, args: &[String]) -> Result<Output, ProvisionerError> {
        debug!("{} {}", self.docker_bin, args.join(" "));
        Command::new(&self.docker_bin)
            .args(args)
            .output()
            .map_err(|e| ProvisionerError::ExecFailed(format!("{} failed to start: {e}", self.docker_bin)))
    }

    fn run_args(&self, service_id: &ServiceId, spec: &ContainerSpec) -> Vec<String> {
        let mut args = vec![
            "run".to_owned(),
            "--detach".to_owned(),
            "--name".to_owned(),
            self.container_name(service_id),
            "--network".to_owned(),
            self.enclave.clone(),
            "--network-alias".to_owned(),
            service_id.to_string(),
            "--label".to_owned(),
            format!("{ENCLAVE_LABEL}={}", self.enclave),
            "--label".to_owned(),
            format!("{SERVICE_ID_LABEL}={service_id}"),
        ];
        for port in spec.used_ports.values() {
            args.push("--expose".to_owned());
            args.push(port.to_docker_notation());
        }
        args.push(spec.image.clone());
        args
    }

    fn inspect_args(&self, service_id: &ServiceId) -> Vec<String> {
        vec![
            "inspect".to_owned(),
            "--format".to_owned(),
            format!(
                "{{{{(index .NetworkSettings.Networks \"{}\").IPAddress}}}}",
                self.enclave
            ),
            self.container_name(service_id),
        ]
    }

    /// Force-remove a container that started but could not be registered.
    fn remove_container(&self, service_id: &ServiceId) {
        let name = self.container_name(service_id);
        match self.docker(&["rm".to_owned(), "-f".to_owned(), name.clone()]) {
            Ok(output) if output.status.success() => {
                debug!("removed half-created container {name}");
            }
            Ok(output) => warn!(
                "failed to remove container {name}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            Err(e) => warn!("failed to remove container {name}: {e}"),
        }
    }

    fn lookup_address(&self, service_id: &ServiceId) -> Result<String, ProvisionerError> {
        let output = self.docker(&self.inspect_args(service_id))?;
        if !output.status.success() {
            return Err(ProvisionerError::ExecFailed(format!(
                "docker inspect {} failed: {}",
                self.container_name(service_id),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        let ip_address = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        if ip_address.is_empty() {
            return Err(ProvisionerError::ExecFailed(format!(
                "service {service_id} has no address on network '{}'",
                self.enclave
            )));
        }
        Ok(ip_address)
    }

    /// Create the enclave network unless it already exists.
    fn ensure_network(&self) -> Result<(), ProvisionerError> {
        let inspect = self.docker(&["network".to_owned(), "inspect".to_owned(), self.enclave.clone()])?;
        if inspect.status.success() {
            return Ok(());
        }

        info!("creating enclave network '{}'", self.enclave);
        let output = self.docker(&[
            "network".to_owned(),
            "create".to_owned(),
            "--label".to_owned(),
            format!("{ENCLAVE_LABEL}={}", self.enclave),
            self.enclave.clone(),
        ])?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        // Lost a race with another creator of the same enclave.
        if stderr.contains("already exists") {
            return Ok(());
        }
        Err(ProvisionerError::ExecFailed(format!(
            "docker network create {} failed: {}",
            self.enclave,
            stderr.trim()
        )))
    }
}

/// Map a failed `docker run` onto a provisioner error.
fn classify_run_failure(service_id: &ServiceId, image: &str, stderr: &str) -> ProvisionerError {
    let msg = stderr.to_lowercase();
    if msg.contains("conflict") && msg.contains("already in use") {
        ProvisionerError::AlreadyExists(service_id.to_string())
    } else if msg.contains("unable to find image")
        || msg.contains("pull access denied")
        || msg.contains("manifest unknown")
        || msg.contains("not found: manifest")
    {
        ProvisionerError::ImageNotFound(image.to_owned())
    } else {
        ProvisionerError::ExecFailed(format!("docker run {service_id} failed: {}", stderr.trim()))
    }
}

impl ServiceProvisioner for DockerProvisioner {
    fn name(&self) -> &'static str {
        "docker"
    }

    fn available(&self) -> bool {
        Command::new(&self.docker_bin)
            .args(["version", "--format", "{{.Server.Version}}"])
            .output()
            .is_ok_and(|o| o.status.success())
    }

    fn create_service(
        &self,
        service_id: &ServiceId,
        spec: &ContainerSpec,
    ) -> Result<ServiceInfo, ProvisionerError> {
        self.ensure_network()?;

        let output = self.docker(&self.run_args(service_id, spec))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_run_failure(service_id, &spec.image, &stderr));
        }
        let container_id = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        debug!("service {service_id} started as container {container_id}");

        // Creation is all or nothing: an unregistered container is removed.
        let ip_address = match self.lookup_address(service_id) {
            Ok(ip) => ip,
            Err(e) => {
                self.remove_container(service_id);
                return Err(e);
            }
        };

        Ok(ServiceInfo {
            service_id: service_id.clone(),
            ip_address,
            ports: spec.used_ports.clone(),
        })
    }
}
