use crate::provisioner::{ServiceInfo, ServiceProvisioner};
use crate::spec::ContainerSpec;
use crate::types::ServiceId;
use crate::ProvisionerError;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MockState {
    calls: usize,
    services: Vec<ServiceInfo>,
    specs: Vec<ContainerSpec>,
}

/// In-memory enclave that records every service it is asked to create.
///
/// Identifiers must be unique within one mock enclave, like a real one.
/// `failing_on_call(k)` makes the k-th `create_service` call (1-based) fail
/// without recording anything.
#[derive(Default)]
pub struct MockProvisioner {
    fail_on_call: Option<usize>,
    state: Mutex<MockState>,
}

impl MockProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on_call(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Number of `create_service` calls made, including failed ones.
    pub fn calls(&self) -> usize {
        self.state().calls
    }

    /// Services created so far, in creation order.
    pub fn created(&self) -> Vec<ServiceId> {
        self.state()
            .services
            .iter()
            .map(|i| i.service_id.clone())
            .collect()
    }

    /// Container specs handed to successful `create_service` calls.
    pub fn specs(&self) -> Vec<ContainerSpec> {
        self.state().specs.clone()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state poisoned")
    }

    fn mock_address(index: usize) -> String {
        format!("10.42.{}.{}", index / 250, index % 250 + 2)
    }
}

impl ServiceProvisioner for MockProvisioner {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn available(&self) -> bool {
        true
    }

    fn create_service(
        &self,
        service_id: &ServiceId,
        spec: &ContainerSpec,
    ) -> Result<ServiceInfo, ProvisionerError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| ProvisionerError::ExecFailed(format!("mutex poisoned: {e}")))?;
        state.calls += 1;

        if self.fail_on_call == Some(state.calls) {
            return Err(ProvisionerError::Rejected(format!(
                "mock failure injected on call {}",
                state.calls
            )));
        }
        if state.services.iter().any(|s| s.service_id == *service_id) {
            return Err(ProvisionerError::AlreadyExists(service_id.to_string()));
        }

        let info = ServiceInfo {
            service_id: service_id.clone(),
            ip_address: Self::mock_address(state.services.len()),
            ports: spec.used_ports.clone(),
        };
        state.services.push(info.clone());
        state.specs.push(spec.clone());
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{PortProtocol, PortSpec};

    fn test_spec() -> ContainerSpec {
        ContainerSpec::new("example/datastore")
            .with_port("grpc", PortSpec::new(1323, PortProtocol::Tcp))
    }

    #[test]
    fn mock_records_services_in_order() {
        let mock = MockProvisioner::new();
        let spec = test_spec();

        let a = mock.create_service(&ServiceId::new("a"), &spec).unwrap();
        let b = mock.create_service(&ServiceId::new("b"), &spec).unwrap();

        assert_eq!(a.ip_address, "10.42.0.2");
        assert_eq!(b.ip_address, "10.42.0.3");
        assert_eq!(b.ports, spec.used_ports);
        assert_eq!(mock.created(), vec![ServiceId::new("a"), ServiceId::new("b")]);
        assert_eq!(mock.calls(), 2);
        assert_eq!(mock.specs(), vec![spec.clone(), spec]);
    }

    #[test]
    fn mock_rejects_duplicate_service_id() {
        let mock = MockProvisioner::new();
        let spec = test_spec();
        mock.create_service(&ServiceId::new("dup"), &spec).unwrap();

        let err = mock.create_service(&ServiceId::new("dup"), &spec).unwrap_err();
        assert!(matches!(err, ProvisionerError::AlreadyExists(ref id) if id == "dup"));
        assert_eq!(mock.created().len(), 1);
        assert_eq!(mock.calls(), 2);
    }

    #[test]
    fn mock_failure_injection_hits_only_that_call() {
        let mock = MockProvisioner::failing_on_call(2);
        let spec = test_spec();

        assert!(mock.create_service(&ServiceId::new("s0"), &spec).is_ok());
        let err = mock.create_service(&ServiceId::new("s1"), &spec).unwrap_err();
        assert!(matches!(err, ProvisionerError::Rejected(_)));
        assert!(mock.create_service(&ServiceId::new("s1"), &spec).is_ok());

        assert_eq!(mock.created(), vec![ServiceId::new("s0"), ServiceId::new("s1")]);
        assert_eq!(mock.calls(), 3);
    }

    #[test]
    #[should_panic(expected = "mock state poisoned")]
    fn poisoned_mock_does_not_report_empty_state() {
        let mock = std::sync::Arc::new(MockProvisioner::new());
        let m = std::sync::Arc::clone(&mock);
        let _ = std::thread::spawn(move || {
            let _guard = m.state.lock().unwrap();
            panic!("poison the mock");
        })
        .join();

        let _ = mock.calls();
    }

    #[test]
    fn mock_is_always_available() {
        let mock = MockProvisioner::new();
        assert!(mock.available());
        assert_eq!(mock.name(), "mock");
    }
}
