use crate::datastore::{datastore_container_spec, datastore_service_id, DATASTORE_PORT_ID};
use crate::params::{decode_params, ProvisionRequest};
use crate::result::{encode_result, ProvisionResult};
use crate::CoreError;
use datastore_army_runtime::{PortId, ServiceId, ServiceProvisioner};
use tracing::{debug, info, warn};

/// Adds datastore services to an enclave in numbered batches.
///
/// The orchestrator owns the sequence counter used to name services, so ids
/// keep increasing across batches run on the same value and are never reused,
/// even for services that were left behind by a failed batch. Independent
/// orchestrators (one per enclave) do not share any state.
///
/// Batches run sequentially and are not cancellable. A batch either creates
/// every requested service or fails on the first provisioner error; services
/// created before the failure are not removed.
#[derive(Debug, Default)]
pub struct DatastoreArmy {
    num_datastores_added: usize,
}

impl DatastoreArmy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of datastores successfully created over this value's lifetime.
    pub fn num_datastores_added(&self) -> usize {
        self.num_datastores_added
    }

    /// Decode `serialized_params`, provision the batch it asks for and encode
    /// the created service ids.
    pub fn execute<P>(&mut self, provisioner: &P, serialized_params: &str) -> Result<String, CoreError>
    where
        P: ServiceProvisioner + ?Sized,
    {
        let request = decode_params(serialized_params)?;
        let result = self.provision(provisioner, &request)?;
        encode_result(&result)
    }

    pub fn provision<P>(
        &mut self,
        provisioner: &P,
        request: &ProvisionRequest,
    ) -> Result<ProvisionResult, CoreError>
    where
        P: ServiceProvisioner + ?Sized,
    {
        info!(
            "adding {} datastore(s) via {} provisioner, starting at sequence {}",
            request.desired_count,
            provisioner.name(),
            self.num_datastores_added
        );

        let mut result = ProvisionResult::new();
        for attempt in 1..=request.desired_count as usize {
            let service_id = self.add_datastore_service(provisioner, attempt)?;
            result.push(service_id, PortId::new(DATASTORE_PORT_ID));
        }

        info!("batch complete: {} datastore(s) added", result.len());
        Ok(result)
    }

    fn add_datastore_service<P>(&mut self, provisioner: &P, attempt: usize) -> Result<ServiceId, CoreError>
    where
        P: ServiceProvisioner + ?Sized,
    {
        let service_id = datastore_service_id(self.num_datastores_added);
        let spec = datastore_container_spec();

        match provisioner.create_service(&service_id, &spec) {
            Ok(service) => {
                debug!("datastore {service_id} is up at {}", service.ip_address);
                self.num_datastores_added += 1;
                Ok(service_id)
            }
            Err(source) => {
                warn!("adding datastore {service_id} failed, aborting batch at attempt {attempt}: {source}");
                Err(CoreError::ProvisioningFailed {
                    service_id,
                    attempt,
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datastore_army_runtime::{MockProvisioner, ProvisionerError};

    #[test]
    fn new_army_starts_at_zero() {
        assert_eq!(DatastoreArmy::new().num_datastores_added(), 0);
    }

    #[test]
    fn provision_creates_requested_count() {
        let mock = MockProvisioner::new();
        let mut army = DatastoreArmy::new();

        let result = army.provision(&mock, &ProvisionRequest::new(4)).unwrap();

        let ids: Vec<&str> = result.service_ids().map(ServiceId::as_str).collect();
        assert_eq!(ids, ["datastore-0", "datastore-1", "datastore-2", "datastore-3"]);
        assert!(result.entries().iter().all(|(_, port)| *port == "grpc"));
        assert_eq!(army.num_datastores_added(), 4);
    }

    #[test]
    fn every_instance_gets_the_datastore_spec() {
        let mock = MockProvisioner::new();
        let mut army = DatastoreArmy::new();
        army.provision(&mock, &ProvisionRequest::new(3)).unwrap();

        let specs = mock.specs();
        assert_eq!(specs.len(), 3);
        assert!(specs.iter().all(|s| *s == datastore_container_spec()));
    }

    #[test]
    fn failure_names_attempt_and_service() {
        let mock = MockProvisioner::failing_on_call(3);
        let mut army = DatastoreArmy::new();

        let err = army.provision(&mock, &ProvisionRequest::new(5)).unwrap_err();
        match err {
            CoreError::ProvisioningFailed {
                service_id,
                attempt,
                source,
            } => {
                assert_eq!(service_id, "datastore-2");
                assert_eq!(attempt, 3);
                assert!(matches!(source, ProvisionerError::Rejected(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(army.num_datastores_added(), 2);
        assert_eq!(mock.calls(), 3);
    }

    #[test]
    fn failure_message_carries_cause() {
        let mock = MockProvisioner::failing_on_call(1);
        let mut army = DatastoreArmy::new();
        let err = army.provision(&mock, &ProvisionRequest::new(1)).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("datastore-0"), "{msg}");
        assert!(msg.contains("mock failure injected"), "{msg}");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn execute_round_trip_through_payloads() {
        let mock = MockProvisioner::new();
        let mut army = DatastoreArmy::new();
        let out = army.execute(&mock, r#"{"numDatastores": 2}"#).unwrap();
        assert_eq!(
            out,
            r#"{"createdServiceIdsToPortIds":{"datastore-0":"grpc","datastore-1":"grpc"}}"#
        );
    }

    #[test]
    fn execute_accepts_trait_objects() {
        let provisioner: Box<dyn ServiceProvisioner> = Box::new(MockProvisioner::new());
        let mut army = DatastoreArmy::new();
        let out = army.execute(provisioner.as_ref(), r#"{"numDatastores": 1}"#).unwrap();
        assert!(out.contains("datastore-0"));
    }
}
