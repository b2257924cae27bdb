//! Fixed definition of the datastore service.
//!
//! Every datastore in an army runs the same image and exposes the same single
//! gRPC port, so the container spec does not depend on the instance.

use datastore_army_runtime::{ContainerSpec, PortProtocol, PortSpec, ServiceId};

pub const DATASTORE_IMAGE: &str = "kurtosistech/example-datastore-server";

pub const DATASTORE_PORT_ID: &str = "grpc";
pub const DATASTORE_PORT_NUM: u16 = 1323;

const SERVICE_ID_PREFIX: &str = "datastore";

pub fn datastore_container_spec() -> ContainerSpec {
    ContainerSpec::new(DATASTORE_IMAGE).with_port(
        DATASTORE_PORT_ID,
        PortSpec::new(DATASTORE_PORT_NUM, PortProtocol::Tcp),
    )
}

pub fn datastore_service_id(sequence: usize) -> ServiceId {
    ServiceId::new(format!("{SERVICE_ID_PREFIX}-{sequence}"))
}
