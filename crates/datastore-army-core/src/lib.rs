//! Provisioning orchestration for datastore-army.
//!
//! This crate turns an execute request into a batch of datastore services:
//! `params` decodes the request payload, `DatastoreArmy` allocates service ids
//! and drives a `ServiceProvisioner` one instance at a time, and `result`
//! encodes the created ids into the response payload. It also owns the fixed
//! datastore container definition and the module configuration file.

pub mod army;
pub mod config;
pub mod datastore;
pub mod params;
pub mod result;

pub use army::DatastoreArmy;
pub use config::{ModuleConfig, ProvisionerSection, ServerSection};
pub use datastore::{
    datastore_container_spec, datastore_service_id, DATASTORE_IMAGE, DATASTORE_PORT_ID,
    DATASTORE_PORT_NUM,
};
pub use params::{decode_params, ProvisionRequest};
pub use result::{encode_result, ProvisionResult};

use datastore_army_runtime::{ProvisionerError, ServiceId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed request: {0}")]
    MalformedRequest(#[source] serde_json::Error),
    #[error("failed to provision datastore service '{service_id}' (attempt {attempt} of batch): {source}")]
    ProvisioningFailed {
        service_id: ServiceId,
        /// 1-based position of the failed creation call within its batch.
        attempt: usize,
        #[source]
        source: ProvisionerError,
    },
    #[error("all datastores were provisioned, but the result could not be encoded: {0}")]
    EncodingFailed(#[source] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
