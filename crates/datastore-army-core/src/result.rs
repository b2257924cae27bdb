use crate::CoreError;
use datastore_army_runtime::{PortId, ServiceId};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

/// Services created by one batch, in creation order, with the port label
/// clients should use to reach each of them.
///
/// Serializes as `{"createdServiceIdsToPortIds": {"<id>": "<port>", ...}}`
/// with keys in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionResult {
    entries: Vec<(ServiceId, PortId)>,
}

impl ProvisionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, service_id: ServiceId, port_id: PortId) {
        self.entries.push((service_id, port_id));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(ServiceId, PortId)] {
        &self.entries
    }

    pub fn service_ids(&self) -> impl Iterator<Item = &ServiceId> {
        self.entries.iter().map(|(id, _)| id)
    }
}

struct ServiceIdsToPortIds<'a>(&'a [(ServiceId, PortId)]);

impl Serialize for ServiceIdsToPortIds<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (service_id, port_id) in self.0 {
            map.serialize_entry(service_id, port_id)?;
        }
        map.end()
    }
}

impl Serialize for ProvisionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut result = serializer.serialize_struct("ExecuteResult", 1)?;
        result.serialize_field("createdServiceIdsToPortIds", &ServiceIdsToPortIds(&self.entries))?;
        result.end()
    }
}

pub fn encode_result(result: &ProvisionResult) -> Result<String, CoreError> {
    serde_json::to_string(result).map_err(CoreError::EncodingFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ids: &[&str]) -> ProvisionResult {
        let mut result = ProvisionResult::new();
        for id in ids {
            result.push(ServiceId::new(*id), PortId::new("grpc"));
        }
        result
    }

    #[test]
    fn encode_empty_result() {
        let json = encode_result(&ProvisionResult::new()).unwrap();
        assert_eq!(json, r#"{"createdServiceIdsToPortIds":{}}"#);
    }

    #[test]
    fn encode_keeps_creation_order() {
        let ids: Vec<String> = (0..12).map(|n| format!("datastore-{n}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let json = encode_result(&sample(&refs)).unwrap();

        let pos_2 = json.find("\"datastore-2\"").unwrap();
        let pos_10 = json.find("\"datastore-10\"").unwrap();
        assert!(pos_2 < pos_10, "creation order must win over lexical order: {json}");
    }

    #[test]
    fn encode_is_byte_identical_across_calls() {
        let result = sample(&["datastore-0", "datastore-1", "datastore-2"]);
        assert_eq!(encode_result(&result).unwrap(), encode_result(&result).unwrap());
    }

    #[test]
    fn encoded_result_parses_back_as_map() {
        let json = encode_result(&sample(&["datastore-0", "datastore-1"])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let map = value["createdServiceIdsToPortIds"].as_object().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["datastore-1"], "grpc");
    }

    #[test]
    fn accessors_reflect_entries() {
        let result = sample(&["datastore-5", "datastore-6"]);
        assert_eq!(result.len(), 2);
        assert!(!result.is_empty());
        assert_eq!(result.entries()[0].1, "grpc");
        let ids: Vec<&str> = result.service_ids().map(ServiceId::as_str).collect();
        assert_eq!(ids, ["datastore-5", "datastore-6"]);
    }
}
