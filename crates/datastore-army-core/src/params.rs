use crate::CoreError;
use serde::{Deserialize, Serialize};

/// Decoded execute request: how many datastores to add.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProvisionRequest {
    #[serde(rename = "numDatastores")]
    pub desired_count: u32,
}

impl ProvisionRequest {
    pub fn new(desired_count: u32) -> Self {
        Self { desired_count }
    }
}

/// Decode a serialized execute request. Only the shape is checked.
pub fn decode_params(serialized: &str) -> Result<ProvisionRequest, CoreError> {
    serde_json::from_str(serialized).map_err(CoreError::MalformedRequest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_valid_request() {
        let req = decode_params(r#"{"numDatastores": 3}"#).unwrap();
        assert_eq!(req, ProvisionRequest::new(3));
    }

    #[test]
    fn decode_zero_count() {
        assert_eq!(decode_params(r#"{"numDatastores":0}"#).unwrap().desired_count, 0);
    }

    #[test]
    fn decode_ignores_unknown_fields() {
        let req = decode_params(r#"{"numDatastores": 2, "comment": "extra"}"#).unwrap();
        assert_eq!(req.desired_count, 2);
    }

    #[test]
    fn decode_accepts_large_counts() {
        let req = decode_params(r#"{"numDatastores": 4294967295}"#).unwrap();
        assert_eq!(req.desired_count, u32::MAX);
    }

    #[test]
    fn decode_missing_field_is_malformed() {
        let err = decode_params("{}").unwrap_err();
        assert!(matches!(err, CoreError::MalformedRequest(_)));
        assert!(err.to_string().contains("numDatastores"));
    }

    #[test]
    fn decode_non_numeric_count_is_malformed() {
        assert!(matches!(
            decode_params(r#"{"numDatastores": "three"}"#),
            Err(CoreError::MalformedRequest(_))
        ));
        assert!(matches!(
            decode_params(r#"{"numDatastores": 1.5}"#),
            Err(CoreError::MalformedRequest(_))
        ));
    }

    #[test]
    fn decode_negative_count_is_malformed() {
        assert!(matches!(
            decode_params(r#"{"numDatastores": -1}"#),
            Err(CoreError::MalformedRequest(_))
        ));
    }

    #[test]
    fn decode_garbage_is_malformed() {
        for input in ["", "not json", "null", "[]", "3", r#"{"numDatastores": 3"#] {
            assert!(
                matches!(decode_params(input), Err(CoreError::MalformedRequest(_))),
                "expected MalformedRequest for {input:?}"
            );
        }
    }
}
