//! Intake validation.
//!
//! Only the envelope is checked: `source_type` must be one of the known
//! tags and `payload` must be a JSON object. Payload content is opaque.

use crate::error::IngestError;
use serde::Deserialize;
use serde_json::Value;
use signet_sdk::canonical::Payload;
use signet_sdk::objects::{IngestRequest, SourceType};

/// A submission as received, before any validation.
///
/// Fields are kept loosely typed so that every shape problem is reported
/// through [`validate`] with a uniform `InvalidRequest` error.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub source_type: Option<Value>,
    #[serde(default)]
    pub payload: Option<Value>,
}

impl From<IngestRequest> for Submission {
    fn from(request: IngestRequest) -> Self {
        Self {
            source_type: Some(Value::String(request.source_type.as_str().to_string())),
            payload: Some(Value::Object(request.payload)),
        }
    }
}

/// A submission whose envelope passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    pub source_type: SourceType,
    pub payload: Payload,
}

pub fn validate(submission: Submission) -> Result<ValidatedSubmission, IngestError> {
    let source_type = match submission.source_type {
        None => {
            return Err(IngestError::InvalidRequest(
                "source_type is required".to_string(),
            ));
        }
        Some(Value::String(tag)) => tag
            .parse::<SourceType>()
            .map_err(|e| IngestError::InvalidRequest(e.to_string()))?,
        Some(_) => {
            return Err(IngestError::InvalidRequest(
                "source_type must be a string".to_string(),
            ));
        }
    };

    let payload = match submission.payload {
        None => {
            return Err(IngestError::InvalidRequest(
                "payload is required".to_string(),
            ));
        }
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(IngestError::InvalidRequest(
                "payload must be a JSON object".to_string(),
            ));
        }
    };

    Ok(ValidatedSubmission {
        source_type,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submission(value: Value) -> Submission {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_accepts_each_source_type() {
        for tag in ["VC", "OIDC", "MANUAL"] {
            let validated =
                validate(submission(json!({ "source_type": tag, "payload": {} }))).unwrap();
            assert_eq!(validated.source_type.as_str(), tag);
        }
    }

    #[test]
    fn test_rejects_unknown_source_type() {
        let err = validate(submission(json!({ "source_type": "BOGUS", "payload": {} })))
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidRequest(msg) if msg.contains("BOGUS")));
    }

    #[test]
    fn test_rejects_missing_or_non_string_source_type() {
        assert!(matches!(
            validate(submission(json!({ "payload": {} }))),
            Err(IngestError::InvalidRequest(_))
        ));
        assert!(matches!(
            validate(submission(json!({ "source_type": 7, "payload": {} }))),
            Err(IngestError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_rejects_missing_null_or_non_object_payload() {
        for payload in [json!(null), json!([1, 2]), json!("text"), json!(3)] {
            let err = validate(submission(json!({ "source_type": "VC", "payload": payload })))
                .unwrap_err();
            assert!(matches!(err, IngestError::InvalidRequest(_)));
        }
        assert!(matches!(
            validate(submission(json!({ "source_type": "VC" }))),
            Err(IngestError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_payload_content_is_not_inspected() {
        let validated = validate(submission(json!({
            "source_type": "MANUAL",
            "payload": { "anything": { "goes": [1, "two", null] } }
        })))
        .unwrap();
        assert_eq!(validated.payload["anything"]["goes"][1], json!("two"));
    }

    #[test]
    fn test_typed_request_converts_to_valid_submission() {
        let request = IngestRequest {
            source_type: SourceType::Oidc,
            payload: Payload::new(),
        };
        let validated = validate(request.into()).unwrap();
        assert_eq!(validated.source_type, SourceType::Oidc);
    }
}
