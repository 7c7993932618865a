//! Error payload returned across the external boundary
//!
//! Every caller-visible error has the same three fields regardless of cause.

use serde::{Deserialize, Serialize};

/// Coarse status class of an error payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    ServiceUnavailable,
    BadGateway,
    GatewayTimeout,
    Internal,
}

impl StatusClass {
    /// Status code in an HTTP binding
    pub fn http_status(&self) -> u16 {
        match self {
            StatusClass::ServiceUnavailable => 503,
            StatusClass::BadGateway => 502,
            StatusClass::GatewayTimeout => 504,
            StatusClass::Internal => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub status: StatusClass,
    pub reason_code: String,
    pub detail: String,
}

impl ErrorPayload {
    pub fn new(status: StatusClass, reason_code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status,
            reason_code: reason_code.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let payload = ErrorPayload::new(StatusClass::ServiceUnavailable, "unknown_model", "x");
        let json = serde_json::to_value(&payload).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["detail", "reason_code", "status"]);
        assert_eq!(json["status"], "service_unavailable");
        assert_eq!(payload.status.http_status(), 503);
    }
}
