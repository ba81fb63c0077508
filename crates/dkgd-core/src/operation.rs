// ABOUTME: Defines the Operation struct representing a unit of pending protocol work.
// ABOUTME: Operations are keyed by a caller-assigned unique ID and carry an opaque payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// A pending unit of protocol work. The store only relies on `id` being
/// unique; every other field is owned and interpreted by the protocol layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    pub operation_type: String,
    pub payload: serde_json::Value,
    #[serde(default)]
    pub result_msgs: Vec<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub dkg_identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

impl Operation {
    /// Create a new Operation with a freshly generated ULID as its ID.
    /// No recipient, no FSM event, and no result messages.
    pub fn new(operation_type: String, dkg_identifier: String, payload: serde_json::Value) -> Self {
        Self::with_id(Ulid::new().to_string(), operation_type, dkg_identifier, payload)
    }

    /// Create a new Operation under a caller-chosen ID.
    pub fn with_id(
        id: String,
        operation_type: String,
        dkg_identifier: String,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id,
            operation_type,
            payload,
            result_msgs: Vec::new(),
            created_at: Utc::now(),
            dkg_identifier,
            to: None,
            event: None,
        }
    }
}
