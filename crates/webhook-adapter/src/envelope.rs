use serde::Serialize;

use crate::errors::AdapterError;
use crate::shape::InboundShape;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub tool_call_id: String,
    pub result: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallFailure {
    pub tool_call_id: String,
    pub error: String,
}

/// Outbound body. Webhook and list callers expect a `results` array; direct
/// callers get the bare result object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    Batch { results: Vec<ToolCallResult> },
    Single(ToolCallResult),
    Failure(ToolCallFailure),
}

impl ResponseEnvelope {
    pub fn success(shape: InboundShape, call_id: impl Into<String>, result: String) -> Self {
        let entry = ToolCallResult {
            tool_call_id: call_id.into(),
            result,
        };
        match shape {
            InboundShape::Webhook | InboundShape::List => Self::Batch {
                results: vec![entry],
            },
            InboundShape::Direct => Self::Single(entry),
        }
    }

    /// `call_id` is `None` when the failure happened before a call id was
    /// extracted; the envelope then carries an empty id.
    pub fn failure(call_id: Option<&str>, error: &AdapterError) -> Self {
        Self::Failure(ToolCallFailure {
            tool_call_id: call_id.unwrap_or_default().to_string(),
            error: error.to_string(),
        })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}
