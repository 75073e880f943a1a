//! Detection of the three inbound body layouts and their normalization into a
//! single [`ToolInvocation`].

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::{AdapterError, AdapterResult};

/// Tool name assumed when the caller omits one.
pub const DEFAULT_TOOL: &str = "web_search";

const TOOL_CALLS_MESSAGE: &str = "tool-calls";
const NO_TOOL_CALLS: &str = "No tool calls in request";

/// Which caller layout produced a request; picks the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InboundShape {
    /// `{"message": {"type": "tool-calls", "toolCalls": [...]}}`
    Webhook,
    /// `{"toolCallList": [...]}`
    List,
    /// `{"name": ..., "arguments": ..., "id": ...}`
    Direct,
}

impl InboundShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Webhook => "webhook",
            Self::List => "list",
            Self::Direct => "direct",
        }
    }
}

/// Normalized tool call, identical regardless of the inbound layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub parameters: Map<String, Value>,
    pub call_id: String,
}

impl ToolInvocation {
    /// Reads a string parameter; non-string values are treated as absent.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }
}

/// Inbound body classified by layout, borrowing the fields each layout uses.
#[derive(Debug, Clone, Copy)]
pub enum InboundRequest<'a> {
    Webhook { tool_calls: &'a [Value] },
    List { tool_calls: &'a [Value] },
    Direct { call: &'a Map<String, Value> },
}

impl<'a> InboundRequest<'a> {
    /// Classifies a body. The webhook layout wins over the list layout, and
    /// anything else is a direct call.
    pub fn classify(body: &'a Value) -> AdapterResult<Self> {
        let root = body
            .as_object()
            .ok_or_else(|| AdapterError::invalid_request("request body must be a JSON object"))?;

        let message = match root.get("message") {
            Some(Value::Object(message)) => Some(message),
            Some(_) => {
                return Err(AdapterError::invalid_request(
                    "message must be a JSON object",
                ))
            }
            None => None,
        };
        let webhook = message.filter(|message| {
            message.get("type").and_then(Value::as_str) == Some(TOOL_CALLS_MESSAGE)
        });
        if let Some(message) = webhook {
            return Ok(Self::Webhook {
                tool_calls: call_list(message.get("toolCalls"), "toolCalls")?,
            });
        }

        if let Some(list) = root.get("toolCallList") {
            return Ok(Self::List {
                tool_calls: call_list(Some(list), "toolCallList")?,
            });
        }

        Ok(Self::Direct { call: root })
    }

    pub fn shape(&self) -> InboundShape {
        match self {
            Self::Webhook { .. } => InboundShape::Webhook,
            Self::List { .. } => InboundShape::List,
            Self::Direct { .. } => InboundShape::Direct,
        }
    }

    /// Extracts the first tool call. Only the webhook layout carries
    /// `function.arguments` as an encoded JSON string.
    pub fn invocation(&self) -> AdapterResult<ToolInvocation> {
        match self {
            Self::Webhook { tool_calls } => {
                let call = first_call(tool_calls)?;
                let function = call.get("function").and_then(Value::as_object);
                let arguments = function
                    .and_then(|function| function.get("arguments"))
                    .map(decode_string_arguments)
                    .transpose()?;
                build_invocation(
                    function.and_then(|function| function.get("name")),
                    arguments.as_ref(),
                    call.get("id"),
                )
            }
            Self::List { tool_calls } => {
                let call = first_call(tool_calls)?;
                build_invocation(call.get("name"), call.get("arguments"), call.get("id"))
            }
            Self::Direct { call } => {
                build_invocation(call.get("name"), call.get("arguments"), call.get("id"))
            }
        }
    }
}

/// A classified request together with its extracted invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCall {
    pub shape: InboundShape,
    pub invocation: ToolInvocation,
}

/// Classifies `body` and extracts its tool call in one step.
pub fn normalize(body: &Value) -> AdapterResult<NormalizedCall> {
    let request = InboundRequest::classify(body)?;
    Ok(NormalizedCall {
        shape: request.shape(),
        invocation: request.invocation()?,
    })
}

/// Parses raw bytes and normalizes them.
pub fn normalize_bytes(body: &[u8]) -> AdapterResult<NormalizedCall> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| AdapterError::invalid_request(format!("invalid JSON body: {err}")))?;
    normalize(&value)
}

fn call_list<'a>(value: Option<&'a Value>, field: &str) -> AdapterResult<&'a [Value]> {
    match value {
        None | Some(Value::Null) => Ok(&[][..]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(AdapterError::invalid_request(format!(
            "{field} must be a list"
        ))),
    }
}

fn first_call(tool_calls: &[Value]) -> AdapterResult<&Map<String, Value>> {
    let first = tool_calls
        .first()
        .ok_or_else(|| AdapterError::invalid_request(NO_TOOL_CALLS))?;
    first
        .as_object()
        .ok_or_else(|| AdapterError::invalid_request("tool call must be a JSON object"))
}

fn decode_string_arguments(arguments: &Value) -> AdapterResult<Value> {
    match arguments {
        Value::String(raw) => serde_json::from_str(raw).map_err(|err| {
            AdapterError::invalid_request(format!("invalid tool call arguments: {err}"))
        }),
        other => Ok(other.clone()),
    }
}

fn build_invocation(
    name: Option<&Value>,
    arguments: Option<&Value>,
    id: Option<&Value>,
) -> AdapterResult<ToolInvocation> {
    let parameters = match arguments {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            return Err(AdapterError::invalid_request(
                "tool call arguments must be a JSON object",
            ))
        }
    };

    Ok(ToolInvocation {
        tool_name: name
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TOOL)
            .to_string(),
        parameters,
        call_id: id.and_then(Value::as_str).unwrap_or_default().to_string(),
    })
}
