use async_trait::async_trait;
use serde::Serialize;

use crate::errors::{AdapterError, AdapterResult};

/// One delegated request for the remote agent runner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrchestrationRequest {
    pub input: String,
    pub model: String,
    pub mcp_servers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrchestrationOutcome {
    pub final_output: String,
}

/// Remote multi-agent execution service. Capability selection among the
/// supplied MCP servers happens entirely on the remote side.
#[async_trait]
pub trait OrchestratorPort: Send + Sync {
    async fn run(&self, request: OrchestrationRequest) -> AdapterResult<OrchestrationOutcome>;
}

pub struct NoopOrchestrator;

#[async_trait]
impl OrchestratorPort for NoopOrchestrator {
    async fn run(&self, _request: OrchestrationRequest) -> AdapterResult<OrchestrationOutcome> {
        Err(AdapterError::remote_call("orchestrator not configured"))
    }
}
