//! HTTP client for the Dedalus agent runner.
//!
//! The runner receives one user message plus the MCP servers it may use, picks
//! and drives those servers itself, and answers with a chat-completion style
//! payload whose first choice is the final output.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use webhook_adapter::{
    AdapterError, AdapterResult, OrchestrationOutcome, OrchestrationRequest, OrchestratorPort,
};

pub const DEFAULT_API_BASE: &str = "https://api.dedaluslabs.ai";

#[derive(Debug, Clone)]
pub struct DedalusConfig {
    pub api_key: String,
    pub api_base: String,
    /// `None` waits on the runner indefinitely.
    pub timeout: Option<Duration>,
}

impl DedalusConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: None,
        }
    }
}

pub struct DedalusClient {
    client: Client,
    config: DedalusConfig,
}

impl DedalusClient {
    pub fn new(config: DedalusConfig) -> AdapterResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AdapterError::config("missing Dedalus API key"));
        }
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| AdapterError::config(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl OrchestratorPort for DedalusClient {
    async fn run(&self, request: OrchestrationRequest) -> AdapterResult<OrchestrationOutcome> {
        let body = RunRequest {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.input,
            }],
            mcp_servers: &request.mcp_servers,
            stream: false,
        };
        debug!(
            target: "dedalus",
            model = %request.model,
            servers = request.mcp_servers.len(),
            "submitting run"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| AdapterError::remote_call(format!("dedalus request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            warn!(target: "dedalus", %status, "dedalus rejected run");
            return Err(AdapterError::remote_call(format!(
                "dedalus returned {status}: {text}"
            )));
        }

        let payload: RunResponse = response.json().await.map_err(|err| {
            AdapterError::remote_call(format!("dedalus response invalid: {err}"))
        })?;
        let final_output = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AdapterError::remote_call("dedalus response missing final output"))?;

        Ok(OrchestrationOutcome { final_output })
    }
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    mcp_servers: &'a [String],
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    #[serde(default)]
    choices: Vec<RunChoice>,
}

#[derive(Debug, Deserialize)]
struct RunChoice {
    message: RunMessage,
}

#[derive(Debug, Deserialize)]
struct RunMessage {
    #[serde(default)]
    content: Option<String>,
}
