use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use tracing::debug;

use crate::errors::AdapterResult;
use crate::metrics;
use crate::ports::{OrchestrationRequest, OrchestratorPort};
use crate::shape::ToolInvocation;

/// The only tool answered locally.
pub const DATETIME_TOOL: &str = "get_datetime";

/// Model requested from the remote agent runner.
pub const ORCHESTRATION_MODEL: &str = "openai/gpt-4-turbo";

/// MCP servers offered to the remote runner: web search, weather, email.
pub const CAPABILITY_SERVERS: [&str; 3] = [
    "tsion/brave-search-mcp",
    "joerup/open-meteo-mcp",
    "vroom08/agentmail-mcp",
];

/// Zone used for the date context sentence on time-sensitive requests.
pub const DEFAULT_CONTEXT_ZONE: Tz = chrono_tz::America::Los_Angeles;

const UTC_ZONE: &str = "UTC";
const DISPLAY_WITH_ZONE: &str = "%A, %B %d, %Y at %I:%M %p %Z";
const DISPLAY_UTC: &str = "%A, %B %d, %Y at %I:%M %p UTC";
const REQUEST_KEYS: [&str; 3] = ["request", "query", "prompt"];
const TIME_SENSITIVE_WORDS: [&str; 7] = [
    "news", "latest", "today", "current", "recent", "now", "weather",
];

/// Routes a normalized tool call either to the local datetime answer or to
/// the remote orchestrator.
pub struct ToolDispatcher {
    orchestrator: Arc<dyn OrchestratorPort>,
    context_zone: Tz,
}

impl ToolDispatcher {
    pub fn new(orchestrator: Arc<dyn OrchestratorPort>) -> Self {
        Self {
            orchestrator,
            context_zone: DEFAULT_CONTEXT_ZONE,
        }
    }

    pub fn with_context_zone(mut self, zone: Tz) -> Self {
        self.context_zone = zone;
        self
    }

    pub fn context_zone(&self) -> Tz {
        self.context_zone
    }

    /// Produces the result text for `invocation`. `now` is the instant the
    /// request arrived.
    pub async fn dispatch(
        &self,
        invocation: &ToolInvocation,
        now: DateTime<Utc>,
    ) -> AdapterResult<String> {
        if invocation.tool_name == DATETIME_TOOL {
            return Ok(current_datetime(invocation, now));
        }

        let request = orchestration_request(invocation, now, self.context_zone);
        debug!(
            model = %request.model,
            input_len = request.input.len(),
            "delegating to orchestrator"
        );
        let started = Instant::now();
        let outcome = self.orchestrator.run(request).await;
        metrics::observe_orchestration(started.elapsed(), outcome.is_ok());
        Ok(outcome?.final_output)
    }
}

/// Builds the remote request: the caller's text, prefixed with a date
/// sentence when it looks time-sensitive, plus the fixed model and servers.
pub fn orchestration_request(
    invocation: &ToolInvocation,
    now: DateTime<Utc>,
    context_zone: Tz,
) -> OrchestrationRequest {
    let text = request_text(invocation);
    let input = if is_time_sensitive(&text) {
        format!("{}{}", date_context(now, context_zone), text)
    } else {
        text
    };
    OrchestrationRequest {
        input,
        model: ORCHESTRATION_MODEL.to_string(),
        mcp_servers: CAPABILITY_SERVERS.iter().map(|s| s.to_string()).collect(),
    }
}

/// Answers `get_datetime`. Unknown zones fall back to UTC instead of failing.
pub fn current_datetime(invocation: &ToolInvocation, now: DateTime<Utc>) -> String {
    let requested = invocation
        .parameters
        .get("timezone")
        .map_or(Some(UTC_ZONE), Value::as_str);

    match requested {
        Some(UTC_ZONE) => format!(
            "Current date and time in {UTC_ZONE}: {}",
            now.format(DISPLAY_WITH_ZONE)
        ),
        Some(name) => match parse_zone(name) {
            Some(zone) => format!(
                "Current date and time in {name}: {}",
                now.with_timezone(&zone).format(DISPLAY_WITH_ZONE)
            ),
            None => {
                debug!(timezone = name, "unknown timezone, answering in UTC");
                utc_fallback(now)
            }
        },
        None => utc_fallback(now),
    }
}

/// IANA lookup that tolerates lowercased names such as `america/new_york`.
pub fn parse_zone(name: &str) -> Option<Tz> {
    name.parse::<Tz>()
        .ok()
        .or_else(|| Tz::from_str_insensitive(name).ok())
}

fn utc_fallback(now: DateTime<Utc>) -> String {
    format!("Current UTC time: {}", now.format(DISPLAY_UTC))
}

/// First non-empty string among `request`, `query` and `prompt`.
pub fn request_text(invocation: &ToolInvocation) -> String {
    REQUEST_KEYS
        .iter()
        .find_map(|key| invocation.param_str(key).filter(|text| !text.is_empty()))
        .unwrap_or_default()
        .to_string()
}

/// Plain substring match, so "know" and "snow" also count.
pub fn is_time_sensitive(text: &str) -> bool {
    let lowered = text.to_lowercase();
    TIME_SENSITIVE_WORDS
        .iter()
        .any(|word| lowered.contains(word))
}

pub fn date_context(now: DateTime<Utc>, zone: Tz) -> String {
    format!(
        "Today is {}. ",
        now.with_timezone(&zone).format(DISPLAY_WITH_ZONE)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AdapterError;
    use crate::ports::OrchestrationOutcome;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::{json, Map};
    use std::sync::Mutex;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 20, 30, 0).unwrap()
    }

    fn invocation(tool: &str, parameters: Value) -> ToolInvocation {
        let parameters: Map<String, Value> = match parameters {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        ToolInvocation {
            tool_name: tool.into(),
            parameters,
            call_id: "call-1".into(),
        }
    }

    #[derive(Default)]
    struct RecordingOrchestrator {
        seen: Mutex<Vec<OrchestrationRequest>>,
    }

    #[async_trait]
    impl OrchestratorPort for RecordingOrchestrator {
        async fn run(&self, request: OrchestrationRequest) -> AdapterResult<OrchestrationOutcome> {
            let reply = format!("answered: {}", request.input);
            self.seen.lock().unwrap().push(request);
            Ok(OrchestrationOutcome {
                final_output: reply,
            })
        }
    }

    struct FailingOrchestrator;

    #[async_trait]
    impl OrchestratorPort for FailingOrchestrator {
        async fn run(&self, _request: OrchestrationRequest) -> AdapterResult<OrchestrationOutcome> {
            Err(AdapterError::remote_call("upstream exploded"))
        }
    }

    #[test]
    fn datetime_in_utc() {
        let call = invocation(DATETIME_TOOL, json!({ "timezone": "UTC" }));
        assert_eq!(
            current_datetime(&call, fixed_now()),
            "Current date and time in UTC: Friday, March 15, 2024 at 08:30 PM UTC"
        );

        let defaulted = invocation(DATETIME_TOOL, json!({}));
        assert_eq!(
            current_datetime(&defaulted, fixed_now()),
            current_datetime(&call, fixed_now())
        );
    }

    #[test]
    fn datetime_in_named_zone() {
        let call = invocation(DATETIME_TOOL, json!({ "timezone": "Asia/Tokyo" }));
        assert_eq!(
            current_datetime(&call, fixed_now()),
            "Current date and time in Asia/Tokyo: Saturday, March 16, 2024 at 05:30 AM JST"
        );
    }

    #[test]
    fn zone_names_match_regardless_of_case() {
        let new_york = invocation(DATETIME_TOOL, json!({ "timezone": "america/new_york" }));
        assert_eq!(
            current_datetime(&new_york, fixed_now()),
            "Current date and time in america/new_york: Friday, March 15, 2024 at 04:30 PM EDT"
        );

        let utc = invocation(DATETIME_TOOL, json!({ "timezone": "utc" }));
        assert_eq!(
            current_datetime(&utc, fixed_now()),
            "Current date and time in utc: Friday, March 15, 2024 at 08:30 PM UTC"
        );
    }

    #[test]
    fn unknown_zone_falls_back_to_utc() {
        let expected = "Current UTC time: Friday, March 15, 2024 at 08:30 PM UTC";
        let bogus = invocation(DATETIME_TOOL, json!({ "timezone": "Mars/Phobos" }));
        assert_eq!(current_datetime(&bogus, fixed_now()), expected);

        let not_a_string = invocation(DATETIME_TOOL, json!({ "timezone": 7 }));
        assert_eq!(current_datetime(&not_a_string, fixed_now()), expected);
    }

    #[test]
    fn request_text_prefers_request_then_query_then_prompt() {
        let call = invocation(
            "web_search",
            json!({ "request": "", "query": "rust", "prompt": "ignored" }),
        );
        assert_eq!(request_text(&call), "rust");
        assert_eq!(request_text(&invocation("x", json!({}))), "");
    }

    #[test]
    fn time_sensitive_requests_get_a_date_prefix() {
        let weather = invocation("web_search", json!({ "query": "what's today's weather" }));
        let request = orchestration_request(&weather, fixed_now(), DEFAULT_CONTEXT_ZONE);
        assert_eq!(
            request.input,
            "Today is Friday, March 15, 2024 at 01:30 PM PDT. what's today's weather"
        );

        let translate = invocation("web_search", json!({ "query": "translate this sentence" }));
        let request = orchestration_request(&translate, fixed_now(), DEFAULT_CONTEXT_ZONE);
        assert_eq!(request.input, "translate this sentence");
        assert_eq!(request.model, ORCHESTRATION_MODEL);
        assert_eq!(request.mcp_servers, CAPABILITY_SERVERS.to_vec());
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        assert!(is_time_sensitive("LATEST scores"));
        assert!(is_time_sensitive("do you know"));
        assert!(!is_time_sensitive("send an email to bob"));
    }

    #[tokio::test]
    async fn datetime_never_reaches_the_orchestrator() {
        let orchestrator = Arc::new(RecordingOrchestrator::default());
        let dispatcher = ToolDispatcher::new(orchestrator.clone());
        let call = invocation(DATETIME_TOOL, json!({ "timezone": "UTC" }));
        let result = dispatcher.dispatch(&call, fixed_now()).await.unwrap();
        assert!(result.starts_with("Current date and time in UTC"));
        assert!(orchestrator.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_tools_return_the_final_output_verbatim() {
        let orchestrator = Arc::new(RecordingOrchestrator::default());
        let dispatcher = ToolDispatcher::new(orchestrator.clone());
        let call = invocation("send_email", json!({ "request": "email bob" }));
        let result = dispatcher.dispatch(&call, fixed_now()).await.unwrap();
        assert_eq!(result, "answered: email bob");
        assert_eq!(orchestrator.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn orchestrator_failures_propagate() {
        let dispatcher = ToolDispatcher::new(Arc::new(FailingOrchestrator));
        let call = invocation("web_search", json!({ "query": "rust" }));
        let err = dispatcher.dispatch(&call, fixed_now()).await.unwrap_err();
        assert!(matches!(err, AdapterError::RemoteCall(_)));
        assert_eq!(err.to_string(), "upstream exploded");
    }
}
