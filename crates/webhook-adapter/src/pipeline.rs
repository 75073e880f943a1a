use std::sync::Arc;

use tracing::{debug, info, warn, Instrument, Span};

use crate::clock::Clock;
use crate::dispatch::ToolDispatcher;
use crate::envelope::ResponseEnvelope;
use crate::errors::AdapterError;
use crate::metrics;
use crate::shape;
use crate::trace::AdapterTracer;

/// Full request path shared by the HTTP handler and the `call` command:
/// normalize, dispatch, mirror. Never fails; errors become an in-band
/// failure envelope.
pub struct WebhookPipeline {
    dispatcher: ToolDispatcher,
    clock: Arc<dyn Clock>,
    tracer: AdapterTracer,
}

impl WebhookPipeline {
    pub fn new(dispatcher: ToolDispatcher, clock: Arc<dyn Clock>, tracer: AdapterTracer) -> Self {
        Self {
            dispatcher,
            clock,
            tracer,
        }
    }

    pub async fn handle(&self, body: &[u8]) -> ResponseEnvelope {
        let span = self.tracer.span(&new_trace_id());
        self.process(body).instrument(span).await
    }

    async fn process(&self, body: &[u8]) -> ResponseEnvelope {
        let now = self.clock.now();
        debug!(body = %String::from_utf8_lossy(body), "inbound webhook");

        let call = match shape::normalize_bytes(body) {
            Ok(call) => call,
            Err(err) => return fail(None, err),
        };

        let span = Span::current();
        span.record("shape", call.shape.as_str());
        span.record("tool", call.invocation.tool_name.as_str());
        span.record("call_id", call.invocation.call_id.as_str());
        metrics::record_request(call.shape);

        let outcome = self.dispatcher.dispatch(&call.invocation, now).await;
        match outcome {
            Ok(result) => {
                info!(result_len = result.len(), "tool call answered");
                ResponseEnvelope::success(call.shape, call.invocation.call_id, result)
            }
            Err(err) => fail(Some(&call.invocation.call_id), err),
        }
    }
}

fn fail(call_id: Option<&str>, err: AdapterError) -> ResponseEnvelope {
    warn!(kind = err.kind(), error = %err, "tool call failed");
    metrics::record_failure(err.kind());
    ResponseEnvelope::failure(call_id, &err)
}

fn new_trace_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
