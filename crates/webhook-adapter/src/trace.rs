use std::borrow::Cow;

use tracing::{field, span, Level, Span};

#[derive(Clone)]
pub struct AdapterTracer {
    pub component: Cow<'static, str>,
}

impl Default for AdapterTracer {
    fn default() -> Self {
        Self {
            component: Cow::Borrowed("vapi-bridge"),
        }
    }
}

impl AdapterTracer {
    /// Span for one webhook request. `shape`, `tool` and `call_id` are
    /// recorded once the body has been normalized.
    pub fn span(&self, trace_id: &str) -> Span {
        span!(
            Level::INFO,
            "webhook.adapter.http",
            trace_id = trace_id,
            component = %self.component,
            shape = field::Empty,
            tool = field::Empty,
            call_id = field::Empty,
        )
    }
}
