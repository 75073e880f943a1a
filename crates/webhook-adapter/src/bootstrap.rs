use std::sync::Arc;

use axum::Router;
use chrono_tz::Tz;

use crate::clock::{Clock, SystemClock};
use crate::dispatch::{parse_zone, ToolDispatcher, DEFAULT_CONTEXT_ZONE};
use crate::errors::{AdapterError, AdapterResult};
use crate::http;
use crate::pipeline::WebhookPipeline;
use crate::ports::OrchestratorPort;
use crate::trace::AdapterTracer;

/// Builder wiring the orchestrator collaborator into the webhook pipeline.
#[derive(Clone)]
pub struct AdapterBootstrap {
    orchestrator: Arc<dyn OrchestratorPort>,
    clock: Arc<dyn Clock>,
    tracer: AdapterTracer,
    context_zone: Tz,
}

impl AdapterBootstrap {
    pub fn new(orchestrator: Arc<dyn OrchestratorPort>) -> Self {
        Self {
            orchestrator,
            clock: Arc::new(SystemClock),
            tracer: AdapterTracer::default(),
            context_zone: DEFAULT_CONTEXT_ZONE,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_tracer(mut self, tracer: AdapterTracer) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn with_context_zone(mut self, zone: Tz) -> Self {
        self.context_zone = zone;
        self
    }

    /// Like [`with_context_zone`](Self::with_context_zone) but takes an IANA
    /// name, failing on names the zone database does not know.
    pub fn with_context_zone_name(self, name: &str) -> AdapterResult<Self> {
        let zone = parse_zone(name)
            .ok_or_else(|| AdapterError::config(format!("unknown timezone '{name}'")))?;
        Ok(self.with_context_zone(zone))
    }

    pub fn pipeline(&self) -> WebhookPipeline {
        WebhookPipeline::new(
            ToolDispatcher::new(Arc::clone(&self.orchestrator)).with_context_zone(self.context_zone),
            Arc::clone(&self.clock),
            self.tracer.clone(),
        )
    }

    pub fn build_http(&self) -> Router {
        http::router(Arc::new(self.pipeline()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::NoopOrchestrator;

    #[test]
    fn context_zone_name_is_validated() {
        let bootstrap = AdapterBootstrap::new(Arc::new(NoopOrchestrator));
        assert!(bootstrap.clone().with_context_zone_name("Europe/Berlin").is_ok());
        assert!(bootstrap.clone().with_context_zone_name("europe/berlin").is_ok());
        let err = bootstrap
            .with_context_zone_name("Mars/Phobos")
            .err()
            .expect("unknown zone must be rejected");
        assert!(matches!(err, AdapterError::Config(_)));
    }
}
