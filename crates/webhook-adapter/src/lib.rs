//! Adapter between voice-assistant tool-call webhooks and a remote agent
//! runner.
//!
//! Inbound bodies come in three layouts (see [`shape`]). Each is normalized
//! into a [`ToolInvocation`], answered by the [`ToolDispatcher`], and mirrored
//! back in the envelope the caller expects (see [`envelope`]).

pub mod bootstrap;
pub mod clock;
pub mod dispatch;
pub mod envelope;
pub mod errors;
pub mod http;
pub mod metrics;
pub mod pipeline;
pub mod ports;
pub mod shape;
pub mod trace;

pub use bootstrap::AdapterBootstrap;
pub use clock::{Clock, FixedClock, SystemClock};
pub use dispatch::ToolDispatcher;
pub use envelope::ResponseEnvelope;
pub use errors::{AdapterError, AdapterResult};
pub use http::{router, router_with_state, AdapterState};
pub use pipeline::WebhookPipeline;
pub use ports::{OrchestrationOutcome, OrchestrationRequest, OrchestratorPort};
pub use shape::{InboundShape, ToolInvocation};
