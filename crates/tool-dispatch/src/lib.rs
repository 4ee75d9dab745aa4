//! Tool dispatch: maps named tool calls onto action handlers behind a
//! permission check, records frames for recording groups and shapes the
//! uniform `ActionResult` returned to the agent.

pub mod analytics;
pub mod approval;
pub mod coerce;
pub mod context;
pub mod errors;
pub mod handler;
pub mod metrics;
pub mod model;
pub mod ports;
pub mod registry;
pub mod tools;

mod recording;

pub use analytics::{AnalyticsSink, FailureReason, ToolCallEvent, TracingAnalytics};
pub use context::{SessionContext, SessionContexts};
pub use errors::{DispatchError, RegistryError};
pub use handler::{is_tab_exempt, ToolCallHandler, ToolCallHandlerBuilder, TAB_EXEMPT_TOOLS};
pub use model::{ExecutionContext, PermissionGate, ToolCall, ToolOutcome};
pub use ports::{ApprovalDecision, ApprovalPort, ApprovalScope, TabGroupProvider};
pub use registry::{Tool, ToolRegistry, ToolSchema};
