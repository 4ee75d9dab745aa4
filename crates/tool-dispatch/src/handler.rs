//! Per-call orchestration: resolve the tab, check the permission gate, execute,
//! record a frame and shape the result.

use std::sync::Arc;

use action_primitives::AutomationSurface;
use gif_recorder::RecordingStore;
use permissions_broker::{origin_of, PermissionAuthority};
use serde_json::Value;
use tabpilot_core_types::{
    ActionResult, PermissionPrompt, PromptActionData, TabContext, TabId, TabInfo,
};
use tracing::{debug, instrument, warn};

use crate::analytics::{AnalyticsSink, ToolCallEvent, TracingAnalytics};
use crate::coerce::coerce_params;
use crate::context::{SessionContext, SessionContexts};
use crate::errors::DispatchError;
use crate::metrics;
use crate::model::{ExecutionContext, PermissionGate, ToolCall};
use crate::ports::TabGroupProvider;
use crate::recording::capture_action_frame;
use crate::registry::ToolRegistry;

/// Tools that run without an active tab.
pub const TAB_EXEMPT_TOOLS: &[&str] = &["tabs_context", "tabs_create"];

pub fn is_tab_exempt(tool: &str) -> bool {
    TAB_EXEMPT_TOOLS.contains(&tool)
}

pub struct ToolCallHandler {
    registry: Arc<ToolRegistry>,
    contexts: Arc<SessionContexts>,
    authority: Arc<dyn PermissionAuthority>,
    tabs: Arc<dyn TabGroupProvider>,
    surface: Option<Arc<dyn AutomationSurface>>,
    recordings: Option<Arc<RecordingStore>>,
    analytics: Arc<dyn AnalyticsSink>,
}

#[derive(Default)]
pub struct ToolCallHandlerBuilder {
    registry: Option<Arc<ToolRegistry>>,
    contexts: Option<Arc<SessionContexts>>,
    authority: Option<Arc<dyn PermissionAuthority>>,
    tabs: Option<Arc<dyn TabGroupProvider>>,
    surface: Option<Arc<dyn AutomationSurface>>,
    recordings: Option<Arc<RecordingStore>>,
    analytics: Option<Arc<dyn AnalyticsSink>>,
}

impl ToolCallHandlerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_contexts(mut self, contexts: Arc<SessionContexts>) -> Self {
        self.contexts = Some(contexts);
        self
    }

    pub fn with_authority(mut self, authority: Arc<dyn PermissionAuthority>) -> Self {
        self.authority = Some(authority);
        self
    }

    pub fn with_tabs(mut self, tabs: Arc<dyn TabGroupProvider>) -> Self {
        self.tabs = Some(tabs);
        self
    }

    /// Used for prompt screenshots and recording frames.
    pub fn with_surface(mut self, surface: Arc<dyn AutomationSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn with_recordings(mut self, recordings: Arc<RecordingStore>) -> Self {
        self.recordings = Some(recordings);
        self
    }

    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = Some(analytics);
        self
    }

    pub fn build(self) -> Result<ToolCallHandler, DispatchError> {
        let missing = |what: &str| DispatchError::Configuration(format!("{what} is required"));
        Ok(ToolCallHandler {
            registry: self.registry.ok_or_else(|| missing("tool registry"))?,
            contexts: self.contexts.unwrap_or_default(),
            authority: self.authority.ok_or_else(|| missing("permission authority"))?,
            tabs: self.tabs.ok_or_else(|| missing("tab group provider"))?,
            surface: self.surface,
            recordings: self.recordings,
            analytics: self
                .analytics
                .unwrap_or_else(|| Arc::new(TracingAnalytics)),
        })
    }
}

/// Tab a call runs against and its URL when the call was resolved.
struct ResolvedTab {
    tab: TabId,
    url: String,
}

impl ToolCallHandler {
    pub fn builder() -> ToolCallHandlerBuilder {
        ToolCallHandlerBuilder::new()
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn contexts(&self) -> &Arc<SessionContexts> {
        &self.contexts
    }

    pub fn authority(&self) -> &Arc<dyn PermissionAuthority> {
        &self.authority
    }

    /// Run one call to a terminal result. Errors never escape; they become `ActionResult::Error`.
    #[instrument(
        skip_all,
        fields(tool = %call.tool_name, tool_use_id = %call.tool_use_id, session = %call.session_id)
    )]
    pub async fn handle(&self, call: &ToolCall) -> ActionResult {
        let mut event = ToolCallEvent::new(&call.tool_name, call.session_id.clone());
        let result = match self.run(call, &mut event).await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "tool call failed");
                ActionResult::error(err.to_string())
            }
        };

        event.finish(&result);
        metrics::record_call(&call.tool_name, outcome_label(&result));
        self.analytics.record(&event);
        result
    }

    async fn run(
        &self,
        call: &ToolCall,
        event: &mut ToolCallEvent,
    ) -> Result<ActionResult, DispatchError> {
        let entry = self
            .registry
            .entry(&call.tool_name)
            .ok_or_else(|| DispatchError::UnknownTool(call.tool_name.clone()))?;
        let tool = entry.tool.clone();
        let params = coerce_params(&entry.schema, call.raw_params.clone());
        let session = self.contexts.get(&call.session_id);

        let resolved = if is_tab_exempt(&call.tool_name) {
            None
        } else {
            Some(self.resolve_tab(&params, &session).await?)
        };
        let ctx = ExecutionContext {
            session_id: call.session_id.clone(),
            tool_use_id: call.tool_use_id.clone(),
            tab_id: resolved.as_ref().map(|r| r.tab).or(session.tab_id),
            tab_group_id: session.tab_group_id,
            page_url: resolved.map(|r| r.url).unwrap_or_default(),
            authority: self.authority.clone(),
        };

        if let Some(gate) = tool.permission_gate(&params, &ctx)? {
            let url = gate.url.clone().unwrap_or_else(|| ctx.page_url.clone());
            event.permission = Some(gate.kind);
            event.verb = gate.verb.clone();
            event.domain = domain_of(&url);

            let check = self
                .authority
                .check_permission(&url, gate.kind, Some(&call.tool_use_id))
                .await?;
            if !check.allowed {
                if check.needs_prompt {
                    metrics::record_prompt(&call.tool_name);
                    debug!(permission = %gate.kind, "permission prompt issued");
                    return Ok(self.permission_prompt(call, &ctx, gate, url).await);
                }
                return Ok(ActionResult::error(format!(
                    "Permission denied: {} is not allowed on {}",
                    gate.kind,
                    origin_of(&url)
                )));
            }
        }

        let outcome = tool.execute(params, &ctx).await?;
        if !outcome.result.is_ok() {
            return Ok(outcome.result);
        }

        if let (Some(action), Some(group), Some(tab)) =
            (outcome.action, ctx.tab_group_id, ctx.tab_id)
        {
            if let (Some(surface), Some(store)) = (&self.surface, &self.recordings) {
                capture_action_frame(surface.as_ref(), store, group, tab, action).await;
            }
        }

        let current = self.contexts.get(&call.session_id).tab_id;
        Ok(self
            .attach_tab_context(outcome.result, current, ctx.tab_id)
            .await)
    }

    /// The call's tab: an explicit `tab_id` parameter, else the session's active tab.
    /// It must be listed in the session's group.
    async fn resolve_tab(
        &self,
        params: &Value,
        session: &SessionContext,
    ) -> Result<ResolvedTab, DispatchError> {
        let requested = params.get("tab_id").and_then(Value::as_i64).map(TabId);
        let tab = requested
            .or(session.tab_id)
            .ok_or(DispatchError::NoActiveTab)?;
        let reference = session.tab_id.unwrap_or(tab);
        let tabs = self.tabs.list_tabs_with_metadata(reference).await?;
        let info = find_tab(&tabs, tab).ok_or(DispatchError::TabNotInGroup(tab))?;
        Ok(ResolvedTab {
            tab,
            url: info.url.clone(),
        })
    }

    async fn permission_prompt(
        &self,
        call: &ToolCall,
        ctx: &ExecutionContext,
        gate: PermissionGate,
        url: String,
    ) -> ActionResult {
        let mut data = gate.prompt_data.unwrap_or_default();
        if gate.wants_screenshot {
            if let (Some(surface), Some(tab)) = (&self.surface, ctx.tab_id) {
                match surface.screenshot(tab).await {
                    Ok(shot) => data.screenshot = Some(shot.image),
                    Err(err) => debug!(tab = %tab, error = %err, "prompt screenshot failed"),
                }
            }
        }
        let action_data = (data != PromptActionData::default()).then_some(data);
        ActionResult::PermissionRequired(PermissionPrompt {
            tool: call.tool_name.clone(),
            url,
            tool_use_id: call.tool_use_id.clone(),
            permission: gate.kind,
            action_data,
        })
    }

    async fn attach_tab_context(
        &self,
        result: ActionResult,
        current: Option<TabId>,
        executed_on: Option<TabId>,
    ) -> ActionResult {
        let Some(reference) = executed_on.or(current) else {
            return result;
        };
        match self.tabs.list_tabs_with_metadata(reference).await {
            Ok(tabs) => result.with_tab_context(TabContext::new(current, executed_on, tabs)),
            Err(err) => {
                debug!(tab = %reference, error = %err, "tab context unavailable");
                result
            }
        }
    }
}

fn find_tab(tabs: &[TabInfo], tab: TabId) -> Option<&TabInfo> {
    tabs.iter().find(|info| info.id == tab)
}

fn domain_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
}

fn outcome_label(result: &ActionResult) -> &'static str {
    match result {
        ActionResult::Ok(_) => "ok",
        ActionResult::Error { .. } => "error",
        ActionResult::PermissionRequired(_) => "permission_required",
    }
}
