//! Navigate primitive - URL loads and history traversal

use tabpilot_core_types::ActionResult;
use tracing::info;

use crate::{errors::ActionError, primitives::DefaultActionPrimitives, types::ActionCtx};

/// Add `https://` to scheme-less input and check that the result parses.
pub fn normalize_url(raw: &str) -> Result<String, ActionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ActionError::validation("url is required"));
    }
    let has_scheme = trimmed.contains("://")
        || ["about:", "data:", "file:", "javascript:"]
            .iter()
            .any(|scheme| trimmed.starts_with(scheme));
    let candidate = if has_scheme {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    url::Url::parse(&candidate)
        .map(|parsed| parsed.to_string())
        .map_err(|err| ActionError::validation(format!("invalid url '{trimmed}': {err}")))
}

pub async fn execute_navigate(
    primitives: &DefaultActionPrimitives,
    ctx: &ActionCtx,
    url: &str,
) -> Result<ActionResult, ActionError> {
    let tab = ctx.tab_id;
    let surface = primitives.surface();
    match url.trim().to_ascii_lowercase().as_str() {
        "back" => {
            surface.go_back(tab).await?;
            info!(tab = %tab, "navigated back");
            Ok(ActionResult::ok("Navigated back"))
        }
        "forward" => {
            surface.go_forward(tab).await?;
            info!(tab = %tab, "navigated forward");
            Ok(ActionResult::ok("Navigated forward"))
        }
        _ => {
            let target = normalize_url(url)?;
            surface.navigate(tab, &target).await?;
            info!(tab = %tab, url = %target, "navigated");
            Ok(ActionResult::ok(format!("Navigated to {target}")))
        }
    }
}
