//! Built-in tools.

mod computer;
mod gif;
mod navigate;
mod tabs;

pub use computer::{ComputerAction, ComputerParams, ComputerTool};
pub use gif::{GifAction, GifCreatorParams, GifCreatorTool};
pub use navigate::{NavigateParams, NavigateTool};
pub use tabs::{TabsContextTool, TabsCreateTool};

use action_primitives::ActionCtx;

use crate::errors::DispatchError;
use crate::model::ExecutionContext;

/// Action context for tools that run against the call's tab.
pub(crate) fn action_ctx(ctx: &ExecutionContext) -> Result<ActionCtx, DispatchError> {
    let tab = ctx.tab_id.ok_or(DispatchError::NoActiveTab)?;
    Ok(ActionCtx::new(tab, ctx.tool_use_id.clone(), ctx.page_url.clone())
        .with_authority(ctx.authority.clone()))
}
