//! The `computer` tool: mouse, keyboard and capture actions on the active tab.

use std::sync::Arc;

use action_primitives::{
    keys::parse_modifiers, ActionPrimitives, ClickKind, ClickParams, KeyMod, KeyParams, Point,
    ScrollDirection, ScrollParams, Target,
};
use async_trait::async_trait;
use gif_recorder::ActionInfo;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tabpilot_core_types::{ActionResult, PermissionKind, PromptActionData};
use tracing::debug;

use crate::errors::DispatchError;
use crate::model::{ExecutionContext, PermissionGate, ToolOutcome};
use crate::registry::{parse_params, schema_for_params, Tool};
use crate::tools::action_ctx;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComputerAction {
    LeftClick,
    RightClick,
    DoubleClick,
    TripleClick,
    Hover,
    LeftClickDrag,
    Scroll,
    ScrollTo,
    Key,
    Type,
    Zoom,
    Wait,
    Screenshot,
}

impl ComputerAction {
    pub fn verb(&self) -> &'static str {
        match self {
            ComputerAction::LeftClick => "left_click",
            ComputerAction::RightClick => "right_click",
            ComputerAction::DoubleClick => "double_click",
            ComputerAction::TripleClick => "triple_click",
            ComputerAction::Hover => "hover",
            ComputerAction::LeftClickDrag => "left_click_drag",
            ComputerAction::Scroll => "scroll",
            ComputerAction::ScrollTo => "scroll_to",
            ComputerAction::Key => "key",
            ComputerAction::Type => "type",
            ComputerAction::Zoom => "zoom",
            ComputerAction::Wait => "wait",
            ComputerAction::Screenshot => "screenshot",
        }
    }

    fn click_kind(&self) -> Option<ClickKind> {
        match self {
            ComputerAction::LeftClick => Some(ClickKind::LeftClick),
            ComputerAction::RightClick => Some(ClickKind::RightClick),
            ComputerAction::DoubleClick => Some(ClickKind::DoubleClick),
            ComputerAction::TripleClick => Some(ClickKind::TripleClick),
            _ => None,
        }
    }

    /// Permission category guarding this action; `wait` is ungated.
    pub fn permission(&self) -> Option<PermissionKind> {
        match self {
            ComputerAction::LeftClick
            | ComputerAction::RightClick
            | ComputerAction::DoubleClick
            | ComputerAction::TripleClick
            | ComputerAction::LeftClickDrag => Some(PermissionKind::Click),
            ComputerAction::Key | ComputerAction::Type => Some(PermissionKind::Type),
            ComputerAction::Hover
            | ComputerAction::Scroll
            | ComputerAction::ScrollTo
            | ComputerAction::Zoom
            | ComputerAction::Screenshot => Some(PermissionKind::ReadPageContent),
            ComputerAction::Wait => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl From<Direction> for ScrollDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => ScrollDirection::Up,
            Direction::Down => ScrollDirection::Down,
            Direction::Left => ScrollDirection::Left,
            Direction::Right => ScrollDirection::Right,
        }
    }
}

/// Parameters of the `computer` tool.
#[derive(Clone, Debug, Deserialize, JsonSchema)]
pub struct ComputerParams {
    /// Action to perform
    pub action: ComputerAction,
    /// Screenshot-space `[x, y]`; the drag end point for `left_click_drag`
    pub coordinate: Option<[f64; 2]>,
    /// Drag start point for `left_click_drag`
    pub start_coordinate: Option<[f64; 2]>,
    /// Element reference from a previous page read; takes priority over `coordinate`
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    /// Text to type, or space-separated keys for `key`
    pub text: Option<String>,
    /// Modifier keys held during a click, e.g. `"ctrl+shift"`
    pub modifiers: Option<String>,
    pub scroll_direction: Option<Direction>,
    /// Scroll ticks
    #[schemars(range(min = 1, max = 10))]
    pub scroll_amount: Option<u32>,
    /// Seconds to wait
    #[schemars(range(min = 0, max = 30))]
    pub duration: Option<f64>,
    /// `[x0, y0, x1, y1]` region to zoom into
    pub region: Option<[f64; 4]>,
    /// Times to repeat the key sequence
    #[schemars(range(min = 1, max = 100))]
    pub repeat: Option<u32>,
    /// Tab to act on; defaults to the session's active tab
    pub tab_id: Option<i64>,
}

impl ComputerParams {
    fn target(&self) -> Result<Target, DispatchError> {
        Ok(Target::from_parts(self.reference.as_deref(), self.coordinate)?)
    }

    fn required_coordinate(&self, name: &str) -> Result<Point, DispatchError> {
        let pair = match name {
            "start_coordinate" => self.start_coordinate,
            _ => self.coordinate,
        };
        pair.map(Point::from_pair).ok_or_else(|| {
            DispatchError::InvalidParams(format!("{name} is required for {}", self.action.verb()))
        })
    }

    fn required_text(&self) -> Result<&str, DispatchError> {
        self.text.as_deref().ok_or_else(|| {
            DispatchError::InvalidParams(format!("text is required for {}", self.action.verb()))
        })
    }

    fn modifier_mask(&self) -> Result<KeyMod, DispatchError> {
        match self.modifiers.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Ok(parse_modifiers(raw)?),
            _ => Ok(KeyMod::empty()),
        }
    }

    fn action_info(&self) -> ActionInfo {
        ActionInfo::new(self.action.verb())
            .with_coordinate(self.coordinate)
            .with_start_coordinate(self.start_coordinate)
            .with_text(self.text.clone())
    }
}

pub struct ComputerTool {
    primitives: Arc<dyn ActionPrimitives>,
}

impl ComputerTool {
    pub fn new(primitives: Arc<dyn ActionPrimitives>) -> Self {
        Self { primitives }
    }
}

#[async_trait]
impl Tool for ComputerTool {
    fn name(&self) -> &'static str {
        "computer"
    }

    fn description(&self) -> &'static str {
        "Use a mouse and keyboard to interact with the active browser tab, and take screenshots. \
         Coordinates are in the pixel space of the most recent screenshot."
    }

    fn parameters(&self) -> RootSchema {
        schema_for_params::<ComputerParams>()
    }

    fn permission_gate(
        &self,
        params: &Value,
        _ctx: &ExecutionContext,
    ) -> Result<Option<PermissionGate>, DispatchError> {
        let params: ComputerParams = parse_params(params)?;
        let Some(kind) = params.action.permission() else {
            return Ok(None);
        };
        let gate = PermissionGate::new(kind).with_verb(params.action.verb());
        let gate = match params.action {
            action if action.click_kind().is_some() => gate
                .with_prompt_data(PromptActionData {
                    coordinate: params.coordinate,
                    ..PromptActionData::default()
                })
                .with_screenshot(),
            ComputerAction::LeftClickDrag => gate.with_prompt_data(PromptActionData {
                coordinate: params.coordinate,
                start_coordinate: params.start_coordinate,
                ..PromptActionData::default()
            }),
            ComputerAction::Type | ComputerAction::Key => {
                gate.with_prompt_data(PromptActionData {
                    text: params.text.clone(),
                    ..PromptActionData::default()
                })
            }
            _ => gate,
        };
        Ok(Some(gate))
    }

    async fn execute(
        &self,
        params: Value,
        ctx: &ExecutionContext,
    ) -> Result<ToolOutcome, DispatchError> {
        let params: ComputerParams = parse_params(&params)?;
        let action_ctx = action_ctx(ctx)?;
        let primitives = &self.primitives;
        debug!(action = params.action.verb(), tab = %action_ctx.tab_id, "computer action");

        let result: ActionResult = match params.action {
            action @ (ComputerAction::LeftClick
            | ComputerAction::RightClick
            | ComputerAction::DoubleClick
            | ComputerAction::TripleClick) => {
                let kind = action
                    .click_kind()
                    .ok_or_else(|| DispatchError::InvalidParams("not a click action".into()))?;
                let click = ClickParams {
                    kind,
                    target: params.target()?,
                    modifiers: params.modifier_mask()?,
                };
                primitives.click(&action_ctx, &click).await?
            }
            ComputerAction::Hover => primitives.hover(&action_ctx, &params.target()?).await?,
            ComputerAction::LeftClickDrag => {
                let start = params.required_coordinate("start_coordinate")?;
                let end = params.required_coordinate("coordinate")?;
                primitives.drag(&action_ctx, start, end).await?
            }
            ComputerAction::Scroll => {
                let direction = params.scroll_direction.ok_or_else(|| {
                    DispatchError::InvalidParams("scroll_direction is required for scroll".into())
                })?;
                let scroll = ScrollParams {
                    coordinate: params.required_coordinate("coordinate")?,
                    direction: direction.into(),
                    amount: params.scroll_amount,
                };
                primitives.scroll(&action_ctx, &scroll).await?
            }
            ComputerAction::ScrollTo => {
                let reference = params.reference.as_deref().ok_or_else(|| {
                    DispatchError::InvalidParams("ref is required for scroll_to".into())
                })?;
                primitives.scroll_to(&action_ctx, reference).await?
            }
            ComputerAction::Key => {
                let key = KeyParams {
                    text: params.required_text()?.to_string(),
                    repeat: params.repeat.unwrap_or(1),
                };
                primitives.key(&action_ctx, &key).await?
            }
            ComputerAction::Type => {
                primitives
                    .type_text(&action_ctx, params.required_text()?)
                    .await?
            }
            ComputerAction::Zoom => {
                let region = params.region.ok_or_else(|| {
                    DispatchError::InvalidParams("region is required for zoom".into())
                })?;
                primitives.zoom(&action_ctx, region).await?
            }
            ComputerAction::Wait => {
                let duration = params.duration.ok_or_else(|| {
                    DispatchError::InvalidParams("duration is required for wait".into())
                })?;
                primitives.wait(&action_ctx, duration).await?
            }
            ComputerAction::Screenshot => primitives.screenshot(&action_ctx).await?,
        };

        Ok(ToolOutcome::new(result).with_action(params.action_info()))
    }
}
