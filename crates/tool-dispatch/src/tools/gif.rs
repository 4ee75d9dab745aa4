//! The `gif_creator` tool: recording lifecycle and export for the session's tab group.

use std::sync::Arc;

use action_primitives::{coords::scale_point, Point, ScalingContextProvider};
use async_trait::async_trait;
use gif_recorder::{
    EncodeOptions, ExportRequest, ExportTarget, GifExporter, StartOutcome, StopOutcome,
};
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tabpilot_core_types::{ActionResult, PermissionKind, PromptActionData};
use tracing::info;

use crate::errors::DispatchError;
use crate::model::{ExecutionContext, PermissionGate, ToolOutcome};
use crate::registry::{parse_params, schema_for_params, Tool};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GifAction {
    StartRecording,
    StopRecording,
    Export,
    Clear,
}

#[derive(Clone, Debug, Deserialize, JsonSchema)]
pub struct GifCreatorParams {
    pub action: GifAction,
    /// Download the GIF instead of dropping it onto the page
    pub download: Option<bool>,
    /// Screenshot-space `[x, y]` where the GIF is dropped
    pub coordinate: Option<[f64; 2]>,
    pub filename: Option<String>,
    /// 1 (best) to 30 (fastest)
    #[schemars(range(min = 1, max = 30))]
    pub quality: Option<u8>,
    pub show_click_indicators: Option<bool>,
    pub show_drag_paths: Option<bool>,
    pub show_action_labels: Option<bool>,
    pub show_progress_bar: Option<bool>,
    pub show_watermark: Option<bool>,
    pub tab_id: Option<i64>,
}

impl GifCreatorParams {
    fn wants_download(&self) -> bool {
        self.download.unwrap_or(false)
    }

    fn drop_coordinate(&self) -> Result<[f64; 2], DispatchError> {
        self.coordinate.ok_or_else(|| {
            DispatchError::InvalidParams(
                "export needs a drop coordinate or download=true".to_string(),
            )
        })
    }

    fn encode_options(&self, defaults: &EncodeOptions) -> EncodeOptions {
        EncodeOptions {
            show_click_indicators: self
                .show_click_indicators
                .unwrap_or(defaults.show_click_indicators),
            show_drag_paths: self.show_drag_paths.unwrap_or(defaults.show_drag_paths),
            show_action_labels: self
                .show_action_labels
                .unwrap_or(defaults.show_action_labels),
            show_progress_bar: self.show_progress_bar.unwrap_or(defaults.show_progress_bar),
            show_watermark: self.show_watermark.unwrap_or(defaults.show_watermark),
            quality: self.quality.unwrap_or(defaults.quality),
        }
    }
}

pub struct GifCreatorTool {
    exporter: Arc<GifExporter>,
    scaling: Arc<dyn ScalingContextProvider>,
    defaults: EncodeOptions,
}

impl GifCreatorTool {
    pub fn new(
        exporter: Arc<GifExporter>,
        scaling: Arc<dyn ScalingContextProvider>,
        defaults: EncodeOptions,
    ) -> Self {
        Self {
            exporter,
            scaling,
            defaults,
        }
    }
}

#[async_trait]
impl Tool for GifCreatorTool {
    fn name(&self) -> &'static str {
        "gif_creator"
    }

    fn description(&self) -> &'static str {
        "Record actions in this tab group and export them as an animated GIF, \
         either downloaded or dropped onto the page at a coordinate."
    }

    fn parameters(&self) -> RootSchema {
        schema_for_params::<GifCreatorParams>()
    }

    fn permission_gate(
        &self,
        params: &Value,
        ctx: &ExecutionContext,
    ) -> Result<Option<PermissionGate>, DispatchError> {
        let params: GifCreatorParams = parse_params(params)?;
        if params.action != GifAction::Export || params.wants_download() {
            return Ok(None);
        }
        let coordinate = params.drop_coordinate()?;
        // Nothing to upload: let execution report the missing group or frames.
        let Some(group) = ctx.tab_group_id else {
            return Ok(None);
        };
        if self.exporter.store().frame_count(group) == 0 {
            return Ok(None);
        }
        Ok(Some(
            PermissionGate::new(PermissionKind::UploadImage)
                .with_verb("gif_export")
                .with_prompt_data(PromptActionData {
                    coordinate: Some(coordinate),
                    ..PromptActionData::default()
                }),
        ))
    }

    async fn execute(
        &self,
        params: Value,
        ctx: &ExecutionContext,
    ) -> Result<ToolOutcome, DispatchError> {
        let params: GifCreatorParams = parse_params(&params)?;
        let group = ctx.tab_group_id.ok_or(DispatchError::NoTabGroup)?;
        let store = self.exporter.store();

        let result = match params.action {
            GifAction::StartRecording => match store.start(group) {
                StartOutcome::Started { .. } => ActionResult::ok(
                    "Started recording. Actions in this tab group will be captured as frames.",
                ),
                StartOutcome::AlreadyActive => {
                    ActionResult::ok("Recording is already active for this tab group.")
                }
            },
            GifAction::StopRecording => match store.stop(group) {
                StopOutcome::Stopped { frames } => ActionResult::ok(format!(
                    "Stopped recording with {frames} frame(s). Use export to create the GIF."
                )),
                StopOutcome::NotActive => {
                    ActionResult::ok("Recording is not active for this tab group.")
                }
            },
            GifAction::Clear => {
                let discarded = store.clear(group);
                ActionResult::ok(format!("Cleared {discarded} frame(s)."))
            }
            GifAction::Export => {
                let target = if params.wants_download() {
                    ExportTarget::Download
                } else {
                    let tab = ctx.tab_id.ok_or(DispatchError::NoActiveTab)?;
                    let point = scale_point(
                        Point::from_pair(params.drop_coordinate()?),
                        self.scaling.get_context(tab).as_ref(),
                    );
                    ExportTarget::Drop {
                        tab,
                        x: point.x,
                        y: point.y,
                    }
                };
                let request = ExportRequest {
                    group,
                    target,
                    filename: params.filename.clone(),
                    options: params.encode_options(&self.defaults),
                };
                let outcome = self.exporter.export(request).await?;
                info!(
                    group = %group,
                    frames = outcome.frame_count,
                    bytes = outcome.byte_size,
                    "gif exported"
                );
                let delivered = match outcome.target {
                    ExportTarget::Download => "downloaded".to_string(),
                    ExportTarget::Drop { x, y, .. } => format!("dropped at ({x}, {y})"),
                };
                ActionResult::ok(format!(
                    "Exported {} with {} frame(s) ({}x{}, {} bytes), {}.",
                    outcome.filename,
                    outcome.frame_count,
                    outcome.width,
                    outcome.height,
                    outcome.byte_size,
                    delivered
                ))
            }
        };
        Ok(result.into())
    }
}
