// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::fmt;

use crate::config::consts::{DEFAULT_OUTPAINT_EXPAND, DEFAULT_UPSCALE_FACTOR};
use crate::engine::{ExecutionResult, NodeInputs};
use crate::errors::HandlerError;
use crate::graph::Node;
use crate::handlers::resolve_prompt;
use crate::service::{ImageParams, InpaintParams, OutpaintParams, UpscaleParams};
use crate::traits::{HandlerContext, NodeHandler};

pub const TOOL_TYPE_KEY: &str = "toolType";
pub const MASK_IMAGE_KEY: &str = "maskImage";

/// Post-processing operation of a `tool` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolType {
    RemoveBackground,
    Upscale,
    Inpaint,
    Outpaint,
}

impl ToolType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "removebg" => Some(ToolType::RemoveBackground),
            "upscale" => Some(ToolType::Upscale),
            "inpaint" => Some(ToolType::Inpaint),
            "outpaint" => Some(ToolType::Outpaint),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::RemoveBackground => "removebg",
            ToolType::Upscale => "upscale",
            ToolType::Inpaint => "inpaint",
            ToolType::Outpaint => "outpaint",
        }
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-side outpaint expansion. All zero falls back to `expandAll` on every side.
fn outpaint_params(node: &Node, image_url: &str, prompt: Option<String>) -> OutpaintParams {
    let side = |key: &str| node.u32_field(key).unwrap_or(0);
    let (mut left, mut right, mut top, mut bottom) = (
        side("expandLeft"),
        side("expandRight"),
        side("expandTop"),
        side("expandBottom"),
    );
    if left == 0 && right == 0 && top == 0 && bottom == 0 {
        let all = node.u32_field("expandAll").unwrap_or(DEFAULT_OUTPAINT_EXPAND);
        (left, right, top, bottom) = (all, all, all, all);
    }
    OutpaintParams {
        image_url: image_url.to_string(),
        expand_left: left,
        expand_right: right,
        expand_top: top,
        expand_bottom: bottom,
        prompt,
    }
}

/// Image post-processing: background removal, upscaling, inpainting, outpainting.
///
/// Every tool needs one image input. Inpainting also needs `maskImage` in the node's
/// data; without it no call is attempted.
#[derive(Debug, Default, Clone, Copy)]
pub struct ToolHandler;

#[async_trait]
impl NodeHandler for ToolHandler {
    async fn handle(
        &self,
        node: &Node,
        inputs: &NodeInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<Option<ExecutionResult>, HandlerError> {
        let tool = match node.str_field(TOOL_TYPE_KEY) {
            None => return Err(HandlerError::MissingConfiguration(TOOL_TYPE_KEY)),
            Some(raw) => ToolType::parse(raw).ok_or_else(|| HandlerError::InvalidConfiguration {
                field: TOOL_TYPE_KEY,
                value: raw.to_string(),
            })?,
        };
        let mask = node.str_field(MASK_IMAGE_KEY);
        if tool == ToolType::Inpaint && mask.is_none() {
            return Err(HandlerError::MissingConfiguration(MASK_IMAGE_KEY));
        }
        let image_url = inputs
            .first_image()
            .ok_or_else(|| HandlerError::MissingInput("image".to_string()))?
            .to_string();

        let generated = match tool {
            ToolType::RemoveBackground => {
                ctx.service
                    .remove_background(&ImageParams { image_url })
                    .await?
            }
            ToolType::Upscale => {
                let scale = node.u32_field("scale").filter(|s| *s > 0);
                ctx.service
                    .upscale_image(&UpscaleParams {
                        image_url,
                        scale: scale.unwrap_or(DEFAULT_UPSCALE_FACTOR),
                    })
                    .await?
            }
            ToolType::Inpaint => {
                ctx.service
                    .inpaint_image(&InpaintParams {
                        image_url,
                        mask_image: mask.unwrap_or_default().to_string(),
                        prompt: resolve_prompt(node, inputs),
                    })
                    .await?
            }
            ToolType::Outpaint => {
                let params = outpaint_params(node, &image_url, resolve_prompt(node, inputs));
                ctx.service.outpaint_image(&params).await?
            }
        };
        Ok(Some(ExecutionResult::image(generated.image_url)))
    }

    fn name(&self) -> &'static str {
        "tool"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeType;
    use crate::handlers::test_support::{run_handler, HandlerRun};
    use crate::service::{Operation, RecordingService};

    fn photo() -> NodeInputs {
        NodeInputs::new().with(
            "img",
            NodeType::ImageInput,
            ExecutionResult::image("https://img/vase.png"),
        )
    }

    async fn run(node: Node, inputs: NodeInputs, service: &RecordingService) -> HandlerRun {
        run_handler(&ToolHandler, vec![node], vec![], "tool", inputs, service).await
    }

    #[tokio::test]
    async fn test_remove_background() {
        let service = RecordingService::new();
        let node = Node::new("tool", NodeType::Tool).with("toolType", "removebg");

        let result = run(node, photo(), &service).await.result.unwrap();

        assert_eq!(
            result,
            Some(ExecutionResult::image(RecordingService::url_for(Operation::RemoveBackground, 1)))
        );
        assert_eq!(
            service.calls_to(Operation::RemoveBackground)[0].params["imageUrl"],
            "https://img/vase.png"
        );
    }

    #[tokio::test]
    async fn test_upscale_defaults_to_two() {
        let service = RecordingService::new();
        let node = Node::new("tool", NodeType::Tool).with("toolType", "upscale");

        run(node, photo(), &service).await.result.unwrap();

        assert_eq!(service.calls_to(Operation::UpscaleImage)[0].params["scale"], 2);
    }

    #[tokio::test]
    async fn test_inpaint_without_mask_makes_no_call() {
        let service = RecordingService::new();
        let node = Node::new("tool", NodeType::Tool).with("toolType", "inpaint");

        let run = run(node, photo(), &service).await;

        let err = run.result.unwrap_err();
        assert!(matches!(err, HandlerError::MissingConfiguration("maskImage")));
        assert!(err.is_precondition());
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_inpaint_with_mask_and_prompt() {
        let service = RecordingService::new();
        let node = Node::new("tool", NodeType::Tool)
            .with("toolType", "inpaint")
            .with("maskImage", "https://img/mask.png")
            .with("prompt", "a bouquet of tulips");

        run(node, photo(), &service).await.result.unwrap();

        let params = &service.calls_to(Operation::InpaintImage)[0].params;
        assert_eq!(params["maskImage"], "https://img/mask.png");
        assert_eq!(params["prompt"], "a bouquet of tulips");
    }

    #[tokio::test]
    async fn test_outpaint_expand_all_fallback() {
        let service = RecordingService::new();
        let node = Node::new("tool", NodeType::Tool).with("toolType", "outpaint");

        run(node, photo(), &service).await.result.unwrap();

        let params = &service.calls_to(Operation::OutpaintImage)[0].params;
        for side in ["expandLeft", "expandRight", "expandTop", "expandBottom"] {
            assert_eq!(params[side], 256, "{}", side);
        }
    }

    #[tokio::test]
    async fn test_outpaint_explicit_sides() {
        let service = RecordingService::new();
        let node = Node::new("tool", NodeType::Tool)
            .with("toolType", "outpaint")
            .with("expandLeft", 128)
            .with("expandAll", 512);

        run(node, photo(), &service).await.result.unwrap();

        let params = &service.calls_to(Operation::OutpaintImage)[0].params;
        assert_eq!(params["expandLeft"], 128);
        assert_eq!(params["expandRight"], 0);
    }

    #[tokio::test]
    async fn test_unknown_tool_type() {
        let service = RecordingService::new();
        let node = Node::new("tool", NodeType::Tool).with("toolType", "sharpen");

        let run = run(node, photo(), &service).await;

        assert!(matches!(
            run.result,
            Err(HandlerError::InvalidConfiguration { field: "toolType", .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_image_input() {
        let service = RecordingService::new();
        let node = Node::new("tool", NodeType::Tool).with("toolType", "removebg");

        let run = run(node, NodeInputs::new(), &service).await;

        assert!(matches!(run.result, Err(HandlerError::MissingInput(_))));
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_service_failure_propagates() {
        let service = RecordingService::new().failing_on(Operation::UpscaleImage, "gpu busy");
        let node = Node::new("tool", NodeType::Tool).with("toolType", "upscale");

        let run = run(node, photo(), &service).await;

        assert!(matches!(run.result, Err(HandlerError::Service(_))));
    }
}
