// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::{ExecutionResult, NodeInputs};
use crate::errors::HandlerError;
use crate::graph::Node;
use crate::service::ImagePayload;
use crate::traits::{HandlerContext, NodeHandler};

pub const PREPROCESSOR_KEY: &str = "preprocessor";

/// Extracts a conditioning guide (edges, depth, pose, ...) from the first image input.
#[derive(Debug, Default, Clone, Copy)]
pub struct ControlNetHandler;

#[async_trait]
impl NodeHandler for ControlNetHandler {
    async fn handle(
        &self,
        node: &Node,
        inputs: &NodeInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<Option<ExecutionResult>, HandlerError> {
        let preprocessor = node
            .str_field(PREPROCESSOR_KEY)
            .ok_or(HandlerError::MissingConfiguration(PREPROCESSOR_KEY))?;
        let image = inputs
            .first_image()
            .ok_or_else(|| HandlerError::MissingInput("image".to_string()))?;

        let payload = ImagePayload::Url {
            url: image.to_string(),
        };
        let guide = ctx.service.preprocess_image(&payload, preprocessor).await?;
        Ok(Some(ExecutionResult::image(guide.image_url)))
    }

    fn name(&self) -> &'static str {
        "control_net"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeType;
    use crate::handlers::test_support::run_handler;
    use crate::service::{Operation, RecordingService};

    fn photo() -> NodeInputs {
        NodeInputs::new().with(
            "img",
            NodeType::ImageInput,
            ExecutionResult::image("https://img/dancer.png"),
        )
    }

    #[tokio::test]
    async fn test_preprocesses_first_image() {
        let service = RecordingService::new();
        let node = Node::new("cn", NodeType::ControlNet).with("preprocessor", "pose");

        let run = run_handler(&ControlNetHandler, vec![node], vec![], "cn", photo(), &service).await;

        assert_eq!(
            run.result.unwrap(),
            Some(ExecutionResult::image(RecordingService::url_for(Operation::PreprocessImage, 1)))
        );
        let call = &service.calls_to(Operation::PreprocessImage)[0];
        assert_eq!(call.params["preprocessor"], "pose");
        assert_eq!(call.params["image"]["url"], "https://img/dancer.png");
    }

    #[tokio::test]
    async fn test_no_image_input_issues_no_call() {
        let service = RecordingService::new();
        let node = Node::new("cn", NodeType::ControlNet).with("preprocessor", "depth");

        let run = run_handler(&ControlNetHandler, vec![node], vec![], "cn", NodeInputs::new(), &service).await;

        assert!(matches!(run.result, Err(HandlerError::MissingInput(_))));
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_preprocessor() {
        let service = RecordingService::new();
        let node = Node::new("cn", NodeType::ControlNet);

        let run = run_handler(&ControlNetHandler, vec![node], vec![], "cn", photo(), &service).await;

        assert!(matches!(
            run.result,
            Err(HandlerError::MissingConfiguration("preprocessor"))
        ));
    }
}
