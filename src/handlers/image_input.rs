// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::Path;

use crate::engine::{ExecutionResult, NodeInputs};
use crate::errors::HandlerError;
use crate::graph::{Node, NodeUpdate};
use crate::service::ImageFile;
use crate::traits::{HandlerContext, NodeHandler};

/// Local file waiting to be uploaded
pub const PENDING_FILE_KEY: &str = "pendingFile";
pub const IMAGE_URL_KEY: &str = "imageUrl";

/// Supplies an image URL, uploading a pending local file first when there is one.
///
/// A successful upload emits updates that store the new `imageUrl` on the node and
/// clear `pendingFile`, so once applied the next run reuses the URL instead of
/// uploading again.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageInputHandler;

fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

impl ImageInputHandler {
    async fn upload(
        &self,
        node: &Node,
        path: &Path,
        ctx: &HandlerContext<'_>,
    ) -> Result<String, HandlerError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");
        let file = ImageFile::new(file_name, mime_type(path), STANDARD.encode(bytes));

        let url = ctx.service.upload_image(&file).await?;
        ctx.emit(NodeUpdate::set(node.id.as_str(), IMAGE_URL_KEY, url.as_str()))
            .await;
        ctx.emit(NodeUpdate::remove(node.id.as_str(), PENDING_FILE_KEY))
            .await;
        Ok(url)
    }
}

#[async_trait]
impl NodeHandler for ImageInputHandler {
    async fn handle(
        &self,
        node: &Node,
        _inputs: &NodeInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<Option<ExecutionResult>, HandlerError> {
        if let Some(pending) = node.str_field(PENDING_FILE_KEY) {
            let url = self.upload(node, Path::new(pending), ctx).await?;
            return Ok(Some(ExecutionResult::image(url)));
        }

        match node.str_field(IMAGE_URL_KEY) {
            Some(url) => Ok(Some(ExecutionResult::image(url))),
            None => Err(HandlerError::MissingConfiguration(IMAGE_URL_KEY)),
        }
    }

    fn name(&self) -> &'static str {
        "image_input"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeType;
    use crate::handlers::test_support::run_handler;
    use crate::service::{Operation, RecordingService};
    use std::io::Write;

    #[tokio::test]
    async fn test_existing_url_is_returned_without_upload() {
        let service = RecordingService::new();
        let node = Node::new("img", NodeType::ImageInput).with("imageUrl", "https://img/cat.png");

        let run = run_handler(&ImageInputHandler, vec![node], vec![], "img", NodeInputs::new(), &service).await;

        assert_eq!(run.result.unwrap(), Some(ExecutionResult::image("https://img/cat.png")));
        assert!(run.updates.is_empty());
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_pending_file_is_uploaded_and_written_back() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"not-really-a-png").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let service = RecordingService::new();
        let node = Node::new("img", NodeType::ImageInput).with("pendingFile", path.as_str());

        let run = run_handler(&ImageInputHandler, vec![node], vec![], "img", NodeInputs::new(), &service).await;

        let uploaded = RecordingService::url_for(Operation::UploadImage, 1);
        assert_eq!(run.result.unwrap(), Some(ExecutionResult::image(uploaded.as_str())));
        assert_eq!(
            run.updates,
            vec![
                NodeUpdate::set("img", IMAGE_URL_KEY, uploaded.as_str()),
                NodeUpdate::remove("img", PENDING_FILE_KEY),
            ]
        );

        let calls = service.calls_to(Operation::UploadImage);
        assert_eq!(calls[0].params["mimeType"], "image/png");
        assert_eq!(calls[0].params["data"], STANDARD.encode(b"not-really-a-png"));
    }

    #[tokio::test]
    async fn test_upload_failure_is_not_a_precondition() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"bytes").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let service = RecordingService::new().failing_on(Operation::UploadImage, "storage down");
        let node = Node::new("img", NodeType::ImageInput).with("pendingFile", path.as_str());

        let run = run_handler(&ImageInputHandler, vec![node], vec![], "img", NodeInputs::new(), &service).await;

        let err = run.result.unwrap_err();
        assert!(matches!(err, HandlerError::Service(_)));
        assert!(!err.is_precondition());
        assert!(run.updates.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_pending_file_is_io_error() {
        let service = RecordingService::new();
        let node = Node::new("img", NodeType::ImageInput).with("pendingFile", "/no/such/file.png");

        let run = run_handler(&ImageInputHandler, vec![node], vec![], "img", NodeInputs::new(), &service).await;

        assert!(matches!(run.result, Err(HandlerError::Io(_))));
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_image_at_all_is_missing_configuration() {
        let service = RecordingService::new();
        let node = Node::new("img", NodeType::ImageInput);

        let run = run_handler(&ImageInputHandler, vec![node], vec![], "img", NodeInputs::new(), &service).await;

        assert!(matches!(
            run.result,
            Err(HandlerError::MissingConfiguration("imageUrl"))
        ));
    }
}
