// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The remote generative-media API consumed by node handlers.
//!
//! * [`HttpGenerationService`] - JSON over HTTP to a configured base URL
//! * [`RecordingService`] - records calls and returns synthetic URLs (dry runs, tests)

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::config::{ServiceBackend, ServiceConfig};
use crate::errors::ServiceError;

mod http;
pub mod params;
mod recording;

pub use http::HttpGenerationService;
pub use params::*;
pub use recording::{RecordedCall, RecordingService, DRY_RUN_HOST};

/// Remote operations, named after the endpoint each one posts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    UploadImage,
    PreprocessImage,
    GenerateImage,
    RemoveBackground,
    UpscaleImage,
    InpaintImage,
    OutpaintImage,
    Reimagine,
    Reference,
    Rescene,
    Reangle,
    Remix,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::UploadImage => "upload-image",
            Operation::PreprocessImage => "preprocess-image",
            Operation::GenerateImage => "generate-image",
            Operation::RemoveBackground => "remove-background",
            Operation::UpscaleImage => "upscale-image",
            Operation::InpaintImage => "inpaint-image",
            Operation::OutpaintImage => "outpaint-image",
            Operation::Reimagine => "reimagine",
            Operation::Reference => "reference",
            Operation::Rescene => "rescene",
            Operation::Reangle => "reangle",
            Operation::Remix => "remix",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request/response surface of the generation service.
///
/// Every call is a single request with a single terminal response; none support
/// cancellation.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Upload a local image and return the URL it is served from.
    async fn upload_image(&self, file: &ImageFile) -> Result<String, ServiceError>;

    async fn preprocess_image(
        &self,
        image: &ImagePayload,
        preprocessor: &str,
    ) -> Result<GeneratedImage, ServiceError>;

    async fn generate_image(&self, params: &GenerateImageParams)
        -> Result<GeneratedImage, ServiceError>;

    async fn remove_background(&self, params: &ImageParams) -> Result<GeneratedImage, ServiceError>;

    async fn upscale_image(&self, params: &UpscaleParams) -> Result<GeneratedImage, ServiceError>;

    async fn inpaint_image(&self, params: &InpaintParams) -> Result<GeneratedImage, ServiceError>;

    async fn outpaint_image(&self, params: &OutpaintParams) -> Result<GeneratedImage, ServiceError>;

    async fn generate_reimagine(
        &self,
        params: &ReimagineParams,
    ) -> Result<GeneratedImage, ServiceError>;

    async fn generate_reference(
        &self,
        params: &ReferenceParams,
    ) -> Result<GeneratedImage, ServiceError>;

    async fn generate_rescene(&self, params: &ResceneParams) -> Result<GeneratedImage, ServiceError>;

    async fn generate_reangle(&self, params: &ReangleParams) -> Result<GeneratedImage, ServiceError>;

    async fn generate_remix(&self, params: &RemixParams) -> Result<GeneratedImage, ServiceError>;
}

/// Build the service selected by `cfg`. `dry_run` forces the recording service.
pub fn from_config(
    cfg: &ServiceConfig,
    dry_run: bool,
) -> Result<Arc<dyn GenerationService>, ServiceError> {
    if dry_run || cfg.backend == ServiceBackend::DryRun {
        return Ok(Arc::new(RecordingService::new()));
    }
    Ok(Arc::new(HttpGenerationService::from_config(cfg)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_flag_overrides_http_backend() {
        let cfg = ServiceConfig::default();
        let service = from_config(&cfg, true).unwrap();

        let url = service
            .upload_image(&ImageFile::new("cat.png", "image/png", "aGk="))
            .await
            .unwrap();
        assert!(url.starts_with("https://dry-run.invalid/upload-image/"));
    }

    #[test]
    fn test_http_backend_builds() {
        let cfg = ServiceConfig::default();
        assert!(from_config(&cfg, false).is_ok());
    }
}
