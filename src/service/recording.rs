// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::errors::ServiceError;
use crate::observability::messages::service::ServiceCallRecorded;
use crate::observability::messages::StructuredLog;
use crate::service::{
    GenerateImageParams, GeneratedImage, GenerationService, ImageFile, ImageParams, ImagePayload,
    InpaintParams, Operation, OutpaintParams, PreprocessRequest, ReangleParams, ReferenceParams,
    ReimagineParams, RemixParams, ResceneParams, UpscaleParams,
};

/// Host of the synthetic URLs handed out by [`RecordingService`]. `.invalid` never resolves.
pub const DRY_RUN_HOST: &str = "https://dry-run.invalid";

/// One call as the service saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: Operation,
    pub params: Value,
    pub image_url: String,
}

/// Generation service that records calls instead of sending them.
///
/// Each call returns `https://dry-run.invalid/<operation>/<n>.png`, where `n` counts
/// calls from 1, so results are deterministic and traceable back to the call that made
/// them. Used by `--dry-run` and as the service double in tests; failures can be
/// injected per operation with [`RecordingService::failing_on`].
#[derive(Debug, Default)]
pub struct RecordingService {
    calls: Mutex<Vec<RecordedCall>>,
    failures: HashMap<Operation, String>,
}

impl RecordingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `operation` fail with [`ServiceError::Unavailable`].
    pub fn failing_on(mut self, operation: Operation, message: &str) -> Self {
        self.failures.insert(operation, message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().clone()
    }

    pub fn calls_to(&self, operation: Operation) -> Vec<RecordedCall> {
        self.lock()
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    /// URL the `n`th call (1-based) returns.
    pub fn url_for(operation: Operation, n: usize) -> String {
        format!("{}/{}/{}.png", DRY_RUN_HOST, operation.as_str(), n)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RecordedCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record<P>(&self, operation: Operation, params: &P) -> Result<GeneratedImage, ServiceError>
    where
        P: Serialize + ?Sized,
    {
        let params = serde_json::to_value(params)?;
        let image_url = {
            let mut calls = self.lock();
            let image_url = Self::url_for(operation, calls.len() + 1);
            calls.push(RecordedCall {
                operation,
                params: params.clone(),
                image_url: image_url.clone(),
            });
            image_url
        };

        if let Some(message) = self.failures.get(&operation) {
            return Err(ServiceError::Unavailable(message.clone()));
        }

        ServiceCallRecorded {
            operation: operation.as_str(),
            params: &params.to_string(),
            image_url: &image_url,
        }
        .log();
        Ok(GeneratedImage::new(image_url))
    }
}

#[async_trait]
impl GenerationService for RecordingService {
    async fn upload_image(&self, file: &ImageFile) -> Result<String, ServiceError> {
        Ok(self.record(Operation::UploadImage, file)?.image_url)
    }

    async fn preprocess_image(
        &self,
        image: &ImagePayload,
        preprocessor: &str,
    ) -> Result<GeneratedImage, ServiceError> {
        self.record(
            Operation::PreprocessImage,
            &PreprocessRequest {
                image,
                preprocessor,
            },
        )
    }

    async fn generate_image(
        &self,
        params: &GenerateImageParams,
    ) -> Result<GeneratedImage, ServiceError> {
        self.record(Operation::GenerateImage, params)
    }

    async fn remove_background(&self, params: &ImageParams) -> Result<GeneratedImage, ServiceError> {
        self.record(Operation::RemoveBackground, params)
    }

    async fn upscale_image(&self, params: &UpscaleParams) -> Result<GeneratedImage, ServiceError> {
        self.record(Operation::UpscaleImage, params)
    }

    async fn inpaint_image(&self, params: &InpaintParams) -> Result<GeneratedImage, ServiceError> {
        self.record(Operation::InpaintImage, params)
    }

    async fn outpaint_image(&self, params: &OutpaintParams) -> Result<GeneratedImage, ServiceError> {
        self.record(Operation::OutpaintImage, params)
    }

    async fn generate_reimagine(
        &self,
        params: &ReimagineParams,
    ) -> Result<GeneratedImage, ServiceError> {
        self.record(Operation::Reimagine, params)
    }

    async fn generate_reference(
        &self,
        params: &ReferenceParams,
    ) -> Result<GeneratedImage, ServiceError> {
        self.record(Operation::Reference, params)
    }

    async fn generate_rescene(&self, params: &ResceneParams) -> Result<GeneratedImage, ServiceError> {
        self.record(Operation::Rescene, params)
    }

    async fn generate_reangle(&self, params: &ReangleParams) -> Result<GeneratedImage, ServiceError> {
        self.record(Operation::Reangle, params)
    }

    async fn generate_remix(&self, params: &RemixParams) -> Result<GeneratedImage, ServiceError> {
        self.record(Operation::Remix, params)
    }
}
