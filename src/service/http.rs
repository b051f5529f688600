// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::config::ServiceConfig;
use crate::errors::ServiceError;
use crate::observability::messages::service::{
    ServiceCallCompleted, ServiceCallFailed, ServiceCallStarted,
};
use crate::observability::messages::StructuredLog;
use crate::service::{
    GenerateImageParams, GeneratedImage, GenerationService, ImageFile, ImageParams, ImagePayload,
    InpaintParams, Operation, OutpaintParams, PreprocessRequest, ReangleParams, ReferenceParams,
    ReimagineParams, RemixParams, ResceneParams, UpscaleParams,
};

/// Generation service over HTTP.
///
/// Each operation is a JSON `POST <base_url>/<operation>`; the bearer token is read
/// once from the environment variable named in the config. Non-2xx responses become
/// [`ServiceError::Status`] with the response body attached.
#[derive(Debug, Clone)]
pub struct HttpGenerationService {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpGenerationService {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_config(cfg: &ServiceConfig) -> Result<Self, ServiceError> {
        let api_key = std::env::var(&cfg.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!(
                api_key_env = %cfg.api_key_env,
                "No API key found; requests will be sent unauthenticated"
            );
        }
        Self::new(
            &cfg.base_url,
            api_key,
            Duration::from_secs(cfg.timeout_seconds),
        )
    }

    pub fn endpoint(&self, operation: Operation) -> String {
        format!("{}/{}", self.base_url, operation.as_str())
    }

    async fn post<P, R>(&self, operation: Operation, body: &P) -> Result<R, ServiceError>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let endpoint = self.endpoint(operation);
        ServiceCallStarted {
            operation: operation.as_str(),
            endpoint: &endpoint,
        }
        .log();

        let result = self.send(&endpoint, body).await;
        if let Err(error) = &result {
            ServiceCallFailed {
                operation: operation.as_str(),
                error,
            }
            .log();
        }
        result
    }

    async fn send<P, R>(&self, endpoint: &str, body: &P) -> Result<R, ServiceError>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let mut request = self.client.post(endpoint).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        serde_json::from_str(&text).map_err(|e| ServiceError::InvalidResponse(e.to_string()))
    }

    async fn image_call<P>(&self, operation: Operation, params: &P) -> Result<GeneratedImage, ServiceError>
    where
        P: Serialize + ?Sized + Sync,
    {
        let start = Instant::now();
        let image: GeneratedImage = self.post(operation, params).await?;
        ServiceCallCompleted {
            operation: operation.as_str(),
            image_url: &image.image_url,
            cost: image.cost,
            duration: start.elapsed(),
        }
        .log();
        Ok(image)
    }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn upload_image(&self, file: &ImageFile) -> Result<String, ServiceError> {
        Ok(self.image_call(Operation::UploadImage, file).await?.image_url)
    }

    async fn preprocess_image(
        &self,
        image: &ImagePayload,
        preprocessor: &str,
    ) -> Result<GeneratedImage, ServiceError> {
        let body = PreprocessRequest {
            image,
            preprocessor,
        };
        self.image_call(Operation::PreprocessImage, &body).await
    }

    async fn generate_image(
        &self,
        params: &GenerateImageParams,
    ) -> Result<GeneratedImage, ServiceError> {
        self.image_call(Operation::GenerateImage, params).await
    }

    async fn remove_background(&self, params: &ImageParams) -> Result<GeneratedImage, ServiceError> {
        self.image_call(Operation::RemoveBackground, params).await
    }

    async fn upscale_image(&self, params: &UpscaleParams) -> Result<GeneratedImage, ServiceError> {
        self.image_call(Operation::UpscaleImage, params).await
    }

    async fn inpaint_image(&self, params: &InpaintParams) -> Result<GeneratedImage, ServiceError> {
        self.image_call(Operation::InpaintImage, params).await
    }

    async fn outpaint_image(&self, params: &OutpaintParams) -> Result<GeneratedImage, ServiceError> {
        self.image_call(Operation::OutpaintImage, params).await
    }

    async fn generate_reimagine(
        &self,
        params: &ReimagineParams,
    ) -> Result<GeneratedImage, ServiceError> {
        self.image_call(Operation::Reimagine, params).await
    }

    async fn generate_reference(
        &self,
        params: &ReferenceParams,
    ) -> Result<GeneratedImage, ServiceError> {
        self.image_call(Operation::Reference, params).await
    }

    async fn generate_rescene(&self, params: &ResceneParams) -> Result<GeneratedImage, ServiceError> {
        self.image_call(Operation::Rescene, params).await
    }

    async fn generate_reangle(&self, params: &ReangleParams) -> Result<GeneratedImage, ServiceError> {
        self.image_call(Operation::Reangle, params).await
    }

    async fn generate_remix(&self, params: &RemixParams) -> Result<GeneratedImage, ServiceError> {
        self.image_call(Operation::Remix, params).await
    }
}
