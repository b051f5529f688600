// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Parameter sets sent to the generation service.
//!
//! Built by handlers just before a call and never persisted. Optional fields are left
//! out of the JSON body entirely when unset, which matters for models that reject
//! parameters they don't support.

use serde::{Deserialize, Serialize};

use crate::config::consts::{DEFAULT_HEIGHT, DEFAULT_MODEL, DEFAULT_WIDTH};

/// A local file prepared for upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFile {
    pub file_name: String,
    pub mime_type: String,
    /// Base64 (standard alphabet) file contents
    pub data: String,
}

impl ImageFile {
    pub fn new(file_name: &str, mime_type: &str, data: impl Into<String>) -> Self {
        Self {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            data: data.into(),
        }
    }
}

/// Image input of a preprocessing call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum ImagePayload {
    Url { url: String },
}

/// Body of a preprocessing call.
#[derive(Debug, Serialize)]
pub struct PreprocessRequest<'a> {
    pub image: &'a ImagePayload,
    pub preprocessor: &'a str,
}

/// Response of every image-producing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    #[serde(rename = "imageURL", alias = "imageUrl", alias = "url")]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

impl GeneratedImage {
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            cost: None,
        }
    }
}

/// A conditioning guide image with its schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlNetGuide {
    pub image_url: String,
    /// The preprocessor that produced the guide (`canny`, `depth`, `pose`, ...)
    #[serde(rename = "type")]
    pub control_type: String,
    pub weight: f64,
    /// Fraction of the sampling schedule where the guide starts applying
    pub start_step: f64,
    pub end_step: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpAdapterRef {
    pub image_url: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoraSpec {
    pub model: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageParams {
    pub prompt: String,
    pub model: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfg_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controlnets: Vec<ControlNetGuide>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_adapters: Vec<IpAdapterRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loras: Vec<LoraSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_images: Vec<String>,
}

impl GenerateImageParams {
    /// Plain text-to-image request at the default model and size.
    pub fn text_to_image(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: DEFAULT_MODEL.to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            steps: None,
            cfg_scale: None,
            controlnets: Vec::new(),
            ip_adapters: Vec::new(),
            loras: Vec::new(),
            seed_image: None,
            strength: None,
            reference_images: Vec::new(),
        }
    }
}

/// Single-image operation with no extra settings (background removal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageParams {
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpscaleParams {
    pub image_url: String,
    pub scale: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InpaintParams {
    pub image_url: String,
    pub mask_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutpaintParams {
    pub image_url: String,
    pub expand_left: u32,
    pub expand_right: u32,
    pub expand_top: u32,
    pub expand_bottom: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReimagineParams {
    pub image_url: String,
    pub prompt: String,
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceParams {
    /// `[generated, reference]`
    pub image_urls: Vec<String>,
    pub prompt: String,
    pub reference_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResceneParams {
    pub object_image_url: String,
    pub scene_image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReangleParams {
    pub image_url: String,
    pub degrees: f64,
    pub direction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemixParams {
    pub image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}
