// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Upper bound on concurrent handler invocations when `max_concurrency` is unset
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Environment variable holding the generation service bearer token
pub const DEFAULT_API_KEY_ENV: &str = "RENDER_GRAPH_API_KEY";
pub const DEFAULT_SERVICE_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_SERVICE_TIMEOUT_SECONDS: u64 = 120;

// Engine generation defaults
pub const DEFAULT_MODEL: &str = "sdxl";
pub const DEFAULT_WIDTH: u32 = 1024;
pub const DEFAULT_HEIGHT: u32 = 1024;
pub const DEFAULT_STEPS: u32 = 30;
pub const DEFAULT_CFG_SCALE: f64 = 7.0;
/// Image-to-image strength, only sent when a seed image exists
pub const DEFAULT_SEED_STRENGTH: f64 = 0.75;
pub const DEFAULT_IP_ADAPTER_WEIGHT: f64 = 0.6;
pub const DEFAULT_CONTROLNET_WEIGHT: f64 = 1.0;
pub const DEFAULT_CONTROLNET_START_STEP: f64 = 0.0;
pub const DEFAULT_CONTROLNET_END_STEP: f64 = 1.0;
pub const DEFAULT_LORA_WEIGHT: f64 = 1.0;

/// Normalized model name that only accepts prompt, dimensions and reference images
pub const FLUX_KONTEXT_MODEL: &str = "flux-kontext";

// Rerendering defaults
pub const DEFAULT_REIMAGINE_STRENGTH: f64 = 0.5;
pub const DEFAULT_REANGLE_DEGREES: f64 = 45.0;

// Tool defaults
pub const DEFAULT_UPSCALE_FACTOR: u32 = 2;
/// Pixels added on every side when an outpaint node sets no explicit expansion
pub const DEFAULT_OUTPAINT_EXPAND: u32 = 256;
