// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Generative re-render operators applied to one or more input images.
//!
//! | `rerenderingType` | images | calls |
//! |-------------------|--------|-------|
//! | `reimagine`       | 1      | reimagine |
//! | `reference`       | 1      | generate-image, then reference |
//! | `rescene`         | 2 (object + scene) | rescene |
//! | `reangle`         | 1      | reangle |
//! | `remix`           | 1..n   | remix |

use async_trait::async_trait;
use std::fmt;

use crate::config::consts::{DEFAULT_REANGLE_DEGREES, DEFAULT_REIMAGINE_STRENGTH};
use crate::engine::{ExecutionResult, NodeInputs};
use crate::errors::HandlerError;
use crate::graph::{ImageRole, Node, IMAGE_TYPE_KEY};
use crate::handlers::resolve_prompt;
use crate::service::{
    GenerateImageParams, ReangleParams, ReferenceParams, ReimagineParams, RemixParams,
    ResceneParams,
};
use crate::traits::{HandlerContext, NodeHandler};

pub const RERENDERING_TYPE_KEY: &str = "rerenderingType";
pub const REFERENCE_TYPE_KEY: &str = "referenceType";

const REIMAGINE_TEMPLATE: &str = "Reimagine this image with a fresh interpretation while \
preserving its main subject and overall composition";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RerenderingType {
    Reimagine,
    Reference,
    Rescene,
    Reangle,
    Remix,
}

impl RerenderingType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reimagine" => Some(RerenderingType::Reimagine),
            "reference" => Some(RerenderingType::Reference),
            "rescene" => Some(RerenderingType::Rescene),
            "reangle" => Some(RerenderingType::Reangle),
            "remix" => Some(RerenderingType::Remix),
            _ => None,
        }
    }

    /// Subtype configured on a rerendering node.
    pub fn of(node: &Node) -> Option<Self> {
        node.str_field(RERENDERING_TYPE_KEY).and_then(Self::parse)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RerenderingType::Reimagine => "reimagine",
            RerenderingType::Reference => "reference",
            RerenderingType::Rescene => "rescene",
            RerenderingType::Reangle => "reangle",
            RerenderingType::Remix => "remix",
        }
    }
}

impl fmt::Display for RerenderingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the second stage of a reference chain takes from the reference image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceType {
    #[default]
    Style,
    Product,
    Character,
    Composition,
}

impl ReferenceType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "style" => Some(ReferenceType::Style),
            "product" => Some(ReferenceType::Product),
            "character" => Some(ReferenceType::Character),
            "composition" => Some(ReferenceType::Composition),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::Style => "style",
            ReferenceType::Product => "product",
            ReferenceType::Character => "character",
            ReferenceType::Composition => "composition",
        }
    }

    /// Fixed instruction sent with the second stage.
    pub fn instruction(&self) -> &'static str {
        match self {
            ReferenceType::Style => {
                "Apply the visual style of the reference image (color palette, lighting, \
                 texture and brushwork) to the first image while keeping its subject and layout."
            }
            ReferenceType::Product => {
                "Place the product from the reference image into the first image, preserving \
                 its exact shape, branding, colors and proportions, with lighting and shadows \
                 that match the scene."
            }
            ReferenceType::Character => {
                "Keep the character from the reference image consistent in the first image: \
                 same face, hair, clothing and distinguishing features."
            }
            ReferenceType::Composition => {
                "Rearrange the first image to follow the composition of the reference image: \
                 subject placement, framing, perspective and visual balance."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReangleDirection {
    Left,
    #[default]
    Right,
    Up,
    Down,
}

impl ReangleDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Some(ReangleDirection::Left),
            "right" => Some(ReangleDirection::Right),
            "up" => Some(ReangleDirection::Up),
            "down" => Some(ReangleDirection::Down),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReangleDirection::Left => "left",
            ReangleDirection::Right => "right",
            ReangleDirection::Up => "up",
            ReangleDirection::Down => "down",
        }
    }
}

fn single_image(inputs: &NodeInputs) -> Result<String, HandlerError> {
    inputs
        .first_image()
        .map(str::to_string)
        .ok_or_else(|| HandlerError::MissingInput("image".to_string()))
}

/// Optional enum-valued field: absent → default, unparseable → invalid configuration.
fn parse_field<T: Default>(
    node: &Node,
    field: &'static str,
    parse: fn(&str) -> Option<T>,
) -> Result<T, HandlerError> {
    match node.str_field(field) {
        None => Ok(T::default()),
        Some(raw) => parse(raw).ok_or_else(|| HandlerError::InvalidConfiguration {
            field,
            value: raw.to_string(),
        }),
    }
}

/// Assign object and scene roles to exactly two images.
///
/// Explicit `object`/`scene` tags on the source nodes are honored first; `fuse` and
/// untagged images then fill whichever role is still open, in edge order. Two images
/// claiming the same explicit role can't be placed.
fn assign_roles(
    images: &[(Option<ImageRole>, String)],
) -> Result<(String, String), HandlerError> {
    let mut object: Option<&str> = None;
    let mut scene: Option<&str> = None;

    for (role, url) in images {
        let slot = match role {
            Some(ImageRole::Object) => &mut object,
            Some(ImageRole::Scene) => &mut scene,
            _ => continue,
        };
        if slot.is_some() {
            return Err(HandlerError::InvalidConfiguration {
                field: IMAGE_TYPE_KEY,
                value: format!(
                    "both images are tagged '{}'",
                    role.map(|r| r.as_str()).unwrap_or_default()
                ),
            });
        }
        *slot = Some(url.as_str());
    }

    for (role, url) in images {
        if matches!(role, Some(ImageRole::Object) | Some(ImageRole::Scene)) {
            continue;
        }
        if object.is_none() {
            object = Some(url.as_str());
        } else if scene.is_none() {
            scene = Some(url.as_str());
        }
    }

    match (object, scene) {
        (Some(object), Some(scene)) => Ok((object.to_string(), scene.to_string())),
        _ => Err(HandlerError::MissingInput("object and scene images".to_string())),
    }
}

/// Dispatches on `rerenderingType`. Missing inputs and unknown subtypes skip without
/// calling the service.
#[derive(Debug, Default, Clone, Copy)]
pub struct RerenderingHandler;

impl RerenderingHandler {
    async fn reimagine(
        &self,
        node: &Node,
        inputs: &NodeInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<String, HandlerError> {
        let image_url = single_image(inputs)?;
        let prompt = match resolve_prompt(node, inputs) {
            Some(user) => format!("{}. {}", REIMAGINE_TEMPLATE, user),
            None => REIMAGINE_TEMPLATE.to_string(),
        };
        let params = ReimagineParams {
            image_url,
            prompt,
            strength: node
                .f64_field("strength")
                .unwrap_or(DEFAULT_REIMAGINE_STRENGTH),
        };
        Ok(ctx.service.generate_reimagine(&params).await?.image_url)
    }

    /// Two dependent calls: text-to-image, then a reference pass that combines the
    /// stage-one image with the input image under a fixed per-type instruction.
    async fn reference(
        &self,
        node: &Node,
        inputs: &NodeInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<String, HandlerError> {
        let reference_url = single_image(inputs)?;
        let prompt = resolve_prompt(node, inputs)
            .ok_or_else(|| HandlerError::MissingInput("prompt".to_string()))?;
        let reference_type = parse_field(node, REFERENCE_TYPE_KEY, ReferenceType::parse)?;

        let stage_one = ctx
            .service
            .generate_image(&GenerateImageParams::text_to_image(prompt.as_str()))
            .await?;

        let params = ReferenceParams {
            image_urls: vec![stage_one.image_url, reference_url],
            prompt: format!("{} {}", reference_type.instruction(), prompt),
            reference_type: reference_type.as_str().to_string(),
        };
        Ok(ctx.service.generate_reference(&params).await?.image_url)
    }

    async fn rescene(
        &self,
        node: &Node,
        inputs: &NodeInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<String, HandlerError> {
        let images: Vec<(Option<ImageRole>, String)> = inputs
            .images()
            .map(|(input, url)| {
                let role = ctx
                    .graph
                    .node(&input.source)
                    .and_then(|source| source.str_field(IMAGE_TYPE_KEY))
                    .and_then(ImageRole::parse);
                (role, url.to_string())
            })
            .collect();
        if images.len() != 2 {
            return Err(HandlerError::MissingInput(format!(
                "exactly two images, got {}",
                images.len()
            )));
        }

        let (object_image_url, scene_image_url) = assign_roles(&images)?;
        let params = ResceneParams {
            object_image_url,
            scene_image_url,
            prompt: resolve_prompt(node, inputs),
        };
        Ok(ctx.service.generate_rescene(&params).await?.image_url)
    }

    async fn reangle(
        &self,
        node: &Node,
        inputs: &NodeInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<String, HandlerError> {
        let image_url = single_image(inputs)?;
        let direction = parse_field(node, "direction", ReangleDirection::parse)?;
        let params = ReangleParams {
            image_url,
            degrees: node.f64_field("degrees").unwrap_or(DEFAULT_REANGLE_DEGREES),
            direction: direction.as_str().to_string(),
            prompt: resolve_prompt(node, inputs),
        };
        Ok(ctx.service.generate_reangle(&params).await?.image_url)
    }

    async fn remix(
        &self,
        node: &Node,
        inputs: &NodeInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<String, HandlerError> {
        let image_urls: Vec<String> = inputs.images().map(|(_, url)| url.to_string()).collect();
        if image_urls.is_empty() {
            return Err(HandlerError::MissingInput("at least one image".to_string()));
        }
        let params = RemixParams {
            image_urls,
            prompt: resolve_prompt(node, inputs),
        };
        Ok(ctx.service.generate_remix(&params).await?.image_url)
    }
}

#[async_trait]
impl NodeHandler for RerenderingHandler {
    async fn handle(
        &self,
        node: &Node,
        inputs: &NodeInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<Option<ExecutionResult>, HandlerError> {
        let kind = match node.str_field(RERENDERING_TYPE_KEY) {
            None => return Err(HandlerError::MissingConfiguration(RERENDERING_TYPE_KEY)),
            Some(raw) => RerenderingType::parse(raw).ok_or_else(|| {
                HandlerError::InvalidConfiguration {
                    field: RERENDERING_TYPE_KEY,
                    value: raw.to_string(),
                }
            })?,
        };

        let url = match kind {
            RerenderingType::Reimagine => self.reimagine(node, inputs, ctx).await?,
            RerenderingType::Reference => self.reference(node, inputs, ctx).await?,
            RerenderingType::Rescene => self.rescene(node, inputs, ctx).await?,
            RerenderingType::Reangle => self.reangle(node, inputs, ctx).await?,
            RerenderingType::Remix => self.remix(node, inputs, ctx).await?,
        };
        Ok(Some(ExecutionResult::image(url)))
    }

    fn name(&self) -> &'static str {
        "rerendering"
    }
}
