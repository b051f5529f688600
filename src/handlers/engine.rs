// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::consts::{
    DEFAULT_CFG_SCALE, DEFAULT_CONTROLNET_END_STEP, DEFAULT_CONTROLNET_START_STEP,
    DEFAULT_CONTROLNET_WEIGHT, DEFAULT_HEIGHT, DEFAULT_IP_ADAPTER_WEIGHT, DEFAULT_LORA_WEIGHT,
    DEFAULT_MODEL, DEFAULT_SEED_STRENGTH, DEFAULT_STEPS, DEFAULT_WIDTH, FLUX_KONTEXT_MODEL,
};
use crate::engine::{ExecutionResult, NodeInputs};
use crate::errors::HandlerError;
use crate::graph::{Node, NodeType};
use crate::handlers::control_net::PREPROCESSOR_KEY;
use crate::handlers::gear::lora_of;
use crate::handlers::resolve_prompt;
use crate::observability::messages::{handler::InputIgnored, StructuredLog};
use crate::service::{ControlNetGuide, GenerateImageParams, IpAdapterRef, LoraSpec};
use crate::traits::{HandlerContext, NodeHandler};

/// Upstream images sorted by the type of the node that produced them.
#[derive(Debug, Default, PartialEq)]
pub struct ImageSlots {
    pub controlnets: Vec<ControlNetGuide>,
    /// Images from tool and engine nodes; used as the seed when no image input exists
    pub seed_candidates: Vec<String>,
    pub ip_adapters: Vec<IpAdapterRef>,
    /// Images from image input nodes, first one wins
    pub seeds: Vec<String>,
}

impl ImageSlots {
    pub fn seed(&self) -> Option<&str> {
        self.seeds
            .first()
            .or_else(|| self.seed_candidates.first())
            .map(String::as_str)
    }

    /// Seed, seed candidates, then IP-adapter images, each URL once.
    pub fn reference_images(&self) -> Vec<String> {
        let mut refs: Vec<String> = Vec::new();
        let ordered = self
            .seed()
            .into_iter()
            .chain(self.seed_candidates.iter().map(String::as_str))
            .chain(self.ip_adapters.iter().map(|r| r.image_url.as_str()));
        for url in ordered {
            if !refs.iter().any(|r| r == url) {
                refs.push(url.to_string());
            }
        }
        refs
    }
}

/// Provenance categorization: an image's slot is decided by where it came from, never
/// by edge position.
pub fn categorize_images(node: &Node, inputs: &NodeInputs, ctx: &HandlerContext<'_>) -> ImageSlots {
    let ip_weight = node
        .f64_field("ipAdapterWeight")
        .unwrap_or(DEFAULT_IP_ADAPTER_WEIGHT);
    let mut slots = ImageSlots::default();

    for (input, url) in inputs.images() {
        match input.source_type {
            NodeType::ControlNet => {
                let source = ctx.graph.node(&input.source);
                let setting = |key: &str, default: f64| {
                    source.and_then(|s| s.f64_field(key)).unwrap_or(default)
                };
                slots.controlnets.push(ControlNetGuide {
                    image_url: url.to_string(),
                    control_type: source
                        .and_then(|s| s.str_field(PREPROCESSOR_KEY))
                        .unwrap_or("canny")
                        .to_string(),
                    weight: setting("weight", DEFAULT_CONTROLNET_WEIGHT),
                    start_step: setting("startStep", DEFAULT_CONTROLNET_START_STEP),
                    end_step: setting("endStep", DEFAULT_CONTROLNET_END_STEP),
                });
            }
            NodeType::Tool | NodeType::Engine => slots.seed_candidates.push(url.to_string()),
            NodeType::Rerendering => slots.ip_adapters.push(IpAdapterRef {
                image_url: url.to_string(),
                weight: ip_weight,
            }),
            NodeType::ImageInput => slots.seeds.push(url.to_string()),
            _ => InputIgnored {
                node_id: &node.id,
                source_id: &input.source,
                source_type: input.source_type.as_str(),
            }
            .log(),
        }
    }
    slots
}

#[derive(Debug, Deserialize)]
struct InlineLora {
    model: String,
    #[serde(default)]
    weight: Option<f64>,
}

/// Connected gear nodes first, then LoRAs configured inline on the engine itself.
/// Each model appears once; the first occurrence wins.
pub fn collect_loras(node: &Node, ctx: &HandlerContext<'_>) -> Vec<LoraSpec> {
    let mut loras: Vec<LoraSpec> = ctx
        .graph
        .incoming_nodes_of_type(&node.id, &NodeType::Gear)
        .into_iter()
        .filter_map(lora_of)
        .collect();

    let inline = node
        .data
        .get("loras")
        .cloned()
        .and_then(|v| serde_json::from_value::<Vec<InlineLora>>(v).ok())
        .unwrap_or_default()
        .into_iter()
        .filter(|l| !l.model.trim().is_empty())
        .map(|l| LoraSpec {
            model: l.model,
            weight: l.weight.unwrap_or(DEFAULT_LORA_WEIGHT),
        });
    let single = node.str_field("loraModel").map(|model| LoraSpec {
        model: model.to_string(),
        weight: node.f64_field("loraWeight").unwrap_or(DEFAULT_LORA_WEIGHT),
    });

    for lora in inline.chain(single) {
        if !loras.iter().any(|l| l.model == lora.model) {
            loras.push(lora);
        }
    }
    loras
}

/// `Flux Kontext`, `flux_kontext` and `flux-kontext` all name the same model.
pub fn is_flux_kontext(model: &str) -> bool {
    let normalized: String = model
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '_' { '-' } else { c })
        .collect();
    normalized == FLUX_KONTEXT_MODEL
}

/// Assemble the generation request for an engine node.
pub fn build_params(node: &Node, inputs: &NodeInputs, ctx: &HandlerContext<'_>) -> GenerateImageParams {
    let slots = categorize_images(node, inputs, ctx);
    let model = node.str_field("model").unwrap_or(DEFAULT_MODEL).to_string();

    let mut params = GenerateImageParams::text_to_image(resolve_prompt(node, inputs).unwrap_or_default());
    params.width = node.u32_field("width").filter(|w| *w > 0).unwrap_or(DEFAULT_WIDTH);
    params.height = node.u32_field("height").filter(|h| *h > 0).unwrap_or(DEFAULT_HEIGHT);

    if is_flux_kontext(&model) {
        // The service rejects steps, CFG, ControlNet and LoRA fields for this model
        params.model = model;
        params.reference_images = slots.reference_images();
        return params;
    }

    params.model = model;
    params.steps = Some(node.u32_field("steps").unwrap_or(DEFAULT_STEPS));
    params.cfg_scale = Some(node.f64_field("cfgScale").unwrap_or(DEFAULT_CFG_SCALE));
    params.loras = collect_loras(node, ctx);
    params.seed_image = slots.seed().map(str::to_string);
    if params.seed_image.is_some() {
        params.strength = Some(node.f64_field("strength").unwrap_or(DEFAULT_SEED_STRENGTH));
    }
    params.controlnets = slots.controlnets;
    params.ip_adapters = slots.ip_adapters;
    params
}

/// Primary generation node: one `generate-image` call built from every upstream value.
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineHandler;

#[async_trait]
impl NodeHandler for EngineHandler {
    async fn handle(
        &self,
        node: &Node,
        inputs: &NodeInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<Option<ExecutionResult>, HandlerError> {
        let params = build_params(node, inputs, ctx);
        let generated = ctx.service.generate_image(&params).await?;
        Ok(Some(ExecutionResult::image(generated.image_url)))
    }

    fn name(&self) -> &'static str {
        "engine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;
    use crate::handlers::test_support::{run_handler, HandlerRun};
    use crate::service::{Operation, RecordingService};
    use serde_json::json;

    async fn run(
        engine: Node,
        sources: Vec<Node>,
        inputs: NodeInputs,
        service: &RecordingService,
    ) -> HandlerRun {
        let edges = sources
            .iter()
            .enumerate()
            .map(|(i, s)| Edge::new(format!("e{}", i), s.id.as_str(), "eng"))
            .collect();
        let mut nodes = sources;
        nodes.push(engine);
        run_handler(&EngineHandler, nodes, edges, "eng", inputs, service).await
    }

    fn sent(service: &RecordingService) -> serde_json::Value {
        service.calls_to(Operation::GenerateImage)[0].params.clone()
    }

    #[tokio::test]
    async fn test_image_input_becomes_seed() {
        let service = RecordingService::new();
        let engine = Node::new("eng", NodeType::Engine).with("model", "std");
        let inputs = NodeInputs::new().with("a", NodeType::ImageInput, ExecutionResult::image("img1"));

        let run = run(engine, vec![Node::new("a", NodeType::ImageInput)], inputs, &service).await;

        assert_eq!(
            run.result.unwrap(),
            Some(ExecutionResult::image(RecordingService::url_for(Operation::GenerateImage, 1)))
        );
        let params = sent(&service);
        assert_eq!(params["seedImage"], "img1");
        assert_eq!(params["strength"], 0.75);
        assert_eq!(params["model"], "std");
    }

    #[tokio::test]
    async fn test_controlnet_and_seed_land_in_separate_slots() {
        let service = RecordingService::new();
        let sources = vec![
            Node::new("cn", NodeType::ControlNet)
                .with("preprocessor", "depth")
                .with("weight", 0.7)
                .with("endStep", 0.6),
            Node::new("img", NodeType::ImageInput),
        ];
        let inputs = NodeInputs::new()
            .with("cn", NodeType::ControlNet, ExecutionResult::image("https://img/depth.png"))
            .with("img", NodeType::ImageInput, ExecutionResult::image("https://img/photo.png"));

        run(Node::new("eng", NodeType::Engine), sources, inputs, &service)
            .await
            .result
            .unwrap();

        let params = sent(&service);
        assert_eq!(params["seedImage"], "https://img/photo.png");
        assert_eq!(
            params["controlnets"],
            json!([{
                "imageUrl": "https://img/depth.png",
                "type": "depth",
                "weight": 0.7,
                "startStep": 0.0,
                "endStep": 0.6
            }])
        );
        assert!(params.get("ipAdapters").is_none());
    }

    #[tokio::test]
    async fn test_tool_output_is_seed_only_without_image_input() {
        let service = RecordingService::new();
        let inputs = NodeInputs::new()
            .with("tool", NodeType::Tool, ExecutionResult::image("https://img/clean.png"))
            .with("rr", NodeType::Rerendering, ExecutionResult::image("https://img/style.png"));

        run(
            Node::new("eng", NodeType::Engine).with("ipAdapterWeight", 0.4),
            vec![Node::new("tool", NodeType::Tool), Node::new("rr", NodeType::Rerendering)],
            inputs,
            &service,
        )
        .await
        .result
        .unwrap();

        let params = sent(&service);
        assert_eq!(params["seedImage"], "https://img/clean.png");
        assert_eq!(
            params["ipAdapters"],
            json!([{ "imageUrl": "https://img/style.png", "weight": 0.4 }])
        );
    }

    #[tokio::test]
    async fn test_text_to_image_has_no_strength() {
        let service = RecordingService::new();
        let inputs = NodeInputs::new().with("t", NodeType::TextInput, ExecutionResult::text("a koi pond"));

        run(
            Node::new("eng", NodeType::Engine),
            vec![Node::new("t", NodeType::TextInput)],
            inputs,
            &service,
        )
        .await
        .result
        .unwrap();

        let params = sent(&service);
        assert_eq!(params["prompt"], "a koi pond");
        assert_eq!(params["model"], "sdxl");
        assert_eq!(params["width"], 1024);
        assert_eq!(params["steps"], 30);
        assert_eq!(params["cfgScale"], 7.0);
        assert!(params.get("seedImage").is_none());
        assert!(params.get("strength").is_none());
    }

    #[tokio::test]
    async fn test_gear_loras_merge_with_inline_and_win_on_conflict() {
        let service = RecordingService::new();
        let engine = Node::new("eng", NodeType::Engine)
            .with("loras", json!([{ "model": "ink", "weight": 0.2 }, { "model": "film" }]))
            .with("loraModel", "grain")
            .with("loraWeight", 0.3);
        let sources = vec![
            Node::new("g1", NodeType::Gear).with("loraModel", "ink").with("weight", 0.9),
            Node::new("g2", NodeType::Gear),
        ];

        run(engine, sources, NodeInputs::new(), &service)
            .await
            .result
            .unwrap();

        assert_eq!(
            sent(&service)["loras"],
            json!([
                { "model": "ink", "weight": 0.9 },
                { "model": "film", "weight": 1.0 },
                { "model": "grain", "weight": 0.3 }
            ])
        );
    }

    #[tokio::test]
    async fn test_flux_kontext_sends_only_supported_fields() {
        let service = RecordingService::new();
        let engine = Node::new("eng", NodeType::Engine)
            .with("model", "Flux Kontext")
            .with("prompt", "make it snow")
            .with("steps", 50)
            .with("loraModel", "ink");
        let sources = vec![
            Node::new("cn", NodeType::ControlNet).with("preprocessor", "canny"),
            Node::new("img", NodeType::ImageInput),
            Node::new("rr", NodeType::Rerendering),
        ];
        let inputs = NodeInputs::new()
            .with("cn", NodeType::ControlNet, ExecutionResult::image("https://img/edges.png"))
            .with("img", NodeType::ImageInput, ExecutionResult::image("https://img/street.png"))
            .with("rr", NodeType::Rerendering, ExecutionResult::image("https://img/style.png"));

        run(engine, sources, inputs, &service).await.result.unwrap();

        assert_eq!(
            sent(&service),
            json!({
                "prompt": "make it snow",
                "model": "Flux Kontext",
                "width": 1024,
                "height": 1024,
                "referenceImages": ["https://img/street.png", "https://img/style.png"]
            })
        );
    }

    #[test]
    fn test_flux_kontext_name_normalization() {
        assert!(is_flux_kontext("flux-kontext"));
        assert!(is_flux_kontext(" FLUX_Kontext "));
        assert!(is_flux_kontext("Flux Kontext"));
        assert!(!is_flux_kontext("flux-dev"));
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let service = RecordingService::new().failing_on(Operation::GenerateImage, "nsfw filter");

        let run = run(Node::new("eng", NodeType::Engine), vec![], NodeInputs::new(), &service).await;

        assert!(matches!(run.result, Err(HandlerError::Service(_))));
    }
}
