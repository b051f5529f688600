// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::config::consts::{
    DEFAULT_API_KEY_ENV, DEFAULT_MAX_CONCURRENCY, DEFAULT_SERVICE_BASE_URL,
    DEFAULT_SERVICE_TIMEOUT_SECONDS,
};
use crate::config::validate_graph;
use crate::errors::ConfigError;
use crate::graph::{GraphDocument, NodeUpdate};
use crate::observability::messages::{validation::ValidationWarning, StructuredLog};

/// Runtime configuration for evaluating graphs.
///
/// Every field has a default, so an empty file (or no file at all) is a valid config.
///
/// # Example
/// ```yaml
/// strategy: concurrent
/// executor_options:
///   max_concurrency: 8
/// service:
///   backend: http
///   base_url: https://render.example.com/api
///   api_key_env: RENDER_API_KEY
///   timeout_seconds: 90
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub strategy: EvaluationStrategy,
    #[serde(default)]
    pub executor_options: ExecutorOptions,
    #[serde(default)]
    pub service: ServiceConfig,
}

/// How a node's dependencies are awaited.
///
/// * `Sequential` - one input at a time in edge-list order
/// * `Concurrent` - independent inputs in parallel, handler calls bounded by
///   `max_concurrency`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStrategy {
    #[default]
    Sequential,
    Concurrent,
}

impl EvaluationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationStrategy::Sequential => "sequential",
            EvaluationStrategy::Concurrent => "concurrent",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutorOptions {
    pub max_concurrency: Option<usize>,
}

impl ExecutorOptions {
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_CONCURRENCY)
    }
}

/// Which [`GenerationService`](crate::service::GenerationService) implementation to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceBackend {
    #[default]
    Http,
    DryRun,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub backend: ServiceBackend,
    pub base_url: String,
    pub api_key_env: String,
    pub timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            backend: ServiceBackend::Http,
            base_url: DEFAULT_SERVICE_BASE_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_seconds: DEFAULT_SERVICE_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let format = Format::of(path)?;
    let content = read(path)?;
    let value = match format {
        Format::Yaml => serde_yaml::from_str(&content)?,
        Format::Json => serde_json::from_str(&content)?,
        Format::Toml => toml::from_str(&content)?,
    };
    Ok(value)
}

/// Load a runtime config from a YAML, JSON or TOML file (chosen by extension)
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    parse(path.as_ref())
}

/// Load a graph document from a YAML, JSON or TOML file (chosen by extension)
pub fn load_graph<P: AsRef<Path>>(path: P) -> Result<GraphDocument, ConfigError> {
    parse(path.as_ref())
}

/// Load a graph document and validate it.
///
/// Errors (duplicate IDs, cycles) reject the document; warnings (dangling edges,
/// unknown node types) are logged and the document is returned.
pub fn load_and_validate_graph<P: AsRef<Path>>(path: P) -> Result<GraphDocument, ConfigError> {
    let doc = load_graph(path)?;
    let warnings = validate_graph(&doc).map_err(ConfigError::Invalid)?;
    for warning in &warnings {
        ValidationWarning { warning }.log();
    }
    Ok(doc)
}

/// Persist a graph document, e.g. after applying node updates from a run
pub fn save_graph<P: AsRef<Path>>(doc: &GraphDocument, path: P) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let content = match Format::of(path)? {
        Format::Yaml => serde_yaml::to_string(doc)?,
        Format::Json => serde_json::to_string_pretty(doc)?,
        Format::Toml => toml::to_string_pretty(&without_nulls(doc))?,
    };
    fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply node updates from a run to `doc` and save it to `path`.
///
/// Nothing is written when there are no updates. Returns how many updates touched an
/// existing node.
pub fn persist_updates<P: AsRef<Path>>(
    doc: &mut GraphDocument,
    updates: &[NodeUpdate],
    path: P,
) -> Result<usize, ConfigError> {
    if updates.is_empty() {
        return Ok(0);
    }
    let applied = doc.apply_updates(updates);
    save_graph(doc, path)?;
    Ok(applied)
}

/// TOML has no null. Null data values are dropped, which reads back as an absent key.
fn without_nulls(doc: &GraphDocument) -> GraphDocument {
    let mut doc = doc.clone();
    for node in &mut doc.nodes {
        strip_nulls_in_map(&mut node.data);
    }
    doc
}

fn strip_nulls_in_map(map: &mut Map<String, Value>) {
    map.retain(|_, value| !value.is_null());
    map.values_mut().for_each(strip_nulls);
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => strip_nulls_in_map(map),
        Value::Array(items) => {
            items.retain(|item| !item.is_null());
            items.iter_mut().for_each(strip_nulls);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node, NodeType};
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn write_temp(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
strategy: concurrent
executor_options:
  max_concurrency: 8
service:
  backend: dry_run
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.strategy, EvaluationStrategy::Concurrent);
        assert_eq!(cfg.executor_options.max_concurrency(), 8);
        assert_eq!(cfg.service.backend, ServiceBackend::DryRun);
        assert_eq!(cfg.service.api_key_env, DEFAULT_API_KEY_ENV);
        assert_eq!(cfg.service.timeout_seconds, DEFAULT_SERVICE_TIMEOUT_SECONDS);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.strategy, EvaluationStrategy::Sequential);
        assert_eq!(cfg.executor_options.max_concurrency(), DEFAULT_MAX_CONCURRENCY);
    }

    #[test]
    fn test_zero_max_concurrency_falls_back_to_default() {
        let options = ExecutorOptions {
            max_concurrency: Some(0),
        };
        assert_eq!(options.max_concurrency(), DEFAULT_MAX_CONCURRENCY);
    }

    #[test]
    fn test_load_config_from_toml_file() {
        let file = write_temp(
            ".toml",
            r#"
strategy = "concurrent"

[service]
backend = "http"
base_url = "https://render.example.com/api"
"#,
        );

        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.strategy, EvaluationStrategy::Concurrent);
        assert_eq!(cfg.service.base_url, "https://render.example.com/api");
    }

    #[test]
    fn test_load_graph_from_yaml_file() {
        let file = write_temp(
            ".yaml",
            r#"
nodes:
  - id: prompt
    type: textInput
    data:
      prompt: a lighthouse at dusk
  - id: engine
    type: engine
    data:
      model: sdxl
      steps: 20
edges:
  - id: e1
    source: prompt
    target: engine
"#,
        );

        let doc = load_graph(file.path()).unwrap();
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.nodes[0].node_type, NodeType::TextInput);
        assert_eq!(doc.nodes[1].u32_field("steps"), Some(20));
        assert_eq!(doc.edges[0].target, "engine");
    }

    #[test]
    fn test_load_graph_from_json_file() {
        let file = write_temp(
            ".json",
            r#"{"nodes":[{"id":"out","type":"output"}],"edges":[]}"#,
        );

        let doc = load_graph(file.path()).unwrap();
        assert_eq!(doc.nodes[0].node_type, NodeType::Output);
        assert!(doc.nodes[0].data.is_empty());
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_temp(".ini", "strategy=sequential");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_graph("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.yaml"));
    }

    #[test]
    fn test_load_and_validate_rejects_cycle() {
        let file = write_temp(
            ".yaml",
            r#"
nodes:
  - { id: a, type: tool }
  - { id: b, type: tool }
edges:
  - { id: e1, source: a, target: b }
  - { id: e2, source: b, target: a }
"#,
        );

        match load_and_validate_graph(file.path()) {
            Err(ConfigError::Invalid(errors)) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].to_string().contains("Cyclic dependency"));
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_load_and_validate_accepts_dangling_edge() {
        let file = write_temp(
            ".yaml",
            r#"
nodes:
  - { id: out, type: output }
edges:
  - { id: e1, source: gone, target: out }
"#,
        );

        let doc = load_and_validate_graph(file.path()).unwrap();
        assert_eq!(doc.edges.len(), 1);
    }

    #[test]
    fn test_save_graph_then_reload_each_format() {
        let doc = GraphDocument::new(
            vec![
                Node::new("img", NodeType::ImageInput).with("imageUrl", "https://img/a.png"),
                Node::new("out", NodeType::Output),
            ],
            vec![Edge::new("e1", "img", "out")],
        );
        let dir = tempfile::tempdir().unwrap();

        for name in ["graph.yaml", "graph.json", "graph.toml"] {
            let path = dir.path().join(name);
            save_graph(&doc, &path).unwrap();
            assert_eq!(load_graph(&path).unwrap(), doc, "format {}", name);
        }
    }

    #[test]
    fn test_save_graph_toml_drops_null_data() {
        let doc = GraphDocument::new(
            vec![Node::new("eng", NodeType::Engine)
                .with("prompt", Value::Null)
                .with("model", "sdxl")
                .with("loras", serde_json::json!([{ "model": "ink", "weight": null }, null]))],
            vec![],
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.toml");

        save_graph(&doc, &path).unwrap();

        let node = load_graph(&path).unwrap().nodes.remove(0);
        assert!(!node.data.contains_key("prompt"));
        assert_eq!(node.str_field("model"), Some("sdxl"));
        assert_eq!(node.data["loras"], serde_json::json!([{ "model": "ink" }]));
    }

    #[test]
    fn test_persist_updates_saves_only_when_something_changed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.yaml");
        let mut doc = GraphDocument::new(
            vec![Node::new("img", NodeType::ImageInput).with("pendingFile", "/tmp/cat.png")],
            vec![],
        );

        assert_eq!(persist_updates(&mut doc, &[], &path).unwrap(), 0);
        assert!(!path.exists());

        let updates = [
            NodeUpdate::set("img", "imageUrl", "https://cdn.example/cat.png"),
            NodeUpdate::remove("img", "pendingFile"),
        ];
        assert_eq!(persist_updates(&mut doc, &updates, &path).unwrap(), 2);

        let saved = load_graph(&path).unwrap();
        let node = saved.node("img").unwrap();
        assert_eq!(node.str_field("imageUrl"), Some("https://cdn.example/cat.png"));
        assert!(!node.data.contains_key("pendingFile"));
    }
}
