//! Source nodes backed by the search collaborator.

use crate::extract::list_text;
use async_trait::async_trait;
use presscore::services::{
    ModelConfig, SearchItem, SearchRequest, SearchService, SearchSource, TextGenerator,
};
use presscore::{NodeContext, NodeError, NodeHandler, NodeKind, Payload};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

fn default_max_items() -> usize {
    10
}

fn default_academic_results() -> usize {
    5
}

fn default_depth() -> u32 {
    2
}

fn default_language() -> String {
    "en".to_string()
}

/// Query from `config.query`, else the keywords joined by spaces.
fn query_from(query: &Option<String>, keywords: &[String]) -> Option<String> {
    query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .or_else(|| {
            let joined = keywords
                .iter()
                .map(|k| k.trim())
                .filter(|k| !k.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            (!joined.is_empty()).then_some(joined)
        })
}

fn items_to_json(items: Vec<SearchItem>, max: usize) -> Vec<Value> {
    items
        .into_iter()
        .take(max)
        .filter_map(|item| serde_json::to_value(item).ok())
        .collect()
}

fn filters(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedConfig {
    #[serde(default)]
    feeds: Vec<String>,
    #[serde(default = "default_max_items")]
    max_items: usize,
}

/// Pulls items from every configured feed. A feed that fails is logged and
/// skipped.
pub struct FeedAggregatorNode {
    search: Arc<dyn SearchService>,
}

impl FeedAggregatorNode {
    pub fn new(search: Arc<dyn SearchService>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl NodeHandler for FeedAggregatorNode {
    fn kind(&self) -> NodeKind {
        NodeKind::FeedAggregator
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError> {
        let config: FeedConfig = ctx.parse_config()?;
        let feeds: Vec<&str> = config
            .feeds
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .collect();
        if feeds.is_empty() {
            return Err(NodeError::Configuration("No feeds configured".to_string()));
        }

        let mut articles = Vec::new();
        for feed in feeds {
            let request = SearchRequest {
                source: SearchSource::Feed,
                query: feed.to_string(),
                filters: filters(&[("maxItems", json!(config.max_items))]),
            };
            match ctx.call(self.search.search(request)).await {
                Ok(results) => articles.extend(items_to_json(results.items, config.max_items)),
                Err(NodeError::Cancelled) => return Err(NodeError::Cancelled),
                Err(e) => {
                    tracing::warn!("Feed {} failed: {}", feed, e);
                    ctx.trace.error(format!("Failed to read feed {}: {}", feed, e));
                }
            }
        }

        Ok(ctx.output().with("articles", articles))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsConfig {
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    query: Option<String>,
    #[serde(default = "default_max_items")]
    max_results: usize,
    #[serde(default = "default_language")]
    language: String,
}

pub struct NewsDiscoveryNode {
    search: Arc<dyn SearchService>,
}

impl NewsDiscoveryNode {
    pub fn new(search: Arc<dyn SearchService>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl NodeHandler for NewsDiscoveryNode {
    fn kind(&self) -> NodeKind {
        NodeKind::NewsDiscovery
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError> {
        let config: NewsConfig = ctx.parse_config()?;
        let query = query_from(&config.query, &config.keywords).ok_or_else(|| {
            NodeError::Configuration("News discovery needs keywords or a query".to_string())
        })?;

        let request = SearchRequest {
            source: SearchSource::News,
            query,
            filters: filters(&[
                ("maxResults", json!(config.max_results)),
                ("language", json!(config.language)),
            ]),
        };
        let results = ctx.call(self.search.search(request)).await?;

        Ok(ctx
            .output()
            .with("articles", items_to_json(results.items, config.max_results)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AcademicConfig {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default = "default_academic_results")]
    max_results: usize,
}

pub struct AcademicSearchNode {
    search: Arc<dyn SearchService>,
}

impl AcademicSearchNode {
    pub fn new(search: Arc<dyn SearchService>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl NodeHandler for AcademicSearchNode {
    fn kind(&self) -> NodeKind {
        NodeKind::AcademicSearch
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError> {
        let config: AcademicConfig = ctx.parse_config()?;
        let query = query_from(&config.query, &config.keywords).ok_or_else(|| {
            NodeError::Configuration("Academic search needs a query or keywords".to_string())
        })?;

        let request = SearchRequest {
            source: SearchSource::Academic,
            query,
            filters: filters(&[("maxResults", json!(config.max_results))]),
        };
        let results = ctx.call(self.search.search(request)).await?;

        Ok(ctx
            .output()
            .with("papers", items_to_json(results.items, config.max_results)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeepResearchConfig {
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    query: Option<String>,
    #[serde(default = "default_depth")]
    depth: u32,
    #[serde(default)]
    model: Option<String>,
}

/// Searches a topic, then asks the text generator for a summary of the
/// findings.
pub struct DeepResearchNode {
    search: Arc<dyn SearchService>,
    text: Arc<dyn TextGenerator>,
}

impl DeepResearchNode {
    pub fn new(search: Arc<dyn SearchService>, text: Arc<dyn TextGenerator>) -> Self {
        Self { search, text }
    }
}

#[async_trait]
impl NodeHandler for DeepResearchNode {
    fn kind(&self) -> NodeKind {
        NodeKind::DeepResearch
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError> {
        let config: DeepResearchConfig = ctx.parse_config()?;
        let topic = [config.topic.as_deref(), config.query.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|t| !t.is_empty())
            .or_else(|| ctx.input.get_str("title"))
            .map(str::to_string)
            .ok_or_else(|| {
                NodeError::missing_any("research topic", &["config.topic", "config.query", "title"])
            })?;

        let request = SearchRequest {
            source: SearchSource::Research,
            query: topic.clone(),
            filters: filters(&[("depth", json!(config.depth))]),
        };
        let results = ctx.call(self.search.search(request)).await?;
        let articles = items_to_json(results.items, usize::MAX);

        let findings = Payload::new().with("articles", articles.clone());
        let findings = list_text(&findings, "articles").unwrap_or_default();
        let prompt = format!(
            "Summarize the current research on \"{}\" in a few paragraphs.\n\nSources:\n\n{}",
            topic, findings
        );
        let model = ModelConfig {
            model: config.model.unwrap_or_else(|| ModelConfig::default().model),
            ..ModelConfig::default()
        };
        let summary = ctx.call(self.text.generate(&prompt, &model)).await?;

        Ok(ctx
            .output()
            .with("articles", articles)
            .with("researchSummary", summary.text.trim()))
    }
}
