//! Text generation nodes.

use crate::extract::{list_text, parse_generated, require_content};
use async_trait::async_trait;
use presscore::services::{ModelConfig, TextGenerator};
use presscore::{NodeContext, NodeError, NodeHandler, NodeKind, Payload};
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_PROCESS_PROMPT: &str =
    "Rewrite the following content as a well structured article with a title.";
const DEFAULT_SYNTHESIS_PROMPT: &str =
    "Synthesize the following sources into one coherent article.";

/// Payload keys the synthesizer merges, in prompt order.
const SYNTHESIS_SOURCES: [&str; 4] = ["scrapedContent", "articles", "papers", "researchSummary"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    max_tokens: Option<u32>,
}

impl GenerationConfig {
    fn prompt_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(fallback)
    }

    fn model_config(&self) -> ModelConfig {
        let defaults = ModelConfig::default();
        ModelConfig {
            model: self
                .model
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(defaults.model),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
        }
    }
}

/// Turns whatever content the payload carries into an article with a title.
pub struct AiContentProcessorNode {
    text: Arc<dyn TextGenerator>,
}

impl AiContentProcessorNode {
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }
}

#[async_trait]
impl NodeHandler for AiContentProcessorNode {
    fn kind(&self) -> NodeKind {
        NodeKind::AiContentProcessor
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError> {
        let config: GenerationConfig = ctx.parse_config()?;
        let (source, content) = require_content(&ctx.input)?;
        tracing::debug!("{} using content from '{}'", ctx.label, source);

        let model = config.model_config();
        let prompt = format!("{}\n\n{}", config.prompt_or(DEFAULT_PROCESS_PROMPT), content);
        let generated = ctx.call(self.text.generate(&prompt, &model)).await?;
        let parsed = parse_generated(&generated.text);

        let mut output = ctx.output();
        if let Some(title) = parsed.title {
            output.insert("title", title);
        }
        Ok(output
            .with("processedContent", parsed.body)
            .with("aiModel", model.model))
    }
}

/// Merges several upstream sources into one article.
pub struct MultiSourceSynthesizerNode {
    text: Arc<dyn TextGenerator>,
}

impl MultiSourceSynthesizerNode {
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }
}

#[async_trait]
impl NodeHandler for MultiSourceSynthesizerNode {
    fn kind(&self) -> NodeKind {
        NodeKind::MultiSourceSynthesizer
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError> {
        let config: GenerationConfig = ctx.parse_config()?;

        let sources: Vec<String> = SYNTHESIS_SOURCES
            .iter()
            .filter_map(|key| match ctx.input.get_str(key) {
                Some(text) => Some(text.to_string()),
                None => list_text(&ctx.input, key),
            })
            .collect();
        if sources.is_empty() {
            return Err(NodeError::missing_any(
                "nothing to synthesize",
                &SYNTHESIS_SOURCES,
            ));
        }

        let prompt = format!(
            "{}\n\n{}",
            config.prompt_or(DEFAULT_SYNTHESIS_PROMPT),
            sources.join("\n\n===\n\n")
        );
        let model = config.model_config();
        let generated = ctx.call(self.text.generate(&prompt, &model)).await?;
        let parsed = parse_generated(&generated.text);

        let mut output = ctx
            .output()
            .with("synthesizedContent", parsed.body)
            .with("sourceCount", sources.len());
        if let Some(title) = parsed.title {
            output.insert("title", title);
        }
        Ok(output)
    }
}
