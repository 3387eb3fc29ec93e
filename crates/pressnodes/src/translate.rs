use crate::extract::{slugify, ARTICLE_BODY_KEYS};
use async_trait::async_trait;
use presscore::services::Translator;
use presscore::{NodeContext, NodeError, NodeHandler, NodeKind, Payload};
use serde::Deserialize;
use std::sync::Arc;

const BODY_KEYS: [&str; 2] = ["content", "processedContent"];

fn default_language() -> String {
    "es".to_string()
}

fn default_provider() -> String {
    "default".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslatorConfig {
    #[serde(default = "default_language")]
    target_language: String,
    #[serde(default = "default_provider")]
    provider: String,
}

/// Translates the article body and title.
///
/// The slug is always derived from the untranslated title. A failed body
/// translation fails the node; a failed title translation keeps the original
/// title.
pub struct TranslatorNode {
    translator: Arc<dyn Translator>,
}

impl TranslatorNode {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self { translator }
    }
}

#[async_trait]
impl NodeHandler for TranslatorNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Translator
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError> {
        let config: TranslatorConfig = ctx.parse_config()?;
        let language = config.target_language.trim();
        if language.is_empty() {
            return Err(NodeError::Configuration(
                "targetLanguage must not be empty".to_string(),
            ));
        }

        let body = ctx
            .input
            .first_str(&BODY_KEYS)
            .or_else(|| ctx.input.first_str(&ARTICLE_BODY_KEYS));
        let original_title = ctx.input.get_str("title").map(str::to_string);
        if body.is_none() && original_title.is_none() {
            return Err(NodeError::missing_any(
                "nothing to translate",
                &["content", "processedContent", "title"],
            ));
        }

        let mut output = ctx.output();

        if let Some(body) = body {
            let translated = ctx
                .call(self.translator.translate(body, language, &config.provider))
                .await?;
            output.insert("processedContent", translated);
        }

        if let Some(original) = original_title {
            let title = match ctx
                .call(self.translator.translate(&original, language, &config.provider))
                .await
            {
                Ok(translated) if !translated.trim().is_empty() => translated.trim().to_string(),
                Ok(_) => original.clone(),
                Err(NodeError::Cancelled) => return Err(NodeError::Cancelled),
                Err(e) => {
                    tracing::warn!("Title translation failed, keeping original: {}", e);
                    original.clone()
                }
            };
            output.insert("slug", slugify(&original));
            output.insert("title", title);
            output.insert("originalTitle", original);
        }

        Ok(output.with("language", language))
    }
}
