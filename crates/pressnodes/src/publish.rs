//! Output nodes that push the article somewhere.

use crate::extract::{render_template, require_article_body};
use async_trait::async_trait;
use presscore::services::{PublishRequest, Publisher, SocialPoster};
use presscore::{NodeContext, NodeError, NodeHandler, NodeKind, Payload};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const UNTITLED: &str = "Untitled";

fn default_status() -> String {
    "draft".to_string()
}

fn default_category() -> String {
    "general".to_string()
}

fn default_template() -> String {
    "{title} {url}".to_string()
}

#[derive(Debug, Deserialize)]
struct PublisherConfig {
    #[serde(default = "default_status")]
    status: String,
    #[serde(default = "default_category")]
    category: String,
}

pub struct PublisherNode {
    publisher: Arc<dyn Publisher>,
}

impl PublisherNode {
    pub fn new(publisher: Arc<dyn Publisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl NodeHandler for PublisherNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Publisher
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError> {
        let config: PublisherConfig = ctx.parse_config()?;
        let content = require_article_body(&ctx.input)?;
        let title = ctx.input.get_str("title").unwrap_or(UNTITLED).to_string();

        let request = PublishRequest {
            content,
            title,
            slug: ctx.input.get_str("slug").map(str::to_string),
            image_url: ctx.input.get_str("imageUrl").map(str::to_string),
            category: ctx
                .input
                .get_str("category")
                .unwrap_or(&config.category)
                .to_string(),
            status: config.status,
        };
        let article = ctx.call(self.publisher.publish(request)).await?;

        tracing::info!("Published article {} at {}", article.id, article.url);
        Ok(ctx
            .output()
            .with("articleId", article.id)
            .with("slug", article.slug)
            .with("status", article.status)
            .with("url", article.url)
            .with("published", true))
    }
}

#[derive(Debug, Deserialize)]
struct SocialConfig {
    #[serde(default)]
    platforms: Vec<String>,
    #[serde(default = "default_template")]
    template: String,
}

/// Posts an announcement to every configured platform. A platform that
/// fails is logged and skipped.
pub struct SocialPosterNode {
    social: Arc<dyn SocialPoster>,
}

impl SocialPosterNode {
    pub fn new(social: Arc<dyn SocialPoster>) -> Self {
        Self { social }
    }
}

#[async_trait]
impl NodeHandler for SocialPosterNode {
    fn kind(&self) -> NodeKind {
        NodeKind::SocialPoster
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError> {
        let config: SocialConfig = ctx.parse_config()?;
        let platforms: Vec<&str> = config
            .platforms
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();
        if platforms.is_empty() {
            return Err(NodeError::Configuration("No platforms configured".to_string()));
        }
        if ctx.input.first_str(&["url", "title"]).is_none() {
            return Err(NodeError::missing_any("nothing to announce", &["url", "title"]));
        }

        let message = render_template(&config.template, &ctx.input);
        let url = ctx.input.get_str("url");

        let mut posts = Vec::with_capacity(platforms.len());
        for platform in platforms {
            match ctx.call(self.social.post(platform, message.trim(), url)).await {
                Ok(post) => {
                    if let Ok(value) = serde_json::to_value(&post) {
                        posts.push(value);
                    }
                }
                Err(NodeError::Cancelled) => return Err(NodeError::Cancelled),
                Err(e) => {
                    tracing::warn!("Posting to {} failed: {}", platform, e);
                    ctx.trace.error(format!("Failed to post to {}: {}", platform, e));
                }
            }
        }

        Ok(ctx.output().with("socialPosts", Value::Array(posts)))
    }
}
