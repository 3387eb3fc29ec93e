use async_trait::async_trait;
use presscore::services::{ImageGenerator, ImageRequest};
use presscore::{NodeContext, NodeError, NodeHandler, NodeKind, Payload};
use serde::Deserialize;
use std::sync::Arc;

const MAX_PROMPT_CHARS: usize = 500;

fn default_style() -> String {
    "photographic".to_string()
}

fn default_size() -> String {
    "1024x1024".to_string()
}

fn default_quality() -> String {
    "standard".to_string()
}

fn default_model() -> String {
    "default".to_string()
}

#[derive(Debug, Deserialize)]
struct ImageConfig {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default = "default_style")]
    style: String,
    #[serde(default = "default_size")]
    size: String,
    #[serde(default = "default_quality")]
    quality: String,
    #[serde(default = "default_model")]
    model: String,
}

pub struct ImageGeneratorNode {
    images: Arc<dyn ImageGenerator>,
}

impl ImageGeneratorNode {
    pub fn new(images: Arc<dyn ImageGenerator>) -> Self {
        Self { images }
    }
}

#[async_trait]
impl NodeHandler for ImageGeneratorNode {
    fn kind(&self) -> NodeKind {
        NodeKind::ImageGenerator
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError> {
        let config: ImageConfig = ctx.parse_config()?;
        let prompt = config
            .prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .or_else(|| ctx.input.first_str(&["title", "processedContent"]))
            .map(|p| p.chars().take(MAX_PROMPT_CHARS).collect::<String>())
            .ok_or_else(|| {
                NodeError::missing_any(
                    "no image prompt",
                    &["config.prompt", "title", "processedContent"],
                )
            })?;

        let image = ctx
            .call(self.images.generate_image(ImageRequest {
                prompt,
                style: config.style,
                size: config.size,
                quality: config.quality,
                model: config.model,
            }))
            .await?;

        if image.was_reused {
            tracing::info!("{} reused image {}", ctx.label, image.image_url);
        }

        Ok(ctx
            .output()
            .with("imageUrl", image.image_url)
            .with("imageWasReused", image.was_reused)
            .with("imageGeneratedWith", image.generated_with))
    }
}
