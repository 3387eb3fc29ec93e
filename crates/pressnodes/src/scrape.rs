use async_trait::async_trait;
use presscore::services::ContentScraper;
use presscore::{NodeContext, NodeError, NodeHandler, NodeKind, Payload};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct ScraperConfig {
    #[serde(default)]
    urls: Vec<String>,
    #[serde(default)]
    selector: Option<String>,
}

/// Fetches each configured URL. A URL that fails is logged and skipped.
pub struct ContentScraperNode {
    scraper: Arc<dyn ContentScraper>,
}

impl ContentScraperNode {
    pub fn new(scraper: Arc<dyn ContentScraper>) -> Self {
        Self { scraper }
    }
}

#[async_trait]
impl NodeHandler for ContentScraperNode {
    fn kind(&self) -> NodeKind {
        NodeKind::ContentScraper
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError> {
        let config: ScraperConfig = ctx.parse_config()?;
        let urls: Vec<&str> = config
            .urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .collect();
        if urls.is_empty() {
            return Err(NodeError::Configuration("No URLs configured".to_string()));
        }

        let mut scraped = Vec::with_capacity(urls.len());
        for url in urls {
            match ctx
                .call(self.scraper.scrape(url, config.selector.as_deref()))
                .await
            {
                Ok(page) => scraped.push(json!({ "url": url, "content": page.content })),
                Err(NodeError::Cancelled) => return Err(NodeError::Cancelled),
                Err(e) => {
                    tracing::warn!("Scraping {} failed: {}", url, e);
                    ctx.trace.error(format!("Failed to scrape {}: {}", url, e));
                }
            }
        }

        Ok(ctx.output().with("scrapedContent", scraped))
    }
}
