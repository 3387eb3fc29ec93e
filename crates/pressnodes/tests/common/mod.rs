#![allow(dead_code)]

use async_trait::async_trait;
use presscore::services::*;
use presscore::{Node, NodeContext, NodeKind, Payload, ServiceError};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

/// In-memory stand-in for every collaborator.
pub struct FakeGateway {
    pub generated_text: String,
    pub fail_urls: Vec<String>,
    pub fail_feeds: Vec<String>,
    pub fail_platforms: Vec<String>,
    /// Translating exactly this text fails
    pub fail_translation_of: Option<String>,
    pub quality: QualityReport,
    pub prompts: Mutex<Vec<String>>,
    pub searches: Mutex<Vec<SearchRequest>>,
    pub published: Mutex<Vec<PublishRequest>>,
    pub notifications: Mutex<Vec<(String, String, String)>>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            generated_text: "# Generated Title\n\nGenerated body.".to_string(),
            fail_urls: Vec::new(),
            fail_feeds: Vec::new(),
            fail_platforms: Vec::new(),
            fail_translation_of: None,
            quality: QualityReport {
                score: 80.0,
                is_valid: true,
                issues: Vec::new(),
            },
            prompts: Mutex::new(Vec::new()),
            searches: Mutex::new(Vec::new()),
            published: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
        }
    }
}

impl FakeGateway {
    pub fn services(self) -> (Arc<Self>, Services) {
        let shared = Arc::new(self);
        (shared.clone(), Services::from_shared(shared))
    }
}

#[async_trait]
impl ContentScraper for FakeGateway {
    async fn scrape(&self, url: &str, _selector: Option<&str>) -> ServiceResult<ScrapedPage> {
        if self.fail_urls.iter().any(|u| u == url) {
            return Err(ServiceError::Status {
                status: 404,
                body: "not found".to_string(),
            });
        }
        Ok(ScrapedPage {
            content: format!("Content of {}", url),
        })
    }
}

#[async_trait]
impl SearchService for FakeGateway {
    async fn search(&self, request: SearchRequest) -> ServiceResult<SearchResults> {
        self.searches.lock().unwrap().push(request.clone());
        if self.fail_feeds.contains(&request.query) {
            return Err(ServiceError::Unavailable(request.query));
        }
        let items = (1..=2)
            .map(|i| SearchItem {
                title: format!("{} result {}", request.query, i),
                content: format!("About {} ({})", request.query, i),
                url: Some(format!("https://example.com/{}", i)),
                published_at: None,
            })
            .collect();
        Ok(SearchResults { items })
    }
}

#[async_trait]
impl TextGenerator for FakeGateway {
    async fn generate(&self, prompt: &str, _model: &ModelConfig) -> ServiceResult<GeneratedText> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(GeneratedText {
            text: self.generated_text.clone(),
        })
    }
}

#[async_trait]
impl Translator for FakeGateway {
    async fn translate(
        &self,
        content: &str,
        target_language: &str,
        _provider: &str,
    ) -> ServiceResult<String> {
        if self.fail_translation_of.as_deref() == Some(content) {
            return Err(ServiceError::Http("translation backend down".to_string()));
        }
        Ok(match (content, target_language) {
            ("Hello World", "es") => "Hola Mundo".to_string(),
            ("Body text", "es") => "Texto del cuerpo".to_string(),
            _ => format!("[{}] {}", target_language, content),
        })
    }
}

#[async_trait]
impl ImageGenerator for FakeGateway {
    async fn generate_image(&self, request: ImageRequest) -> ServiceResult<GeneratedImage> {
        self.prompts.lock().unwrap().push(request.prompt);
        Ok(GeneratedImage {
            image_url: "https://img.example.com/1.png".to_string(),
            was_reused: false,
            generated_with: request.model,
        })
    }
}

#[async_trait]
impl QualityValidator for FakeGateway {
    async fn validate(&self, _content: &str) -> ServiceResult<QualityReport> {
        Ok(self.quality.clone())
    }
}

#[async_trait]
impl Publisher for FakeGateway {
    async fn publish(&self, request: PublishRequest) -> ServiceResult<PublishedArticle> {
        let mut published = self.published.lock().unwrap();
        published.push(request.clone());
        let slug = request.slug.unwrap_or_else(|| "generated-slug".to_string());
        Ok(PublishedArticle {
            id: format!("article-{}", published.len()),
            title: request.title,
            url: format!("https://blog.example.com/{}", slug),
            slug,
            status: request.status,
        })
    }
}

#[async_trait]
impl Notifier for FakeGateway {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> ServiceResult<bool> {
        self.notifications.lock().unwrap().push((
            recipient.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        Ok(true)
    }
}

#[async_trait]
impl SocialPoster for FakeGateway {
    async fn post(&self, platform: &str, _message: &str, url: Option<&str>) -> ServiceResult<SocialPost> {
        if self.fail_platforms.iter().any(|p| p == platform) {
            return Err(ServiceError::Status {
                status: 503,
                body: "rate limited".to_string(),
            });
        }
        Ok(SocialPost {
            platform: platform.to_string(),
            id: format!("{}-1", platform),
            url: url.map(str::to_string),
        })
    }
}

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

/// Context for one node of `kind` with `config` merged over the defaults.
pub fn context(kind: NodeKind, config: Value, input: Payload) -> NodeContext {
    let mut node = Node::new(kind).with_id("node-1");
    node.config.extend(object(config));
    NodeContext::new(&node, input)
}
