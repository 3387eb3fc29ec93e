//! Contracts for the external services node handlers call into.
//!
//! Each collaborator is an opaque async request/response service. The engine
//! only depends on these traits; `pressnodes` ships an HTTP gateway that
//! implements all of them.

use crate::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub content: String,
}

#[async_trait]
pub trait ContentScraper: Send + Sync {
    async fn scrape(&self, url: &str, selector: Option<&str>) -> ServiceResult<ScrapedPage>;
}

/// Which corpus a search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
    Feed,
    News,
    Academic,
    Research,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub source: SearchSource,
    pub query: String,
    #[serde(default)]
    pub filters: Map<String, Value>,
}

/// One search hit: a title and some body-like text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    pub title: String,
    /// Body, abstract or description, whichever the source provides.
    #[serde(default, alias = "abstract", alias = "description", alias = "body")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub items: Vec<SearchItem>,
}

#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, request: SearchRequest) -> ServiceResult<SearchResults>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "default".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedText {
    pub text: String,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, model: &ModelConfig) -> ServiceResult<GeneratedText>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        content: &str,
        target_language: &str,
        provider: &str,
    ) -> ServiceResult<String>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub style: String,
    pub size: String,
    pub quality: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub image_url: String,
    pub was_reused: bool,
    pub generated_with: String,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, request: ImageRequest) -> ServiceResult<GeneratedImage>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub score: f64,
    pub is_valid: bool,
    #[serde(default)]
    pub issues: Vec<String>,
}

#[async_trait]
pub trait QualityValidator: Send + Sync {
    async fn validate(&self, content: &str) -> ServiceResult<QualityReport>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub content: String,
    pub title: String,
    pub slug: Option<String>,
    pub image_url: Option<String>,
    pub category: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedArticle {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub status: String,
    pub url: String,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, request: PublishRequest) -> ServiceResult<PublishedArticle>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns whether the message was accepted for delivery.
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> ServiceResult<bool>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    pub platform: String,
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[async_trait]
pub trait SocialPoster: Send + Sync {
    async fn post(&self, platform: &str, message: &str, url: Option<&str>) -> ServiceResult<SocialPost>;
}

/// The set of collaborators handed to the node handlers.
#[derive(Clone)]
pub struct Services {
    pub scraper: Arc<dyn ContentScraper>,
    pub search: Arc<dyn SearchService>,
    pub text: Arc<dyn TextGenerator>,
    pub translator: Arc<dyn Translator>,
    pub images: Arc<dyn ImageGenerator>,
    pub validator: Arc<dyn QualityValidator>,
    pub publisher: Arc<dyn Publisher>,
    pub notifier: Arc<dyn Notifier>,
    pub social: Arc<dyn SocialPoster>,
}

impl Services {
    /// Use one object for every contract, e.g. a gateway that implements all.
    pub fn from_shared<T>(shared: Arc<T>) -> Self
    where
        T: ContentScraper
            + SearchService
            + TextGenerator
            + Translator
            + ImageGenerator
            + QualityValidator
            + Publisher
            + Notifier
            + SocialPoster
            + 'static,
    {
        Self {
            scraper: shared.clone(),
            search: shared.clone(),
            text: shared.clone(),
            translator: shared.clone(),
            images: shared.clone(),
            validator: shared.clone(),
            publisher: shared.clone(),
            notifier: shared.clone(),
            social: shared,
        }
    }
}
