//! HTTP gateway implementing every collaborator contract.
//!
//! Each call is a JSON `POST` to `{base_url}/{endpoint}`; the response body
//! is decoded into the contract's result type.

use async_trait::async_trait;
use presscore::services::{
    ContentScraper, GeneratedImage, GeneratedText, ImageGenerator, ImageRequest, ModelConfig,
    Notifier, PublishRequest, PublishedArticle, Publisher, QualityReport, QualityValidator,
    ScrapedPage, SearchRequest, SearchResults, SearchService, ServiceResult, SocialPost,
    SocialPoster, TextGenerator, Translator,
};
use presscore::ServiceError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_timeout_secs() -> u64 {
    60
}

/// Where the gateway sends requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    pub base_url: String,
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full URL of an endpoint
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Serialize)]
struct ScrapeBody<'a> {
    url: &'a str,
    selector: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody<'a> {
    prompt: &'a str,
    #[serde(flatten)]
    model: &'a ModelConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslateBody<'a> {
    content: &'a str,
    target_language: &'a str,
    provider: &'a str,
}

#[derive(Deserialize)]
struct TranslateReply {
    #[serde(alias = "translatedContent", alias = "content")]
    text: String,
}

#[derive(Serialize)]
struct ValidateBody<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct NotifyBody<'a> {
    recipient: &'a str,
    subject: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct NotifyReply {
    #[serde(default)]
    delivered: bool,
}

#[derive(Serialize)]
struct SocialBody<'a> {
    platform: &'a str,
    message: &'a str,
    url: Option<&'a str>,
}

/// Collaborator implementation over a single JSON HTTP API.
pub struct HttpGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ServiceError::Http(format!("Failed to build client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> ServiceResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    ServiceError::Unavailable(format!("{}: {}", url, e))
                } else {
                    ServiceError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| ServiceError::Decode(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl ContentScraper for HttpGateway {
    async fn scrape(&self, url: &str, selector: Option<&str>) -> ServiceResult<ScrapedPage> {
        self.post_json("scrape", &ScrapeBody { url, selector }).await
    }
}

#[async_trait]
impl SearchService for HttpGateway {
    async fn search(&self, request: SearchRequest) -> ServiceResult<SearchResults> {
        self.post_json("search", &request).await
    }
}

#[async_trait]
impl TextGenerator for HttpGateway {
    async fn generate(&self, prompt: &str, model: &ModelConfig) -> ServiceResult<GeneratedText> {
        self.post_json("generate", &GenerateBody { prompt, model }).await
    }
}

#[async_trait]
impl Translator for HttpGateway {
    async fn translate(
        &self,
        content: &str,
        target_language: &str,
        provider: &str,
    ) -> ServiceResult<String> {
        let reply: TranslateReply = self
            .post_json(
                "translate",
                &TranslateBody {
                    content,
                    target_language,
                    provider,
                },
            )
            .await?;
        Ok(reply.text)
    }
}

#[async_trait]
impl ImageGenerator for HttpGateway {
    async fn generate_image(&self, request: ImageRequest) -> ServiceResult<GeneratedImage> {
        self.post_json("images", &request).await
    }
}

#[async_trait]
impl QualityValidator for HttpGateway {
    async fn validate(&self, content: &str) -> ServiceResult<QualityReport> {
        self.post_json("validate", &ValidateBody { content }).await
    }
}

#[async_trait]
impl Publisher for HttpGateway {
    async fn publish(&self, request: PublishRequest) -> ServiceResult<PublishedArticle> {
        self.post_json("publish", &request).await
    }
}

#[async_trait]
impl Notifier for HttpGateway {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> ServiceResult<bool> {
        let reply: NotifyReply = self
            .post_json(
                "notify",
                &NotifyBody {
                    recipient,
                    subject,
                    body,
                },
            )
            .await?;
        Ok(reply.delivered)
    }
}

#[async_trait]
impl SocialPoster for HttpGateway {
    async fn post(
        &self,
        platform: &str,
        message: &str,
        url: Option<&str>,
    ) -> ServiceResult<SocialPost> {
        self.post_json(
            "social",
            &SocialBody {
                platform,
                message,
                url,
            },
        )
        .await
    }
}
