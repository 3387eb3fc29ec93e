//! Catalog of node kinds.
//!
//! Every kind has a display label, a category used by the palette, a short
//! description and the default configuration a freshly added node starts with.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Closed set of node kinds, plus a catch-all that keeps unknown kinds from
/// imported documents intact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Trigger,
    ContentScraper,
    FeedAggregator,
    AcademicSearch,
    NewsDiscovery,
    DeepResearch,
    AiContentProcessor,
    MultiSourceSynthesizer,
    ContentFilter,
    Translator,
    ImageGenerator,
    SeoAnalyzer,
    StructureValidator,
    Publisher,
    SocialPoster,
    EmailNotifier,
    Custom(String),
}

impl NodeKind {
    /// All catalog kinds, in palette order.
    pub const ALL: [NodeKind; 16] = [
        NodeKind::Trigger,
        NodeKind::ContentScraper,
        NodeKind::FeedAggregator,
        NodeKind::AcademicSearch,
        NodeKind::NewsDiscovery,
        NodeKind::DeepResearch,
        NodeKind::AiContentProcessor,
        NodeKind::MultiSourceSynthesizer,
        NodeKind::ContentFilter,
        NodeKind::Translator,
        NodeKind::ImageGenerator,
        NodeKind::SeoAnalyzer,
        NodeKind::StructureValidator,
        NodeKind::Publisher,
        NodeKind::SocialPoster,
        NodeKind::EmailNotifier,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Trigger => "trigger",
            NodeKind::ContentScraper => "content-scraper",
            NodeKind::FeedAggregator => "feed-aggregator",
            NodeKind::AcademicSearch => "academic-search",
            NodeKind::NewsDiscovery => "news-discovery",
            NodeKind::DeepResearch => "deep-research",
            NodeKind::AiContentProcessor => "ai-content-processor",
            NodeKind::MultiSourceSynthesizer => "multi-source-synthesizer",
            NodeKind::ContentFilter => "content-filter",
            NodeKind::Translator => "translator",
            NodeKind::ImageGenerator => "image-generator",
            NodeKind::SeoAnalyzer => "seo-analyzer",
            NodeKind::StructureValidator => "structure-validator",
            NodeKind::Publisher => "publisher",
            NodeKind::SocialPoster => "social-poster",
            NodeKind::EmailNotifier => "email-notifier",
            NodeKind::Custom(name) => name,
        }
    }

    pub fn is_trigger(&self) -> bool {
        matches!(self, NodeKind::Trigger)
    }

    /// Catalog entry for this kind. Custom kinds get a generic entry.
    pub fn spec(&self) -> KindSpec {
        let (label, category, description) = match self {
            NodeKind::Trigger => ("Trigger", "trigger", "Starts the workflow"),
            NodeKind::ContentScraper => ("Content Scraper", "source", "Fetches and extracts content from URLs"),
            NodeKind::FeedAggregator => ("Feed Aggregator", "source", "Collects entries from RSS/Atom feeds"),
            NodeKind::AcademicSearch => ("Academic Search", "source", "Searches academic papers"),
            NodeKind::NewsDiscovery => ("News Discovery", "source", "Finds recent news articles"),
            NodeKind::DeepResearch => ("Deep Research", "source", "Researches a topic across sources and summarizes it"),
            NodeKind::AiContentProcessor => ("AI Content Processor", "transform", "Rewrites content into an article with an LLM"),
            NodeKind::MultiSourceSynthesizer => ("Multi-Source Synthesizer", "transform", "Combines several sources into one text"),
            NodeKind::ContentFilter => ("Content Filter", "transform", "Keeps items matching keywords and length limits"),
            NodeKind::Translator => ("Translator", "transform", "Translates title and body"),
            NodeKind::ImageGenerator => ("Image Generator", "media", "Generates a cover image"),
            NodeKind::SeoAnalyzer => ("SEO Analyzer", "quality", "Scores content for search friendliness"),
            NodeKind::StructureValidator => ("Structure Validator", "quality", "Scores content structure and quality"),
            NodeKind::Publisher => ("Publisher", "output", "Creates the article record"),
            NodeKind::SocialPoster => ("Social Poster", "output", "Announces the article on social platforms"),
            NodeKind::EmailNotifier => ("Email Notifier", "output", "Sends an email notification"),
            NodeKind::Custom(name) => {
                return KindSpec {
                    kind: self.clone(),
                    label: name.clone(),
                    category: "custom".to_string(),
                    description: String::new(),
                    default_config: Map::new(),
                }
            }
        };

        KindSpec {
            kind: self.clone(),
            label: label.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            default_config: self.default_config(),
        }
    }

    pub fn label(&self) -> String {
        self.spec().label
    }

    pub fn default_config(&self) -> Map<String, Value> {
        let config = match self {
            NodeKind::Trigger => json!({ "triggerType": "manual" }),
            NodeKind::ContentScraper => json!({ "urls": [], "selector": null }),
            NodeKind::FeedAggregator => json!({ "feeds": [], "maxItems": 10 }),
            NodeKind::AcademicSearch => json!({ "query": "", "maxResults": 5 }),
            NodeKind::NewsDiscovery => json!({ "keywords": [], "maxResults": 10, "language": "en" }),
            NodeKind::DeepResearch => json!({ "topic": "", "depth": 2 }),
            NodeKind::AiContentProcessor => json!({
                "prompt": "Rewrite the following content as a well structured article with a title.",
                "model": "default",
                "temperature": 0.7,
                "maxTokens": 2000
            }),
            NodeKind::MultiSourceSynthesizer => json!({
                "prompt": "Synthesize the following sources into one coherent article.",
                "model": "default"
            }),
            NodeKind::ContentFilter => json!({ "keywords": [], "excludeKeywords": [], "minLength": 0 }),
            NodeKind::Translator => json!({ "targetLanguage": "es", "provider": "default" }),
            NodeKind::ImageGenerator => json!({
                "prompt": "",
                "style": "photographic",
                "size": "1024x1024",
                "quality": "standard",
                "model": "default"
            }),
            NodeKind::SeoAnalyzer => json!({ "minWords": 300, "targetKeywords": [] }),
            NodeKind::StructureValidator => json!({ "minScore": 60, "failOnInvalid": false }),
            NodeKind::Publisher => json!({ "status": "draft", "category": "general" }),
            NodeKind::SocialPoster => json!({ "platforms": [], "template": "{title} {url}" }),
            NodeKind::EmailNotifier => json!({ "recipient": "", "subject": "Workflow finished: {title}" }),
            NodeKind::Custom(_) => json!({}),
        };

        match config {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for NodeKind {
    fn from(s: String) -> Self {
        NodeKind::ALL
            .iter()
            .find(|kind| kind.as_str() == s)
            .cloned()
            .unwrap_or(NodeKind::Custom(s))
    }
}

impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        NodeKind::from(s.to_string())
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Catalog entry describing a node kind.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindSpec {
    pub kind: NodeKind,
    pub label: String,
    pub category: String,
    pub description: String,
    pub default_config: Map<String, Value>,
}

/// The full catalog in palette order.
pub fn catalog() -> Vec<KindSpec> {
    NodeKind::ALL.iter().map(NodeKind::spec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_strings_round_trip() {
        for kind in NodeKind::ALL.iter() {
            assert_eq!(&NodeKind::from(kind.as_str()), kind);
        }
        assert_eq!(
            NodeKind::from("webhook-listener"),
            NodeKind::Custom("webhook-listener".to_string())
        );
    }

    #[test]
    fn catalog_has_labels_and_defaults() {
        let catalog = catalog();
        assert_eq!(catalog.len(), NodeKind::ALL.len());
        assert!(catalog.iter().all(|spec| !spec.label.is_empty()));

        let scraper = NodeKind::ContentScraper.spec();
        assert_eq!(scraper.label, "Content Scraper");
        assert!(scraper.default_config.contains_key("urls"));
    }
}
