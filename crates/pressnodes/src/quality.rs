//! Content quality checks: local SEO heuristics and the remote validator.

use crate::extract::require_article_body;
use async_trait::async_trait;
use presscore::services::QualityValidator;
use presscore::{NodeContext, NodeError, NodeHandler, NodeKind, Payload};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

const TITLE_MIN_CHARS: usize = 30;
const TITLE_MAX_CHARS: usize = 60;

fn default_min_words() -> usize {
    300
}

fn default_min_score() -> f64 {
    60.0
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeoConfig {
    #[serde(default = "default_min_words")]
    min_words: usize,
    #[serde(default)]
    target_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoReport {
    pub score: u32,
    pub word_count: usize,
    pub title_length: usize,
    pub issues: Vec<String>,
}

fn analyze(body: &str, title: Option<&str>, config: &SeoConfig) -> SeoReport {
    let mut score: i32 = 100;
    let mut issues = Vec::new();

    let word_count = body.split_whitespace().count();
    if word_count < config.min_words {
        score -= 25;
        issues.push(format!(
            "Content has {} words, fewer than {}",
            word_count, config.min_words
        ));
    }

    let title_length = title.map(|t| t.chars().count()).unwrap_or(0);
    match title {
        None => {
            score -= 20;
            issues.push("Missing title".to_string());
        }
        Some(_) if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&title_length) => {
            score -= 10;
            issues.push(format!(
                "Title is {} characters, aim for {}-{}",
                title_length, TITLE_MIN_CHARS, TITLE_MAX_CHARS
            ));
        }
        Some(_) => {}
    }

    let haystack = format!("{} {}", title.unwrap_or_default(), body).to_lowercase();
    for keyword in config.target_keywords.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
        if !haystack.contains(&keyword.to_lowercase()) {
            score -= 10;
            issues.push(format!("Keyword '{}' not found", keyword));
        }
    }

    let has_headings = body.lines().any(|line| line.trim_start().starts_with('#'));
    if !has_headings && word_count >= config.min_words {
        score -= 5;
        issues.push("No subheadings".to_string());
    }

    SeoReport {
        score: score.clamp(0, 100) as u32,
        word_count,
        title_length,
        issues,
    }
}

/// Scores the article with local heuristics; no collaborator involved.
pub struct SeoAnalyzerNode;

#[async_trait]
impl NodeHandler for SeoAnalyzerNode {
    fn kind(&self) -> NodeKind {
        NodeKind::SeoAnalyzer
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError> {
        let config: SeoConfig = ctx.parse_config()?;
        let body = require_article_body(&ctx.input)?;
        let report = analyze(&body, ctx.input.get_str("title"), &config);

        let seo = serde_json::to_value(&report)
            .map_err(|e| NodeError::ExecutionFailed(format!("SEO report: {}", e)))?;
        Ok(ctx.output().with("seo", seo))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidatorConfig {
    #[serde(default = "default_min_score")]
    min_score: f64,
    #[serde(default)]
    fail_on_invalid: bool,
}

pub struct StructureValidatorNode {
    validator: Arc<dyn QualityValidator>,
}

impl StructureValidatorNode {
    pub fn new(validator: Arc<dyn QualityValidator>) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl NodeHandler for StructureValidatorNode {
    fn kind(&self) -> NodeKind {
        NodeKind::StructureValidator
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError> {
        let config: ValidatorConfig = ctx.parse_config()?;
        let body = require_article_body(&ctx.input)?;
        let report = ctx.call(self.validator.validate(&body)).await?;

        let mut issues = report.issues;
        let is_valid = report.is_valid && report.score >= config.min_score;
        if report.score < config.min_score {
            issues.push(format!(
                "Score {} is below the minimum of {}",
                report.score, config.min_score
            ));
        }

        if !is_valid && config.fail_on_invalid {
            return Err(NodeError::ExecutionFailed(format!(
                "Content failed validation (score {}): {}",
                report.score,
                issues.join("; ")
            )));
        }

        let issues: Vec<Value> = issues.into_iter().map(Value::String).collect();
        Ok(ctx
            .output()
            .with("qualityScore", report.score)
            .with("isValid", is_valid)
            .with("validationIssues", issues))
    }
}
