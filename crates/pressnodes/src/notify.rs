use crate::extract::{find_content, render_template};
use async_trait::async_trait;
use presscore::services::Notifier;
use presscore::{NodeContext, NodeError, NodeHandler, NodeKind, Payload};
use serde::Deserialize;
use std::sync::Arc;

const EXCERPT_CHARS: usize = 280;

fn default_subject() -> String {
    "Workflow finished: {title}".to_string()
}

#[derive(Debug, Deserialize)]
struct EmailConfig {
    #[serde(default)]
    recipient: String,
    #[serde(default = "default_subject")]
    subject: String,
}

/// Plain-text summary of what the run produced so far.
fn summary(input: &Payload) -> String {
    let mut lines = Vec::new();
    if let Some(title) = input.get_str("title") {
        lines.push(format!("Title: {}", title));
    }
    if let Some(url) = input.get_str("url") {
        lines.push(format!("URL: {}", url));
    }
    if let Some(status) = input.get_str("status") {
        lines.push(format!("Status: {}", status));
    }
    if let Some((_, content)) = find_content(input) {
        let excerpt: String = content.chars().take(EXCERPT_CHARS).collect();
        lines.push(String::new());
        lines.push(excerpt);
    }
    if lines.is_empty() {
        lines.push("The workflow finished without producing an article.".to_string());
    }
    lines.join("\n")
}

pub struct EmailNotifierNode {
    notifier: Arc<dyn Notifier>,
}

impl EmailNotifierNode {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl NodeHandler for EmailNotifierNode {
    fn kind(&self) -> NodeKind {
        NodeKind::EmailNotifier
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError> {
        let config: EmailConfig = ctx.parse_config()?;
        let recipient = config.recipient.trim();
        if recipient.is_empty() {
            return Err(NodeError::Configuration("No recipient configured".to_string()));
        }

        let subject = render_template(&config.subject, &ctx.input);
        let body = summary(&ctx.input);
        let delivered = ctx
            .call(self.notifier.notify(recipient, &subject, &body))
            .await?;

        Ok(ctx
            .output()
            .with("notified", delivered)
            .with("notificationRecipient", recipient))
    }
}
