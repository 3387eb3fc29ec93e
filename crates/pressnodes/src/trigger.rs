use async_trait::async_trait;
use chrono::Utc;
use presscore::{NodeContext, NodeError, NodeHandler, NodeKind, Payload};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TriggerConfig {
    #[serde(default)]
    trigger_type: Option<String>,
}

/// Entry point of a run. Marks the payload as triggered.
pub struct TriggerNode;

#[async_trait]
impl NodeHandler for TriggerNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Trigger
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError> {
        let config: TriggerConfig = ctx.parse_config()?;
        tracing::debug!(
            "{} fired ({})",
            ctx.label,
            config.trigger_type.as_deref().unwrap_or("manual")
        );

        Ok(ctx
            .output()
            .with("triggered", true)
            .with("timestamp", Utc::now().to_rfc3339()))
    }
}
