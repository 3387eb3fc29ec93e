use crate::extract::item_text;
use async_trait::async_trait;
use presscore::{NodeContext, NodeError, NodeHandler, NodeKind, Payload};
use serde::Deserialize;
use serde_json::Value;

const FILTERED_LISTS: [&str; 3] = ["articles", "papers", "scrapedContent"];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterConfig {
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    exclude_keywords: Vec<String>,
    #[serde(default)]
    min_length: usize,
}

impl FilterConfig {
    fn normalized(words: &[String]) -> Vec<String> {
        words
            .iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect()
    }

    /// An item is kept when it is long enough, mentions at least one keyword
    /// (if any are set) and mentions no excluded keyword.
    fn keeps(&self, item: &Value, include: &[String], exclude: &[String]) -> bool {
        let text = item_text(item).unwrap_or_default();
        if text.chars().count() < self.min_length {
            return false;
        }
        let haystack = text.to_lowercase();
        if !include.is_empty() && !include.iter().any(|k| haystack.contains(k.as_str())) {
            return false;
        }
        !exclude.iter().any(|k| haystack.contains(k.as_str()))
    }
}

/// Drops list items by keyword and length.
pub struct ContentFilterNode;

#[async_trait]
impl NodeHandler for ContentFilterNode {
    fn kind(&self) -> NodeKind {
        NodeKind::ContentFilter
    }

    async fn execute(&self, ctx: NodeContext) -> Result<Payload, NodeError> {
        let config: FilterConfig = ctx.parse_config()?;
        let include = FilterConfig::normalized(&config.keywords);
        let exclude = FilterConfig::normalized(&config.exclude_keywords);

        let lists: Vec<(&str, &Vec<Value>)> = FILTERED_LISTS
            .iter()
            .filter_map(|key| {
                ctx.input
                    .get(key)
                    .and_then(Value::as_array)
                    .map(|items| (*key, items))
            })
            .collect();
        if lists.is_empty() {
            return Err(NodeError::missing_any("nothing to filter", &FILTERED_LISTS));
        }

        let mut output = ctx.output();
        let mut filtered_out = 0;
        for (key, items) in lists {
            let kept: Vec<Value> = items
                .iter()
                .filter(|item| config.keeps(item, &include, &exclude))
                .cloned()
                .collect();
            filtered_out += items.len() - kept.len();
            output.insert(key, kept);
        }

        tracing::debug!("{} filtered out {} items", ctx.label, filtered_out);
        Ok(output.with("filteredOut", filtered_out))
    }
}
