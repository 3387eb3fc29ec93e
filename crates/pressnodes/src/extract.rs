//! Heuristics for finding content in a payload and for pulling a title out
//! of generated text.

use chrono::Utc;
use presscore::{NodeError, Payload};
use serde_json::Value;

/// Payload keys checked, in order, for text an AI node can work on.
pub const CONTENT_SOURCES: [&str; 7] = [
    "content",
    "synthesizedContent",
    "processedContent",
    "scrapedContent",
    "articles",
    "papers",
    "text",
];

/// Keys holding a finished article body.
pub const ARTICLE_BODY_KEYS: [&str; 3] = ["processedContent", "synthesizedContent", "content"];

const ITEM_BODY_KEYS: [&str; 6] = ["content", "body", "abstract", "description", "summary", "text"];

const MAX_SLUG_LEN: usize = 80;
const MAX_IMPLICIT_TITLE_LEN: usize = 120;

/// Text of one list item: a plain string, or an object with a title and
/// some body-like field.
pub fn item_text(item: &Value) -> Option<String> {
    match item {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(map) => {
            let body = ITEM_BODY_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .filter(|s| !s.trim().is_empty());
            let title = map
                .get("title")
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty());

            match (title, body) {
                (Some(title), Some(body)) => Some(format!("{}\n\n{}", title, body)),
                (None, Some(body)) => Some(body.to_string()),
                (Some(title), None) => Some(title.to_string()),
                (None, None) => None,
            }
        }
        _ => None,
    }
}

/// Joined text of every usable item under `key`.
pub fn list_text(payload: &Payload, key: &str) -> Option<String> {
    let parts: Vec<String> = payload
        .get_array(key)?
        .iter()
        .filter_map(item_text)
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n---\n\n"))
    }
}

/// First usable content in the payload, with the key it came from.
pub fn find_content(payload: &Payload) -> Option<(&'static str, String)> {
    CONTENT_SOURCES.iter().find_map(|key| {
        let text = match payload.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Array(_) => list_text(payload, key),
            _ => None,
        };
        text.map(|t| (*key, t))
    })
}

/// Like [`find_content`], but a missing-input error naming every source
/// checked when nothing usable is present.
pub fn require_content(payload: &Payload) -> Result<(&'static str, String), NodeError> {
    find_content(payload)
        .ok_or_else(|| NodeError::missing_any("no usable content found", &CONTENT_SOURCES))
}

/// Finished article body, or a missing-input error naming the keys checked.
pub fn require_article_body(payload: &Payload) -> Result<String, NodeError> {
    payload
        .first_str(&ARTICLE_BODY_KEYS)
        .map(str::to_string)
        .ok_or_else(|| NodeError::missing_any("no article content", &ARTICLE_BODY_KEYS))
}

/// Title and body split out of generated text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedText {
    pub title: Option<String>,
    pub body: String,
}

/// Split generated text into a title and body.
///
/// Recognizes a JSON envelope with `title` and `content`/`body` (optionally
/// in a code fence), a leading Markdown heading, or a leading `Title:` line.
/// Marker lines are removed from the body. Otherwise a short first line is
/// taken as the title and the body is left untouched.
pub fn parse_generated(text: &str) -> ParsedText {
    let trimmed = text.trim();

    if let Some(parsed) = parse_envelope(trimmed) {
        return parsed;
    }

    let mut lines = trimmed.lines();
    let first = lines.by_ref().find(|line| !line.trim().is_empty());
    let Some(first) = first else {
        return ParsedText {
            title: None,
            body: String::new(),
        };
    };
    let first = first.trim();
    let rest = lines.collect::<Vec<_>>().join("\n").trim().to_string();

    if first.starts_with('#') {
        let title = clean_title(first.trim_start_matches('#'));
        if !title.is_empty() {
            return ParsedText {
                title: Some(title),
                body: rest,
            };
        }
    }

    let unbolded = first.trim_start_matches('*');
    let has_label = unbolded
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("title:"));
    if has_label {
        let title = clean_title(&unbolded[6..]);
        if !title.is_empty() {
            return ParsedText {
                title: Some(title),
                body: rest,
            };
        }
    }

    let implicit = clean_title(first);
    let title = if !implicit.is_empty() && implicit.chars().count() <= MAX_IMPLICIT_TITLE_LEN {
        Some(implicit)
    } else {
        None
    };
    ParsedText {
        title,
        body: trimmed.to_string(),
    }
}

fn parse_envelope(text: &str) -> Option<ParsedText> {
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .and_then(|t| t.trim_end().strip_suffix("```"))
        .unwrap_or(text)
        .trim();

    if !inner.starts_with('{') {
        return None;
    }
    let value: Value = serde_json::from_str(inner).ok()?;
    let body = value
        .get("content")
        .or_else(|| value.get("body"))
        .and_then(Value::as_str)?
        .trim()
        .to_string();
    let title = value
        .get("title")
        .and_then(Value::as_str)
        .map(clean_title)
        .filter(|t| !t.is_empty());

    Some(ParsedText { title, body })
}

fn clean_title(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '"' | '\'' | '_'))
        .to_string()
}

/// ASCII-safe slug: lowercase alphanumerics separated by single dashes.
/// Falls back to `article-<unix seconds>` when nothing usable remains.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }

    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        format!("article-{}", Utc::now().timestamp())
    } else {
        slug
    }
}

/// Fill `{key}` placeholders from string or number payload values.
pub fn render_template(template: &str, payload: &Payload) -> String {
    let mut rendered = template.to_string();
    for key in payload.keys() {
        let placeholder = format!("{{{}}}", key);
        if !rendered.contains(&placeholder) {
            continue;
        }
        let value = match payload.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => continue,
        };
        rendered = rendered.replace(&placeholder, &value);
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finds_content_in_key_order() {
        let payload = Payload::new()
            .with("articles", json!([{ "title": "A", "description": "first" }]))
            .with("synthesizedContent", "merged");
        assert_eq!(
            find_content(&payload),
            Some(("synthesizedContent", "merged".to_string()))
        );

        let payload = Payload::new().with(
            "scrapedContent",
            json!([{ "url": "u1", "content": "one" }, { "url": "u2", "content": "" }]),
        );
        assert_eq!(
            find_content(&payload),
            Some(("scrapedContent", "one".to_string()))
        );
    }

    #[test]
    fn missing_content_names_sources() {
        let err = require_content(&Payload::new().with("title", "x")).unwrap_err();
        let message = err.to_string();
        for key in CONTENT_SOURCES {
            assert!(message.contains(key), "{} not named in {}", key, message);
        }
    }

    #[test]
    fn parses_markdown_heading() {
        let parsed = parse_generated("# Rust in 2025\n\nIt keeps growing.\n\nMore text.");
        assert_eq!(parsed.title.as_deref(), Some("Rust in 2025"));
        assert_eq!(parsed.body, "It keeps growing.\n\nMore text.");
    }

    #[test]
    fn parses_title_line() {
        let parsed = parse_generated("**Title:** \"Edge AI\"\nBody here");
        assert_eq!(parsed.title.as_deref(), Some("Edge AI"));
        assert_eq!(parsed.body, "Body here");
    }

    #[test]
    fn parses_json_envelope() {
        let parsed = parse_generated("```json\n{\"title\": \"Hi\", \"content\": \"Body\"}\n```");
        assert_eq!(parsed.title.as_deref(), Some("Hi"));
        assert_eq!(parsed.body, "Body");
    }

    #[test]
    fn implicit_title_keeps_body() {
        let parsed = parse_generated("Short opener\nsecond line");
        assert_eq!(parsed.title.as_deref(), Some("Short opener"));
        assert_eq!(parsed.body, "Short opener\nsecond line");
    }

    #[test]
    fn slugs_are_ascii_safe() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Rust & WebAssembly: 2025!  "), "rust-webassembly-2025");
        assert_eq!(slugify("Café crème"), "caf-cr-me");
        assert!(slugify("¿¡!?").starts_with("article-"));
        assert!(slugify(&"a".repeat(200)).len() <= 80);
    }

    #[test]
    fn renders_placeholders() {
        let payload = Payload::new().with("title", "Launch").with("url", "https://x.test/a");
        assert_eq!(
            render_template("{title} {url} {missing}", &payload),
            "Launch https://x.test/a {missing}"
        );
    }
}
