//! Work-item input parsing.

use std::path::Path;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::media::item::WorkItem;
use crate::store::normalize_payload;

/// Items read from one input, with the owner implied by the input itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedInput {
    /// Batch owner; empty for a bare item list.
    pub owner: String,
    pub items: Vec<WorkItem>,
}

/// Parse work items from JSON.
///
/// Accepts a bare array of items, or an account payload in either the
/// current or the legacy shape. For payloads the account name becomes the
/// batch owner and the timeline becomes the item list.
pub fn parse_work_items(json: &str) -> Result<ParsedInput> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| Error::Format(format!("invalid JSON: {}", e)))?;

    match value {
        Value::Array(_) => Ok(ParsedInput {
            owner: String::new(),
            items: items_from(value)?,
        }),
        Value::Object(_) => parse_payload(json),
        _ => Err(Error::Format(
            "expected an array of items or an account payload".into(),
        )),
    }
}

/// Read and parse a work-item file.
pub fn load_work_items(path: &Path) -> Result<ParsedInput> {
    let content = std::fs::read_to_string(path)?;
    let parsed = parse_work_items(&content)?;
    tracing::debug!("Loaded {} item(s) from {}", parsed.items.len(), path.display());
    Ok(parsed)
}

fn parse_payload(json: &str) -> Result<ParsedInput> {
    let normalized = normalize_payload(json)?;
    let mut value: Value = serde_json::from_str(&normalized)?;

    let owner = value
        .pointer("/account_info/name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let timeline = value
        .get_mut("timeline")
        .map(Value::take)
        .ok_or_else(|| Error::Format("payload has no timeline".into()))?;

    Ok(ParsedInput {
        owner,
        items: items_from(timeline)?,
    })
}

fn items_from(value: Value) -> Result<Vec<WorkItem>> {
    serde_json::from_value(value).map_err(|e| Error::Format(format!("invalid work item: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ContentType;

    #[test]
    fn test_parse_item_array() {
        let json = r#"[
            {"url": "https://pbs.twimg.com/media/A.jpg", "date": "2024-01-01T00:00:00", "tweet_id": 10, "type": "photo", "author_username": "alice"},
            {"url": "", "tweet_id": "11", "type": "text", "content": "hi"}
        ]"#;

        let parsed = parse_work_items(json).unwrap();
        assert_eq!(parsed.owner, "");
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.items[0].effective_owner(""), "alice");
        assert_eq!(parsed.items[1].tweet_id, 11);
        assert_eq!(parsed.items[1].content_type, ContentType::Text);
        assert_eq!(parsed.items[1].content.as_deref(), Some("hi"));
    }

    #[test]
    fn test_parse_current_payload() {
        let json = r#"{
            "account_info": {"name": "bob", "nick": "Bob"},
            "total_urls": 1,
            "timeline": [{"url": "https://video.twimg.com/v.mp4", "date": "2024-02-02 10:00:00", "tweet_id": "99", "type": "video", "is_retweet": false}],
            "metadata": {"has_more": false}
        }"#;

        let parsed = parse_work_items(json).unwrap();
        assert_eq!(parsed.owner, "bob");
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].tweet_id, 99);
        assert_eq!(parsed.items[0].content_type, ContentType::Video);
    }

    #[test]
    fn test_parse_legacy_payload() {
        let json = r#"{
            "username": "carol",
            "nick": "Carol",
            "media_list": [{"url": "https://pbs.twimg.com/media/Z.jpg", "date": "2023-05-05T05:05:05", "tweet_id": 5, "type": "photo"}]
        }"#;

        let parsed = parse_work_items(json).unwrap();
        assert_eq!(parsed.owner, "carol");
        assert_eq!(parsed.items[0].tweet_id, 5);
    }

    #[test]
    fn test_rejects_other_shapes() {
        assert!(matches!(parse_work_items("42"), Err(Error::Format(_))));
        assert!(matches!(parse_work_items("{nope"), Err(Error::Format(_))));
        assert!(matches!(
            parse_work_items(r#"{"account_info": {"name": "x"}}"#),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("items.json");
        std::fs::write(&path, r#"[{"url": "https://a.test/x.png", "tweet_id": 1, "type": "photo"}]"#).unwrap();
        assert_eq!(load_work_items(&path).unwrap().items.len(), 1);
    }
}
