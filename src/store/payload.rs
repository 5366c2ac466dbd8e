//! Stored response payload shapes and the legacy-to-current normalizer.
//!
//! The current shape carries `account_info`, `timeline`, `metadata` and
//! `total_urls`. The legacy shape is flat (`username`, `nick`, `followers`,
//! ..., `media_list`). Anything else passes through untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// `account_info` object of the current shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AccountInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nick: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub followers_count: i64,
    #[serde(default)]
    pub friends_count: i64,
    #[serde(default)]
    pub profile_image: String,
    #[serde(default)]
    pub statuses_count: i64,
}

/// Timeline entry produced when converting a legacy media list.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub url: String,
    pub date: String,
    pub tweet_id: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub is_retweet: bool,
}

/// Pagination metadata of the current shape.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PayloadMetadata {
    pub new_entries: usize,
    pub page: u32,
    pub batch_size: u32,
    pub has_more: bool,
}

/// Current payload shape as written by the legacy converter.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentPayload {
    pub account_info: AccountInfo,
    pub total_urls: usize,
    pub timeline: Vec<TimelineEntry>,
    pub metadata: PayloadMetadata,
}

/// Flat legacy shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyPayload {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub nick: String,
    #[serde(default)]
    pub followers: i64,
    #[serde(default)]
    pub following: i64,
    #[serde(default)]
    pub posts: i64,
    #[serde(default)]
    pub profile_image: String,
    #[serde(default)]
    pub media_list: Vec<LegacyMediaEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyMediaEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub tweet_id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub date: String,
    #[serde(rename = "type", default)]
    pub media_type: String,
}

impl From<LegacyPayload> for CurrentPayload {
    fn from(legacy: LegacyPayload) -> Self {
        let count = legacy.media_list.len();
        let timeline = legacy
            .media_list
            .into_iter()
            .map(|media| TimelineEntry {
                url: media.url,
                date: media.date,
                tweet_id: media.tweet_id,
                media_type: media.media_type,
                is_retweet: false,
            })
            .collect();

        Self {
            account_info: AccountInfo {
                name: legacy.username,
                nick: legacy.nick,
                date: String::new(),
                followers_count: legacy.followers,
                friends_count: legacy.following,
                profile_image: legacy.profile_image,
                statuses_count: legacy.posts,
            },
            total_urls: count,
            timeline,
            metadata: PayloadMetadata {
                new_entries: count,
                page: 0,
                batch_size: 0,
                has_more: false,
            },
        }
    }
}

/// Which shape a payload object has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    Current,
    Legacy,
    Unknown,
}

/// Detect the shape of a parsed payload.
pub fn detect_shape(value: &Value) -> PayloadShape {
    match value.as_object() {
        Some(obj) if obj.contains_key("account_info") => PayloadShape::Current,
        Some(obj) if obj.contains_key("username") && obj.contains_key("media_list") => {
            PayloadShape::Legacy
        }
        _ => PayloadShape::Unknown,
    }
}

/// Normalize a payload to the current shape.
///
/// Current and unrecognized shapes are returned byte-for-byte unchanged.
/// Malformed JSON is a [`Error::Format`].
pub fn normalize_payload(json: &str) -> Result<String> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| Error::Format(format!("payload is not valid JSON: {}", e)))?;

    match detect_shape(&value) {
        PayloadShape::Legacy => {
            let legacy: LegacyPayload = serde_json::from_value(value)
                .map_err(|e| Error::Format(format!("malformed legacy payload: {}", e)))?;
            tracing::debug!(
                "Converting legacy payload for {} ({} media)",
                legacy.username,
                legacy.media_list.len()
            );
            Ok(serde_json::to_string(&CurrentPayload::from(legacy))?)
        }
        PayloadShape::Current | PayloadShape::Unknown => Ok(json.to_string()),
    }
}

/// Follower and post counts from a stored payload's `account_info`.
///
/// Missing keys, wrong types and unparsable payloads all yield zero.
pub fn account_counts(json: &str) -> (i64, i64) {
    let Ok(value) = serde_json::from_str::<Value>(json) else {
        return (0, 0);
    };
    let Some(info) = value.get("account_info").and_then(Value::as_object) else {
        return (0, 0);
    };
    let count = |key: &str| {
        info.get(key)
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
            .unwrap_or(0)
    };
    (count("followers_count"), count("statuses_count"))
}

/// Identity fields needed to persist an imported payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadIdentity {
    pub handle: String,
    pub display_name: String,
    pub profile_image: String,
    pub total_urls: i64,
}

/// Extract the identity of a normalized payload.
///
/// Requires an `account_info` object with a non-empty `name`.
pub fn payload_identity(json: &str) -> Result<PayloadIdentity> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| Error::Format(format!("payload is not valid JSON: {}", e)))?;

    let info = value
        .get("account_info")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::Format("missing account_info".into()))?;

    let text = |key: &str| {
        info.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let handle = text("name");
    if handle.is_empty() {
        return Err(Error::Format("missing username".into()));
    }

    let total_urls = value
        .get("total_urls")
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .unwrap_or(0);

    Ok(PayloadIdentity {
        handle,
        display_name: text("nick"),
        profile_image: text("profile_image"),
        total_urls,
    })
}

/// Resume state carried by an extractor response.
///
/// Top-level `cursor`/`completed` win over the `metadata` copies. A missing
/// completion flag is derived from `metadata.has_more`.
pub fn resume_state(json: &str) -> Result<(String, bool)> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| Error::Format(format!("payload is not valid JSON: {}", e)))?;
    let metadata = value.get("metadata");

    let cursor = value
        .get("cursor")
        .and_then(Value::as_str)
        .or_else(|| metadata.and_then(|m| m.get("cursor")).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string();

    let completed = value
        .get("completed")
        .and_then(Value::as_bool)
        .or_else(|| metadata.and_then(|m| m.get("completed")).and_then(Value::as_bool))
        .or_else(|| {
            metadata
                .and_then(|m| m.get("has_more"))
                .and_then(Value::as_bool)
                .map(|has_more| !has_more)
        })
        .unwrap_or(true);

    Ok((cursor, completed))
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
