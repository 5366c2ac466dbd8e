//! Work item representation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Content type tag of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentType {
    Photo,
    Video,
    Gif,
    AnimatedGif,
    Text,
    #[default]
    Other,
}

impl ContentType {
    /// Get the subfolder name for this content type.
    pub fn folder_name(&self) -> &'static str {
        match self {
            ContentType::Photo => "images",
            ContentType::Video => "videos",
            ContentType::Gif | ContentType::AnimatedGif => "gifs",
            ContentType::Text => "texts",
            ContentType::Other => "other",
        }
    }

    /// Extension used when neither the URL query nor the URL path provide one.
    ///
    /// Animated GIFs are served as MP4.
    pub fn default_extension(&self) -> &'static str {
        match self {
            ContentType::Video | ContentType::Gif | ContentType::AnimatedGif => ".mp4",
            ContentType::Text => ".txt",
            ContentType::Photo | ContentType::Other => ".jpg",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Photo => "photo",
            ContentType::Video => "video",
            ContentType::Gif => "gif",
            ContentType::AnimatedGif => "animated_gif",
            ContentType::Text => "text",
            ContentType::Other => "other",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = std::convert::Infallible;

    /// Unknown tags map to [`ContentType::Other`].
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "photo" => ContentType::Photo,
            "video" => ContentType::Video,
            "gif" => ContentType::Gif,
            "animated_gif" => ContentType::AnimatedGif,
            "text" => ContentType::Text,
            _ => ContentType::Other,
        })
    }
}

impl Serialize for ContentType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ContentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_default())
    }
}

/// One piece of content to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Source URL.
    pub url: String,

    /// Timestamp string; the format is not guaranteed.
    #[serde(default)]
    pub date: String,

    /// Identifier of the parent post.
    #[serde(deserialize_with = "deserialize_tweet_id")]
    pub tweet_id: i64,

    /// Content type tag.
    #[serde(rename = "type", default)]
    pub content_type: ContentType,

    /// Owning handle. Empty means the batch owner applies.
    #[serde(default)]
    pub username: String,

    /// Author of a bookmarked or liked post. Wins over `username`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author_username: String,

    /// Inline body for text-only items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Original media filename, when the extractor already knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
}

impl WorkItem {
    /// Create an item with the required fields set.
    pub fn new(url: impl Into<String>, tweet_id: i64, content_type: ContentType) -> Self {
        Self {
            url: url.into(),
            date: String::new(),
            tweet_id,
            content_type,
            username: String::new(),
            author_username: String::new(),
            content: None,
            original_filename: None,
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.username = owner.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author_username = author.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// The post author, then the item owner, then the batch default.
    pub fn effective_owner<'a>(&'a self, batch_owner: &'a str) -> &'a str {
        [self.author_username.as_str(), self.username.as_str()]
            .into_iter()
            .find(|owner| !owner.trim().is_empty())
            .unwrap_or(batch_owner)
    }

    /// Permalink of the parent post.
    pub fn permalink(&self) -> String {
        format!("https://x.com/i/status/{}", self.tweet_id)
    }

    /// Whether the item is written from its inline body instead of fetched.
    pub fn is_text(&self) -> bool {
        self.content_type == ContentType::Text
    }
}

/// Accept a post identifier as either a JSON number or a numeric string.
pub fn deserialize_tweet_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid tweet_id: {s:?}"))),
    }
}
