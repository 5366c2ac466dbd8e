//! Filename generation for downloaded media.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use url::Url;

use crate::error::{Error, Result};
use crate::media::ContentType;

/// Timestamp token used when the item date matches none of the known formats.
pub const TIMESTAMP_SENTINEL: &str = "00000000_000000";

type DateParser = fn(&str) -> Option<NaiveDateTime>;

/// Date formats tried in order; the first successful parse wins.
///
/// Zoned inputs keep their wall-clock time, no conversion to UTC happens.
const DATE_PARSERS: &[DateParser] = &[
    parse_iso_naive,
    parse_iso_offset,
    parse_rfc3339,
    parse_space_separated,
    parse_legacy_api,
];

fn parse_iso_naive(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

fn parse_iso_offset(s: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%:z")
        .ok()
        .map(|dt| dt.naive_local())
}

fn parse_rfc3339(s: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local())
}

fn parse_space_separated(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").ok()
}

// e.g. "Tue Mar 05 10:20:30 +0000 2024"
fn parse_legacy_api(s: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_str(s, "%a %b %d %H:%M:%S %z %Y")
        .ok()
        .map(|dt| dt.naive_local())
}

/// Convert an item date string into the `YYYYMMDD_HHMMSS` filename token.
pub fn format_timestamp(date: &str) -> String {
    let date = date.trim();
    DATE_PARSERS
        .iter()
        .find_map(|parse| parse(date))
        .map(|dt| dt.format("%Y%m%d_%H%M%S").to_string())
        .unwrap_or_else(|| TIMESTAMP_SENTINEL.to_string())
}

/// Resolve the file extension (with leading dot) for a media URL.
///
/// Order: `format` query parameter, then the URL path extension, then the
/// content-type default.
pub fn resolve_extension(media_url: &str, content_type: ContentType) -> String {
    if let Ok(parsed) = Url::parse(media_url) {
        let format = parsed
            .query_pairs()
            .find(|(key, _)| key == "format")
            .map(|(_, value)| value.into_owned());
        if let Some(format) = format.filter(|f| is_safe_extension(f)) {
            return format!(".{}", format);
        }

        let path_ext = Path::new(parsed.path())
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| is_safe_extension(e));
        if let Some(ext) = path_ext {
            return format!(".{}", ext);
        }
    }

    content_type.default_extension().to_string()
}

fn is_safe_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Build the final filename: `<owner>_<timestamp>_<tweet_id>_<seq:02>.<ext>`.
pub fn build_filename(owner: &str, timestamp: &str, tweet_id: i64, sequence: u32, ext: &str) -> String {
    format!("{}_{}_{}_{:02}{}", owner, timestamp, tweet_id, sequence, ext)
}

/// Original media filename derived from the URL: the last path segment
/// without its extension.
pub fn extract_original_filename(media_url: &str) -> Option<String> {
    let parsed = Url::parse(media_url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let stem = Path::new(segment).file_stem()?.to_str()?;
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Sanitize a path component (owner folder name).
///
/// Separators and reserved characters are replaced; traversal and empty
/// names are rejected.
pub fn sanitize_path_component(name: &str) -> Result<String> {
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed: '{}'",
            name
        )));
    }

    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return Err(Error::InvalidFilename(
            "Path component cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}
