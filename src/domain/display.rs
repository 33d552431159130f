//! Display rules shared by every output format.
//!
//! Generators call these instead of inventing their own fallbacks, so a
//! missing field always renders the same placeholder everywhere.

use chrono::{DateTime, TimeZone, Utc};

use super::collection::{ComicEntry, ReadHistory};

pub const PLACEHOLDER: &str = "-";
pub const UNKNOWN: &str = "Unknown";
pub const NO_IMAGE: &str = "No Image";

pub fn language_label(code: &str) -> &'static str {
    match code.trim().to_ascii_lowercase().as_str() {
        "ko" => "Manhwa",
        "ja" => "Manga",
        "zh" => "Manhua",
        _ => "Comic",
    }
}

pub fn language_flag(code: &str) -> &'static str {
    match code.trim().to_ascii_lowercase().as_str() {
        "ko" => "\u{1F1F0}\u{1F1F7}",
        "ja" => "\u{1F1EF}\u{1F1F5}",
        "zh" => "\u{1F1E8}\u{1F1F3}",
        "en" => "\u{1F1EC}\u{1F1E7}",
        _ => "\u{1F3F3}\u{FE0F}",
    }
}

pub fn timestamp_to_datetime(ts_ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ts_ms).single()
}

/// Coarse relative time such as "3d ago".
pub fn time_ago(ts_ms: Option<i64>, now: DateTime<Utc>) -> String {
    let Some(then) = ts_ms.and_then(timestamp_to_datetime) else {
        return UNKNOWN.to_string();
    };
    let seconds = (now - then).num_seconds() as f64;

    const UNITS: [(f64, &str); 5] = [
        (31_536_000.0, "y"),
        (2_592_000.0, "mo"),
        (86_400.0, "d"),
        (3_600.0, "h"),
        (60.0, "m"),
    ];
    for (size, suffix) in UNITS {
        let interval = seconds / size;
        if interval > 1.0 {
            return format!("{}{} ago", interval.floor() as i64, suffix);
        }
    }
    "Just now".to_string()
}

/// `YYYY-MM-DD` in UTC, or the placeholder.
pub fn date_only(ts_ms: Option<i64>) -> String {
    ts_ms
        .and_then(timestamp_to_datetime)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn score_text(score: Option<f64>) -> String {
    match score {
        Some(s) if s != 0.0 && s.is_finite() => format!("{:.1}", s),
        _ => PLACEHOLDER.to_string(),
    }
}

pub fn status_text(status: &str) -> &str {
    if status.trim().is_empty() {
        UNKNOWN
    } else {
        status
    }
}

pub fn is_completed(status: &str) -> bool {
    status.trim().eq_ignore_ascii_case("completed")
}

/// "Ch.200" for a bare number, the label itself otherwise.
pub fn latest_chapter_text(label: Option<&str>) -> Option<String> {
    let label = label.map(str::trim).filter(|l| !l.is_empty())?;
    if label.parse::<f64>().is_ok() {
        Some(format!("Ch.{}", label))
    } else {
        Some(label.to_string())
    }
}

/// First number appearing in a free-text chapter label.
///
/// "Chapter 12.5: The Return" yields `12.5`, "Vol.2 Ch.30" yields `2`.
pub fn chapter_number(label: &str) -> Option<f64> {
    let bytes = label.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;
    let mut end = start;
    let mut seen_dot = false;
    while end < bytes.len() {
        let b = bytes[end];
        if b.is_ascii_digit() {
            end += 1;
        } else if b == b'.' && !seen_dot && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) {
            seen_dot = true;
            end += 1;
        } else {
            break;
        }
    }
    label[start..end].parse().ok()
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Reading progress as `<read> / <latest>`.
///
/// Either side that has a label without a parseable number shows "?";
/// a missing side shows "?" as well unless both are missing, in which case
/// the whole cell is the placeholder.
pub fn progress_text(history: Option<&ReadHistory>, latest_label: Option<&str>) -> String {
    let latest_label = latest_label.map(str::trim).filter(|l| !l.is_empty());
    if history.is_none() && latest_label.is_none() {
        return PLACEHOLDER.to_string();
    }
    let side = |label: Option<&str>| {
        label
            .and_then(chapter_number)
            .map(format_number)
            .unwrap_or_else(|| "?".to_string())
    };
    format!(
        "{} / {}",
        side(history.map(|h| h.chapter_label.as_str())),
        side(latest_label)
    )
}

/// Last-read cell: chapter label, or the placeholder.
pub fn last_read_chapter(entry: &ComicEntry) -> &str {
    entry
        .history
        .as_ref()
        .map(|h| h.chapter_label.as_str())
        .filter(|l| !l.is_empty())
        .unwrap_or(PLACEHOLDER)
}

/// Visual tier of a genre tag. Purely cosmetic; never filters entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagTier {
    ContentWarning,
    Demographic,
    Plain,
}

impl TagTier {
    pub fn css_class(self) -> &'static str {
        match self {
            TagTier::ContentWarning => "tag-warn",
            TagTier::Demographic => "tag-demo",
            TagTier::Plain => "tag",
        }
    }
}

const CONTENT_WARNING_TAGS: &[&str] = &[
    "gore",
    "bloody",
    "violence",
    "sexual violence",
    "smut",
    "hentai",
    "mature",
    "adult",
    "ecchi",
    "self harm",
    "suicide",
    "incest",
    "non human",
    "netorare",
    "lolicon",
    "shotacon",
];

const DEMOGRAPHIC_TAGS: &[&str] = &[
    "shounen",
    "shoujo",
    "seinen",
    "josei",
    "kodomo",
    "shounen ai",
    "shoujo ai",
    "yaoi",
    "yuri",
];

fn normalize_tag(tag: &str) -> String {
    tag.trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn classify_tag(tag: &str) -> TagTier {
    let normalized = normalize_tag(tag);
    if CONTENT_WARNING_TAGS.contains(&normalized.as_str()) {
        TagTier::ContentWarning
    } else if DEMOGRAPHIC_TAGS.contains(&normalized.as_str()) {
        TagTier::Demographic
    } else {
        TagTier::Plain
    }
}
