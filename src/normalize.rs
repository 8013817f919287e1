use std::sync::OnceLock;

use chrono::Local;
use regex::Regex;
use serde_json::Value;

use crate::models::{NewsRecord, RawNewsItem, Region, UPDATED_BY};

const MISSING_TITLE: &str = "N/A";
const MISSING_CONTENTS: &str = "No content provided.";
const DEFAULT_SOURCE: &str = "Grok Live Search";

static CJK_PATTERN: OnceLock<Regex> = OnceLock::new();

/// True when the text contains at least one CJK Unified Ideograph.
fn is_chinese(text: &str) -> bool {
    let re = CJK_PATTERN
        .get_or_init(|| Regex::new(r"[\u{4e00}-\u{9fa5}]").expect("CJK pattern is valid"));
    re.is_match(text)
}

/// Flatten the raw `links` value into a comma-joined cell. Arrays join
/// their string entries in order, bare strings pass through, anything
/// else becomes empty.
fn flatten_links(links: Option<&Value>) -> String {
    match links {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Map raw API items onto fixed-column records for one region.
///
/// Missing titles and contents get sentinel defaults; a Chinese original
/// is copied into the empty translation column; items that are empty on
/// both axes are dropped. Order is preserved.
pub fn normalize(items: Vec<RawNewsItem>, region: Region) -> Vec<NewsRecord> {
    let now = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let mut records = Vec::with_capacity(items.len());

    for item in items {
        let title = item.title.unwrap_or_else(|| MISSING_TITLE.to_string());
        let contents = item
            .contents
            .unwrap_or_else(|| MISSING_CONTENTS.to_string());
        let mut title_cn = item.title_cn.unwrap_or_default();
        let mut contents_cn = item.contents_cn.unwrap_or_default();

        if title_cn.is_empty() && is_chinese(&title) {
            title_cn = title.clone();
        }
        if contents_cn.is_empty() && is_chinese(&contents) {
            contents_cn = contents.clone();
        }

        if title == MISSING_TITLE && contents == MISSING_CONTENTS {
            tracing::debug!(region = %region, "skipping empty news item");
            continue;
        }

        records.push(NewsRecord {
            title,
            contents,
            title_cn,
            contents_cn,
            links: flatten_links(item.links.as_ref()),
            last_update: now.clone(),
            source: item.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            region: region.label().to_string(),
            updated_by: UPDATED_BY.to_string(),
        });
    }

    records
}
