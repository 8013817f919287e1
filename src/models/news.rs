use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::RegionTables;

/// Column order of every destination table. `links` is a comma-separated
/// cell and the sole deduplication key.
pub const HEADERS: [&str; 9] = [
    "title",
    "contents",
    "title_cn",
    "contents_cn",
    "links",
    "last_update",
    "source",
    "region",
    "updated_by",
];

/// Provenance tag written into every row.
pub const UPDATED_BY: &str = "Grok API";

/// The three fixed news categories. Each region selects its own query,
/// search-source preferences and destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    China,
    Global,
    GlobalTech,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::China, Region::Global, Region::GlobalTech];

    pub fn label(&self) -> &'static str {
        match self {
            Region::China => "China",
            Region::Global => "Global",
            Region::GlobalTech => "Global Tech",
        }
    }

    /// Natural-language search query sent to the API.
    pub fn query(&self) -> &'static str {
        match self {
            Region::China => "中国过去24小时内的重要新闻和热点事件",
            Region::Global => "全球过去24小时内的重要新闻和热点事件",
            Region::GlobalTech => "全球过去24小时内重要的科技新闻和行业动态",
        }
    }

    /// Search-source preference list. China restricts news and web sources
    /// to CN; all regions allow X posts.
    pub fn sources(&self) -> Vec<SearchSource> {
        match self {
            Region::China => vec![
                SearchSource::country("news", "CN"),
                SearchSource::country("web", "CN"),
                SearchSource::plain("x"),
            ],
            Region::Global | Region::GlobalTech => vec![
                SearchSource::plain("news"),
                SearchSource::plain("web"),
                SearchSource::plain("x"),
            ],
        }
    }

    pub fn max_search_results(&self) -> u32 {
        match self {
            Region::China => 30,
            Region::Global | Region::GlobalTech => 25,
        }
    }

    pub fn table_name<'a>(&self, tables: &'a RegionTables) -> &'a str {
        match self {
            Region::China => &tables.china,
            Region::Global => &tables.global,
            Region::GlobalTech => &tables.tech,
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchSource {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl SearchSource {
    fn plain(source_type: &str) -> Self {
        Self {
            source_type: source_type.to_string(),
            country: None,
        }
    }

    fn country(source_type: &str, country: &str) -> Self {
        Self {
            source_type: source_type.to_string(),
            country: Some(country.to_string()),
        }
    }
}

/// One news item as returned by the search API. Every field is optional:
/// the model occasionally drops fields or returns `links` as a bare string
/// instead of an array, so the shape is kept permissive and cleaned up by
/// the normalizer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNewsItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub contents: Option<String>,
    #[serde(default)]
    pub title_cn: Option<String>,
    #[serde(default)]
    pub contents_cn: Option<String>,
    #[serde(default)]
    pub links: Option<Value>,
    #[serde(default)]
    pub source: Option<String>,
}

/// A normalized row ready to append, in destination column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsRecord {
    pub title: String,
    pub contents: String,
    pub title_cn: String,
    pub contents_cn: String,
    pub links: String,
    pub last_update: String,
    pub source: String,
    pub region: String,
    pub updated_by: String,
}

impl NewsRecord {
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.contents.clone(),
            self.title_cn.clone(),
            self.contents_cn.clone(),
            self.links.clone(),
            self.last_update.clone(),
            self.source.clone(),
            self.region.clone(),
            self.updated_by.clone(),
        ]
    }
}
