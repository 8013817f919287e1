mod news;

pub use news::{NewsRecord, RawNewsItem, Region, SearchSource, HEADERS, UPDATED_BY};
