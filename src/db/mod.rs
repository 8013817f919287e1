mod appender;
mod repository;
mod schema;

pub use appender::{append_records, split_links};
pub use repository::SqliteTable;

use crate::error::Result;

/// Narrow destination-table seam. The appender depends only on this
/// trait, never on a concrete backend.
#[allow(async_fn_in_trait)]
pub trait Table {
    async fn exists(&self) -> Result<bool>;
    async fn create(&self, headers: &[&str]) -> Result<()>;
    async fn read_column(&self, column: &str) -> Result<Vec<String>>;
    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<()>;
}
