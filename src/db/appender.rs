use std::collections::HashSet;

use crate::error::Result;
use crate::models::{NewsRecord, HEADERS};

use super::Table;

/// Split a comma-joined links cell into trimmed, non-empty tokens.
pub fn split_links(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

/// Append records to the destination table, skipping any record that
/// shares a link token with an existing row. Returns the number of rows
/// actually written.
///
/// A record with no link tokens is never treated as a duplicate. The
/// existing-link snapshot is read once up front; there is no lock, so a
/// single writer at a time is assumed.
pub async fn append_records<T: Table>(table: &T, records: &[NewsRecord]) -> Result<usize> {
    let existing = if table.exists().await? {
        let mut existing = HashSet::new();
        for cell in table.read_column("links").await? {
            existing.extend(split_links(&cell));
        }
        existing
    } else {
        table.create(&HEADERS).await?;
        HashSet::new()
    };

    let mut rows = Vec::new();
    for record in records {
        let is_duplicate = split_links(&record.links)
            .iter()
            .any(|token| existing.contains(token));
        if is_duplicate {
            tracing::debug!(title = %record.title, "skipping duplicate news item");
        } else {
            rows.push(record.to_row());
        }
    }

    let written = rows.len();
    table.append_rows(rows).await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteTable;
    use tokio_rusqlite::Connection;

    fn record(title: &str, links: &str) -> NewsRecord {
        NewsRecord {
            title: title.to_string(),
            contents: format!("{} contents", title),
            title_cn: String::new(),
            contents_cn: String::new(),
            links: links.to_string(),
            last_update: "2026-08-27 07:00:00".to_string(),
            source: "Reuters".to_string(),
            region: "Global".to_string(),
            updated_by: "Grok API".to_string(),
        }
    }

    async fn test_table() -> SqliteTable {
        let conn = Connection::open_in_memory().await.unwrap();
        SqliteTable::new(conn, "global_news").unwrap()
    }

    #[test]
    fn split_links_trims_and_drops_empty_tokens() {
        assert_eq!(
            split_links(" https://a.example/1 ,, https://b.example/2"),
            vec!["https://a.example/1", "https://b.example/2"]
        );
        assert!(split_links("").is_empty());
        assert!(split_links(" , ,").is_empty());
    }

    #[tokio::test]
    async fn creates_table_on_first_write() {
        let table = test_table().await;
        let written = append_records(&table, &[record("First", "https://a.example/1")])
            .await
            .unwrap();
        assert_eq!(written, 1);
        assert!(table.exists().await.unwrap());
        assert_eq!(table.read_column("title").await.unwrap(), vec!["First"]);
    }

    #[tokio::test]
    async fn any_overlapping_token_rejects_the_whole_record() {
        let table = test_table().await;
        append_records(&table, &[record("First", "https://a.example/1")])
            .await
            .unwrap();

        // Second token is novel, but the first already exists.
        let written = append_records(
            &table,
            &[record("Second", "https://a.example/1, https://b.example/2")],
        )
        .await
        .unwrap();
        assert_eq!(written, 0);
        assert_eq!(table.read_column("title").await.unwrap(), vec!["First"]);
    }

    #[tokio::test]
    async fn linkless_records_are_never_deduplicated() {
        let table = test_table().await;
        append_records(&table, &[record("First", "https://a.example/1")])
            .await
            .unwrap();

        let written = append_records(&table, &[record("No links", "")]).await.unwrap();
        assert_eq!(written, 1);

        // Even a repeat of the same link-less record goes through.
        let written = append_records(&table, &[record("No links", "")]).await.unwrap();
        assert_eq!(written, 1);
    }

    #[tokio::test]
    async fn second_identical_append_writes_nothing() {
        let table = test_table().await;
        let batch = vec![
            record("First", "https://a.example/1"),
            record("Second", "https://b.example/2"),
        ];

        assert_eq!(append_records(&table, &batch).await.unwrap(), 2);
        assert_eq!(append_records(&table, &batch).await.unwrap(), 0);
        assert_eq!(
            table.read_column("title").await.unwrap(),
            vec!["First", "Second"]
        );
    }

    #[tokio::test]
    async fn survivors_keep_input_order() {
        let table = test_table().await;
        append_records(&table, &[record("Existing", "https://a.example/1")])
            .await
            .unwrap();

        let batch = vec![
            record("Kept one", "https://c.example/1"),
            record("Dup", "https://a.example/1"),
            record("Kept two", "https://d.example/1"),
        ];
        assert_eq!(append_records(&table, &batch).await.unwrap(), 2);
        assert_eq!(
            table.read_column("title").await.unwrap(),
            vec!["Existing", "Kept one", "Kept two"]
        );
    }
}
