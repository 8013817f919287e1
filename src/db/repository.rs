use rusqlite::params;
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};

use super::schema::create_table_sql;
use super::Table;

/// One destination table in the shared SQLite database. Cheap to
/// construct: the connection handle is cloned per region.
pub struct SqliteTable {
    conn: Connection,
    name: String,
}

impl SqliteTable {
    pub fn new(conn: Connection, name: &str) -> Result<Self> {
        if !valid_ident(name) {
            return Err(AppError::Table(format!("invalid table name: {:?}", name)));
        }
        Ok(Self {
            conn,
            name: name.to_string(),
        })
    }
}

/// Table and column names are interpolated into SQL, so they are limited
/// to identifier characters.
fn valid_ident(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Table for SqliteTable {
    async fn exists(&self) -> Result<bool> {
        let name = self.name.clone();
        let exists = self
            .conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(count > 0)
            })
            .await?;
        Ok(exists)
    }

    async fn create(&self, headers: &[&str]) -> Result<()> {
        if let Some(column) = headers.iter().find(|c| !valid_ident(c)) {
            return Err(AppError::Table(format!("invalid column name: {:?}", column)));
        }
        let sql = create_table_sql(&self.name, headers);
        self.conn
            .call(move |conn| {
                conn.execute_batch(&sql)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn read_column(&self, column: &str) -> Result<Vec<String>> {
        if !valid_ident(column) {
            return Err(AppError::Table(format!("invalid column name: {:?}", column)));
        }
        let sql = format!("SELECT \"{}\" FROM \"{}\"", column, self.name);
        let values = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let values = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(values)
            })
            .await?;
        Ok(values)
    }

    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let name = self.name.clone();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                {
                    let width = rows[0].len();
                    let placeholders = (1..=width)
                        .map(|i| format!("?{}", i))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let sql = format!("INSERT INTO \"{}\" VALUES ({})", name, placeholders);
                    let mut stmt = tx.prepare(&sql)?;
                    for row in &rows {
                        stmt.execute(rusqlite::params_from_iter(row.iter()))?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HEADERS;

    #[tokio::test]
    async fn create_then_exists_and_roundtrip() {
        let conn = Connection::open_in_memory().await.unwrap();
        let table = SqliteTable::new(conn, "china_news").unwrap();

        assert!(!table.exists().await.unwrap());
        table.create(&HEADERS).await.unwrap();
        assert!(table.exists().await.unwrap());

        let row: Vec<String> = (0..HEADERS.len()).map(|i| format!("v{}", i)).collect();
        table.append_rows(vec![row]).await.unwrap();

        assert_eq!(table.read_column("title").await.unwrap(), vec!["v0"]);
        assert_eq!(table.read_column("links").await.unwrap(), vec!["v4"]);
    }

    #[tokio::test]
    async fn rejects_non_identifier_names() {
        let conn = Connection::open_in_memory().await.unwrap();
        assert!(SqliteTable::new(conn.clone(), "bad name; --").is_err());

        let table = SqliteTable::new(conn, "china_news").unwrap();
        assert!(table.read_column("links; DROP TABLE x").await.is_err());
    }
}
