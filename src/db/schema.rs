/// Build the CREATE TABLE statement for one destination table. The column
/// list is the table's "header row"; every column is plain text.
pub fn create_table_sql(table: &str, headers: &[&str]) -> String {
    let columns = headers
        .iter()
        .map(|column| format!("    {} TEXT NOT NULL DEFAULT ''", column))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("CREATE TABLE IF NOT EXISTS \"{}\" (\n{}\n)", table, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HEADERS;

    #[test]
    fn generates_one_text_column_per_header() {
        let sql = create_table_sql("china_news", &HEADERS);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"china_news\""));
        for column in HEADERS {
            assert!(sql.contains(&format!("{} TEXT", column)));
        }
    }
}
