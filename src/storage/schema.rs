//! Database schema definitions and migrations.

/// SQL schema for the two-table crawl store.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS pages (
    url TEXT PRIMARY KEY,
    content TEXT,
    metadata TEXT
);

CREATE TABLE IF NOT EXISTS links (
    url TEXT PRIMARY KEY,
    visited BOOLEAN NOT NULL DEFAULT 0,
    retry_count INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_links_visited ON links(visited);
"#;

/// Initializes the schema, then runs the additive migration pass.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    migrate_schema(conn)
}

/// Brings an older `links` table forward by adding `retry_count` with a
/// default of 0 if it's missing. Mirrors the `PRAGMA table_info` check used
/// to detect pre-existing database files created before this column existed.
fn migrate_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    let mut stmt = conn.prepare("PRAGMA table_info(links)")?;
    let has_retry_count = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?
        .iter()
        .any(|name| name == "retry_count");

    if !has_retry_count {
        conn.execute_batch("ALTER TABLE links ADD COLUMN retry_count INTEGER NOT NULL DEFAULT 0")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn initializes_idempotently() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        initialize_schema(&conn).unwrap();
    }

    #[test]
    fn tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["pages", "links"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "table {table} should exist");
        }
    }

    #[test]
    fn migration_adds_retry_count_to_legacy_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE links (url TEXT PRIMARY KEY, visited BOOLEAN NOT NULL DEFAULT 0)",
        )
        .unwrap();

        migrate_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO links (url, visited) VALUES ('https://example.com/', 0)",
            [],
        )
        .unwrap();
        let retry_count: i64 = conn
            .query_row(
                "SELECT retry_count FROM links WHERE url = 'https://example.com/'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(retry_count, 0);
    }
}
