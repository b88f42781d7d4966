use rusqlite::Connection;

use linkaudit_engine::{EntityKind, SchemaCapabilities};

/// Probe `conn` for family tables and their columns.
///
/// Tables are matched by exact lowercase name. A family table without an
/// `id` column cannot yield records and is left out.
pub fn detect_schema(conn: &Connection) -> rusqlite::Result<SchemaCapabilities> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;

    let mut schema = SchemaCapabilities::new();
    for table in tables {
        let Ok(kind) = table.parse::<EntityKind>() else {
            continue;
        };
        if kind.table() != table {
            continue;
        }

        let columns = table_columns(conn, &table)?;
        if !columns.iter().any(|c| c == "id") {
            log::warn!("table '{table}' has no id column, ignoring it");
            continue;
        }
        log::debug!("{kind}: {} columns", columns.len());
        schema.insert_table(kind, columns);
    }
    Ok(schema)
}

fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_family_tables_and_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE event (id INTEGER PRIMARY KEY, article_id INTEGER, "use" BOOLEAN);
            CREATE TABLE splitlocationmatch (id INTEGER PRIMARY KEY, accepted BOOLEAN);
            CREATE TABLE alembic_version (version_num TEXT);
            CREATE TABLE actor (name TEXT);
            CREATE TABLE Location (id INTEGER PRIMARY KEY);
            "#,
        )
        .unwrap();

        let schema = detect_schema(&conn).unwrap();
        let kinds: Vec<EntityKind> = schema.tables().collect();
        assert_eq!(kinds, vec![EntityKind::Event, EntityKind::SplitLocationMatch]);
        assert!(schema.has_column(EntityKind::Event, "use"));
        assert!(!schema.has_column(EntityKind::Event, "blocked"));
        assert!(schema.has_column(EntityKind::SplitLocationMatch, "accepted"));
    }

    #[test]
    fn empty_database_has_no_tables() {
        let conn = Connection::open_in_memory().unwrap();
        let schema = detect_schema(&conn).unwrap();
        assert_eq!(schema.tables().count(), 0);
    }
}
