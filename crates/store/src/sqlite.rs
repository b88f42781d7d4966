use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Params, Row};

use linkaudit_engine::source::CollectionFilter;
use linkaudit_engine::{EntityKind, FieldValue, Record, RecordSource, SchemaCapabilities, SourceError};

use crate::schema::detect_schema;

/// Read-only [`RecordSource`] over a pipeline SQLite database.
///
/// Every query runs inside one read transaction opened at construction, so
/// a run sees a single snapshot even if the pipeline writes concurrently.
pub struct SqliteSource {
    conn: Connection,
    schema: SchemaCapabilities,
}

impl SqliteSource {
    /// Open `path` read-only.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(query_error)?;
        Self::from_connection(conn)
    }

    /// Wrap an existing connection. The connection is only ever read.
    pub fn from_connection(conn: Connection) -> Result<Self, SourceError> {
        conn.execute_batch("BEGIN DEFERRED").map_err(query_error)?;
        let schema = detect_schema(&conn).map_err(query_error)?;
        log::debug!("dataset carries {} family tables", schema.tables().count());
        Ok(Self { conn, schema })
    }

    fn require_table(&self, kind: EntityKind) -> Result<(), SourceError> {
        if self.schema.has_table(kind) {
            Ok(())
        } else {
            Err(SourceError::MissingTable(kind.table().to_string()))
        }
    }

    fn require_column(&self, kind: EntityKind, column: &str) -> Result<(), SourceError> {
        self.require_table(kind)?;
        if self.schema.has_column(kind, column) {
            Ok(())
        } else {
            Err(SourceError::Query(format!("{kind} has no column '{column}'")))
        }
    }

    fn select<P: Params>(&self, kind: EntityKind, sql: &str, params: P) -> Result<Vec<Record>, SourceError> {
        let mut stmt = self.conn.prepare(sql).map_err(query_error)?;
        let rows = stmt
            .query_map(params, read_row)
            .map_err(query_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(query_error)?;

        Ok(rows
            .into_iter()
            .filter_map(|fields| {
                let record = Record::from_row(kind, fields);
                if record.is_none() {
                    log::warn!("{kind}: skipping row without an integer id");
                }
                record
            })
            .collect())
    }
}

impl RecordSource for SqliteSource {
    fn schema(&self) -> &SchemaCapabilities {
        &self.schema
    }

    fn fetch_all(
        &self,
        kind: EntityKind,
        filter: Option<&CollectionFilter>,
    ) -> Result<Vec<Record>, SourceError> {
        self.require_table(kind)?;
        let table = quote_ident(kind.table());
        match filter {
            None => self.select(kind, &format!("SELECT * FROM {table} ORDER BY rowid"), params![]),
            Some(filter) => {
                self.require_column(filter.kind, &filter.field)?;
                let sql = format!(
                    "SELECT * FROM {table} WHERE id IN (SELECT DISTINCT {} FROM {}) ORDER BY rowid",
                    quote_ident(&filter.field),
                    quote_ident(filter.kind.table()),
                );
                self.select(kind, &sql, params![])
            }
        }
    }

    fn fetch_by_id(&self, kind: EntityKind, id: i64) -> Result<Option<Record>, SourceError> {
        self.require_table(kind)?;
        let sql = format!("SELECT * FROM {} WHERE id = ?1", quote_ident(kind.table()));
        let fields = self
            .conn
            .query_row(&sql, params![id], read_row)
            .optional()
            .map_err(query_error)?;
        Ok(fields.and_then(|f| Record::from_row(kind, f)))
    }

    fn fetch_where(
        &self,
        kind: EntityKind,
        field: &str,
        value: i64,
    ) -> Result<Vec<Record>, SourceError> {
        self.require_column(kind, field)?;
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1 ORDER BY rowid",
            quote_ident(kind.table()),
            quote_ident(field),
        );
        self.select(kind, &sql, params![value])
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<BTreeMap<String, FieldValue>> {
    let stmt = row.as_ref();
    let mut fields = BTreeMap::new();
    for i in 0..stmt.column_count() {
        let name = stmt.column_name(i)?.to_string();
        let value = match row.get_ref(i)? {
            ValueRef::Null => FieldValue::Null,
            ValueRef::Integer(v) => FieldValue::Integer(v),
            ValueRef::Real(v) => FieldValue::Real(v),
            ValueRef::Text(bytes) => FieldValue::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => FieldValue::Blob(bytes.to_vec()),
        };
        fields.insert(name, value);
    }
    Ok(fields)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn query_error(e: rusqlite::Error) -> SourceError {
    SourceError::Query(e.to_string())
}
