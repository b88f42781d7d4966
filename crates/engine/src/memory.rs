//! In-memory [`RecordSource`], used by tests and by callers that already
//! hold a snapshot of the dataset.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::SourceError;
use crate::model::{EntityKind, FieldValue, Record};
use crate::source::{CollectionFilter, RecordSource, SchemaCapabilities};

#[derive(Debug, Default)]
pub struct MemorySource {
    schema: SchemaCapabilities,
    tables: BTreeMap<EntityKind, Vec<Record>>,
    failing: BTreeSet<EntityKind>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an (initially empty) table for `kind`.
    pub fn with_table(mut self, kind: EntityKind) -> Self {
        self.ensure_table(kind);
        self
    }

    /// Append a record; insertion order is the fetch order.
    pub fn insert(&mut self, record: Record) {
        self.ensure_table(record.kind);
        self.tables.entry(record.kind).or_default().push(record);
    }

    /// Append a row built from column/value pairs.
    pub fn insert_row(&mut self, kind: EntityKind, id: i64, pairs: &[(&str, FieldValue)]) {
        let mut fields: BTreeMap<String, FieldValue> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        fields.insert("id".to_string(), FieldValue::Integer(id));
        self.insert(Record::new(kind, id, fields));
    }

    /// Make every base-collection fetch of `kind` fail.
    pub fn fail_fetches(&mut self, kind: EntityKind) {
        self.failing.insert(kind);
    }

    fn ensure_table(&mut self, kind: EntityKind) {
        if !self.schema.has_table(kind) {
            self.schema.insert_table(kind, Vec::<String>::new());
        }
        self.tables.entry(kind).or_default();
    }

    fn table(&self, kind: EntityKind) -> Result<&[Record], SourceError> {
        self.tables
            .get(&kind)
            .map(Vec::as_slice)
            .ok_or_else(|| SourceError::MissingTable(kind.table().to_string()))
    }
}

impl RecordSource for MemorySource {
    fn schema(&self) -> &SchemaCapabilities {
        &self.schema
    }

    fn fetch_all(
        &self,
        kind: EntityKind,
        filter: Option<&CollectionFilter>,
    ) -> Result<Vec<Record>, SourceError> {
        if self.failing.contains(&kind) {
            return Err(SourceError::Query(format!("simulated failure reading '{kind}'")));
        }
        let rows = self.table(kind)?;
        let Some(filter) = filter else {
            return Ok(rows.to_vec());
        };
        let referenced: BTreeSet<i64> = self
            .table(filter.kind)?
            .iter()
            .filter_map(|r| r.foreign_key(&filter.field))
            .collect();
        Ok(rows.iter().filter(|r| referenced.contains(&r.id)).cloned().collect())
    }

    fn fetch_by_id(&self, kind: EntityKind, id: i64) -> Result<Option<Record>, SourceError> {
        Ok(self.table(kind)?.iter().find(|r| r.id == id).cloned())
    }

    fn fetch_where(
        &self,
        kind: EntityKind,
        field: &str,
        value: i64,
    ) -> Result<Vec<Record>, SourceError> {
        Ok(self
            .table(kind)?
            .iter()
            .filter(|r| r.foreign_key(field) == Some(value))
            .cloned()
            .collect())
    }
}
