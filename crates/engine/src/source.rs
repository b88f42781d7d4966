use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::model::{EntityKind, Record};

/// Which family tables (and which of their columns) exist in a dataset.
///
/// Two dataset generations differ in which match tables and review columns
/// they carry. The resolver consults this instead of probing and catching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCapabilities {
    tables: BTreeMap<EntityKind, BTreeSet<String>>,
}

impl SchemaCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every kind present, column sets unknown (treated as "all columns").
    pub fn all() -> Self {
        let mut caps = Self::new();
        for kind in EntityKind::ALL {
            caps.tables.insert(kind, BTreeSet::new());
        }
        caps
    }

    pub fn insert_table<I, S>(&mut self, kind: EntityKind, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables.insert(kind, columns.into_iter().map(Into::into).collect());
    }

    pub fn has_table(&self, kind: EntityKind) -> bool {
        self.tables.contains_key(&kind)
    }

    /// `true` when the table exists and either has the column or its column
    /// set was not recorded.
    pub fn has_column(&self, kind: EntityKind, column: &str) -> bool {
        match self.tables.get(&kind) {
            Some(cols) => cols.is_empty() || cols.contains(column),
            None => false,
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.tables.keys().copied()
    }
}

/// Restricts a family's base collection to records another family points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionFilter {
    /// Referencing kind, e.g. `splitlocationmatch`.
    pub kind: EntityKind,
    /// Foreign-key column on the referencing kind, e.g. `authoritative_location_id`.
    pub field: String,
}

/// Read-only access to the pipeline dataset.
///
/// Collections come back in a stable storage order; the engine never reorders them.
pub trait RecordSource {
    fn schema(&self) -> &SchemaCapabilities;

    /// All records of `kind`, optionally restricted by `filter`.
    fn fetch_all(
        &self,
        kind: EntityKind,
        filter: Option<&CollectionFilter>,
    ) -> Result<Vec<Record>, SourceError>;

    /// Point lookup. `Ok(None)` for a dangling id.
    fn fetch_by_id(&self, kind: EntityKind, id: i64) -> Result<Option<Record>, SourceError>;

    /// Records of `kind` whose column `field` equals `value`.
    fn fetch_where(
        &self,
        kind: EntityKind,
        field: &str,
        value: i64,
    ) -> Result<Vec<Record>, SourceError>;
}

impl<T: RecordSource + ?Sized> RecordSource for &T {
    fn schema(&self) -> &SchemaCapabilities {
        (**self).schema()
    }

    fn fetch_all(
        &self,
        kind: EntityKind,
        filter: Option<&CollectionFilter>,
    ) -> Result<Vec<Record>, SourceError> {
        (**self).fetch_all(kind, filter)
    }

    fn fetch_by_id(&self, kind: EntityKind, id: i64) -> Result<Option<Record>, SourceError> {
        (**self).fetch_by_id(kind, id)
    }

    fn fetch_where(
        &self,
        kind: EntityKind,
        field: &str,
        value: i64,
    ) -> Result<Vec<Record>, SourceError> {
        (**self).fetch_where(kind, field, value)
    }
}
