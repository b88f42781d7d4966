use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::classify::classify;
use crate::model::{Record, Status};
use crate::relations::{relations_for, Relation, RelationKind};
use crate::source::RecordSource;

/// A related record, already classified, with its own attached relations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Related {
    pub record: Record,
    pub status: Status,
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Context::is_empty")]
    pub context: Context,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RelationValue {
    One(Option<Box<Related>>),
    Many(Vec<Related>),
}

impl RelationValue {
    fn empty(kind: RelationKind) -> Self {
        match kind {
            RelationKind::Lookup => Self::One(None),
            RelationKind::Scan => Self::Many(Vec::new()),
        }
    }
}

/// Named relations of one record, in relation-table order. Serializes as a
/// map whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context(Vec<(&'static str, RelationValue)>);

impl Context {
    pub fn get(&self, name: &str) -> Option<&RelationValue> {
        self.0.iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    fn insert(&mut self, name: &'static str, value: RelationValue) {
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// The single related record under `name`, if resolved.
    pub fn one(&self, name: &str) -> Option<&Related> {
        match self.get(name) {
            Some(RelationValue::One(Some(related))) => Some(related),
            _ => None,
        }
    }

    /// The related records under `name`; empty when absent.
    pub fn many(&self, name: &str) -> &[Related] {
        match self.get(name) {
            Some(RelationValue::Many(items)) => items,
            _ => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &RelationValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Assembles a record's relational neighborhood from foreign keys.
///
/// Issues one query per relation per record, with no caching. Dangling
/// references, unset keys, tables missing from the dataset and query
/// errors all resolve to an absent value or an empty list.
pub struct ContextResolver<'a, S: RecordSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: RecordSource + ?Sized> ContextResolver<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    pub fn resolve(&self, record: &Record) -> Context {
        self.resolve_relations(record, relations_for(record.kind))
    }

    fn resolve_relations(&self, record: &Record, relations: &'static [Relation]) -> Context {
        let mut context = Context::default();
        for rel in relations {
            let value = if self.supported(rel) {
                match rel.kind {
                    RelationKind::Lookup => self.lookup(record, rel),
                    RelationKind::Scan => self.scan(record, rel),
                }
            } else {
                log::debug!(
                    "{}/{}: relation '{}' unsupported by this dataset",
                    record.kind,
                    record.id,
                    rel.name
                );
                RelationValue::empty(rel.kind)
            };
            context.insert(rel.name, value);
        }
        context
    }

    fn supported(&self, rel: &Relation) -> bool {
        let schema = self.source.schema();
        match rel.kind {
            RelationKind::Lookup => schema.has_table(rel.target),
            RelationKind::Scan => schema.has_column(rel.target, rel.field),
        }
    }

    fn lookup(&self, record: &Record, rel: &'static Relation) -> RelationValue {
        let Some(id) = record.foreign_key(rel.field) else {
            return RelationValue::One(None);
        };
        match self.source.fetch_by_id(rel.target, id) {
            Ok(Some(found)) => RelationValue::One(Some(Box::new(self.related(found, rel)))),
            Ok(None) => {
                log::debug!(
                    "{}/{}: dangling {} -> {}/{id}",
                    record.kind,
                    record.id,
                    rel.field,
                    rel.target
                );
                RelationValue::One(None)
            }
            Err(e) => {
                log::debug!("{}/{}: lookup '{}' failed: {e}", record.kind, record.id, rel.name);
                RelationValue::One(None)
            }
        }
    }

    fn scan(&self, record: &Record, rel: &'static Relation) -> RelationValue {
        match self.source.fetch_where(rel.target, rel.field, record.id) {
            Ok(rows) => {
                RelationValue::Many(rows.into_iter().map(|r| self.related(r, rel)).collect())
            }
            Err(e) => {
                log::debug!("{}/{}: scan '{}' failed: {e}", record.kind, record.id, rel.name);
                RelationValue::Many(Vec::new())
            }
        }
    }

    fn related(&self, record: Record, rel: &'static Relation) -> Related {
        let verdict = classify(&record);
        let context = self.resolve_relations(&record, rel.attach);
        Related { record, status: verdict.status, reason: verdict.reason, context }
    }
}

/// Resolve `record`'s context against `source`.
pub fn resolve<S: RecordSource + ?Sized>(source: &S, record: &Record) -> Context {
    ContextResolver::new(source).resolve(record)
}
