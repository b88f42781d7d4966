//! `linkaudit-engine`: review status and relational context for a
//! record-linkage dataset.
//!
//! Records come in through a [`RecordSource`]; classified records, their
//! resolved neighborhoods and paginated lists go out to a [`SnapshotSink`].
//! Storage and rendering live in other crates.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod memory;
pub mod model;
pub mod pager;
pub mod relations;
pub mod sink;
pub mod source;

pub use classify::classify;
pub use config::{FamilyConfig, ReviewConfig};
pub use context::{Context, Related, RelationValue};
pub use driver::{generate, tally};
pub use error::{ReviewError, SourceError};
pub use memory::MemorySource;
pub use model::{EntityKind, FieldValue, Record, Status, Verdict};
pub use sink::{FamilyReport, PageView, RecordView, SnapshotIndex, SnapshotSink};
pub use source::{CollectionFilter, RecordSource, SchemaCapabilities};
