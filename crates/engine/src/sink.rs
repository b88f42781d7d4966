//! Structures handed to the rendering collaborator, and the trait it implements.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::{MatchGroup, StatusTally};
use crate::context::Context;
use crate::model::{EntityKind, Record, Status};
use crate::pager::{PageLink, RecordNav};

/// One record with everything needed to render its detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordView {
    pub family: EntityKind,
    pub record: Record,
    pub status: Status,
    pub reason: Option<String>,
    pub context: Context,
    pub nav: RecordNav,
}

/// A row on a list page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListEntry {
    pub id: i64,
    pub status: Status,
    pub reason: Option<String>,
    pub primary: Option<String>,
    pub secondary: Option<String>,
    /// Grouping key of a match record. Match families only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<i64>,
}

/// One list page of a family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView<'a> {
    pub family: EntityKind,
    pub display_name: &'a str,
    pub index: usize,
    pub label: String,
    pub path: String,
    pub entries: &'a [ListEntry],
    pub links: Vec<PageLink>,
}

/// Per-family result: stats plus, for match families, the groups they were
/// computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyReport {
    pub kind: EntityKind,
    pub display_name: String,
    /// Rows fetched, before grouping.
    pub records: usize,
    pub stats: StatusTally,
    pub page_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<MatchGroup<Option<i64>>>,
}

impl FamilyReport {
    pub fn summary(&self) -> FamilySummary {
        FamilySummary {
            kind: self.kind,
            display_name: self.display_name.clone(),
            records: self.records,
            stats: self.stats,
            page_count: self.page_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilySummary {
    pub kind: EntityKind,
    pub display_name: String,
    pub records: usize,
    pub stats: StatusTally,
    pub page_count: usize,
}

/// Emitted once, after every family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotIndex {
    pub generated_at: DateTime<Utc>,
    pub page_size: usize,
    pub families: Vec<FamilySummary>,
}

/// Rendering collaborator. Receives each family's records, then its pages,
/// then its report; [`SnapshotSink::finish`] comes last.
///
/// Any error aborts the run.
pub trait SnapshotSink {
    type Error: fmt::Display;

    fn record(&mut self, view: &RecordView) -> Result<(), Self::Error>;

    fn page(&mut self, view: &PageView<'_>) -> Result<(), Self::Error>;

    fn family(&mut self, report: &FamilyReport) -> Result<(), Self::Error>;

    fn finish(&mut self, index: &SnapshotIndex) -> Result<(), Self::Error>;
}

/// Keeps everything in memory. Used by tests and embedding callers.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub records: Vec<RecordView>,
    pub pages: Vec<CollectedPage>,
    pub reports: Vec<FamilyReport>,
    pub index: Option<SnapshotIndex>,
}

/// Owned copy of a [`PageView`].
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedPage {
    pub family: EntityKind,
    pub label: String,
    pub path: String,
    pub entries: Vec<ListEntry>,
    pub links: Vec<PageLink>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records_of(&self, kind: EntityKind) -> impl Iterator<Item = &RecordView> {
        self.records.iter().filter(move |v| v.family == kind)
    }

    pub fn pages_of(&self, kind: EntityKind) -> impl Iterator<Item = &CollectedPage> {
        self.pages.iter().filter(move |p| p.family == kind)
    }

    pub fn report(&self, kind: EntityKind) -> Option<&FamilyReport> {
        self.reports.iter().find(|r| r.kind == kind)
    }
}

impl SnapshotSink for CollectingSink {
    type Error = std::convert::Infallible;

    fn record(&mut self, view: &RecordView) -> Result<(), Self::Error> {
        self.records.push(view.clone());
        Ok(())
    }

    fn page(&mut self, view: &PageView<'_>) -> Result<(), Self::Error> {
        self.pages.push(CollectedPage {
            family: view.family,
            label: view.label.clone(),
            path: view.path.clone(),
            entries: view.entries.to_vec(),
            links: view.links.clone(),
        });
        Ok(())
    }

    fn family(&mut self, report: &FamilyReport) -> Result<(), Self::Error> {
        self.reports.push(report.clone());
        Ok(())
    }

    fn finish(&mut self, index: &SnapshotIndex) -> Result<(), Self::Error> {
        self.index = Some(index.clone());
        Ok(())
    }
}
