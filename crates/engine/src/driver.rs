use std::time::Instant;

use chrono::Utc;

use crate::aggregate::{aggregate, group_matches, MatchGroup, StatusTally};
use crate::classify::classify;
use crate::config::{FamilyConfig, ReviewConfig};
use crate::context::ContextResolver;
use crate::error::{ReviewError, SourceError};
use crate::model::{Family, FieldValue, Record, Verdict};
use crate::pager::{page_count, page_links, paginate, record_nav};
use crate::sink::{FamilyReport, ListEntry, PageView, RecordView, SnapshotIndex, SnapshotSink};
use crate::source::RecordSource;

/// A family's base collection with one verdict per record, in fetch order.
struct ClassifiedFamily {
    records: Vec<Record>,
    verdicts: Vec<Verdict>,
    stats: StatusTally,
    groups: Vec<MatchGroup<Option<i64>>>,
}

/// Run the full snapshot: every configured family is fetched, classified,
/// tallied, resolved and paginated, and handed to `sink`.
///
/// Families whose table is absent from the dataset are skipped. A failure
/// to fetch an existing family's collection aborts the run.
pub fn generate<S, K>(
    source: &S,
    config: &ReviewConfig,
    sink: &mut K,
) -> Result<SnapshotIndex, ReviewError>
where
    S: RecordSource + ?Sized,
    K: SnapshotSink + ?Sized,
{
    config.validate()?;
    let resolver = ContextResolver::new(source);
    let mut summaries = Vec::new();

    for family in &config.families {
        let started = Instant::now();
        let Some(classified) = load_family(source, family, config.require_tables)? else {
            continue;
        };
        let kind = family.kind;
        let group_key = group_key_of(family);

        let entries: Vec<ListEntry> = classified
            .records
            .iter()
            .zip(&classified.verdicts)
            .map(|(record, verdict)| list_entry(family, group_key, record, verdict))
            .collect();

        let ids: Vec<i64> = classified.records.iter().map(|r| r.id).collect();
        for (index, (record, verdict)) in
            classified.records.into_iter().zip(classified.verdicts).enumerate()
        {
            let Some(nav) = record_nav(&ids, index) else {
                continue;
            };
            let context = resolver.resolve(&record);
            let view = RecordView {
                family: kind,
                record,
                status: verdict.status,
                reason: verdict.reason,
                context,
                nav,
            };
            sink.record(&view).map_err(sink_error)?;
        }

        let root = format!("/{}/", kind.table());
        let pages = paginate(&entries, config.page_size, &root);
        for page in &pages {
            sink.page(&PageView {
                family: kind,
                display_name: family.display_name(),
                index: page.index,
                label: page.label.clone(),
                path: page.path.clone(),
                entries: page.items,
                links: page_links(&pages, page.index),
            })
            .map_err(sink_error)?;
        }

        let report = FamilyReport {
            kind,
            display_name: family.display_name().to_string(),
            records: ids.len(),
            stats: classified.stats,
            page_count: pages.len(),
            group_key: group_key.map(str::to_string),
            groups: classified.groups,
        };
        sink.family(&report).map_err(sink_error)?;

        log::info!(
            "{kind}: {} records, {} pages, {} valid / {} total ({:.1?})",
            report.records,
            report.page_count,
            report.stats.valid,
            report.stats.total,
            started.elapsed()
        );
        summaries.push(report.summary());
    }

    let index = SnapshotIndex {
        generated_at: Utc::now(),
        page_size: config.page_size,
        families: summaries,
    };
    sink.finish(&index).map_err(sink_error)?;
    Ok(index)
}

/// Classification and aggregation only: no context resolution, no output.
pub fn tally<S>(source: &S, config: &ReviewConfig) -> Result<Vec<FamilyReport>, ReviewError>
where
    S: RecordSource + ?Sized,
{
    config.validate()?;
    let mut reports = Vec::new();
    for family in &config.families {
        let Some(classified) = load_family(source, family, config.require_tables)? else {
            continue;
        };
        let records = classified.records.len();
        reports.push(FamilyReport {
            kind: family.kind,
            display_name: family.display_name().to_string(),
            records,
            stats: classified.stats,
            page_count: page_count(records, config.page_size),
            group_key: group_key_of(family).map(str::to_string),
            groups: classified.groups,
        });
    }
    Ok(reports)
}

fn group_key_of(family: &FamilyConfig) -> Option<&str> {
    if family.kind.family() == Family::Match {
        family.group_key()
    } else {
        None
    }
}

/// Fetch and classify one family. `Ok(None)` when its table is absent,
/// unless `require_table` makes that fatal.
fn load_family<S>(
    source: &S,
    family: &FamilyConfig,
    require_table: bool,
) -> Result<Option<ClassifiedFamily>, ReviewError>
where
    S: RecordSource + ?Sized,
{
    let kind = family.kind;
    let schema = source.schema();
    if !schema.has_table(kind) {
        if require_table {
            return Err(ReviewError::Fetch {
                family: kind,
                message: SourceError::MissingTable(kind.table().to_string()).to_string(),
            });
        }
        log::warn!("{kind}: table not present in this dataset, skipping");
        return Ok(None);
    }

    let records = match family.only_referenced_by.as_ref() {
        // Nothing can reference the family when the referencing table is missing.
        Some(filter) if !schema.has_table(filter.kind) => {
            log::warn!(
                "{kind}: filter table '{}' not present, collection is empty",
                filter.kind
            );
            Vec::new()
        }
        filter => source.fetch_all(kind, filter).map_err(|e| ReviewError::Fetch {
            family: kind,
            message: e.to_string(),
        })?,
    };

    // Each record is classified exactly once; grouping reuses these verdicts.
    let verdicts: Vec<Verdict> = records.iter().map(classify).collect();

    let (stats, groups) = match group_key_of(family) {
        Some(key) => {
            let groups = group_matches(
                records
                    .iter()
                    .zip(&verdicts)
                    .map(|(r, v)| (r.foreign_key(key), r.id, v.status)),
            );
            (aggregate(&groups), groups)
        }
        None => (verdicts.iter().map(|v| v.status).collect(), Vec::new()),
    };

    Ok(Some(ClassifiedFamily { records, verdicts, stats, groups }))
}

fn list_entry(
    family: &FamilyConfig,
    group_key: Option<&str>,
    record: &Record,
    verdict: &Verdict,
) -> ListEntry {
    let display = |field: &str| record.field(field).and_then(FieldValue::as_text);
    ListEntry {
        id: record.id,
        status: verdict.status,
        reason: verdict.reason.clone(),
        primary: display(family.primary_field.as_str()),
        secondary: family.secondary_field.as_deref().and_then(display),
        group: group_key.and_then(|key| record.foreign_key(key)),
    }
}

fn sink_error<E: std::fmt::Display>(e: E) -> ReviewError {
    ReviewError::Sink(e.to_string())
}
