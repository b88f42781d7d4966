use std::path::PathBuf;

use linkaudit_engine::aggregate::StatusTally;
use linkaudit_engine::sink::CollectingSink;
use linkaudit_engine::{
    generate, tally, EntityKind, FieldValue, MemorySource, RecordSource, ReviewConfig,
    ReviewError, Status,
};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_config(name: &str) -> ReviewConfig {
    let path = fixtures_dir().join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    ReviewConfig::from_toml(&text).unwrap()
}

/// One parent location, three split locations, four competing matches and
/// three gazetteer entries of which one is never matched. No meeting type tables.
fn location_dataset() -> MemorySource {
    use EntityKind::*;

    let mut src = MemorySource::new();
    src.insert_row(Location, 1, &[("name", "Bristol".into()), ("use", true.into())]);

    src.insert_row(
        SplitLocation,
        10,
        &[
            ("location_id", 1i64.into()),
            ("name", "Bristol".into()),
            ("country", "UK".into()),
            ("needs_review", false.into()),
        ],
    );
    src.insert_row(
        SplitLocation,
        11,
        &[("location_id", 1i64.into()), ("name", "Clifton".into()), ("needs_review", true.into())],
    );
    src.insert_row(
        SplitLocation,
        12,
        &[
            ("location_id", 1i64.into()),
            ("name", "Bristol (dup)".into()),
            ("blocked", true.into()),
            ("block_reason", "duplicate split".into()),
        ],
    );

    src.insert_row(AuthoritativeLocation, 100, &[("name", "Bristol".into()), ("county", "Avon".into())]);
    src.insert_row(AuthoritativeLocation, 101, &[("name", "Bath".into()), ("county", "Somerset".into())]);
    src.insert_row(AuthoritativeLocation, 102, &[("name", "Penzance".into())]);

    let matches: [(i64, i64, i64, FieldValue, Option<&str>); 4] = [
        (1, 10, 100, true.into(), None),
        (2, 10, 101, false.into(), Some("wrong county")),
        (3, 10, 101, FieldValue::Null, None),
        (4, 11, 101, false.into(), Some("too far")),
    ];
    for (id, split, auth, accepted, reason) in matches {
        src.insert_row(
            SplitLocationMatch,
            id,
            &[
                ("split_location_id", split.into()),
                ("authoritative_location_id", auth.into()),
                ("accepted", accepted),
                ("accepted_reason", reason.into()),
                ("confidence_score", 0.75f64.into()),
                ("algorithm", "fuzzy".into()),
            ],
        );
    }
    src
}

// -------------------------------------------------------------------------
// Full generation
// -------------------------------------------------------------------------

#[test]
fn location_families_end_to_end() {
    let src = location_dataset();
    let config = load_config("locations.review.toml");
    let mut sink = CollectingSink::new();
    let index = generate(&src, &config, &mut sink).unwrap();

    // meetingtypematch is configured but absent from the dataset
    let kinds: Vec<EntityKind> = index.families.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EntityKind::SplitLocation,
            EntityKind::SplitLocationMatch,
            EntityKind::AuthoritativeLocation
        ]
    );
    assert_eq!(index.page_size, 2);

    let splits = sink.report(EntityKind::SplitLocation).unwrap();
    assert_eq!(
        splits.stats,
        StatusTally { total: 3, valid: 1, invalid: 0, blocked: 1, unknown: 1 }
    );
    assert_eq!(splits.page_count, 2);

    let pages: Vec<_> = sink.pages_of(EntityKind::SplitLocation).collect();
    assert_eq!(pages[0].label, "1-2");
    assert_eq!(pages[0].path, "/splitlocation/");
    assert_eq!(pages[1].label, "3-3");
    assert_eq!(pages[1].path, "/splitlocation/3-3/");
    assert!(pages[1].links[1].is_current);
    assert!(!pages[1].links[0].is_current);
    assert_eq!(pages[0].entries[0].primary.as_deref(), Some("Bristol"));
    assert_eq!(pages[0].entries[0].secondary.as_deref(), Some("UK"));
    assert_eq!(pages[1].entries[0].reason.as_deref(), Some("duplicate split"));
}

#[test]
fn three_candidates_for_one_split_count_once() {
    let src = location_dataset();
    let config = load_config("locations.review.toml");
    let mut sink = CollectingSink::new();
    generate(&src, &config, &mut sink).unwrap();

    let report = sink.report(EntityKind::SplitLocationMatch).unwrap();
    assert_eq!(report.records, 4);
    assert_eq!(report.stats.total, 2);
    assert_eq!(report.stats.valid, 1);
    assert_eq!(report.stats.invalid, 1);
    assert_eq!(report.groups[0].key, Some(10));
    assert_eq!(report.groups[0].status, Status::Valid);
    assert_eq!(report.groups[0].member_ids, vec![1, 2, 3]);

    // member records keep their own status
    let statuses: Vec<Status> = sink
        .records_of(EntityKind::SplitLocationMatch)
        .map(|v| v.status)
        .collect();
    assert_eq!(statuses, vec![Status::Valid, Status::Invalid, Status::Unknown, Status::Invalid]);

    let entries: Vec<Option<i64>> = sink
        .pages_of(EntityKind::SplitLocationMatch)
        .flat_map(|p| p.entries.iter().map(|e| e.group))
        .collect();
    assert_eq!(entries, vec![Some(10), Some(10), Some(10), Some(11)]);
}

#[test]
fn navigation_follows_fetch_order() {
    let src = location_dataset();
    let config = load_config("locations.review.toml");
    let mut sink = CollectingSink::new();
    generate(&src, &config, &mut sink).unwrap();

    let views: Vec<_> = sink.records_of(EntityKind::SplitLocation).collect();
    assert_eq!(views.len(), 3);
    assert_eq!(views[0].nav.prev_id, None);
    assert_eq!(views[1].nav.prev_id, Some(10));
    assert_eq!(views[1].nav.next_id, Some(12));
    assert_eq!(views[2].nav.next_id, None);
    assert!(views.iter().all(|v| v.nav.first_id == 10 && v.nav.last_id == 12));
}

#[test]
fn split_location_context_denormalizes_match_targets() {
    let src = location_dataset();
    let config = load_config("locations.review.toml");
    let mut sink = CollectingSink::new();
    generate(&src, &config, &mut sink).unwrap();

    let split = sink
        .records_of(EntityKind::SplitLocation)
        .find(|v| v.record.id == 10)
        .unwrap();
    assert_eq!(split.context.one("parent_location").unwrap().record.id, 1);
    let matches = split.context.many("matches");
    assert_eq!(matches.len(), 3);
    assert_eq!(matches[1].reason.as_deref(), Some("wrong county"));
    let target = matches[0].context.one("authoritative_location").unwrap();
    assert_eq!(target.record.field("county"), Some(&FieldValue::from("Avon")));
}

#[test]
fn authoritative_locations_limited_to_matched_ones() {
    let src = location_dataset();
    let config = load_config("locations.review.toml");
    let mut sink = CollectingSink::new();
    generate(&src, &config, &mut sink).unwrap();

    let ids: Vec<i64> = sink
        .records_of(EntityKind::AuthoritativeLocation)
        .map(|v| v.record.id)
        .collect();
    assert_eq!(ids, vec![100, 101]);

    let bath = sink
        .records_of(EntityKind::AuthoritativeLocation)
        .find(|v| v.record.id == 101)
        .unwrap();
    let inbound = bath.context.many("matches");
    assert_eq!(inbound.iter().map(|m| m.record.id).collect::<Vec<_>>(), vec![2, 3, 4]);
    assert_eq!(inbound[2].context.one("split_location").unwrap().record.id, 11);
}

// -------------------------------------------------------------------------
// Events
// -------------------------------------------------------------------------

#[test]
fn event_without_article_resolves_and_classifies() {
    use EntityKind::*;

    let mut src = MemorySource::new()
        .with_table(Article)
        .with_table(Location)
        .with_table(TimeStamp)
        .with_table(MeetingType)
        .with_table(Actor);
    src.insert_row(
        Event,
        1,
        &[("article_id", FieldValue::Null), ("excerpt", "Council met".into()), ("use", true.into())],
    );

    let config = ReviewConfig::from_toml(
        r#"
[[families]]
kind = "event"
primary_field = "excerpt"
"#,
    )
    .unwrap();
    let mut sink = CollectingSink::new();
    generate(&src, &config, &mut sink).unwrap();

    let view = &sink.records[0];
    assert_eq!(view.status, Status::Valid);
    assert!(view.reason.is_none());
    assert!(view.context.one("article").is_none());
    assert!(view.context.get("article").is_some());
    // eventmatch table absent: degrades to an empty list
    assert!(view.context.many("event_matches").is_empty());
}

// -------------------------------------------------------------------------
// Failures
// -------------------------------------------------------------------------

#[test]
fn base_collection_failure_aborts_and_names_family() {
    let mut src = location_dataset();
    src.fail_fetches(EntityKind::SplitLocationMatch);
    let config = load_config("locations.review.toml");
    let mut sink = CollectingSink::new();

    let err = generate(&src, &config, &mut sink).unwrap_err();
    match err {
        ReviewError::Fetch { family, .. } => assert_eq!(family, EntityKind::SplitLocationMatch),
        other => panic!("expected fetch error, got {other}"),
    }
    assert!(sink.index.is_none());
}

#[test]
fn tally_matches_generate_stats() {
    let src = location_dataset();
    let config = load_config("locations.review.toml");
    let mut sink = CollectingSink::new();
    generate(&src, &config, &mut sink).unwrap();

    let reports = tally(&src, &config).unwrap();
    assert_eq!(reports.len(), sink.reports.len());
    for report in &reports {
        let generated = sink.report(report.kind).unwrap();
        assert_eq!(report.stats, generated.stats);
        assert_eq!(report.page_count, generated.page_count);
    }
    assert!(src.schema().has_table(EntityKind::SplitLocation));
}
