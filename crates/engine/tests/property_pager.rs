// Property-based tests for pagination and grouped aggregation.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::BTreeSet;

use proptest::prelude::*;
use linkaudit_engine::aggregate::{aggregate, group_matches, group_status};
use linkaudit_engine::pager::{page_count, page_links, paginate, record_nav};
use linkaudit_engine::Status;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn arb_status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Valid),
        Just(Status::Invalid),
        Just(Status::Blocked),
        Just(Status::Unknown),
    ]
}

/// Match rows: small key space so groups actually collide; some null keys.
fn arb_matches() -> impl Strategy<Value = Vec<(Option<i64>, i64, Status)>> {
    proptest::collection::vec(
        (proptest::option::weighted(0.9, 0i64..8), arb_status()),
        0..60,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (key, status))| (key, i as i64 + 1, status))
            .collect()
    })
}

// ---------------------------------------------------------------------------
// Pager
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn pages_concatenate_to_input(
        items in proptest::collection::vec(any::<u32>(), 0..500),
        page_size in 1usize..64,
    ) {
        let pages = paginate(&items, page_size, "/event/");
        prop_assert!(!pages.is_empty());
        prop_assert_eq!(pages.len(), page_count(items.len(), page_size));

        let joined: Vec<u32> = pages.iter().flat_map(|p| p.items.iter().copied()).collect();
        prop_assert_eq!(joined, items.clone());

        for (k, page) in pages.iter().enumerate() {
            prop_assert_eq!(page.index, k);
            prop_assert!(page.items.len() <= page_size);
            if k + 1 < pages.len() {
                prop_assert_eq!(page.items.len(), page_size);
            }
        }

        let paths: BTreeSet<&str> = pages.iter().map(|p| p.path.as_str()).collect();
        prop_assert_eq!(paths.len(), pages.len());
    }

    #[test]
    fn pagination_is_stable_across_runs(
        items in proptest::collection::vec(any::<u16>(), 0..300),
        page_size in 1usize..50,
    ) {
        prop_assert_eq!(
            paginate(&items, page_size, "/actor/"),
            paginate(&items, page_size, "/actor/")
        );
    }

    #[test]
    fn exactly_one_current_link_per_page(
        len in 0usize..200,
        page_size in 1usize..20,
    ) {
        let items: Vec<usize> = (0..len).collect();
        let pages = paginate(&items, page_size, "/x/");
        for current in 0..pages.len() {
            let links = page_links(&pages, current);
            prop_assert_eq!(links.iter().filter(|l| l.is_current).count(), 1);
            prop_assert!(links[current].is_current);
        }
    }

    #[test]
    fn nav_walks_ids_in_given_order(ids in proptest::collection::vec(any::<i64>(), 1..50)) {
        for i in 0..ids.len() {
            let nav = record_nav(&ids, i).unwrap();
            prop_assert_eq!(nav.first_id, ids[0]);
            prop_assert_eq!(nav.last_id, ids[ids.len() - 1]);
            prop_assert_eq!(nav.prev_id, if i == 0 { None } else { Some(ids[i - 1]) });
            prop_assert_eq!(nav.next_id, ids.get(i + 1).copied());
        }
        prop_assert!(record_nav(&ids, ids.len()).is_none());
    }
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn group_status_rules(members in proptest::collection::vec(arb_status(), 1..12)) {
        let status = group_status(&members);
        let any_valid = members.contains(&Status::Valid);
        let all_invalid = members.iter().all(|s| *s == Status::Invalid);
        prop_assert_eq!(status == Status::Valid, any_valid);
        prop_assert_eq!(status == Status::Invalid, all_invalid);
        if !any_valid && !all_invalid && members.contains(&Status::Blocked) {
            prop_assert_eq!(status, Status::Blocked);
        }
    }

    #[test]
    fn totals_count_groups_not_rows(rows in arb_matches()) {
        let distinct_keys: BTreeSet<Option<i64>> = rows.iter().map(|r| r.0).collect();
        let row_count = rows.len();
        let groups = group_matches(rows);
        let tally = aggregate(&groups);

        prop_assert_eq!(groups.len(), distinct_keys.len());
        prop_assert_eq!(tally.total, distinct_keys.len());
        prop_assert_eq!(
            tally.valid + tally.invalid + tally.blocked + tally.unknown,
            tally.total
        );
        let members: usize = groups.iter().map(|g| g.member_ids.len()).sum();
        prop_assert_eq!(members, row_count);
    }
}
