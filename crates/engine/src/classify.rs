use crate::model::{Capability, Record, ReviewField, Status, Verdict};

/// Classify a record from its own review fields.
///
/// Rules run in capability priority order and the first decisive one wins:
/// - blocked flag set → Blocked (block reason)
/// - use flag true/false → Valid / Invalid (unuse reason); null falls through
/// - accepted flag true/false → Valid / Invalid (rejection reason); null falls through
/// - needs_review false → Valid, otherwise Unknown
/// - matched-at timestamp set → Valid; unset falls through
/// - reviewed-on date set → Valid, otherwise Unknown
/// - nothing applies → Unknown
pub fn classify(record: &Record) -> Verdict {
    for cap in Capability::ALL {
        if let Some(verdict) = record.review_field(cap).and_then(apply_rule) {
            return verdict;
        }
    }
    Verdict::new(Status::Unknown)
}

/// One rule. `None` means the rule does not decide and the next one runs.
fn apply_rule(field: &ReviewField) -> Option<Verdict> {
    match field {
        ReviewField::Blocked { blocked: true, reason } => {
            Some(Verdict::with_reason(Status::Blocked, reason.clone()))
        }
        ReviewField::Blocked { blocked: false, .. } => None,
        ReviewField::Use { value, reason } | ReviewField::Accepted { value, reason } => {
            match value {
                Some(true) => Some(Verdict::new(Status::Valid)),
                Some(false) => Some(Verdict::with_reason(Status::Invalid, reason.clone())),
                None => None,
            }
        }
        ReviewField::NeedsReview(Some(false)) => Some(Verdict::new(Status::Valid)),
        ReviewField::NeedsReview(_) => Some(Verdict::new(Status::Unknown)),
        ReviewField::MatchedAt { set: true, .. } => Some(Verdict::new(Status::Valid)),
        ReviewField::MatchedAt { set: false, .. } => None,
        ReviewField::ReviewedOn { set: true, .. } => Some(Verdict::new(Status::Valid)),
        ReviewField::ReviewedOn { set: false, .. } => Some(Verdict::new(Status::Unknown)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::{EntityKind, FieldValue};

    fn rec(kind: EntityKind, pairs: &[(&str, FieldValue)]) -> Record {
        let fields: BTreeMap<String, FieldValue> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        Record::new(kind, 1, fields)
    }

    #[test]
    fn blocked_overrides_everything() {
        let r = rec(
            EntityKind::Event,
            &[
                ("blocked", true.into()),
                ("block_reason", "wrong city".into()),
                ("use", true.into()),
                ("reviewed_date", "2025-01-01".into()),
            ],
        );
        assert_eq!(
            classify(&r),
            Verdict::with_reason(Status::Blocked, Some("wrong city".into()))
        );
    }

    #[test]
    fn blocked_without_reason() {
        let r = rec(EntityKind::SplitActor, &[("blocked", true.into())]);
        assert_eq!(classify(&r), Verdict::new(Status::Blocked));
    }

    #[test]
    fn unblocked_flag_falls_through() {
        let r = rec(EntityKind::Event, &[("blocked", false.into()), ("use", true.into())]);
        assert_eq!(classify(&r).status, Status::Valid);
    }

    #[test]
    fn use_false_is_invalid_with_unuse_reason() {
        let r = rec(
            EntityKind::Location,
            &[("use", false.into()), ("unuse_reason", "not a place".into())],
        );
        assert_eq!(
            classify(&r),
            Verdict::with_reason(Status::Invalid, Some("not a place".into()))
        );
    }

    #[test]
    fn use_true_is_valid_without_reason() {
        let r = rec(
            EntityKind::Location,
            &[("use", true.into()), ("unuse_reason", "stale".into())],
        );
        assert_eq!(classify(&r), Verdict::new(Status::Valid));
    }

    #[test]
    fn accepted_decides_for_match_records() {
        let rejected = rec(
            EntityKind::SplitLocationMatch,
            &[("accepted", false.into()), ("accepted_reason", "too far".into())],
        );
        assert_eq!(
            classify(&rejected),
            Verdict::with_reason(Status::Invalid, Some("too far".into()))
        );

        let accepted = rec(
            EntityKind::SplitLocationMatch,
            &[("accepted", true.into()), ("accepted_reason", "exact".into())],
        );
        assert_eq!(classify(&accepted), Verdict::new(Status::Valid));
    }

    #[test]
    fn null_accepted_falls_to_matched_at() {
        let matched = rec(
            EntityKind::SplitActorMatch,
            &[("accepted", FieldValue::Null), ("matching_datetime", "2025-02-02 10:00:00".into())],
        );
        assert_eq!(classify(&matched).status, Status::Valid);

        let pending = rec(
            EntityKind::SplitActorMatch,
            &[("accepted", FieldValue::Null), ("matching_datetime", FieldValue::Null)],
        );
        assert_eq!(classify(&pending), Verdict::new(Status::Unknown));
    }

    #[test]
    fn needs_review_is_terminal() {
        let reviewed = rec(EntityKind::SplitLocation, &[("needs_review", false.into())]);
        assert_eq!(classify(&reviewed).status, Status::Valid);

        let pending = rec(EntityKind::SplitLocation, &[("needs_review", true.into())]);
        assert_eq!(classify(&pending).status, Status::Unknown);

        let unset = rec(EntityKind::SplitLocation, &[("needs_review", FieldValue::Null)]);
        assert_eq!(classify(&unset).status, Status::Unknown);
    }

    #[test]
    fn reviewed_on_fallback() {
        let done = rec(EntityKind::Actor, &[("use", FieldValue::Null), ("reviewed_date", "2024-05-06".into())]);
        assert_eq!(classify(&done), Verdict::new(Status::Valid));

        let open = rec(EntityKind::Actor, &[("reviewed_date", FieldValue::Null)]);
        assert_eq!(classify(&open), Verdict::new(Status::Unknown));
    }

    #[test]
    fn unparseable_set_timestamps_are_valid() {
        let text = rec(
            EntityKind::SplitLocationMatch,
            &[("accepted", FieldValue::Null), ("matching_datetime", "01/03/2025 12:00".into())],
        );
        assert_eq!(classify(&text), Verdict::new(Status::Valid));

        let julian = rec(
            EntityKind::SplitLocationMatch,
            &[("accepted", FieldValue::Null), ("matching_datetime", FieldValue::Real(2460000.5))],
        );
        assert_eq!(classify(&julian), Verdict::new(Status::Valid));

        let reviewed = rec(EntityKind::Actor, &[("reviewed_date", "03/01/2025".into())]);
        assert_eq!(classify(&reviewed), Verdict::new(Status::Valid));
    }

    #[test]
    fn use_false_wins_over_null_accepted() {
        let r = rec(
            EntityKind::EventMatch,
            &[
                ("use", false.into()),
                ("unuse_reason", "dup".into()),
                ("accepted", FieldValue::Null),
            ],
        );
        assert_eq!(classify(&r), Verdict::with_reason(Status::Invalid, Some("dup".into())));
    }

    #[test]
    fn any_present_review_column_applies() {
        let alias = rec(EntityKind::ActorAlias, &[("needs_review", false.into())]);
        assert_eq!(classify(&alias).status, Status::Valid);

        let event = rec(
            EntityKind::Event,
            &[("accepted", false.into()), ("accepted_reason", "wrong meeting".into())],
        );
        assert_eq!(
            classify(&event),
            Verdict::with_reason(Status::Invalid, Some("wrong meeting".into()))
        );
    }

    #[test]
    fn source_records_are_never_reviewed() {
        let r = rec(EntityKind::Article, &[("use", true.into())]);
        assert_eq!(classify(&r), Verdict::new(Status::Unknown));
    }

    #[test]
    fn no_review_fields_is_unknown() {
        let r = rec(EntityKind::Article, &[("title", "x".into())]);
        assert_eq!(classify(&r), Verdict::new(Status::Unknown));
    }
}
