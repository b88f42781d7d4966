//! Declarative relation graph: for each entity kind, the related records a
//! reviewer needs to see, and how to fetch them from foreign keys.

use crate::model::EntityKind;
use crate::model::EntityKind::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Point lookup: `field` is a foreign key on the record being resolved.
    Lookup,
    /// Filtered scan: `field` is a foreign key on `target` pointing back at the record.
    Scan,
}

#[derive(Debug)]
pub struct Relation {
    /// Key in the resolved context.
    pub name: &'static str,
    pub kind: RelationKind,
    pub field: &'static str,
    pub target: EntityKind,
    /// Relations resolved on each related record in turn.
    pub attach: &'static [Relation],
}

impl Relation {
    const fn with(self, attach: &'static [Relation]) -> Self {
        Self { attach, ..self }
    }
}

const fn lookup(name: &'static str, field: &'static str, target: EntityKind) -> Relation {
    Relation { name, kind: RelationKind::Lookup, field, target, attach: &[] }
}

const fn scan(name: &'static str, field: &'static str, target: EntityKind) -> Relation {
    Relation { name, kind: RelationKind::Scan, field, target, attach: &[] }
}

// ---------------------------------------------------------------------------
// Attachments (second-level relations)
// ---------------------------------------------------------------------------

const EVENT_DETAIL: &[Relation] = &[
    lookup("article", "article_id", Article),
    lookup("location", "location_id", Location),
    lookup("timestamp", "date_id", TimeStamp),
    lookup("meetingtype", "type_id", MeetingType),
    scan("actors", "event_id", Actor),
];

const SOURCE_EVENT: &[Relation] = &[lookup("event", "event_id", Event).with(EVENT_DETAIL)];

const WITH_AUTH_LOCATION: &[Relation] =
    &[lookup("authoritative_location", "authoritative_location_id", AuthoritativeLocation)];

const WITH_AUTH_ACTOR: &[Relation] =
    &[lookup("authoritative_actor", "authoritative_actor_id", AuthoritativeActor)];

const WITH_AUTH_MEETINGTYPE: &[Relation] = &[lookup(
    "authoritative_meetingtype",
    "authoritative_meetingtype_id",
    AuthoritativeMeetingType,
)];

const WITH_SPLIT_LOCATION: &[Relation] =
    &[lookup("split_location", "split_location_id", SplitLocation)];

const WITH_SPLIT_ACTOR: &[Relation] = &[lookup("split_actor", "split_actor_id", SplitActor)];

const WITH_MEETINGTYPE: &[Relation] = &[lookup("meetingtype", "meetingtype_id", MeetingType)];

// ---------------------------------------------------------------------------
// Per-kind tables
// ---------------------------------------------------------------------------

const EVENT: &[Relation] = &[
    lookup("article", "article_id", Article),
    lookup("location", "location_id", Location),
    lookup("timestamp", "date_id", TimeStamp),
    lookup("meetingtype", "type_id", MeetingType),
    scan("actors", "event_id", Actor),
    scan("event_matches", "event_id", EventMatch),
];

const LOCATION: &[Relation] = &[
    scan("split_locations", "location_id", SplitLocation),
    scan("events", "location_id", Event),
];

const SPLIT_LOCATION: &[Relation] = &[
    lookup("parent_location", "location_id", Location),
    scan("matches", "split_location_id", SplitLocationMatch).with(WITH_AUTH_LOCATION),
];

const ACTOR: &[Relation] = &[
    scan("split_actors", "actor_id", SplitActor),
    lookup("event", "event_id", Event),
];

const SPLIT_ACTOR: &[Relation] = &[
    lookup("parent_actor", "actor_id", Actor),
    scan("matches", "split_actor_id", SplitActorMatch).with(WITH_AUTH_ACTOR),
];

const TIMESTAMP: &[Relation] = &[scan("events", "date_id", Event)];

const MEETING_TYPE: &[Relation] = &[
    scan("events", "type_id", Event),
    scan("matches", "meetingtype_id", MeetingTypeMatch).with(WITH_AUTH_MEETINGTYPE),
];

const AUTHORITATIVE_EVENT: &[Relation] = &[
    lookup("auth_location", "authoritative_location_id", AuthoritativeLocation),
    scan("source_events", "authoritative_event_id", EventMatch).with(SOURCE_EVENT),
    scan("auth_actors", "authoritative_event_id", AuthoritativeEventActor).with(WITH_AUTH_ACTOR),
];

const EVENT_MATCH: &[Relation] = &[
    lookup("event", "event_id", Event),
    lookup("auth_event", "authoritative_event_id", AuthoritativeEvent),
];

const AUTHORITATIVE_LOCATION: &[Relation] = &[scan(
    "matches",
    "authoritative_location_id",
    SplitLocationMatch,
)
.with(WITH_SPLIT_LOCATION)];

const SPLIT_LOCATION_MATCH: &[Relation] = &[
    lookup("split_location", "split_location_id", SplitLocation),
    lookup("auth_location", "authoritative_location_id", AuthoritativeLocation),
];

const AUTHORITATIVE_ACTOR: &[Relation] = &[
    scan("aliases", "authoritative_actor_id", ActorAlias),
    scan("matches", "authoritative_actor_id", SplitActorMatch).with(WITH_SPLIT_ACTOR),
];

const ACTOR_ALIAS: &[Relation] = &[lookup("auth_actor", "authoritative_actor_id", AuthoritativeActor)];

const SPLIT_ACTOR_MATCH: &[Relation] = &[
    lookup("split_actor", "split_actor_id", SplitActor),
    lookup("auth_actor", "authoritative_actor_id", AuthoritativeActor),
];

const AUTHORITATIVE_MEETING_TYPE: &[Relation] = &[scan(
    "matches",
    "authoritative_meetingtype_id",
    MeetingTypeMatch,
)
.with(WITH_MEETINGTYPE)];

const MEETING_TYPE_MATCH: &[Relation] = &[
    lookup("meetingtype", "meetingtype_id", MeetingType),
    lookup("auth_meetingtype", "authoritative_meetingtype_id", AuthoritativeMeetingType),
];

const AUTHORITATIVE_EVENT_ACTOR: &[Relation] = &[
    lookup("auth_event", "authoritative_event_id", AuthoritativeEvent),
    lookup("auth_actor", "authoritative_actor_id", AuthoritativeActor),
];

/// Relations shown alongside a record of `kind`, in display order.
pub fn relations_for(kind: EntityKind) -> &'static [Relation] {
    match kind {
        Article => &[],
        Event => EVENT,
        Location => LOCATION,
        Actor => ACTOR,
        TimeStamp => TIMESTAMP,
        MeetingType => MEETING_TYPE,
        SplitLocation => SPLIT_LOCATION,
        SplitActor => SPLIT_ACTOR,
        SplitLocationMatch => SPLIT_LOCATION_MATCH,
        SplitActorMatch => SPLIT_ACTOR_MATCH,
        MeetingTypeMatch => MEETING_TYPE_MATCH,
        EventMatch => EVENT_MATCH,
        AuthoritativeLocation => AUTHORITATIVE_LOCATION,
        AuthoritativeActor => AUTHORITATIVE_ACTOR,
        AuthoritativeMeetingType => AUTHORITATIVE_MEETING_TYPE,
        AuthoritativeEvent => AUTHORITATIVE_EVENT,
        ActorAlias => ACTOR_ALIAS,
        AuthoritativeEventActor => AUTHORITATIVE_EVENT_ACTOR,
    }
}
