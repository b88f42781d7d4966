use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Entity families
// ---------------------------------------------------------------------------

/// Pipeline stage an entity kind belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Source,
    Primary,
    Split,
    Match,
    Authoritative,
    CrossReference,
}

/// Every entity kind in the linkage graph. The lowercase name doubles as the
/// storage table name and the output path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Article,
    Event,
    Location,
    Actor,
    TimeStamp,
    MeetingType,
    SplitLocation,
    SplitActor,
    SplitLocationMatch,
    SplitActorMatch,
    MeetingTypeMatch,
    EventMatch,
    AuthoritativeLocation,
    AuthoritativeActor,
    AuthoritativeMeetingType,
    AuthoritativeEvent,
    ActorAlias,
    AuthoritativeEventActor,
}

impl EntityKind {
    pub const ALL: [EntityKind; 18] = [
        Self::Article,
        Self::Event,
        Self::Location,
        Self::Actor,
        Self::TimeStamp,
        Self::MeetingType,
        Self::SplitLocation,
        Self::SplitActor,
        Self::SplitLocationMatch,
        Self::SplitActorMatch,
        Self::MeetingTypeMatch,
        Self::EventMatch,
        Self::AuthoritativeLocation,
        Self::AuthoritativeActor,
        Self::AuthoritativeMeetingType,
        Self::AuthoritativeEvent,
        Self::ActorAlias,
        Self::AuthoritativeEventActor,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Event => "event",
            Self::Location => "location",
            Self::Actor => "actor",
            Self::TimeStamp => "timestamp",
            Self::MeetingType => "meetingtype",
            Self::SplitLocation => "splitlocation",
            Self::SplitActor => "splitactor",
            Self::SplitLocationMatch => "splitlocationmatch",
            Self::SplitActorMatch => "splitactormatch",
            Self::MeetingTypeMatch => "meetingtypematch",
            Self::EventMatch => "eventmatch",
            Self::AuthoritativeLocation => "authoritativelocation",
            Self::AuthoritativeActor => "authoritativeactor",
            Self::AuthoritativeMeetingType => "authoritativemeetingtype",
            Self::AuthoritativeEvent => "authoritativeevent",
            Self::ActorAlias => "actoralias",
            Self::AuthoritativeEventActor => "authoritativeeventactor",
        }
    }

    pub fn family(&self) -> Family {
        match self {
            Self::Article => Family::Source,
            Self::Event | Self::Location | Self::Actor | Self::TimeStamp | Self::MeetingType => {
                Family::Primary
            }
            Self::SplitLocation | Self::SplitActor => Family::Split,
            Self::SplitLocationMatch
            | Self::SplitActorMatch
            | Self::MeetingTypeMatch
            | Self::EventMatch => Family::Match,
            Self::AuthoritativeLocation
            | Self::AuthoritativeActor
            | Self::AuthoritativeMeetingType
            | Self::AuthoritativeEvent => Family::Authoritative,
            Self::ActorAlias | Self::AuthoritativeEventActor => Family::CrossReference,
        }
    }

    /// Review vocabulary this kind declares. Every reviewable kind declares
    /// the full rule set; a record only exposes the subset whose columns
    /// exist in the dataset, since generations differ in which they carry.
    pub fn declared_capabilities(&self) -> &'static [Capability] {
        match self.family() {
            Family::Source => &[],
            _ => &Capability::ALL,
        }
    }

    /// Foreign-key columns on this kind and the kind each one references.
    pub fn foreign_keys(&self) -> &'static [(&'static str, EntityKind)] {
        match self {
            Self::Event => &[
                ("article_id", Self::Article),
                ("location_id", Self::Location),
                ("date_id", Self::TimeStamp),
                ("type_id", Self::MeetingType),
            ],
            Self::Actor => &[("event_id", Self::Event)],
            Self::SplitLocation => &[("location_id", Self::Location)],
            Self::SplitActor => &[("actor_id", Self::Actor)],
            Self::SplitLocationMatch => &[
                ("split_location_id", Self::SplitLocation),
                ("authoritative_location_id", Self::AuthoritativeLocation),
            ],
            Self::SplitActorMatch => &[
                ("split_actor_id", Self::SplitActor),
                ("authoritative_actor_id", Self::AuthoritativeActor),
            ],
            Self::MeetingTypeMatch => &[
                ("meetingtype_id", Self::MeetingType),
                ("authoritative_meetingtype_id", Self::AuthoritativeMeetingType),
            ],
            Self::EventMatch => &[
                ("event_id", Self::Event),
                ("authoritative_event_id", Self::AuthoritativeEvent),
            ],
            Self::AuthoritativeEvent => &[("authoritative_location_id", Self::AuthoritativeLocation)],
            Self::ActorAlias => &[("authoritative_actor_id", Self::AuthoritativeActor)],
            Self::AuthoritativeEventActor => &[
                ("authoritative_event_id", Self::AuthoritativeEvent),
                ("authoritative_actor_id", Self::AuthoritativeActor),
            ],
            Self::Article
            | Self::Location
            | Self::TimeStamp
            | Self::MeetingType
            | Self::AuthoritativeLocation
            | Self::AuthoritativeActor
            | Self::AuthoritativeMeetingType => &[],
        }
    }

    pub fn has_foreign_key(&self, field: &str) -> bool {
        self.foreign_keys().iter().any(|(f, _)| *f == field)
    }

    /// Column that ties competing match candidates to the record they compete for.
    pub fn default_group_key(&self) -> Option<&'static str> {
        match self {
            Self::SplitLocationMatch => Some("split_location_id"),
            Self::SplitActorMatch => Some("split_actor_id"),
            Self::MeetingTypeMatch => Some("meetingtype_id"),
            Self::EventMatch => Some("event_id"),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.table() == wanted)
            .ok_or_else(|| format!("unknown entity kind: '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

/// A single column value as read from storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// SQLite stores booleans as 0/1; text spellings are accepted too.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Integer(v) => Some(*v != 0),
            Self::Real(v) => Some(*v != 0.0),
            Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "t" | "yes" => Some(true),
                "0" | "false" | "f" | "no" => Some(false),
                _ => None,
            },
            Self::Null | Self::Blob(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null | Self::Blob(_) => None,
            Self::Integer(v) => Some(v.to_string()),
            Self::Real(v) => Some(v.to_string()),
            Self::Text(s) => Some(s.clone()),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Integer(v as i64)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

// ---------------------------------------------------------------------------
// Review vocabulary
// ---------------------------------------------------------------------------

/// Review fields a record can expose, in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Blocked,
    Use,
    Accepted,
    NeedsReview,
    MatchedAt,
    ReviewedOn,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Self::Blocked,
        Self::Use,
        Self::Accepted,
        Self::NeedsReview,
        Self::MatchedAt,
        Self::ReviewedOn,
    ];

    /// Column whose presence in the table marks the capability.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Blocked => "blocked",
            Self::Use => "use",
            Self::Accepted => "accepted",
            Self::NeedsReview => "needs_review",
            Self::MatchedAt => "matching_datetime",
            Self::ReviewedOn => "reviewed_date",
        }
    }

    /// Free-text column carrying the reason, where the capability has one.
    pub fn reason_column(&self) -> Option<&'static str> {
        match self {
            Self::Blocked => Some("block_reason"),
            Self::Use => Some("unuse_reason"),
            Self::Accepted => Some("accepted_reason"),
            Self::NeedsReview | Self::MatchedAt | Self::ReviewedOn => None,
        }
    }
}

/// A review field a record actually exposes, with its value.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewField {
    Blocked { blocked: bool, reason: Option<String> },
    Use { value: Option<bool>, reason: Option<String> },
    Accepted { value: Option<bool>, reason: Option<String> },
    NeedsReview(Option<bool>),
    /// `set` is whether the column is non-null; `at` is its parsed value.
    MatchedAt { set: bool, at: Option<NaiveDateTime> },
    ReviewedOn { set: bool, on: Option<NaiveDate> },
}

impl ReviewField {
    pub fn capability(&self) -> Capability {
        match self {
            Self::Blocked { .. } => Capability::Blocked,
            Self::Use { .. } => Capability::Use,
            Self::Accepted { .. } => Capability::Accepted,
            Self::NeedsReview(_) => Capability::NeedsReview,
            Self::MatchedAt { .. } => Capability::MatchedAt,
            Self::ReviewedOn { .. } => Capability::ReviewedOn,
        }
    }

    /// Read a capability's field from a row. `None` when the row has no such
    /// column, which means the rule does not apply to this record.
    pub fn extract(cap: Capability, fields: &BTreeMap<String, FieldValue>) -> Option<Self> {
        let value = fields.get(cap.column())?;
        let reason = || {
            cap.reason_column()
                .and_then(|c| fields.get(c))
                .and_then(FieldValue::as_text)
        };
        Some(match cap {
            Capability::Blocked => Self::Blocked {
                blocked: value.as_bool().unwrap_or(false),
                reason: reason(),
            },
            Capability::Use => Self::Use { value: value.as_bool(), reason: reason() },
            Capability::Accepted => Self::Accepted { value: value.as_bool(), reason: reason() },
            Capability::NeedsReview => Self::NeedsReview(value.as_bool()),
            Capability::MatchedAt => Self::MatchedAt {
                set: !value.is_null(),
                at: parse_datetime(value),
            },
            Capability::ReviewedOn => Self::ReviewedOn {
                set: !value.is_null(),
                on: parse_date(value),
            },
        })
    }
}

fn parse_datetime(value: &FieldValue) -> Option<NaiveDateTime> {
    let parsed = datetime_of(value);
    if parsed.is_none() && !value.is_null() {
        log::warn!("unparseable matching_datetime value {value:?}, kept as set");
    }
    parsed
}

fn datetime_of(value: &FieldValue) -> Option<NaiveDateTime> {
    match value {
        FieldValue::Null => None,
        FieldValue::Integer(secs) => {
            DateTime::<Utc>::from_timestamp(*secs, 0).map(|dt| dt.naive_utc())
        }
        FieldValue::Text(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.naive_utc())
                .ok()
                .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").ok())
                .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok())
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
        }
        FieldValue::Real(_) | FieldValue::Blob(_) => None,
    }
}

fn parse_date(value: &FieldValue) -> Option<NaiveDate> {
    let parsed = match value {
        FieldValue::Null => return None,
        FieldValue::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .ok()
            .or_else(|| datetime_of(value).map(|dt| dt.date())),
        other => datetime_of(other).map(|dt| dt.date()),
    };
    if parsed.is_none() {
        log::warn!("unparseable reviewed_date value {value:?}, kept as set");
    }
    parsed
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One row of one entity kind. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub kind: EntityKind,
    pub id: i64,
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(skip)]
    pub review: Vec<ReviewField>,
}

impl Record {
    /// Build a record, deriving its review fields from the kind's declared
    /// capabilities and the columns present in `fields`.
    pub fn new(kind: EntityKind, id: i64, fields: BTreeMap<String, FieldValue>) -> Self {
        let review = kind
            .declared_capabilities()
            .iter()
            .filter_map(|cap| ReviewField::extract(*cap, &fields))
            .collect();
        Self { kind, id, fields, review }
    }

    /// Build from a full row; the id comes from the `id` column.
    pub fn from_row(kind: EntityKind, fields: BTreeMap<String, FieldValue>) -> Option<Self> {
        let id = fields.get("id").and_then(FieldValue::as_i64)?;
        Some(Self::new(kind, id, fields))
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Value of a foreign-key column, `None` when unset or absent.
    pub fn foreign_key(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(FieldValue::as_i64)
    }

    pub fn review_field(&self, cap: Capability) -> Option<&ReviewField> {
        self.review.iter().find(|f| f.capability() == cap)
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Valid,
    Invalid,
    Blocked,
    Unknown,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Invalid => write!(f, "invalid"),
            Self::Blocked => write!(f, "blocked"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classifier output: status plus the reason that justified it, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub status: Status,
    pub reason: Option<String>,
}

impl Verdict {
    pub fn new(status: Status) -> Self {
        Self { status, reason: None }
    }

    pub fn with_reason(status: Status, reason: Option<String>) -> Self {
        Self { status, reason }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
