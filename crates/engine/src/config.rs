use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ReviewError;
use crate::model::{EntityKind, Family};
use crate::source::CollectionFilter;

pub const DEFAULT_PAGE_SIZE: usize = 200;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Abort when a configured family's table is missing instead of skipping it.
    #[serde(default)]
    pub require_tables: bool,
    /// Families to generate, in output order.
    #[serde(default = "default_families")]
    pub families: Vec<FamilyConfig>,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE, require_tables: false, families: default_families() }
    }
}

// ---------------------------------------------------------------------------
// Family
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilyConfig {
    pub kind: EntityKind,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Column shown first in list entries.
    #[serde(default = "default_primary_field")]
    pub primary_field: String,
    #[serde(default)]
    pub secondary_field: Option<String>,
    /// Overrides the match grouping column. Match families only.
    #[serde(default)]
    pub group_by: Option<String>,
    /// Only records referenced by this kind/column are listed.
    #[serde(default)]
    pub only_referenced_by: Option<CollectionFilter>,
}

fn default_primary_field() -> String {
    "id".into()
}

impl FamilyConfig {
    pub fn new(kind: EntityKind, display_name: &str, primary: &str, secondary: Option<&str>) -> Self {
        Self {
            kind,
            display_name: Some(display_name.to_string()),
            primary_field: primary.to_string(),
            secondary_field: secondary.map(str::to_string),
            group_by: None,
            only_referenced_by: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or_else(|| self.kind.table())
    }

    /// Column grouping competing match candidates, for match families.
    pub fn group_key(&self) -> Option<&str> {
        self.group_by.as_deref().or_else(|| self.kind.default_group_key())
    }
}

fn default_families() -> Vec<FamilyConfig> {
    use EntityKind::*;

    let mut auth_location = FamilyConfig::new(
        AuthoritativeLocation,
        "Authoritative Locations",
        "name",
        Some("county"),
    );
    // The gazetteer is far larger than the set anything was matched against.
    auth_location.only_referenced_by = Some(CollectionFilter {
        kind: SplitLocationMatch,
        field: "authoritative_location_id".into(),
    });

    vec![
        FamilyConfig::new(Event, "Events", "excerpt", None),
        FamilyConfig::new(Location, "Locations", "name", Some("country")),
        FamilyConfig::new(SplitLocation, "Split Locations", "name", Some("country")),
        FamilyConfig::new(Actor, "Actors", "name", Some("description")),
        FamilyConfig::new(SplitActor, "Split Actors", "name", Some("actor_type")),
        FamilyConfig::new(TimeStamp, "Timestamps", "when", None),
        FamilyConfig::new(MeetingType, "Meeting Types", "name", Some("category")),
        FamilyConfig::new(AuthoritativeEvent, "Authoritative Events", "canonical_name", Some("category")),
        FamilyConfig::new(EventMatch, "Event Matches", "composite_score", Some("algorithm")),
        auth_location,
        FamilyConfig::new(SplitLocationMatch, "Split Location Matches", "confidence_score", Some("algorithm")),
        FamilyConfig::new(AuthoritativeActor, "Authoritative Actors", "name", Some("actor_type")),
        FamilyConfig::new(ActorAlias, "Actor Aliases", "alias", Some("alias_normalized")),
        FamilyConfig::new(SplitActorMatch, "Split Actor Matches", "confidence_score", Some("algorithm")),
        FamilyConfig::new(AuthoritativeMeetingType, "Authoritative Meeting Types", "name", Some("category")),
        FamilyConfig::new(MeetingTypeMatch, "Meeting Type Matches", "confidence_score", Some("algorithm")),
        FamilyConfig::new(AuthoritativeEventActor, "Authoritative Event Actors", "role", Some("source_event_count")),
    ]
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReviewConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReviewError> {
        let config: ReviewConfig =
            toml::from_str(input).map_err(|e| ReviewError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ReviewError> {
        toml::to_string_pretty(self).map_err(|e| ReviewError::ConfigParse(e.to_string()))
    }

    pub fn family(&self, kind: EntityKind) -> Option<&FamilyConfig> {
        self.families.iter().find(|f| f.kind == kind)
    }

    pub fn validate(&self) -> Result<(), ReviewError> {
        if self.page_size == 0 {
            return Err(ReviewError::ConfigValidation("page_size must be at least 1".into()));
        }

        if self.families.is_empty() {
            return Err(ReviewError::ConfigValidation(
                "at least one family is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for family in &self.families {
            let kind = family.kind;
            if !seen.insert(kind) {
                return Err(ReviewError::ConfigValidation(format!(
                    "family '{kind}' is listed more than once"
                )));
            }

            if let Some(ref column) = family.group_by {
                if kind.family() != Family::Match {
                    return Err(ReviewError::ConfigValidation(format!(
                        "family '{kind}': group_by is only valid on match families"
                    )));
                }
                if !kind.has_foreign_key(column) {
                    return Err(ReviewError::ConfigValidation(format!(
                        "family '{kind}': group_by '{column}' is not a foreign key"
                    )));
                }
            }

            if let Some(ref filter) = family.only_referenced_by {
                let points_here = filter
                    .kind
                    .foreign_keys()
                    .iter()
                    .any(|(field, target)| *field == filter.field && *target == kind);
                if !points_here {
                    return Err(ReviewError::ConfigValidation(format!(
                        "family '{kind}': '{}.{}' does not reference {kind}",
                        filter.kind, filter.field
                    )));
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
