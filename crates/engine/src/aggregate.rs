use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::Status;

/// Per-family status counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusTally {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub blocked: usize,
    pub unknown: usize,
}

impl StatusTally {
    pub fn add(&mut self, status: Status) {
        self.total += 1;
        match status {
            Status::Valid => self.valid += 1,
            Status::Invalid => self.invalid += 1,
            Status::Blocked => self.blocked += 1,
            Status::Unknown => self.unknown += 1,
        }
    }

    pub fn count(&self, status: Status) -> usize {
        match status {
            Status::Valid => self.valid,
            Status::Invalid => self.invalid,
            Status::Blocked => self.blocked,
            Status::Unknown => self.unknown,
        }
    }
}

impl FromIterator<Status> for StatusTally {
    fn from_iter<I: IntoIterator<Item = Status>>(iter: I) -> Self {
        let mut tally = Self::default();
        for status in iter {
            tally.add(status);
        }
        tally
    }
}

/// Competing match candidates for one source record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchGroup<K> {
    pub key: K,
    pub status: Status,
    pub member_ids: Vec<i64>,
}

/// Roll member statuses up into one group status.
///
/// One accepted candidate decides the group; otherwise unanimous rejection
/// makes it invalid, then any block makes it blocked. An empty list is unknown.
pub fn group_status(members: &[Status]) -> Status {
    if members.is_empty() {
        Status::Unknown
    } else if members.contains(&Status::Valid) {
        Status::Valid
    } else if members.iter().all(|s| *s == Status::Invalid) {
        Status::Invalid
    } else if members.contains(&Status::Blocked) {
        Status::Blocked
    } else {
        Status::Unknown
    }
}

/// Partition `(key, id, status)` triples by key and assign each group a status.
/// Groups come back in key order; member ids keep input order.
pub fn group_matches<K, I>(members: I) -> Vec<MatchGroup<K>>
where
    K: Ord,
    I: IntoIterator<Item = (K, i64, Status)>,
{
    let mut groups: BTreeMap<K, (Vec<i64>, Vec<Status>)> = BTreeMap::new();
    for (key, id, status) in members {
        let entry = groups.entry(key).or_default();
        entry.0.push(id);
        entry.1.push(status);
    }

    groups
        .into_iter()
        .map(|(key, (member_ids, statuses))| MatchGroup {
            key,
            status: group_status(&statuses),
            member_ids,
        })
        .collect()
}

/// Tally groups rather than rows: five candidates for one split record add
/// one to `total`.
pub fn aggregate<K>(groups: &[MatchGroup<K>]) -> StatusTally {
    groups.iter().map(|g| g.status).collect()
}
