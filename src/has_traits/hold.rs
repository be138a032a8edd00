//! Bookkeeping for `hold_trait_notifications` regions.

use indexmap::IndexMap;

use crate::value::Value;

use super::events::{Change, EventType};

/// What an object does with notifications while a hold region is open.
pub(super) enum Hold {
    /// Queue them, compressed per name.
    Collecting(Pending),
    /// Drop them; the region is rolling back.
    Discarding,
}

#[derive(Default)]
struct Entry {
    /// Value before the region touched the name: `None` until recorded,
    /// `Some(None)` when the name had no stored value.
    prior: Option<Option<Value>>,
    changes: Vec<Change>,
}

/// Notifications and prior values gathered during a hold region, in the
/// order names were first touched.
#[derive(Default)]
pub(super) struct Pending {
    entries: IndexMap<String, Entry>,
}

impl Pending {
    /// Records the value `name` held before its first assignment.
    pub(super) fn record_prior(&mut self, name: &str, prior: Option<Value>) {
        let entry = self.entries.entry(name.to_owned()).or_default();
        if entry.prior.is_none() {
            entry.prior = Some(prior);
        }
    }

    /// Queues a change, folding it into the previous one where possible.
    pub(super) fn push(&mut self, change: Change) {
        let changes = &mut self.entries.entry(change.name.clone()).or_default().changes;
        if let Some(last) = changes.last_mut() {
            match (&last.event_type, &change.event_type) {
                (EventType::Change, EventType::Change) => {
                    last.new = change.new;
                    return;
                }
                (EventType::Mutation, EventType::Mutation) => {
                    last.events.extend(change.events);
                    last.new = change.new;
                    return;
                }
                _ => {}
            }
        }
        changes.push(change);
    }

    /// Names with at least one queued change, in first-touch order. Names
    /// only re-set to an equal value are left out.
    pub(super) fn changed_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.changes.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Names with a recorded prior value, and that value.
    pub(super) fn priors(&self) -> Vec<(String, Option<Value>)> {
        self.entries
            .iter()
            .filter_map(|(name, entry)| entry.prior.clone().map(|prior| (name.clone(), prior)))
            .collect()
    }

    /// Every queued change, grouped by name in first-touch order.
    pub(super) fn into_changes(self) -> Vec<Change> {
        self.entries
            .into_values()
            .flat_map(|entry| entry.changes)
            .collect()
    }
}
