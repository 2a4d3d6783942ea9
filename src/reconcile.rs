//! Reconciliation: merge an authoritative snapshot into the local item list.
//!
//! Position and size are always trusted from local state, because debounced
//! geometry writes may still be pending or in flight when a refresh lands;
//! taking the server's values would snap an item back mid-drag. Everything
//! else comes from the snapshot, except for protected items (pending writes
//! or an open editor), which also keep their local text fields.

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod reconcile_test;

use std::collections::{HashMap, HashSet};

use crate::item::{Item, ItemId};

/// Result of one merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciled {
    /// The new local list, in snapshot order.
    pub items: Vec<Item>,
    /// Ids present in the snapshot but not locally.
    pub added: Vec<ItemId>,
    /// Ids present locally but not in the snapshot.
    pub removed: Vec<ItemId>,
}

/// Merge `incoming` into `local`.
///
/// - Known ids keep local `position`; `size` stays local unless the local
///   item has none.
/// - Ids in `protected` also keep local `content` and `time_label`.
/// - Unknown ids are adopted verbatim.
/// - Local ids missing from `incoming` are dropped.
#[must_use]
pub fn reconcile(local: &[Item], incoming: Vec<Item>, protected: &HashSet<ItemId>) -> Reconciled {
    let by_id: HashMap<ItemId, &Item> = local.iter().map(|item| (item.id, item)).collect();
    let incoming_ids: HashSet<ItemId> = incoming.iter().map(|item| item.id).collect();

    let mut added = Vec::new();
    let items = incoming
        .into_iter()
        .map(|mut fresh| {
            let Some(current) = by_id.get(&fresh.id) else {
                added.push(fresh.id);
                return fresh;
            };
            fresh.position = current.position;
            fresh.size = current.size.or(fresh.size);
            if protected.contains(&fresh.id) {
                fresh.content.clone_from(&current.content);
                fresh.time_label.clone_from(&current.time_label);
            }
            fresh
        })
        .collect();

    let removed = local
        .iter()
        .map(|item| item.id)
        .filter(|id| !incoming_ids.contains(id))
        .collect();

    Reconciled { items, added, removed }
}
