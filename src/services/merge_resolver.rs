//! Last-write-wins merge of two favorites snapshots.
//!
//! Pure and total: inputs are borrowed, the result is a fresh collection.
//! Resolution is per record, so `pinned` travels with whichever side wins.
//! Absence is not deletion: a record missing on one side is kept.

use std::collections::BTreeMap;

use crate::types::favorite::FavoriteItem;

/// Result of a merge plus how each id was decided.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Merged collection ordered by id.
    pub items: Vec<FavoriteItem>,
    pub local_only: usize,
    pub remote_only: usize,
    /// Ids on both sides where the local record was kept over a different
    /// remote one (newer, or tied with other content).
    pub local_wins: usize,
    /// Ids whose records are equal on both sides.
    pub identical: usize,
    /// Ids on both sides where the remote record was newer.
    pub remote_wins: usize,
}

impl MergeOutcome {
    /// True when the merged collection differs from what the remote holds.
    pub fn remote_is_stale(&self) -> bool {
        self.local_only > 0 || self.local_wins > 0
    }
}

/// Merges `local` and `remote`; on equal `last_used_at` the local record wins.
///
/// Duplicate ids inside one input collapse to the newest record of that side.
pub fn merge_favorites(local: &[FavoriteItem], remote: &[FavoriteItem]) -> MergeOutcome {
    let local = index_newest(local);
    let remote = index_newest(remote);

    let mut outcome = MergeOutcome::default();
    let mut merged: BTreeMap<&str, &FavoriteItem> = BTreeMap::new();

    for (id, local_item) in &local {
        match remote.get(id) {
            None => {
                outcome.local_only += 1;
                merged.insert(*id, *local_item);
            }
            Some(remote_item) if remote_item.last_used_at > local_item.last_used_at => {
                outcome.remote_wins += 1;
                merged.insert(*id, *remote_item);
            }
            Some(remote_item) => {
                if remote_item == local_item {
                    outcome.identical += 1;
                } else {
                    outcome.local_wins += 1;
                }
                merged.insert(*id, *local_item);
            }
        }
    }

    for (id, remote_item) in &remote {
        if !local.contains_key(id) {
            outcome.remote_only += 1;
            merged.insert(*id, *remote_item);
        }
    }

    outcome.items = merged.into_values().cloned().collect();
    outcome
}

fn index_newest(items: &[FavoriteItem]) -> BTreeMap<&str, &FavoriteItem> {
    let mut index: BTreeMap<&str, &FavoriteItem> = BTreeMap::new();
    for item in items {
        index
            .entry(item.id.as_str())
            .and_modify(|current| {
                if item.last_used_at > current.last_used_at {
                    *current = item;
                }
            })
            .or_insert(item);
    }
    index
}
