//! Unit tests for the last-write-wins merge of favorites snapshots.

use astrolab::services::merge_resolver::merge_favorites;
use astrolab::types::favorite::{FavoriteCandidate, FavoriteItem, FavoriteKind};

fn sign(title: &str, last_used_at: i64) -> FavoriteItem {
    let route = format!("/glossary/signs/{}", title.to_lowercase());
    let mut item = FavoriteCandidate::new(FavoriteKind::GlossarySign, title, &route).into_item(0);
    item.last_used_at = last_used_at;
    item
}

fn pinned(mut item: FavoriteItem) -> FavoriteItem {
    item.pinned = true;
    item
}

#[test]
fn test_empty_inputs() {
    let outcome = merge_favorites(&[], &[]);
    assert!(outcome.items.is_empty());
    assert!(!outcome.remote_is_stale());
}

#[test]
fn test_one_sided_records_are_kept() {
    let outcome = merge_favorites(&[sign("Aries", 10)], &[sign("Leo", 20)]);
    let ids: Vec<&str> = outcome.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["glossary-sign:aries", "glossary-sign:leo"]);
    assert_eq!(outcome.local_only, 1);
    assert_eq!(outcome.remote_only, 1);
    assert!(outcome.remote_is_stale());
}

#[test]
fn test_newer_remote_wins() {
    let local = pinned(sign("Aries", 10));
    let remote = sign("Aries", 30);
    let outcome = merge_favorites(&[local], &[remote.clone()]);
    assert_eq!(outcome.items, vec![remote]);
    assert_eq!(outcome.remote_wins, 1);
    assert!(!outcome.remote_is_stale());
}

#[test]
fn test_newer_local_wins() {
    let local = pinned(sign("Aries", 50));
    let outcome = merge_favorites(&[local.clone()], &[sign("Aries", 30)]);
    assert_eq!(outcome.items, vec![local]);
    assert_eq!(outcome.local_wins, 1);
}

#[test]
fn test_tie_keeps_local() {
    let mut local = sign("Aries", 30);
    local.icon = "local".to_string();
    let mut remote = sign("Aries", 30);
    remote.icon = "remote".to_string();

    let outcome = merge_favorites(&[local], &[remote]);
    assert_eq!(outcome.items[0].icon, "local");
    assert_eq!(outcome.local_wins, 1);
    assert!(outcome.remote_is_stale());
}

#[test]
fn test_identical_records_leave_remote_current() {
    let both = pinned(sign("Aries", 30));
    let outcome = merge_favorites(&[both.clone(), sign("Leo", 5)], &[both, sign("Leo", 9)]);
    assert_eq!(outcome.identical, 1);
    assert_eq!(outcome.remote_wins, 1);
    assert_eq!(outcome.local_wins, 0);
    assert!(!outcome.remote_is_stale());
}

#[test]
fn test_local_only_pinned_is_never_dropped() {
    let local = vec![pinned(sign("Aries", 1)), sign("Leo", 5)];
    let remote = vec![sign("Leo", 9), sign("Virgo", 3)];
    let outcome = merge_favorites(&local, &remote);

    let aries = outcome.items.iter().find(|i| i.id == "glossary-sign:aries").unwrap();
    assert!(aries.pinned);
    assert_eq!(outcome.items.len(), 3);
}

#[test]
fn test_duplicates_within_one_side_collapse_to_newest() {
    let older = sign("Aries", 1);
    let mut newer = sign("Aries", 7);
    newer.icon = "♈".to_string();

    let outcome = merge_favorites(&[older, newer.clone()], &[]);
    assert_eq!(outcome.items, vec![newer]);
    assert_eq!(outcome.local_only, 1);
}

#[test]
fn test_inputs_are_not_modified() {
    let local = vec![sign("Aries", 1)];
    let remote = vec![sign("Aries", 2)];
    let before = (local.clone(), remote.clone());
    let _ = merge_favorites(&local, &remote);
    assert_eq!((local, remote), before);
}
