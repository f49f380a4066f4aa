//! Property-based tests for favorite identity.
//!
//! The id of a favorite is derived from its kind and title only, so every
//! spelling of the same title that differs in case or whitespace must land
//! on the same record.

use astrolab::types::favorite::{deterministic_id, normalize_title, FavoriteCandidate, FavoriteKind};
use proptest::prelude::*;

fn arb_kind() -> impl Strategy<Value = FavoriteKind> {
    proptest::sample::select(FavoriteKind::ALL.to_vec())
}

/// Titles made of words, with Spanish letters since the glossary is bilingual.
fn arb_title() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-zA-ZáéíóúñÁÉÍÓÚÑ0-9]{1,8}", 1..5).prop_map(|words| words.join(" "))
}

/// Re-spaces and re-cases `title` without changing its words.
fn respell(title: &str, upper: bool, pad: usize) -> String {
    let spaces = " ".repeat(pad + 1);
    let words: Vec<String> = title
        .split_whitespace()
        .map(|w| if upper { w.to_uppercase() } else { w.to_lowercase() })
        .collect();
    format!("{}{}{}", "\t".repeat(pad), words.join(&spaces), " ".repeat(pad))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Computing the id twice yields the same value.
    #[test]
    fn id_is_stable(kind in arb_kind(), title in arb_title()) {
        prop_assert_eq!(deterministic_id(kind, &title), deterministic_id(kind, &title));
    }

    // Case and whitespace do not change the id.
    #[test]
    fn id_ignores_case_and_whitespace(
        kind in arb_kind(),
        title in arb_title(),
        upper in any::<bool>(),
        pad in 0usize..3,
    ) {
        let respelled = respell(&title, upper, pad);
        prop_assert_eq!(deterministic_id(kind, &title), deterministic_id(kind, &respelled));
    }

    // Normalizing is idempotent.
    #[test]
    fn normalize_is_idempotent(title in arb_title()) {
        let once = normalize_title(&title);
        prop_assert_eq!(normalize_title(&once), once);
    }

    // Different kinds never share an id.
    #[test]
    fn kinds_partition_ids(a in arb_kind(), b in arb_kind(), title in arb_title()) {
        prop_assume!(a != b);
        prop_assert_ne!(deterministic_id(a, &title), deterministic_id(b, &title));
    }

    // The candidate and the stored item agree on the id.
    #[test]
    fn candidate_and_item_share_id(kind in arb_kind(), title in arb_title(), now in 0i64..1_000_000) {
        let candidate = FavoriteCandidate::new(kind, &title, "/route");
        let id = candidate.id();
        prop_assert_eq!(candidate.into_item(now).id, id);
    }
}
