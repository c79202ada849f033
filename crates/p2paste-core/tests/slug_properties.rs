//! Property tests for room slug naming.
//!
//! These tests verify critical invariants:
//! - Every vocabulary pair validates with its own checksum, in either order
//! - Swapping the words without recomputing the checksum is rejected
//! - Checksums ignore case and surrounding whitespace
//! - Paths round-trip through `Slug::from_path`

use p2paste_core::{
    Slug, SlugError,
    slug::{ADJECTIVES, ANIMALS, CHECKSUM_LEN, checksum, classify, validate},
};
use proptest::prelude::*;

fn adjective() -> impl Strategy<Value = &'static str> {
    proptest::sample::select(ADJECTIVES.to_vec())
}

fn animal() -> impl Strategy<Value = &'static str> {
    proptest::sample::select(ANIMALS.to_vec())
}

fn with_noise(word: &'static str) -> impl Strategy<Value = String> {
    (any::<bool>(), 0usize..3, 0usize..3).prop_map(move |(upper, lead, trail)| {
        let cased = if upper { word.to_uppercase() } else { word.to_string() };
        format!("{}{cased}{}", " ".repeat(lead), "\t".repeat(trail))
    })
}

proptest! {
    /// INVARIANT: validate(a, b, checksum(a, b)) holds in both word orders.
    #[test]
    fn valid_pairs_validate(adj in adjective(), ani in animal()) {
        prop_assert!(validate(adj, ani, &checksum(adj, ani)));
        prop_assert!(validate(ani, adj, &checksum(ani, adj)));
    }

    /// INVARIANT: the checksum is order-sensitive.
    #[test]
    fn swapped_order_without_recompute_rejected(adj in adjective(), ani in animal()) {
        let code = checksum(adj, ani);
        prop_assert!(!validate(ani, adj, &code));
    }

    /// INVARIANT: checksum is a pure function of the normalized words.
    #[test]
    fn checksum_ignores_case_and_whitespace(
        (adj, noisy_adj) in adjective().prop_flat_map(|w| (Just(w), with_noise(w))),
        (ani, noisy_ani) in animal().prop_flat_map(|w| (Just(w), with_noise(w))),
    ) {
        prop_assert_eq!(checksum(adj, ani), checksum(&noisy_adj, &noisy_ani));
        prop_assert_eq!(checksum(adj, ani), checksum(adj, ani));
    }

    /// INVARIANT: checksum is always four lowercase letters.
    #[test]
    fn checksum_shape(a in ".*", b in ".*") {
        let code = checksum(&a, &b);
        prop_assert_eq!(code.len(), CHECKSUM_LEN);
        prop_assert!(code.bytes().all(|c| c.is_ascii_lowercase()));
    }

    /// INVARIANT: two words of the same class never validate.
    #[test]
    fn same_class_pairs_rejected(a in adjective(), b in adjective()) {
        prop_assert!(!validate(a, b, &checksum(a, b)));
    }

    /// INVARIANT: a valid slug's path parses back to the same slug.
    #[test]
    fn path_round_trip(adj in adjective(), ani in animal(), flip in any::<bool>()) {
        let (first, second) = if flip { (ani, adj) } else { (adj, ani) };
        let slug = Slug::new(first, second, &checksum(first, second)).unwrap();

        prop_assert_eq!(Slug::from_path(&slug.path()).unwrap(), slug.clone());
        prop_assert_eq!(slug.path(), format!("/{slug}"));
    }

    /// INVARIANT: arbitrary paths never panic, and accepted ones validate.
    #[test]
    fn arbitrary_paths_never_panic(path in "/?[a-zA-Z/ -]{0,40}") {
        if let Ok(slug) = Slug::from_path(&path) {
            prop_assert!(validate(slug.first(), slug.second(), slug.checksum()));
        }
    }
}

#[test]
fn vocabulary_classification_is_exclusive() {
    for word in ADJECTIVES {
        let class = classify(word);
        assert!(class.is_adjective && !class.is_animal, "{word}");
    }
    for word in ANIMALS {
        let class = classify(word);
        assert!(class.is_animal && !class.is_adjective, "{word}");
    }
}

#[test]
fn path_shapes_outside_the_slug_are_rejected() {
    for path in ["", "/", "blue-otter-degk", "/blue-otter", "/blue-otter-degk/extra", "//blue-otter-degk"] {
        assert!(Slug::from_path(path).is_err(), "{path:?} accepted");
    }
    assert_eq!(Slug::from_path("/blue-otter-zzzz"), Err(SlugError::Rejected));
}
