//! Fuzz target for slug parsing and validation
//!
//! # Invariants
//!
//! - Parsing never panics
//! - A parsed slug validates and survives a path round trip
//! - Validation agrees with parsing

#![no_main]

use libfuzzer_sys::fuzz_target;
use p2paste_core::{Slug, slug};

fuzz_target!(|input: &str| {
    if let Ok(parsed) = Slug::parse(input) {
        assert!(slug::validate(parsed.first(), parsed.second(), parsed.checksum()));
        assert_eq!(Slug::from_path(&parsed.path()).ok(), Some(parsed.clone()));
    }

    let _ = Slug::from_path(input);

    let mut words = input.splitn(3, '-');
    if let (Some(a), Some(b), Some(code)) = (words.next(), words.next(), words.next()) {
        let valid = slug::validate(a, b, code);
        if valid {
            assert!(Slug::new(a, b, code).is_ok());
        }
    }
});
