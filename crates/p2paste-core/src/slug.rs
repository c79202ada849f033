//! Human-readable room names.
//!
//! A slug is `<first>-<second>-<checksum>`: one adjective and one animal in
//! either order, followed by a four-letter code derived from the two words.
//! The slug is the only thing needed to join a room, so the code exists to
//! stop careless guesses (`blue-otter` alone would be guessable), not to
//! resist forgery.
//!
//! ```
//! use p2paste_core::slug;
//!
//! let code = slug::checksum("blue", "otter");
//! assert!(slug::validate("blue", "otter", &code));
//! assert!(slug::validate("BLUE ", " Otter", &code));
//! ```

use std::{fmt, str::FromStr};

use crate::{env::Environment, error::SlugError};

/// Adjective vocabulary. Disjoint from [`ANIMALS`].
pub const ADJECTIVES: [&str; 20] = [
    "blue", "red", "green", "bright", "dark", "quiet", "loud", "swift", "brave", "calm", "happy",
    "eager", "clever", "fuzzy", "gentle", "golden", "silver", "rusty", "mellow", "zany",
];

/// Animal vocabulary. Disjoint from [`ADJECTIVES`].
pub const ANIMALS: [&str; 20] = [
    "horse", "tiger", "panda", "otter", "eagle", "shark", "whale", "lynx", "falcon", "koala",
    "sloth", "wolf", "bear", "fox", "moose", "goose", "llama", "yak", "zebra", "sparrow",
];

/// Number of letters in the checksum token.
pub const CHECKSUM_LEN: usize = 4;

/// FNV-1a offset basis.
const HASH_SEED: u32 = 0x811C_9DC5;

/// FNV-1a prime.
const HASH_PRIME: u32 = 0x0100_0193;

/// 26^4 distinct codes.
const CHECKSUM_SPACE: u32 = 26 * 26 * 26 * 26;

/// Vocabulary membership of a single word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WordClass {
    /// Word is in [`ADJECTIVES`].
    pub is_adjective: bool,
    /// Word is in [`ANIMALS`].
    pub is_animal: bool,
}

fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}

/// Classify a word against both vocabularies, ignoring case and surrounding
/// whitespace.
pub fn classify(word: &str) -> WordClass {
    let word = normalize(word);
    WordClass {
        is_adjective: ADJECTIVES.contains(&word.as_str()),
        is_animal: ANIMALS.contains(&word.as_str()),
    }
}

/// Four-letter checksum of the ordered pair `(a, b)`.
///
/// Both words are trimmed and lower-cased, joined as `a-b`, hashed with 32-bit
/// FNV-1a over UTF-16 code units, reduced modulo 26^4 and written as four
/// base-26 letters, most significant first. The result is stable across
/// platforms and releases; changing any constant here orphans every link ever
/// shared.
pub fn checksum(a: &str, b: &str) -> String {
    let joined = format!("{}-{}", normalize(a), normalize(b));

    let hash = joined
        .encode_utf16()
        .fold(HASH_SEED, |hash, unit| (hash ^ u32::from(unit)).wrapping_mul(HASH_PRIME));

    let mut value = hash % CHECKSUM_SPACE;
    let mut digits = [b'a'; CHECKSUM_LEN];
    for digit in digits.iter_mut().rev() {
        *digit = b'a' + (value % 26) as u8;
        value /= 26;
    }

    digits.iter().map(|&d| char::from(d)).collect()
}

/// Check a hand-entered slug.
///
/// True iff `code` equals `checksum(a, b)` for the order given, and exactly
/// one of `a`/`b` is an adjective while the other is an animal.
///
/// `code` is normalized like the words, so `" DEGK "` is accepted for
/// `degk`. Callers wanting exactly four lower-case letters must check that
/// themselves.
pub fn validate(a: &str, b: &str, code: &str) -> bool {
    let (ca, cb) = (classify(a), classify(b));
    let typed = (ca.is_adjective && cb.is_animal) || (ca.is_animal && cb.is_adjective);

    typed && normalize(code) == checksum(a, b)
}

/// A validated room slug.
///
/// Tokens are stored normalized (trimmed, lower-case), so two people typing
/// `Blue` and `blue` end up in the same room.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slug {
    first: String,
    second: String,
    checksum: String,
}

impl Slug {
    /// Generate a fresh slug.
    ///
    /// Picks an adjective and an animal uniformly, then a uniform order.
    pub fn generate<E: Environment>(env: &E) -> Self {
        let adjective = ADJECTIVES[env.random_index(ADJECTIVES.len())];
        let animal = ANIMALS[env.random_index(ANIMALS.len())];

        let (first, second) =
            if env.random_bool() { (adjective, animal) } else { (animal, adjective) };

        Self {
            first: first.to_string(),
            second: second.to_string(),
            checksum: checksum(first, second),
        }
    }

    /// Build a slug from three tokens as typed.
    ///
    /// # Errors
    ///
    /// - `SlugError::Rejected` if [`validate`] fails
    pub fn new(first: &str, second: &str, code: &str) -> Result<Self, SlugError> {
        if !validate(first, second, code) {
            return Err(SlugError::Rejected);
        }

        Ok(Self { first: normalize(first), second: normalize(second), checksum: normalize(code) })
    }

    /// Parse `<first>-<second>-<checksum>`.
    ///
    /// # Errors
    ///
    /// - `SlugError::Malformed` if the input does not have exactly three
    ///   non-empty, dash-separated tokens
    /// - `SlugError::Rejected` if the tokens fail [`validate`]
    pub fn parse(input: &str) -> Result<Self, SlugError> {
        let mut tokens = input.split('-');
        let (Some(first), Some(second), Some(code), None) =
            (tokens.next(), tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(SlugError::Malformed);
        };

        if [first, second, code].iter().any(|token| token.is_empty()) {
            return Err(SlugError::Malformed);
        }

        Self::new(first, second, code)
    }

    /// Parse a room path `/<first>-<second>-<checksum>`.
    ///
    /// # Errors
    ///
    /// - `SlugError::Malformed` if the path has a different shape
    /// - `SlugError::Rejected` if the tokens fail [`validate`]
    pub fn from_path(path: &str) -> Result<Self, SlugError> {
        let segment = path.strip_prefix('/').ok_or(SlugError::Malformed)?;
        let segment = segment.strip_suffix('/').unwrap_or(segment);

        if segment.contains('/') {
            return Err(SlugError::Malformed);
        }

        Self::parse(segment)
    }

    /// Room path for this slug, `/<first>-<second>-<checksum>`.
    pub fn path(&self) -> String {
        format!("/{self}")
    }

    /// First word, as ordered in the slug.
    pub fn first(&self) -> &str {
        &self.first
    }

    /// Second word, as ordered in the slug.
    pub fn second(&self) -> &str {
        &self.second
    }

    /// Checksum token.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.first, self.second, self.checksum)
    }
}

impl FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
