//! Join form for hand-typed room links.

use p2paste_core::Slug;

use crate::error::JoinError;

/// Longest checksum code the form accepts.
pub const CODE_MAX_LEN: usize = 4;

/// Three free-text fields: word, word, code.
///
/// Fields keep letters only; the code is additionally capped at
/// [`CODE_MAX_LEN`] characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinForm {
    first: String,
    second: String,
    code: String,
}

impl JoinForm {
    /// Empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the first word field.
    pub fn set_first(&mut self, input: &str) {
        self.first = letters(input, usize::MAX);
    }

    /// Set the second word field.
    pub fn set_second(&mut self, input: &str) {
        self.second = letters(input, usize::MAX);
    }

    /// Set the code field.
    pub fn set_code(&mut self, input: &str) {
        self.code = letters(input, CODE_MAX_LEN);
    }

    /// First word as sanitized.
    pub fn first(&self) -> &str {
        &self.first
    }

    /// Second word as sanitized.
    pub fn second(&self) -> &str {
        &self.second
    }

    /// Code as sanitized.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Validate the fields and return the room path to navigate to.
    ///
    /// # Errors
    ///
    /// - `JoinError::Rejected` for any invalid combination, whichever check
    ///   failed
    pub fn submit(&self) -> Result<String, JoinError> {
        match Slug::new(&self.first, &self.second, &self.code) {
            Ok(slug) => Ok(slug.path()),
            Err(error) => {
                tracing::debug!(%error, "join form rejected");
                Err(JoinError::Rejected)
            },
        }
    }
}

fn letters(input: &str, max: usize) -> String {
    input.chars().filter(char::is_ascii_alphabetic).take(max).collect()
}

#[cfg(test)]
mod tests {
    use p2paste_core::slug::checksum;

    use super::*;

    fn form(first: &str, second: &str, code: &str) -> JoinForm {
        let mut form = JoinForm::new();
        form.set_first(first);
        form.set_second(second);
        form.set_code(code);
        form
    }

    #[test]
    fn sanitizes_to_letters() {
        let form = form(" Blue!1", "ot-ter", "de g k z");
        assert_eq!(form.first(), "Blue");
        assert_eq!(form.second(), "otter");
        assert_eq!(form.code(), "degk");
    }

    #[test]
    fn valid_entry_routes_to_room_path() {
        let code = checksum("otter", "blue");
        assert_eq!(form("Otter", "BLUE", &code).submit(), Ok(format!("/otter-blue-{code}")));
    }

    #[test]
    fn every_failure_reads_the_same() {
        let bad_checksum = form("blue", "otter", "aaaa").submit();
        let bad_words = form("blue", "green", &checksum("blue", "green")).submit();
        let empty = JoinForm::new().submit();

        assert_eq!(bad_checksum, Err(JoinError::Rejected));
        assert_eq!(bad_words, Err(JoinError::Rejected));
        assert_eq!(empty, Err(JoinError::Rejected));
    }

    #[test]
    fn swapped_words_need_their_own_code() {
        let code = checksum("blue", "otter");
        assert!(form("blue", "otter", &code).submit().is_ok());
        assert!(form("otter", "blue", &code).submit().is_err());
    }
}
