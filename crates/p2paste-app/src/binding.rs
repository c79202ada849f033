//! Presentation binding between the shared document and a text control.
//!
//! The control reports its whole contents on every input. The binding keeps
//! the text it last showed and turns each input into the smallest single
//! splice that explains the difference, so concurrent edits elsewhere in the
//! document survive the merge. Positions are counted in characters.

use p2paste_core::TextEdit;

/// Two-way glue between a document and the text control showing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBinding {
    shown: String,
}

impl TextBinding {
    /// Binding for an empty control.
    pub fn new() -> Self {
        Self::default()
    }

    /// Text currently shown in the control.
    pub fn shown(&self) -> &str {
        &self.shown
    }

    /// Control now holds `text`; returns the edit to apply to the document.
    ///
    /// Returns `None` when nothing changed.
    pub fn input(&mut self, text: &str) -> Option<TextEdit> {
        let edit = diff(&self.shown, text);
        self.shown = text.to_string();
        edit
    }

    /// Document now holds `text`; returns whether the control must redraw.
    pub fn refresh(&mut self, text: String) -> bool {
        if self.shown == text {
            return false;
        }
        self.shown = text;
        true
    }

    /// Forget the shown text.
    pub fn clear(&mut self) {
        self.shown.clear();
    }
}

/// Single splice turning `old` into `new`.
fn diff(old: &str, new: &str) -> Option<TextEdit> {
    if old == new {
        return None;
    }

    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();

    let prefix = old_chars.iter().zip(&new_chars).take_while(|(a, b)| a == b).count();

    let max_suffix = old_chars.len().min(new_chars.len()) - prefix;
    let suffix = old_chars
        .iter()
        .rev()
        .zip(new_chars.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let delete = old_chars.len() - prefix - suffix;
    let insert: String = new_chars[prefix..new_chars.len() - suffix].iter().collect();

    Some(TextEdit { index: prefix, delete, insert })
}
