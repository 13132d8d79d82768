//! Candidate code assembled from per-digit slots or a paste.

/// Outcome of an edit to the code input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeEntry {
    /// At least one slot is still empty, or the edit was rejected.
    Incomplete,
    /// The edit completed the code; submit this candidate now.
    AutoSubmit(String),
    /// The code is complete but was already reported for submission.
    Complete,
}

/// Fixed-length numeric code input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeInput {
    slots: Vec<Option<char>>,
    focus: usize,
    reported: bool,
}

impl CodeInput {
    /// Creates an empty input with `length` slots.
    pub fn new(length: usize) -> Self {
        Self {
            slots: vec![None; length.max(1)],
            focus: 0,
            reported: false,
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if every slot is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Slot that should hold input focus.
    pub fn focus(&self) -> usize {
        self.focus
    }

    /// Returns true if no slot is empty.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// The candidate string when complete.
    pub fn candidate(&self) -> Option<String> {
        self.slots.iter().copied().collect()
    }

    /// Manual submission is available exactly when the candidate is complete.
    pub fn can_submit(&self) -> bool {
        self.is_complete()
    }

    /// Types one character into `position`.
    ///
    /// Non-digits and out-of-range positions are ignored.
    pub fn enter(&mut self, position: usize, ch: char) -> CodeEntry {
        if !ch.is_ascii_digit() || position >= self.slots.len() {
            return self.settle();
        }
        self.slots[position] = Some(ch);
        self.focus = (position + 1).min(self.slots.len() - 1);
        self.settle()
    }

    /// Clears `position` and moves focus back to it.
    pub fn erase(&mut self, position: usize) -> CodeEntry {
        if position < self.slots.len() {
            self.slots[position] = None;
            self.focus = position;
        }
        self.settle()
    }

    /// Distributes pasted text across the slots from the first one.
    ///
    /// Non-digit characters are dropped; extra digits are ignored.
    pub fn paste(&mut self, text: &str) -> CodeEntry {
        let digits: Vec<char> = text
            .chars()
            .filter(char::is_ascii_digit)
            .take(self.slots.len())
            .collect();
        if digits.is_empty() {
            return self.settle();
        }
        for (slot, digit) in self.slots.iter_mut().zip(digits.iter()) {
            *slot = Some(*digit);
        }
        self.focus = self
            .slots
            .iter()
            .position(Option::is_none)
            .unwrap_or(self.slots.len() - 1);
        self.settle()
    }

    /// Empties every slot and returns focus to the first one.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.focus = 0;
        self.reported = false;
    }

    fn settle(&mut self) -> CodeEntry {
        match self.candidate() {
            None => {
                self.reported = false;
                CodeEntry::Incomplete
            }
            Some(_) if self.reported => CodeEntry::Complete,
            Some(code) => {
                self.reported = true;
                CodeEntry::AutoSubmit(code)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::otp::CODE_LENGTH;
    use proptest::prelude::*;

    #[test]
    fn auto_submits_when_last_digit_entered() {
        let mut input = CodeInput::new(CODE_LENGTH);
        for (i, ch) in "12345".chars().enumerate() {
            assert_eq!(input.enter(i, ch), CodeEntry::Incomplete);
        }
        assert_eq!(input.enter(5, '6'), CodeEntry::AutoSubmit("123456".to_string()));
        assert_eq!(input.focus(), 5);
    }

    #[test]
    fn editing_a_complete_code_does_not_resubmit() {
        let mut input = CodeInput::new(CODE_LENGTH);
        input.paste("123456");
        assert_eq!(input.enter(2, '9'), CodeEntry::Complete);
    }

    #[test]
    fn erase_then_refill_reports_again() {
        let mut input = CodeInput::new(CODE_LENGTH);
        input.paste("123456");
        assert_eq!(input.erase(3), CodeEntry::Incomplete);
        assert_eq!(input.focus(), 3);
        assert_eq!(input.enter(3, '0'), CodeEntry::AutoSubmit("123056".to_string()));
    }

    #[test]
    fn non_digits_are_ignored() {
        let mut input = CodeInput::new(CODE_LENGTH);
        assert_eq!(input.enter(0, 'a'), CodeEntry::Incomplete);
        assert!(input.is_empty());
    }

    #[test]
    fn paste_normalizes_separators() {
        let mut input = CodeInput::new(CODE_LENGTH);
        assert_eq!(input.paste(" 123-456 "), CodeEntry::AutoSubmit("123456".to_string()));
    }

    #[test]
    fn short_paste_leaves_focus_on_first_gap() {
        let mut input = CodeInput::new(CODE_LENGTH);
        assert_eq!(input.paste("12"), CodeEntry::Incomplete);
        assert_eq!(input.focus(), 2);
        assert!(!input.can_submit());
    }

    #[test]
    fn clear_resets_slots_and_focus() {
        let mut input = CodeInput::new(CODE_LENGTH);
        input.paste("123456");
        input.clear();
        assert!(input.is_empty());
        assert_eq!(input.focus(), 0);
        assert_eq!(input.paste("654321"), CodeEntry::AutoSubmit("654321".to_string()));
    }

    proptest! {
        #[test]
        fn digit_by_digit_entry_auto_submits_exactly_once_on_sixth_digit(code in "[0-9]{6}") {
            let mut input = CodeInput::new(CODE_LENGTH);
            let mut fired = Vec::new();
            for (i, ch) in code.chars().enumerate() {
                if let CodeEntry::AutoSubmit(candidate) = input.enter(i, ch) {
                    fired.push((i, candidate));
                }
            }
            prop_assert_eq!(fired, vec![(5, code.clone())]);
        }
    }
}
