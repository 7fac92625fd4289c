//! Morse-code symbol encoding.
//!
//! [`encode`] turns a message into a lazy sequence of [`Symbol`]s: signals
//! (dot or dash) separated by three kinds of gap.
//!
//! | Position | Symbol |
//! |----------|--------|
//! | between elements of one character | [`Symbol::IntraCharacterGap`] |
//! | between characters of one word | [`Symbol::IntraWordGap`] |
//! | between words | [`Symbol::InterWordGap`] |
//!
//! Letters are case-insensitive. Characters outside `A-Z` and `0-9` have no
//! code and are skipped: they emit nothing, not even a gap. The sequence never
//! starts or ends with a gap.
//!
//! # Example
//!
//! ```rust
//! use rs_blinkz::morse::{encode, Signal, Symbol};
//!
//! let symbols: Vec<Symbol> = encode("ET").collect();
//! assert_eq!(
//!     symbols,
//!     vec![
//!         Symbol::Signal(Signal::Dot),
//!         Symbol::IntraWordGap,
//!         Symbol::Signal(Signal::Dash),
//!     ]
//! );
//!
//! // Restartable: encoding again yields the same sequence
//! assert!(encode("SOS").eq(encode("SOS")));
//! ```

use core::str::{Chars, SplitWhitespace};

/// A lit signal element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Signal {
    /// Short element.
    Dot,
    /// Long element, three times a dot.
    Dash,
}

/// One timed unit of output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Symbol {
    /// A dot or dash with its LED lit.
    Signal(Signal),
    /// Dead time between elements of a character.
    IntraCharacterGap,
    /// Dead time between characters of a word.
    IntraWordGap,
    /// Dead time between words.
    InterWordGap,
}

impl Symbol {
    /// Returns true for the three gap kinds.
    #[inline]
    pub const fn is_gap(&self) -> bool {
        !matches!(self, Symbol::Signal(_))
    }
}

/// Dot/dash pattern for `c`, or `None` if it has no code.
///
/// ```
/// use rs_blinkz::morse::code_for;
///
/// assert_eq!(code_for('s'), Some("..."));
/// assert_eq!(code_for('0'), Some("-----"));
/// assert_eq!(code_for('?'), None);
/// ```
pub fn code_for(c: char) -> Option<&'static str> {
    let code = match c.to_ascii_uppercase() {
        'A' => ".-",
        'B' => "-...",
        'C' => "-.-.",
        'D' => "-..",
        'E' => ".",
        'F' => "..-.",
        'G' => "--.",
        'H' => "....",
        'I' => "..",
        'J' => ".---",
        'K' => "-.-",
        'L' => ".-..",
        'M' => "--",
        'N' => "-.",
        'O' => "---",
        'P' => ".--.",
        'Q' => "--.-",
        'R' => ".-.",
        'S' => "...",
        'T' => "-",
        'U' => "..-",
        'V' => "...-",
        'W' => ".--",
        'X' => "-..-",
        'Y' => "-.--",
        'Z' => "--..",
        '0' => "-----",
        '1' => ".----",
        '2' => "..---",
        '3' => "...--",
        '4' => "....-",
        '5' => ".....",
        '6' => "-....",
        '7' => "--...",
        '8' => "---..",
        '9' => "----.",
        _ => return None,
    };
    Some(code)
}

/// Returns true if every non-whitespace character of `message` has a code.
pub fn is_encodable(message: &str) -> bool {
    message
        .chars()
        .filter(|c| !c.is_whitespace())
        .all(|c| code_for(c).is_some())
}

/// Encodes `message` as a lazy symbol sequence.
pub fn encode(message: &str) -> Symbols<'_> {
    Symbols {
        words: message.split_whitespace(),
        chars: None,
        code: "",
        pending_gap: None,
        word_started: false,
        emitted: false,
    }
}

/// Iterator returned by [`encode`].
///
/// Cloning it snapshots the position, so a clone replays the rest of the
/// sequence identically.
#[derive(Clone, Debug)]
pub struct Symbols<'a> {
    words: SplitWhitespace<'a>,
    chars: Option<Chars<'a>>,
    // remaining elements of the current character
    code: &'static str,
    pending_gap: Option<Symbol>,
    word_started: bool,
    emitted: bool,
}

impl Iterator for Symbols<'_> {
    type Item = Symbol;

    fn next(&mut self) -> Option<Symbol> {
        loop {
            if let Some(element) = self.code.as_bytes().first().copied() {
                // A gap is only released once a signal follows it.
                if let Some(gap) = self.pending_gap.take() {
                    return Some(gap);
                }

                self.code = &self.code[1..];
                if !self.code.is_empty() {
                    self.pending_gap = Some(Symbol::IntraCharacterGap);
                }
                self.emitted = true;

                let signal = if element == b'.' {
                    Signal::Dot
                } else {
                    Signal::Dash
                };
                return Some(Symbol::Signal(signal));
            }

            if let Some(chars) = self.chars.as_mut() {
                if let Some(c) = chars.next() {
                    if let Some(code) = code_for(c) {
                        if self.word_started {
                            self.pending_gap = Some(Symbol::IntraWordGap);
                        }
                        self.word_started = true;
                        self.code = code;
                    }
                    continue;
                }
            }

            let word = self.words.next()?;
            if self.emitted {
                self.pending_gap = Some(Symbol::InterWordGap);
            }
            self.chars = Some(word.chars());
            self.word_started = false;
        }
    }
}
