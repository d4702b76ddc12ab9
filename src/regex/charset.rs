//! Character sets and the literal alphabets of the regex syntax.
//!
//! All character classes live inside printable ASCII (`' '..='~'`). Which
//! characters may appear bare, and which must be escaped, depends on
//! whether the literal sits in regex position or inside brackets.

use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use std::collections::btree_set::Iter;
use std::fmt;

/// First character of the alphabet.
pub const ALPHABET_START: char = ' ';

/// Last character of the alphabet.
pub const ALPHABET_END: char = '~';

/// Meta-characters a bare `.` does not match.
pub const RESERVED: &[char] = &['\\', '*', '+', '?', '|', '[', ']', '(', ')', '.', '\'', '"'];

/// Characters that may be escaped in regex position. All of them except
/// `-` must be.
const REGEX_ESCAPED: &[char] = &[
    ' ', '"', '\'', '(', ')', '*', '+', '-', '.', '?', '[', '\\', ']', '|',
];

/// Characters that must be escaped inside brackets.
const CLASS_ESCAPED: &[char] = &['-', '[', '\\', ']', '^'];

/// The set matched by `.`: the alphabet minus [`RESERVED`].
pub static DOT: Lazy<CharSet> = Lazy::new(|| {
    (ALPHABET_START..=ALPHABET_END)
        .filter(|c| !RESERVED.contains(c))
        .collect()
});

/// An ordered set of characters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CharSet(BTreeSet<char>);

impl CharSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Adds one character; returns `true` if it was not present.
    pub fn insert(&mut self, c: char) -> bool {
        self.0.insert(c)
    }

    /// Adds the inclusive range `lo..=hi`. Returns `false` (and adds
    /// nothing) when `lo > hi`.
    pub fn insert_range(&mut self, lo: char, hi: char) -> bool {
        if lo > hi {
            return false;
        }
        self.0.extend(lo..=hi);
        true
    }

    /// Returns `self − other`.
    pub fn difference(&self, other: &CharSet) -> CharSet {
        CharSet(self.0.difference(&other.0).copied().collect())
    }

    pub fn contains(&self, c: char) -> bool {
        self.0.contains(&c)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, char> {
        self.0.iter()
    }
}

impl FromIterator<char> for CharSet {
    fn from_iter<T: IntoIterator<Item = char>>(iter: T) -> Self {
        CharSet(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CharSet {
    type Item = &'a char;
    type IntoIter = Iter<'a, char>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Writes the set in bracket syntax, collapsing runs into ranges.
impl fmt::Display for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        let mut iter = self.0.iter().copied().peekable();
        while let Some(lo) = iter.next() {
            let mut hi = lo;
            while let Some(&next) = iter.peek() {
                if next as u32 == hi as u32 + 1 {
                    hi = next;
                    iter.next();
                } else {
                    break;
                }
            }
            write_class_char(f, lo)?;
            if hi != lo {
                f.write_str("-")?;
                write_class_char(f, hi)?;
            }
        }
        f.write_str("]")
    }
}

fn write_class_char(f: &mut fmt::Formatter<'_>, c: char) -> fmt::Result {
    if CLASS_ESCAPED.contains(&c) {
        write!(f, "\\{}", c)
    } else {
        write!(f, "{}", c)
    }
}

#[inline]
fn in_alphabet(c: char) -> bool {
    (ALPHABET_START..=ALPHABET_END).contains(&c)
}

/// Splits a literal token value into `(escaped, char)`.
fn split_literal(value: &str) -> Option<(bool, char)> {
    let mut chars = value.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('\\'), Some(c), None) => Some((true, c)),
        (Some(c), None, None) => Some((false, c)),
        _ => None,
    }
}

/// Resolves a literal in regex position, or `None` if it is not a valid
/// regex character there (e.g. a bare `(` or an escaped `a`).
pub fn regex_literal(value: &str) -> Option<char> {
    match split_literal(value)? {
        (true, c) if REGEX_ESCAPED.contains(&c) => Some(c),
        (false, '-') => Some('-'),
        (false, c) if in_alphabet(c) && !REGEX_ESCAPED.contains(&c) => Some(c),
        _ => None,
    }
}

/// Resolves a literal inside brackets, or `None` if it is not a valid
/// class character there (e.g. a bare `-` or `^`).
pub fn class_literal(value: &str) -> Option<char> {
    match split_literal(value)? {
        (true, c) if CLASS_ESCAPED.contains(&c) => Some(c),
        (false, c) if in_alphabet(c) && !CLASS_ESCAPED.contains(&c) => Some(c),
        _ => None,
    }
}
