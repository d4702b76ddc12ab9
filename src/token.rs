//! Typed tokens exchanged between the lexers and the generator core.
//!
//! A [`Token`] pairs a kind (an enum chosen by the lexer that produced it)
//! with the matched text and the 1-based position where it starts. Tokens
//! are immutable once produced.

use crate::error::Position;
use smartstring::alias::String;
use std::fmt;

/// A lexical token: `{kind, value, line, column}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token<K> {
    /// The token kind.
    pub kind: K,
    /// The matched text (escapes are kept verbatim).
    pub value: String,
    /// 1-based line of the first character.
    pub line: usize,
    /// 1-based column of the first character.
    pub column: usize,
}

impl<K> Token<K> {
    /// Creates a new token.
    pub fn new(kind: K, value: impl AsRef<str>, line: usize, column: usize) -> Self {
        Self {
            kind,
            value: value.as_ref().into(),
            line,
            column,
        }
    }

    /// The position of the first character of this token.
    #[inline]
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

impl<K> fmt::Display for Token<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
