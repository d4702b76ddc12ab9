//! Source positions and the error taxonomy of a generator run.
//!
//! Every failure raised while compiling token definitions or building the
//! parse table is a [`GenError`]. All of them are fatal to the run that
//! raised them: no partial scanner or table is ever produced. Callers that
//! drive many definitions decide for themselves whether to abort or move
//! on to the next one.

use smartstring::alias::String;
use std::fmt;
use thiserror::Error;

/// A 1-based line/column position in specification text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number (character position in the line).
    pub column: usize,
}

impl Position {
    /// Creates a new `Position`.
    #[inline]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Errors raised while generating a scanner or a parse table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenError {
    /// A malformed token: a literal outside the alphabet of its context,
    /// an unexpected token, or an unrecognized character.
    #[error("syntax error at {pos}: {message}")]
    Syntax { message: String, pos: Position },

    /// A named identifier or class that has not been defined (yet).
    #[error("undefined reference `{name}` at {pos}")]
    UndefinedReference { name: String, pos: Position },

    /// An exclusion operand that names something other than a character class.
    #[error("exclusion may only be applied to a character class, `{name}` is not one (at {pos})")]
    NotACharClass { name: String, pos: Position },

    /// Two rules compete for the same parse-table cell.
    #[error(
        "grammar is not LL(1): `{existing}` and `{incoming}` both apply to ({non_terminal}, {terminal})"
    )]
    GrammarConflict {
        non_terminal: String,
        terminal: String,
        existing: String,
        incoming: String,
    },

    /// An unterminated group or bracket, or a nesting the grammar forbids.
    #[error("structural error at {pos}: {message}")]
    Structural { message: String, pos: Position },
}

impl GenError {
    /// Builds a [`GenError::Syntax`].
    pub fn syntax(message: impl AsRef<str>, pos: Position) -> Self {
        GenError::Syntax {
            message: message.as_ref().into(),
            pos,
        }
    }

    /// Builds a [`GenError::Structural`].
    pub fn structural(message: impl AsRef<str>, pos: Position) -> Self {
        GenError::Structural {
            message: message.as_ref().into(),
            pos,
        }
    }

    /// Source position of the error, when it has one.
    pub fn position(&self) -> Option<Position> {
        match self {
            GenError::Syntax { pos, .. }
            | GenError::UndefinedReference { pos, .. }
            | GenError::NotACharClass { pos, .. }
            | GenError::Structural { pos, .. } => Some(*pos),
            GenError::GrammarConflict { .. } => None,
        }
    }
}
