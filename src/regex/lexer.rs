//! Regex tokenizer.
//!
//! Splits the text of one token definition into [`Token<RegexKind>`]s. The
//! meaning of a character depends on where it appears (`-` is a literal in
//! regex position but a range operator inside brackets, `IN` is a keyword
//! only after an exclusion), so the tokenizer runs three [`logos`] lexers
//! and morphs between them:
//!
//! - [`OuterToken`] in regex position,
//! - [`ClassToken`] between `[` and `]`,
//! - [`OperandToken`] after the `]` that closes a `[^X]` exclusion, where
//!   `IN` and the right-hand operand are expected.
//!
//! Literal values are kept verbatim (`a`, `\*`); whether a literal is legal
//! in its position is decided by the compiler.

use crate::error::{GenError, Position};
use crate::token::Token;
use logos::Logos;

/// Kinds of regex tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegexKind {
    /// A bare or escaped character (`a`, `\(`).
    Literal,
    /// A reference to a previously defined identifier (`$DIGIT`).
    Defined,
    /// `|`
    Union,
    /// `*`
    Kleene,
    /// `+`
    Plus,
    /// `.`
    Dot,
    /// `^` as the first token of a bracket expression.
    Caret,
    /// `-` inside brackets.
    Dash,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `IN` after an exclusion.
    In,
}

/// Tokens in regex position. Bare spaces are insignificant here.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t]+")]
enum OuterToken {
    #[regex(r"\\[ -~]")]
    Escaped,

    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*")]
    Defined,

    #[token("|")]
    Union,

    #[token("*")]
    Kleene,

    #[token("+")]
    Plus,

    #[token(".")]
    Dot,

    #[token("[")]
    LBracket,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[regex(r"[!-~]", priority = 1)]
    Literal,
}

/// Tokens inside brackets. Spaces are ordinary members here.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum ClassToken {
    #[regex(r"\\[ -~]")]
    Escaped,

    #[token("^")]
    Caret,

    #[token("-")]
    Dash,

    #[token("]")]
    RBracket,

    #[regex(r"[ -~]", priority = 1)]
    Literal,
}

/// Tokens after `[^X]`: the `IN` keyword and the right-hand operand.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t]+")]
enum OperandToken {
    #[token("IN")]
    In,

    #[token("[")]
    LBracket,

    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*")]
    Defined,
}

/// The active sub-lexer.
enum Mode<'source> {
    Outer(logos::Lexer<'source, OuterToken>),
    Class {
        inner: logos::Lexer<'source, ClassToken>,
        /// No token of this bracket expression has been produced yet.
        first: bool,
        /// The expression started with `^`.
        exclusion: bool,
    },
    Operand(logos::Lexer<'source, OperandToken>),
}

/// Tokenizer over the text of one regex.
pub struct RegexLexer<'source> {
    mode: Option<Mode<'source>>,
    origin: Position,
}

impl<'source> RegexLexer<'source> {
    /// Creates a lexer whose first character sits at `origin`.
    pub fn new(input: &'source str, origin: Position) -> Self {
        Self {
            mode: Some(Mode::Outer(OuterToken::lexer(input))),
            origin,
        }
    }

    /// Tokenizes the entire input, stopping at the first error.
    pub fn tokenize_all(
        input: &'source str,
        origin: Position,
    ) -> Result<Vec<Token<RegexKind>>, GenError> {
        RegexLexer::new(input, origin).collect()
    }

    fn token(&self, kind: RegexKind, slice: &str, offset: usize) -> Token<RegexKind> {
        Token::new(kind, slice, self.origin.line, self.origin.column + offset)
    }

    fn error(&self, slice: &str, offset: usize) -> GenError {
        GenError::syntax(
            format!("unrecognized input {:?} in regex", slice),
            Position::new(self.origin.line, self.origin.column + offset),
        )
    }
}

impl Iterator for RegexLexer<'_> {
    type Item = Result<Token<RegexKind>, GenError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (item, mode) = match self.mode.take()? {
            Mode::Outer(mut inner) => {
                let res = inner.next()?;
                let (slice, offset) = (inner.slice(), inner.span().start);
                let kind = match res {
                    Ok(OuterToken::Escaped) | Ok(OuterToken::Literal) => RegexKind::Literal,
                    Ok(OuterToken::Defined) => RegexKind::Defined,
                    Ok(OuterToken::Union) => RegexKind::Union,
                    Ok(OuterToken::Kleene) => RegexKind::Kleene,
                    Ok(OuterToken::Plus) => RegexKind::Plus,
                    Ok(OuterToken::Dot) => RegexKind::Dot,
                    Ok(OuterToken::LBracket) => RegexKind::LBracket,
                    Ok(OuterToken::LParen) => RegexKind::LParen,
                    Ok(OuterToken::RParen) => RegexKind::RParen,
                    Err(()) => {
                        let err = self.error(slice, offset);
                        self.mode = Some(Mode::Outer(inner));
                        return Some(Err(err));
                    }
                };
                let tok = self.token(kind, slice, offset);
                let mode = if kind == RegexKind::LBracket {
                    Mode::Class {
                        inner: inner.morph(),
                        first: true,
                        exclusion: false,
                    }
                } else {
                    Mode::Outer(inner)
                };
                (Ok(tok), mode)
            }

            Mode::Class {
                mut inner,
                first,
                exclusion,
            } => {
                let res = inner.next()?;
                let (slice, offset) = (inner.slice(), inner.span().start);
                let kind = match res {
                    Ok(ClassToken::Escaped) | Ok(ClassToken::Literal) => RegexKind::Literal,
                    Ok(ClassToken::Caret) => RegexKind::Caret,
                    Ok(ClassToken::Dash) => RegexKind::Dash,
                    Ok(ClassToken::RBracket) => RegexKind::RBracket,
                    Err(()) => {
                        let err = self.error(slice, offset);
                        self.mode = Some(Mode::Class {
                            inner,
                            first,
                            exclusion,
                        });
                        return Some(Err(err));
                    }
                };
                let tok = self.token(kind, slice, offset);
                let exclusion = exclusion || (first && kind == RegexKind::Caret);
                let mode = match kind {
                    RegexKind::RBracket if exclusion => Mode::Operand(inner.morph()),
                    RegexKind::RBracket => Mode::Outer(inner.morph()),
                    _ => Mode::Class {
                        inner,
                        first: false,
                        exclusion,
                    },
                };
                (Ok(tok), mode)
            }

            Mode::Operand(mut inner) => {
                let res = inner.next()?;
                let (slice, offset) = (inner.slice(), inner.span().start);
                match res {
                    Ok(OperandToken::In) => (
                        Ok(self.token(RegexKind::In, slice, offset)),
                        Mode::Operand(inner),
                    ),
                    Ok(OperandToken::LBracket) => (
                        Ok(self.token(RegexKind::LBracket, slice, offset)),
                        Mode::Class {
                            inner: inner.morph(),
                            first: true,
                            exclusion: false,
                        },
                    ),
                    Ok(OperandToken::Defined) => (
                        Ok(self.token(RegexKind::Defined, slice, offset)),
                        Mode::Outer(inner.morph()),
                    ),
                    Err(()) => (Err(self.error(slice, offset)), Mode::Operand(inner)),
                }
            }
        };
        self.mode = Some(mode);
        Some(item)
    }
}
