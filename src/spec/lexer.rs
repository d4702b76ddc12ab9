//! Specification lexer.
//!
//! Tokenizes a specification file into [`SpecToken`]s. A specification is
//! line oriented: the first block holds one `$NAME regex` definition per
//! line, and the following blocks hold productions. Blocks are closed by
//! `%%`, and comments run from `--` to the end of the line.
//!
//! The regex of a definition is not tokenized here. The whole remainder of
//! the line becomes a single [`SpecKind::Regex`] token that the regex
//! compiler picks up later, with its position preserved so errors inside
//! the regex point at the right column. Definition lines therefore cannot
//! carry comments: a `--` after `$NAME` is part of the regex.

use crate::error::{GenError, Position};
use crate::token::Token;
use logos::Logos;

/// Kinds of specification tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecKind {
    /// The name of a token definition, without the leading `$`.
    Definition,
    /// The regex of a token definition, trimmed.
    Regex,
    /// A non-terminal, brackets included (`<stmt>`).
    NonTerminal,
    /// An identifier or a single punctuation character.
    Terminal,
    /// `->` or `::=`
    Arrow,
    /// `|`
    Pipe,
    /// `EPSILON`
    Epsilon,
    /// End of a line.
    LineFeed,
    /// `%%`
    EndOfBlock,
    /// End of input. Also the kind of the `$` end-marker terminal.
    Eof,
}

pub type SpecToken = Token<SpecKind>;

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]
enum LogosToken {
    #[regex(r"\n")]
    LineFeed,

    #[regex(r"--[^\n]*")]
    Comment,

    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*([ \t][^\n]*)?")]
    Definition,

    #[token("%%")]
    EndOfBlock,

    #[token("->")]
    #[token("::=")]
    Arrow,

    #[token("|")]
    Pipe,

    #[token("EPSILON")]
    Epsilon,

    #[regex(r"<[A-Za-z_][A-Za-z0-9_\-]*>")]
    NonTerminal,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r###"[-~`!@#%^&*+=\\<>?/;\(\)\[\]{},\.'":]"###)]
    Sym,
}

/// Source-level lexer for specification files.
pub struct SpecLexer<'source> {
    inner: logos::Lexer<'source, LogosToken>,
    /// Current 1-based line.
    line: usize,
    /// Byte offset at which the current line starts.
    line_start: usize,
    /// Second half of a split definition line.
    pending: Option<SpecToken>,
}

impl<'source> SpecLexer<'source> {
    pub fn new(input: &'source str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
            line: 1,
            line_start: 0,
            pending: None,
        }
    }

    /// Position of byte offset `offset` on the current line.
    fn position(&self, offset: usize) -> Position {
        let column = self.inner.source()[self.line_start..offset].chars().count() + 1;
        Position::new(self.line, column)
    }

    fn token(&self, kind: SpecKind, value: &str, offset: usize) -> SpecToken {
        let pos = self.position(offset);
        Token::new(kind, value, pos.line, pos.column)
    }

    /// Splits `$NAME  regex` into a definition token and a regex token.
    fn split_definition(&mut self, slice: &str, start: usize) -> SpecToken {
        let name_end = 1 + slice[1..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(slice.len() - 1);
        let rest = &slice[name_end..];
        let lead = rest.len() - rest.trim_start().len();
        self.pending = Some(self.token(SpecKind::Regex, rest.trim(), start + name_end + lead));
        self.token(SpecKind::Definition, &slice[1..name_end], start)
    }

    /// Returns the next token, `None` at the end of input.
    pub fn next_token(&mut self) -> Option<Result<SpecToken, GenError>> {
        if let Some(tok) = self.pending.take() {
            return Some(Ok(tok));
        }
        while let Some(res) = self.inner.next() {
            let slice = self.inner.slice();
            let start = self.inner.span().start;
            let kind = match res {
                Ok(LogosToken::Comment) => continue,
                Ok(LogosToken::LineFeed) => {
                    let tok = self.token(SpecKind::LineFeed, slice, start);
                    self.line += 1;
                    self.line_start = self.inner.span().end;
                    return Some(Ok(tok));
                }
                Ok(LogosToken::Definition) => return Some(Ok(self.split_definition(slice, start))),
                Ok(LogosToken::EndOfBlock) => SpecKind::EndOfBlock,
                Ok(LogosToken::Arrow) => SpecKind::Arrow,
                Ok(LogosToken::Pipe) => SpecKind::Pipe,
                Ok(LogosToken::Epsilon) => SpecKind::Epsilon,
                Ok(LogosToken::NonTerminal) => SpecKind::NonTerminal,
                Ok(LogosToken::Ident) | Ok(LogosToken::Sym) => SpecKind::Terminal,
                Err(()) => {
                    return Some(Err(GenError::syntax(
                        format!("unrecognized input {:?}", slice),
                        self.position(start),
                    )));
                }
            };
            return Some(Ok(self.token(kind, slice, start)));
        }
        None
    }

    /// Tokenizes the entire input. The result always ends with a line feed
    /// followed by [`SpecKind::Eof`].
    pub fn tokenize_all(input: &'source str) -> Result<Vec<SpecToken>, GenError> {
        let mut lex = SpecLexer::new(input);
        let mut out = Vec::new();
        while let Some(tok) = lex.next_token() {
            out.push(tok?);
        }
        let end = lex.position(input.len());
        if out.last().is_some_and(|t| t.kind != SpecKind::LineFeed) {
            out.push(Token::new(SpecKind::LineFeed, "\n", end.line, end.column));
        }
        out.push(Token::new(SpecKind::Eof, "", end.line, end.column));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<SpecKind> {
        SpecLexer::tokenize_all(input)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn production_line() {
        use SpecKind::*;
        assert_eq!(
            kinds("<stmts> -> <stmt> ; <stmts> | EPSILON -- trailing\n"),
            vec![NonTerminal, Arrow, NonTerminal, Terminal, NonTerminal, Pipe, Epsilon, LineFeed, Eof]
        );
        assert_eq!(kinds("<a> ::= x"), vec![NonTerminal, Arrow, Terminal, LineFeed, Eof]);
    }

    #[test]
    fn definition_line_is_split() {
        let toks = SpecLexer::tokenize_all("  $DIGIT   [0-9] \n%%").unwrap();
        assert_eq!(toks[0].kind, SpecKind::Definition);
        assert_eq!(toks[0].value.as_str(), "DIGIT");
        assert_eq!(toks[0].position(), Position::new(1, 3));
        assert_eq!(toks[1].kind, SpecKind::Regex);
        assert_eq!(toks[1].value.as_str(), "[0-9]");
        assert_eq!(toks[1].position(), Position::new(1, 12));
        assert_eq!(toks[3].kind, SpecKind::EndOfBlock);
        assert_eq!(toks[3].position(), Position::new(2, 1));
    }

    #[test]
    fn definition_without_regex() {
        let toks = SpecLexer::tokenize_all("$EMPTY\n").unwrap();
        assert_eq!(toks[1].kind, SpecKind::Regex);
        assert!(toks[1].value.is_empty());
    }

    #[test]
    fn definition_line_has_no_comment() {
        let toks = SpecLexer::tokenize_all("$X a|b -- c\n").unwrap();
        assert_eq!(toks[1].value.as_str(), "a|b -- c");
    }

    #[test]
    fn epsilon_prefix_is_a_terminal() {
        use SpecKind::*;
        assert_eq!(kinds("EPSILONS"), vec![Terminal, LineFeed, Eof]);
    }

    #[test]
    fn unrecognized_input() {
        let err = SpecLexer::tokenize_all("<a> -> x\n  $").unwrap_err();
        assert_eq!(err.position(), Some(Position::new(2, 3)));
    }
}
