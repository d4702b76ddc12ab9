//! Specification parser.
//!
//! A [`chumsky`] grammar over [`SpecToken`] slices:
//!
//! ```text
//! spec        := (definition | LF)* '%%' block* lines EOF
//! definition  := DEFINITION REGEX LF
//! block       := lines '%%'
//! lines       := (production | LF)*
//! production  := NONTERMINAL '->' body ('|' body)* LF
//! body        := 'EPSILON' | symbol*
//! ```

use crate::error::{GenError, Position};
use crate::ll1::{NonTerminal, Rule, Symbol, Terminal};
use crate::spec::lexer::{SpecKind, SpecLexer, SpecToken};
use crate::token::Token;
use chumsky::prelude::*;

/// A token definition `$NAME regex`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub name: SpecToken,
    pub regex: SpecToken,
}

/// The parsed contents of a specification file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Specification {
    /// Token definitions in file order.
    pub definitions: Vec<Definition>,
    /// Production alternatives of all blocks, one rule each, in file order.
    pub rules: Vec<Rule>,
}

type Extra<'a> = extra::Err<Rich<'a, SpecToken>>;

pub fn parser<'a>() -> impl Parser<'a, &'a [SpecToken], Specification, Extra<'a>> {
    let lf = select! { Token { kind: SpecKind::LineFeed, .. } => () }.labelled("end of line");
    let end_block = select! { Token { kind: SpecKind::EndOfBlock, .. } => () }.labelled("`%%`");
    let eof = select! { Token { kind: SpecKind::Eof, .. } => () }.labelled("end of input");
    let arrow = select! { Token { kind: SpecKind::Arrow, .. } => () }.labelled("`->`");
    let pipe = select! { Token { kind: SpecKind::Pipe, .. } => () }.labelled("`|`");
    let epsilon = select! { Token { kind: SpecKind::Epsilon, .. } => () }.labelled("EPSILON");

    let name = select! { tok @ Token { kind: SpecKind::Definition, .. } => tok }.labelled("definition");
    let regex = select! { tok @ Token { kind: SpecKind::Regex, .. } => tok }.labelled("regex");

    let definition = name
        .then(regex)
        .then_ignore(lf.clone())
        .map(|(name, regex)| Some(Definition { name, regex }));

    let definitions = definition
        .or(lf.clone().map(|_| None))
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(end_block.clone())
        .map(|items| items.into_iter().flatten().collect::<Vec<_>>());

    let symbol = select! {
        tok @ Token { kind: SpecKind::Terminal, .. } => Symbol::Terminal(Terminal::new(tok)),
        tok @ Token { kind: SpecKind::NonTerminal, .. } => Symbol::NonTerminal(NonTerminal::new(tok)),
    }
    .labelled("symbol");

    let body = epsilon
        .map(|_| Vec::new())
        .or(symbol.repeated().collect::<Vec<_>>());

    let head = select! {
        tok @ Token { kind: SpecKind::NonTerminal, .. } => NonTerminal::new(tok),
    }
    .labelled("non-terminal");

    let production = head
        .then_ignore(arrow)
        .then(body.separated_by(pipe).at_least(1).collect::<Vec<_>>())
        .then_ignore(lf.clone())
        .map(|(lhs, bodies)| {
            bodies
                .into_iter()
                .map(|rhs| Rule::new(lhs.clone(), rhs))
                .collect::<Vec<_>>()
        });

    let lines = production
        .or(lf.map(|_| Vec::new()))
        .repeated()
        .collect::<Vec<_>>()
        .map(|items| items.into_iter().flatten().collect::<Vec<Rule>>());

    let blocks = lines
        .clone()
        .then_ignore(end_block)
        .repeated()
        .collect::<Vec<_>>();

    definitions
        .then(blocks)
        .then(lines)
        .then_ignore(eof)
        .then_ignore(end())
        .map(|((definitions, blocks), tail)| Specification {
            definitions,
            rules: blocks.into_iter().flatten().chain(tail).collect(),
        })
}

/// Parses a token stream produced by [`SpecLexer::tokenize_all`].
pub fn parse(tokens: &[SpecToken]) -> Result<Specification, GenError> {
    parser().parse(tokens).into_result().map_err(|errs| {
        match errs.into_iter().next() {
            Some(err) => syntax_error(&err, tokens),
            None => GenError::syntax("malformed specification", Position::new(1, 1)),
        }
    })
}

/// Tokenizes and parses specification text.
pub fn parse_str(input: &str) -> Result<Specification, GenError> {
    let tokens = SpecLexer::tokenize_all(input)?;
    let spec = parse(&tokens)?;
    log::debug!(
        "specification: {} definitions, {} rules",
        spec.definitions.len(),
        spec.rules.len()
    );
    Ok(spec)
}

fn describe(tok: &SpecToken) -> String {
    match tok.kind {
        SpecKind::LineFeed => "end of line".to_string(),
        SpecKind::Eof => "end of input".to_string(),
        SpecKind::Definition => format!("definition `${}`", tok.value),
        _ => format!("`{}`", tok.value),
    }
}

/// Converts a parser error, whose span counts tokens, into a positioned
/// [`GenError::Syntax`].
fn syntax_error(err: &Rich<'_, SpecToken>, tokens: &[SpecToken]) -> GenError {
    let pos = tokens
        .get(err.span().start)
        .or(tokens.last())
        .map(Token::position)
        .unwrap_or(Position::new(1, 1));
    let found = err.found().map_or("end of input".to_string(), describe);
    let expected = err
        .expected()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let message = if expected.is_empty() {
        format!("unexpected {}", found)
    } else {
        format!("unexpected {}, expected {}", found, expected)
    };
    GenError::syntax(message, pos)
}
