//! Grammar model.
//!
//! [`Terminal`] and [`NonTerminal`] wrap the spec token they were read from
//! but compare and hash by value only, so the same name written at two
//! places is one symbol. A [`Grammar`] freezes an ordered list of rules and
//! assigns every symbol a dense index: terminals in order of first
//! appearance in the bodies followed by the end marker `$`, non-terminals
//! in order of first appearance with heads first.

use crate::error::GenError;
use crate::ll1::symtab::Symtab;
use crate::spec::SpecKind;
use crate::token::Token;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Name of the end-of-input terminal.
pub const END_MARKER: &str = "$";

/// Printed for a rule with an empty body.
pub const EPSILON: &str = "EPSILON";

macro_rules! symbol_wrapper {
    ($name:ident) => {
        impl $name {
            pub fn new(token: Token<SpecKind>) -> Self {
                Self(token)
            }

            /// The symbol's name as written in the specification.
            #[inline]
            pub fn value(&self) -> &str {
                &self.0.value
            }

            /// The token of the occurrence this symbol was built from.
            #[inline]
            pub fn token(&self) -> &Token<SpecKind> {
                &self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.0.value == other.0.value
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.value.hash(state)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0.value)
            }
        }
    };
}

/// A terminal symbol; a column of the parse table.
#[derive(Debug, Clone)]
pub struct Terminal(Token<SpecKind>);

symbol_wrapper!(Terminal);

impl Terminal {
    /// The distinguished end-of-input terminal `$`.
    pub fn end_marker() -> Self {
        Self(Token::new(SpecKind::Eof, END_MARKER, 0, 0))
    }

    pub fn is_end_marker(&self) -> bool {
        self.value() == END_MARKER
    }
}

/// A non-terminal symbol; a row of the parse table.
#[derive(Debug, Clone)]
pub struct NonTerminal(Token<SpecKind>);

symbol_wrapper!(NonTerminal);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    Terminal(Terminal),
    NonTerminal(NonTerminal),
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Terminal(t) => t.fmt(f),
            Symbol::NonTerminal(n) => n.fmt(f),
        }
    }
}

/// One production alternative `head -> body`. An empty body is an
/// epsilon production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub head: NonTerminal,
    pub body: Vec<Symbol>,
}

impl Rule {
    pub fn new(head: NonTerminal, body: Vec<Symbol>) -> Self {
        Self { head, body }
    }

    pub fn is_epsilon(&self) -> bool {
        self.body.is_empty()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.head)?;
        if self.body.is_empty() {
            return write!(f, " {}", EPSILON);
        }
        for sym in &self.body {
            write!(f, " {}", sym)?;
        }
        Ok(())
    }
}

/// A symbol by index into the grammar's tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolId {
    Terminal(usize),
    NonTerminal(usize),
}

/// An immutable context-free grammar with indexed symbols.
#[derive(Debug, Clone)]
pub struct Grammar {
    rules: Vec<Rule>,
    term_tab: Symtab,
    nonterm_tab: Symtab,
    terminals: Vec<Terminal>,
    non_terminals: Vec<NonTerminal>,
    heads: Vec<usize>,
    bodies: Vec<Vec<SymbolId>>,
}

impl Grammar {
    /// Indexes `rules`. The head of the first rule is the start symbol.
    ///
    /// Fails with [`GenError::UndefinedReference`] if a body mentions a
    /// non-terminal that heads no rule.
    pub fn new(rules: Vec<Rule>) -> Result<Self, GenError> {
        let mut term_tab = Symtab::new();
        let mut nonterm_tab = Symtab::new();
        let mut terminals = Vec::new();
        let mut non_terminals = Vec::new();

        for rule in &rules {
            if nonterm_tab.idx(rule.head.value()).is_none() {
                nonterm_tab.add(rule.head.value());
                non_terminals.push(rule.head.clone());
            }
        }

        let mut bodies = Vec::with_capacity(rules.len());
        for rule in &rules {
            let mut body = Vec::with_capacity(rule.body.len());
            for sym in &rule.body {
                match sym {
                    Symbol::Terminal(t) => {
                        if term_tab.idx(t.value()).is_none() {
                            terminals.push(t.clone());
                        }
                        body.push(SymbolId::Terminal(term_tab.add(t.value())));
                    }
                    Symbol::NonTerminal(n) => match nonterm_tab.idx(n.value()) {
                        Some(idx) => body.push(SymbolId::NonTerminal(idx)),
                        None => {
                            return Err(GenError::UndefinedReference {
                                name: n.value().into(),
                                pos: n.token().position(),
                            });
                        }
                    },
                }
            }
            bodies.push(body);
        }

        let end = Terminal::end_marker();
        term_tab.add(end.value());
        terminals.push(end);

        let heads = rules
            .iter()
            .map(|r| nonterm_tab.idx(r.head.value()).unwrap_or_default())
            .collect();

        log::debug!(
            "grammar: {} rules, {} non-terminals, {} terminals",
            rules.len(),
            non_terminals.len(),
            terminals.len()
        );

        Ok(Self {
            rules,
            term_tab,
            nonterm_tab,
            terminals,
            non_terminals,
            heads,
            bodies,
        })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Terminals in column order; the last one is `$`.
    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    /// Non-terminals in row order.
    pub fn non_terminals(&self) -> &[NonTerminal] {
        &self.non_terminals
    }

    /// Index of the start symbol, or `None` for a grammar without rules.
    pub fn start(&self) -> Option<usize> {
        if self.rules.is_empty() { None } else { Some(0) }
    }

    /// Index of the end marker `$`.
    pub fn end_marker(&self) -> usize {
        self.terminals.len() - 1
    }

    pub fn terminal_index(&self, name: &str) -> Option<usize> {
        self.term_tab.idx(name)
    }

    pub fn non_terminal_index(&self, name: &str) -> Option<usize> {
        self.nonterm_tab.idx(name)
    }

    /// Row index of the head of rule `rule`.
    pub fn head(&self, rule: usize) -> usize {
        self.heads[rule]
    }

    /// Body of rule `rule` as symbol indices.
    pub fn body(&self, rule: usize) -> &[SymbolId] {
        &self.bodies[rule]
    }

    pub(crate) fn term_tab(&self) -> &Symtab {
        &self.term_tab
    }

    pub(crate) fn nonterm_tab(&self) -> &Symtab {
        &self.nonterm_tab
    }
}
