//! The LL(1) predictive parse table.

use crate::error::GenError;
use crate::ll1::first_follow::FirstFollow;
use crate::ll1::grammar::{Grammar, NonTerminal, Rule, Terminal};
use crate::ll1::symtab::Symtab;
use std::fmt;

/// Maps `(non-terminal, terminal)` to the rule to expand, if any.
///
/// A table only exists for grammars that are LL(1): [`ParseTable::build`]
/// refuses to return one if any cell would receive two rules. It is
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct ParseTable {
    rules: Vec<Rule>,
    terminals: Vec<Terminal>,
    non_terminals: Vec<NonTerminal>,
    term_tab: Symtab,
    nonterm_tab: Symtab,
    /// `cells[non_terminal][terminal]` is a rule index.
    cells: Vec<Vec<Option<usize>>>,
}

impl ParseTable {
    /// Builds the table from a grammar and its FIRST/FOLLOW sets.
    ///
    /// Every rule is entered under each terminal of its FIRST set and, if
    /// that set contains epsilon, under each terminal of FOLLOW(head).
    /// A second write to a cell fails with [`GenError::GrammarConflict`].
    pub fn build(grammar: &Grammar, sets: &FirstFollow) -> Result<Self, GenError> {
        let mut cells = vec![vec![None; grammar.terminals().len()]; grammar.non_terminals().len()];

        for (idx, rule) in grammar.rules().iter().enumerate() {
            let head = grammar.head(idx);
            let first = sets.rule_first(idx);
            let follow = first.epsilon.then(|| sets.follow(head));
            let targets = first
                .terminals
                .iter()
                .chain(follow.into_iter().flatten());
            for &t in targets {
                let cell: &mut Option<usize> = &mut cells[head][t];
                if let Some(existing) = *cell {
                    return Err(GenError::GrammarConflict {
                        non_terminal: rule.head.value().into(),
                        terminal: grammar.terminals()[t].value().into(),
                        existing: grammar.rules()[existing].to_string().into(),
                        incoming: rule.to_string().into(),
                    });
                }
                *cell = Some(idx);
            }
        }

        let filled = cells.iter().flatten().filter(|c| c.is_some()).count();
        log::debug!(
            "parse table: {} x {}, {} cells filled",
            grammar.non_terminals().len(),
            grammar.terminals().len(),
            filled
        );

        Ok(Self {
            rules: grammar.rules().to_vec(),
            terminals: grammar.terminals().to_vec(),
            non_terminals: grammar.non_terminals().to_vec(),
            term_tab: grammar.term_tab().clone(),
            nonterm_tab: grammar.nonterm_tab().clone(),
            cells,
        })
    }

    /// Looks up a cell by symbol names. Unknown names yield `None`.
    pub fn lookup(&self, non_terminal: &str, terminal: &str) -> Option<&Rule> {
        let row = self.nonterm_tab.idx(non_terminal)?;
        let col = self.term_tab.idx(terminal)?;
        self.cells[row][col].map(|r| &self.rules[r])
    }

    pub fn has_production(&self, non_terminal: &NonTerminal, terminal: &Terminal) -> bool {
        self.get_production(non_terminal, terminal).is_some()
    }

    pub fn get_production(&self, non_terminal: &NonTerminal, terminal: &Terminal) -> Option<&Rule> {
        self.lookup(non_terminal.value(), terminal.value())
    }

    /// Column keys, in order; the last one is `$`.
    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    /// Row keys, in order.
    pub fn non_terminals(&self) -> &[NonTerminal] {
        &self.non_terminals
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

impl fmt::Display for ParseTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, nt) in self.non_terminals.iter().enumerate() {
            writeln!(f, "non-terminal: {}", nt)?;
            for (col, t) in self.terminals.iter().enumerate() {
                if let Some(rule) = self.cells[row][col] {
                    writeln!(f, "\trule: \"{}\", on: {}", self.rules[rule], t)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ll1::grammar::tests::{n, nt, rule, t};
    use crate::spec::SpecKind;
    use crate::token::Token;

    fn build(rules: Vec<Rule>) -> Result<ParseTable, GenError> {
        let g = Grammar::new(rules)?;
        let ff = FirstFollow::compute(&g);
        ParseTable::build(&g, &ff)
    }

    fn stmts_grammar() -> Vec<Rule> {
        vec![
            rule("<program>", vec![t("begin"), n("<stmts>"), t("end")]),
            rule("<stmts>", vec![n("<stmt>"), n("<stmts>")]),
            rule("<stmts>", vec![]),
            rule("<stmt>", vec![t("ID"), t(";")]),
        ]
    }

    #[test]
    fn ll1_grammar_builds() {
        let table = build(stmts_grammar()).unwrap();
        let stmts = nt("<stmts>");
        let id = Terminal::new(Token::new(SpecKind::Terminal, "ID", 9, 9));
        let end = Terminal::new(Token::new(SpecKind::Terminal, "end", 9, 9));

        assert_eq!(
            table.get_production(&stmts, &id).map(|r| r.to_string()),
            Some("<stmts> -> <stmt> <stmts>".to_string())
        );
        assert!(table.get_production(&stmts, &end).unwrap().is_epsilon());
        assert!(!table.has_production(&nt("<program>"), &id));
        assert!(table.lookup("<program>", "begin").is_some());
        assert!(table.lookup("<nope>", "begin").is_none());
        assert!(table.lookup("<program>", "nope").is_none());
        assert!(table.lookup("<stmt>", "$").is_none());
    }

    #[test]
    fn epsilon_rule_on_end_marker() {
        let table = build(vec![rule("<s>", vec![t("a"), n("<s>")]), rule("<s>", vec![])]).unwrap();
        assert!(table.has_production(&nt("<s>"), &Terminal::end_marker()));
        assert_eq!(table.terminals().last().map(|t| t.value()), Some("$"));
    }

    #[test]
    fn shared_first_terminal_conflicts() {
        let err = build(vec![
            rule("<s>", vec![t("a"), t("b")]),
            rule("<s>", vec![t("a"), t("c")]),
        ])
        .unwrap_err();
        match err {
            GenError::GrammarConflict {
                non_terminal,
                terminal,
                existing,
                incoming,
            } => {
                assert_eq!(non_terminal.as_str(), "<s>");
                assert_eq!(terminal.as_str(), "a");
                assert_eq!(existing.as_str(), "<s> -> a b");
                assert_eq!(incoming.as_str(), "<s> -> a c");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn first_follow_overlap_conflicts() {
        // <a> may be empty and is followed by x, which it may also start with.
        let err = build(vec![
            rule("<s>", vec![n("<a>"), t("x")]),
            rule("<a>", vec![t("x")]),
            rule("<a>", vec![]),
        ])
        .unwrap_err();
        assert!(matches!(err, GenError::GrammarConflict { ref terminal, .. } if terminal == "x"));
    }

    #[test]
    fn display_is_deterministic() {
        let a = build(stmts_grammar()).unwrap().to_string();
        let b = build(stmts_grammar()).unwrap().to_string();
        assert_eq!(a, b);
        assert_eq!(
            a,
            "non-terminal: <program>\n\
             \trule: \"<program> -> begin <stmts> end\", on: begin\n\
             non-terminal: <stmts>\n\
             \trule: \"<stmts> -> EPSILON\", on: end\n\
             \trule: \"<stmts> -> <stmt> <stmts>\", on: ID\n\
             non-terminal: <stmt>\n\
             \trule: \"<stmt> -> ID ;\", on: ID\n"
        );
    }
}
