//! FIRST and FOLLOW sets.
//!
//! Both are computed by fixed-point iteration over the rules and kept in a
//! side table ([`FirstFollow`]) indexed by non-terminal and rule index; the
//! [`Grammar`] itself is never touched.

use crate::ll1::grammar::{Grammar, SymbolId};
use std::collections::BTreeSet;
use std::io::{self, Write};

/// A set of terminal indices plus the epsilon flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstSet {
    pub terminals: BTreeSet<usize>,
    pub epsilon: bool,
}

impl FirstSet {
    pub fn contains(&self, terminal: usize) -> bool {
        self.terminals.contains(&terminal)
    }

    /// Adds the terminals of `other`, ignoring its epsilon flag. Returns
    /// `true` if anything was added.
    fn absorb(&mut self, other: &FirstSet) -> bool {
        let before = self.terminals.len();
        self.terminals.extend(other.terminals.iter().copied());
        self.terminals.len() != before
    }
}

/// FIRST of the symbol sequence `seq` under the non-terminal sets `first`.
/// The empty sequence yields `{ε}`.
pub fn sequence_first(seq: &[SymbolId], first: &[FirstSet]) -> FirstSet {
    let mut out = FirstSet::default();
    for sym in seq {
        match *sym {
            SymbolId::Terminal(t) => {
                out.terminals.insert(t);
                return out;
            }
            SymbolId::NonTerminal(n) => {
                out.absorb(&first[n]);
                if !first[n].epsilon {
                    return out;
                }
            }
        }
    }
    out.epsilon = true;
    out
}

/// One pass of the FIRST computation. Returns `true` if any set grew.
pub fn first_pass(grammar: &Grammar, first: &mut [FirstSet]) -> bool {
    let mut changed = false;
    for rule in 0..grammar.rules().len() {
        let lhs = grammar.head(rule);
        let body_first = sequence_first(grammar.body(rule), first);
        changed |= first[lhs].absorb(&body_first);
        if body_first.epsilon && !first[lhs].epsilon {
            first[lhs].epsilon = true;
            changed = true;
        }
    }
    changed
}

/// Computes FIRST sets for all non-terminals.
pub fn first_sets(grammar: &Grammar) -> Vec<FirstSet> {
    let mut first = vec![FirstSet::default(); grammar.non_terminals().len()];
    let mut passes = 1;
    while first_pass(grammar, &mut first) {
        passes += 1;
    }
    log::trace!("FIRST converged after {} passes", passes);
    first
}

/// One pass of the FOLLOW computation. Returns `true` if any set grew.
pub fn follow_pass(grammar: &Grammar, first: &[FirstSet], follow: &mut [BTreeSet<usize>]) -> bool {
    let mut changed = false;
    for rule in 0..grammar.rules().len() {
        let lhs = grammar.head(rule);
        let rhs = grammar.body(rule);
        for (i, sym) in rhs.iter().enumerate() {
            let SymbolId::NonTerminal(b) = *sym else {
                continue;
            };
            let beta = sequence_first(&rhs[i + 1..], first);
            for &f in &beta.terminals {
                changed |= follow[b].insert(f);
            }
            if beta.epsilon {
                let follow_lhs = follow[lhs].clone();
                for f in follow_lhs {
                    changed |= follow[b].insert(f);
                }
            }
        }
    }
    changed
}

/// Computes FOLLOW sets for all non-terminals. The start symbol is
/// followed by the end marker.
pub fn follow_sets(grammar: &Grammar, first: &[FirstSet]) -> Vec<BTreeSet<usize>> {
    let mut follow = vec![BTreeSet::new(); grammar.non_terminals().len()];
    if let Some(start) = grammar.start() {
        follow[start].insert(grammar.end_marker());
    }
    let mut passes = 1;
    while follow_pass(grammar, first, &mut follow) {
        passes += 1;
    }
    log::trace!("FOLLOW converged after {} passes", passes);
    follow
}

/// The converged FIRST/FOLLOW side table of a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstFollow {
    first: Vec<FirstSet>,
    follow: Vec<BTreeSet<usize>>,
    rule_first: Vec<FirstSet>,
}

impl FirstFollow {
    pub fn compute(grammar: &Grammar) -> Self {
        let first = first_sets(grammar);
        let follow = follow_sets(grammar, &first);
        let rule_first = (0..grammar.rules().len())
            .map(|rule| sequence_first(grammar.body(rule), &first))
            .collect();
        Self {
            first,
            follow,
            rule_first,
        }
    }

    /// FIRST of non-terminal `nt`.
    pub fn first(&self, nt: usize) -> &FirstSet {
        &self.first[nt]
    }

    /// FOLLOW of non-terminal `nt`.
    pub fn follow(&self, nt: usize) -> &BTreeSet<usize> {
        &self.follow[nt]
    }

    /// FIRST of the body of rule `rule`.
    pub fn rule_first(&self, rule: usize) -> &FirstSet {
        &self.rule_first[rule]
    }
}

/// Writes FIRST and FOLLOW sets, one line per non-terminal.
///
/// ```text
/// FIRST,<non-terminal>,{`empty', t1, t2, }
/// FOLLOW,<non-terminal>,{t1, $, }
/// ```
pub fn write_first_follow<W: Write>(
    out: &mut W,
    grammar: &Grammar,
    sets: &FirstFollow,
) -> io::Result<()> {
    let terms = grammar.term_tab();
    for (nt, name) in grammar.nonterm_tab().iter().enumerate() {
        write!(out, "FIRST,{},{{", name)?;
        if sets.first(nt).epsilon {
            write!(out, "`empty', ")?;
        }
        for &t in &sets.first(nt).terminals {
            write!(out, "{}, ", terms.sym(t).unwrap_or("?"))?;
        }
        writeln!(out, "}}")?;
    }
    for (nt, name) in grammar.nonterm_tab().iter().enumerate() {
        write!(out, "FOLLOW,{},{{", name)?;
        for &t in sets.follow(nt) {
            write!(out, "{}, ", terms.sym(t).unwrap_or("?"))?;
        }
        writeln!(out, "}}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ll1::grammar::tests::{n, rule, t};

    fn names(grammar: &Grammar, set: &BTreeSet<usize>) -> Vec<String> {
        set.iter()
            .map(|&i| grammar.terminals()[i].value().to_string())
            .collect()
    }

    /// <s> -> <a> c ; <a> -> a | EPSILON ; <b> -> <a> <a>
    fn nullable_grammar() -> Grammar {
        Grammar::new(vec![
            rule("<s>", vec![n("<a>"), t("c"), n("<b>")]),
            rule("<a>", vec![t("a")]),
            rule("<a>", vec![]),
            rule("<b>", vec![n("<a>"), n("<a>")]),
        ])
        .unwrap()
    }

    #[test]
    fn first_of_terminal_only_and_epsilon_rules() {
        let g = Grammar::new(vec![
            rule("<s>", vec![t("x"), t("y")]),
            rule("<e>", vec![]),
        ])
        .unwrap();
        let ff = FirstFollow::compute(&g);
        assert_eq!(names(&g, &ff.first(0).terminals), vec!["x"]);
        assert!(!ff.first(0).epsilon);
        assert!(ff.first(1).terminals.is_empty());
        assert!(ff.first(1).epsilon);
    }

    #[test]
    fn first_through_nullable_prefix() {
        let g = nullable_grammar();
        let ff = FirstFollow::compute(&g);
        assert_eq!(names(&g, &ff.first(0).terminals), vec!["c", "a"]);
        assert!(!ff.first(0).epsilon);
        assert!(ff.first(2).epsilon);
        assert_eq!(names(&g, &ff.first(2).terminals), vec!["a"]);
        assert!(ff.rule_first(2).epsilon);
        assert!(ff.rule_first(3).epsilon);
        assert!(!ff.rule_first(1).epsilon);
    }

    #[test]
    fn follow_sets_propagate_head_follow() {
        let g = nullable_grammar();
        let ff = FirstFollow::compute(&g);
        assert_eq!(names(&g, ff.follow(0)), vec!["$"]);
        // <a> is followed by c, by another <a>, and by whatever follows <b>
        assert_eq!(names(&g, ff.follow(1)), vec!["c", "a", "$"]);
        assert_eq!(names(&g, ff.follow(2)), vec!["$"]);
    }

    #[test]
    fn passes_are_idempotent_after_convergence() {
        let g = nullable_grammar();
        let mut first = first_sets(&g);
        let snapshot = first.clone();
        assert!(!first_pass(&g, &mut first));
        assert_eq!(first, snapshot);

        let mut follow = follow_sets(&g, &first);
        let snapshot = follow.clone();
        assert!(!follow_pass(&g, &first, &mut follow));
        assert_eq!(follow, snapshot);
    }

    #[test]
    fn left_to_right_order_needs_several_passes() {
        // <s> refers forward to <c>, which is only resolved later in the list.
        let g = Grammar::new(vec![
            rule("<s>", vec![n("<b>")]),
            rule("<b>", vec![n("<c>")]),
            rule("<c>", vec![t("z")]),
        ])
        .unwrap();
        let ff = FirstFollow::compute(&g);
        assert_eq!(names(&g, &ff.first(0).terminals), vec!["z"]);
        assert_eq!(names(&g, ff.follow(2)), vec!["$"]);
    }

    #[test]
    fn report_format() {
        let g = Grammar::new(vec![rule("<s>", vec![t("x")]), rule("<s>", vec![])]).unwrap();
        let ff = FirstFollow::compute(&g);
        let mut buf = Vec::new();
        write_first_follow(&mut buf, &g, &ff).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "FIRST,<s>,{`empty', x, }\nFOLLOW,<s>,{$, }\n"
        );
    }
}
