//! NFA model and the fragment algebra used by the regex compiler.
//!
//! An [`Nfa`] owns all of its states; transitions refer to their targets
//! by [`StateId`] index. While a fragment is being built it keeps a *tail*
//! (the point where the next atom is spliced), the tails of finished union
//! branches, and the entry/exit of its most recent atom so that a trailing
//! `*` or `+` can loop just that atom. [`Nfa::finalize`] resolves all of
//! this into a single accept state.
//!
//! Finalized fragments have two properties the composition operations rely
//! on: the start state has no incoming transitions and the accept state has
//! no outgoing ones. Looping a finalized fragment, or an atom built from
//! fresh states, therefore never leaks into surrounding structure.

use crate::regex::CharSet;
use indexmap::IndexMap;
use smartstring::alias::String;
use std::collections::BTreeMap;
use std::fmt;

/// Index of a state inside its owning [`Nfa`].
pub type StateId = usize;

/// The label of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Letter {
    /// Taken without consuming input.
    Epsilon,
    /// Taken on exactly this character.
    Char(char),
}

/// An outgoing edge of a [`State`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transition {
    pub letter: Letter,
    pub target: StateId,
}

/// A node of the automaton with its ordered outgoing transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    transitions: Vec<Transition>,
}

impl State {
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }
}

/// A nondeterministic finite automaton, or a fragment of one under
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nfa {
    states: Vec<State>,
    start: StateId,
    tail: StateId,
    branches: Vec<StateId>,
    last: Option<(StateId, StateId)>,
    accept: Option<StateId>,
}

impl Default for Nfa {
    fn default() -> Self {
        Self::new()
    }
}

impl Nfa {
    /// Creates an empty fragment: a lone start state that is also its tail.
    pub fn new() -> Self {
        Self {
            states: vec![State::default()],
            start: 0,
            tail: 0,
            branches: Vec::new(),
            last: None,
            accept: None,
        }
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    /// The accept state, once [`Nfa::finalize`] has run.
    pub fn accept(&self) -> Option<StateId> {
        self.accept
    }

    pub fn is_finalized(&self) -> bool {
        self.accept.is_some()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn add_state(&mut self) -> StateId {
        self.states.push(State::default());
        self.states.len() - 1
    }

    fn add_transition(&mut self, from: StateId, letter: Letter, target: StateId) {
        let t = Transition { letter, target };
        let state = &mut self.states[from];
        if !state.transitions.contains(&t) {
            state.transitions.push(t);
        }
    }

    /// Appends an atom matching any one character of `set` at the tail.
    pub fn concatenate_set(&mut self, set: &CharSet) {
        debug_assert!(self.accept.is_none(), "fragment already finalized");
        let entry = self.add_state();
        let exit = self.add_state();
        self.add_transition(self.tail, Letter::Epsilon, entry);
        for &c in set {
            self.add_transition(entry, Letter::Char(c), exit);
        }
        self.tail = exit;
        self.last = Some((entry, exit));
    }

    /// Appends an atom matching exactly `c` at the tail.
    pub fn concatenate_char(&mut self, c: char) {
        self.concatenate_set(&[c].into_iter().collect());
    }

    /// Splices `other` in at the tail. `other` is finalized first if needed
    /// and becomes the most recent atom of `self`.
    pub fn concatenate(&mut self, mut other: Nfa) {
        debug_assert!(self.accept.is_none(), "fragment already finalized");
        let other_accept = other.finalize();
        let offset = self.states.len();
        self.states.extend(other.states.into_iter().map(|mut s| {
            for t in s.transitions.iter_mut() {
                t.target += offset;
            }
            s
        }));
        let entry = other.start + offset;
        let exit = other_accept + offset;
        self.add_transition(self.tail, Letter::Epsilon, entry);
        self.tail = exit;
        self.last = Some((entry, exit));
    }

    /// Closes the current union branch; parsing continues with a new branch
    /// that starts again at the start state.
    pub fn alternate(&mut self) {
        debug_assert!(self.accept.is_none(), "fragment already finalized");
        self.branches.push(self.tail);
        self.tail = self.start;
        self.last = None;
    }

    /// Zero-or-more repetition of the most recent atom. No-op without one.
    pub fn repeat_kleene(&mut self) {
        if let Some((entry, exit)) = self.last {
            self.add_transition(entry, Letter::Epsilon, exit);
            self.add_transition(exit, Letter::Epsilon, entry);
        }
    }

    /// One-or-more repetition of the most recent atom. No-op without one.
    pub fn repeat_plus(&mut self) {
        if let Some((entry, exit)) = self.last {
            self.add_transition(exit, Letter::Epsilon, entry);
        }
    }

    /// Zero-or-more repetition of the whole fragment, finalizing it first.
    pub fn repeat_kleene_whole(&mut self) {
        let accept = self.finalize();
        self.add_transition(self.start, Letter::Epsilon, accept);
        self.add_transition(accept, Letter::Epsilon, self.start);
        self.last = Some((self.start, accept));
    }

    /// One-or-more repetition of the whole fragment, finalizing it first.
    pub fn repeat_plus_whole(&mut self) {
        let accept = self.finalize();
        self.add_transition(accept, Letter::Epsilon, self.start);
        self.last = Some((self.start, accept));
    }

    /// Creates the accept state and joins every pending branch tail to it.
    /// Idempotent; returns the accept state.
    pub fn finalize(&mut self) -> StateId {
        if let Some(accept) = self.accept {
            return accept;
        }
        let accept = self.add_state();
        let tails: Vec<StateId> = self
            .branches
            .drain(..)
            .chain(std::iter::once(self.tail))
            .collect();
        for tail in tails {
            self.add_transition(tail, Letter::Epsilon, accept);
        }
        self.tail = accept;
        self.accept = Some(accept);
        accept
    }

    /// States reachable from `states` through epsilon transitions alone.
    #[cfg(test)]
    fn epsilon_closure(&self, states: &mut Vec<StateId>) {
        let mut stack = states.clone();
        while let Some(s) = stack.pop() {
            for t in &self.states[s].transitions {
                if t.letter == Letter::Epsilon && !states.contains(&t.target) {
                    states.push(t.target);
                    stack.push(t.target);
                }
            }
        }
    }

    /// Simulates the automaton on `input`. Test-only; matching belongs to
    /// the scanner.
    #[cfg(test)]
    pub(crate) fn accepts(&self, input: &str) -> bool {
        let Some(accept) = self.accept else {
            return false;
        };
        let mut current = vec![self.start];
        self.epsilon_closure(&mut current);
        for c in input.chars() {
            let mut next = Vec::new();
            for &s in &current {
                for t in &self.states[s].transitions {
                    if t.letter == Letter::Char(c) && !next.contains(&t.target) {
                        next.push(t.target);
                    }
                }
            }
            self.epsilon_closure(&mut next);
            current = next;
        }
        current.contains(&accept)
    }
}

/// One line per (state, target) pair; character labels are collapsed into
/// a bracket class.
impl fmt::Display for Nfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "start: {}, accept: {}, states: {}",
            self.start,
            self.accept
                .map(|a| a.to_string())
                .unwrap_or_else(|| "-".to_string()),
            self.states.len()
        )?;
        for (i, state) in self.states.iter().enumerate() {
            let mut by_target: BTreeMap<StateId, (bool, CharSet)> = BTreeMap::new();
            for t in &state.transitions {
                let entry = by_target.entry(t.target).or_default();
                match t.letter {
                    Letter::Epsilon => entry.0 = true,
                    Letter::Char(c) => {
                        entry.1.insert(c);
                    }
                }
            }
            for (target, (eps, set)) in by_target {
                if eps {
                    writeln!(f, "  {} -eps-> {}", i, target)?;
                }
                if !set.is_empty() {
                    writeln!(f, "  {} -{}-> {}", i, set, target)?;
                }
            }
        }
        Ok(())
    }
}

/// A compiled token definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NfaIdentifier {
    /// The defined name, `None` until the definition is registered.
    pub name: Option<String>,
    /// The finalized automaton.
    pub nfa: Nfa,
    /// The character set, when the definition is a pure character class.
    pub class: Option<CharSet>,
}

impl NfaIdentifier {
    pub fn new(nfa: Nfa, class: Option<CharSet>) -> Self {
        Self {
            name: None,
            nfa,
            class,
        }
    }

    /// Whether this definition may be used as an exclusion operand.
    pub fn is_char_class(&self) -> bool {
        self.class.is_some()
    }
}

/// Defined identifiers in declaration order.
#[derive(Debug, Clone, Default)]
pub struct NfaRegistry {
    defined: IndexMap<String, NfaIdentifier>,
}

impl NfaRegistry {
    pub fn new() -> Self {
        Self {
            defined: IndexMap::new(),
        }
    }

    /// Registers `ident` under `name`. Returns `false` and leaves the
    /// registry untouched if `name` is already defined.
    pub fn define(&mut self, name: impl AsRef<str>, mut ident: NfaIdentifier) -> bool {
        let name: String = name.as_ref().into();
        if self.defined.contains_key(&name) {
            return false;
        }
        ident.name = Some(name.clone());
        self.defined.insert(name, ident);
        true
    }

    pub fn get(&self, name: &str) -> Option<&NfaIdentifier> {
        self.defined.get(name)
    }

    pub fn len(&self) -> usize {
        self.defined.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defined.is_empty()
    }

    /// Identifiers in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &NfaIdentifier> {
        self.defined.values()
    }
}
