//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! Scanner and LL(1) parse-table generator for MiniRE-style language
//! specifications.
//!
//! A specification declares named tokens as regular expressions and the
//! language's syntax as context-free productions. `minire-gen` turns it
//! into two artifacts:
//!  * one finalized NFA per token definition ([`nfa::NfaRegistry`]), built
//!    by the recursive-descent compiler in [`regex`];
//!  * an LL(1) predictive parse table ([`ll1::ParseTable`]), built from
//!    FIRST/FOLLOW sets of the grammar.
//!
//! [`generate::generate_from_str`] runs the whole pipeline on specification
//! text; [`generate::generate`] does the same for a file and writes a
//! report.

pub mod error;
pub mod generate;
pub mod ll1;
pub mod nfa;
pub mod regex;
pub mod spec;
pub mod token;

pub use error::{GenError, Position};
pub use generate::{Generated, generate, generate_from_str};
pub use ll1::{Grammar, NonTerminal, ParseTable, Rule, Symbol, Terminal};
pub use nfa::{Nfa, NfaIdentifier, NfaRegistry};
pub use token::Token;
