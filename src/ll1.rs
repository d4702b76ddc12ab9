//! LL(1) parse-table generation.
//!
//! A [`Grammar`] is built from the rules read out of a specification, its
//! FIRST and FOLLOW sets are computed into a [`FirstFollow`] side table,
//! and the two together produce a [`ParseTable`].

mod first_follow;
mod grammar;
mod symtab;
mod table;

pub use first_follow::{
    FirstFollow, FirstSet, first_pass, first_sets, follow_pass, follow_sets, sequence_first,
    write_first_follow,
};
pub use grammar::{END_MARKER, EPSILON, Grammar, NonTerminal, Rule, Symbol, SymbolId, Terminal};
pub use symtab::Symtab;
pub use table::ParseTable;
