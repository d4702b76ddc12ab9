//! Insertion-ordered symbol tables.
//!
//! A [`Symtab`] gives every distinct symbol value a stable index equal to
//! the order in which it was first added. The grammar uses one table for
//! terminals and one for non-terminals; those indices are the fixed
//! column and row orderings of the parse table.

use indexmap::IndexSet;
use smartstring::alias::String;

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Symtab {
    set: IndexSet<String>,
}

impl Symtab {
    pub fn new() -> Self {
        Self {
            set: IndexSet::new(),
        }
    }

    /// Inserts `sym` if missing and returns its index.
    pub fn add(&mut self, sym: &str) -> usize {
        if let Some(idx) = self.set.get_index_of(sym) {
            return idx;
        }
        self.set.insert_full(String::from(sym)).0
    }

    pub fn idx(&self, sym: &str) -> Option<usize> {
        self.set.get_index_of(sym)
    }

    pub fn sym(&self, idx: usize) -> Option<&str> {
        self.set.get_index(idx).map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.set.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}
