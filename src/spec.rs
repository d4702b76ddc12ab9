//! Specification files: token definitions followed by grammar productions.

mod lexer;
mod parser;

pub use lexer::{SpecKind, SpecLexer, SpecToken};
pub use parser::{Definition, Specification, parse, parse_str, parser};
