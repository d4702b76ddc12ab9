//! Regular-expression front end of the scanner generator.
//!
//! Each token definition is tokenized by [`RegexLexer`] and compiled by
//! [`compile`] into an [`NfaIdentifier`](crate::nfa::NfaIdentifier). The
//! supported syntax is union, concatenation, `*`, `+`, the `.` wildcard,
//! bracketed classes with ranges, `[^X] IN Y` exclusions, and `$NAME`
//! references to earlier definitions.

mod charset;
mod compiler;
mod lexer;

pub use charset::{CharSet, DOT, RESERVED, class_literal, regex_literal};
pub use compiler::{compile, compile_str};
pub use lexer::{RegexKind, RegexLexer};
