//! Recursive-descent regex compiler.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! regex     -> branch ( '|' branch )*
//! branch    -> ( atom repeat? )*
//! repeat    -> '*' | '+'
//! atom      -> '(' regex ')' | LITERAL | '.' | '[' class ']' | DEFINED
//! class     -> member+ | '^' member+ ']' IN operand
//! member    -> CLS_CHAR ( '-' CLS_CHAR )?
//! operand   -> '[' member+ ']' | DEFINED
//! ```
//!
//! The compiler keeps an owned stack of NFA fragments. The bottom fragment
//! is the definition being compiled; every open group pushes one more.
//! Atoms are spliced onto the top fragment, `|` closes a branch of the top
//! fragment, and a closing `)` splices the group fragment back into its
//! parent, looping the whole group first when a repetition follows.
//!
//! The compiler only ever peeks one token ahead, so rejecting an
//! alternative never consumes input.

use super::charset::{self, CharSet, DOT};
use super::lexer::{RegexKind, RegexLexer};
use crate::error::{GenError, Position};
use crate::nfa::{Nfa, NfaIdentifier, NfaRegistry};
use crate::token::Token;
use std::iter::Peekable;

/// Compiles one definition's token stream into an [`NfaIdentifier`].
///
/// References (`$NAME`) resolve against `registry` eagerly, so only
/// identifiers defined earlier are visible.
pub fn compile<I>(tokens: I, registry: &NfaRegistry) -> Result<NfaIdentifier, GenError>
where
    I: IntoIterator<Item = Token<RegexKind>>,
{
    Compiler::new(tokens.into_iter(), registry).run()
}

/// Tokenizes `regex` (whose first character sits at `origin`) and compiles it.
pub fn compile_str(
    regex: &str,
    origin: Position,
    registry: &NfaRegistry,
) -> Result<NfaIdentifier, GenError> {
    let tokens = RegexLexer::tokenize_all(regex, origin)?;
    Compiler::new(tokens.into_iter(), registry)
        .with_origin(origin)
        .run()
}

/// Definition-wide flags threaded through the descent.
#[derive(Debug)]
struct Context {
    /// Nothing but class atoms has been seen.
    pure: bool,
    /// Number of atoms in the whole definition.
    atoms: usize,
    /// Character set of the most recent class atom.
    class: Option<CharSet>,
}

impl Context {
    fn new() -> Self {
        Self {
            pure: true,
            atoms: 0,
            class: None,
        }
    }

    fn note_class(&mut self, set: CharSet) {
        self.atoms += 1;
        self.class = Some(set);
    }

    fn note_other(&mut self) {
        self.atoms += 1;
        self.pure = false;
    }

    /// The character set, if the definition is exactly one class atom.
    fn into_class(self) -> Option<CharSet> {
        if self.pure && self.atoms == 1 {
            self.class
        } else {
            None
        }
    }
}

/// What the last atom was; a group needs its fragment spliced back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Atom {
    Single,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repeat {
    Kleene,
    Plus,
}

struct Compiler<'r, I: Iterator<Item = Token<RegexKind>>> {
    tokens: Peekable<I>,
    registry: &'r NfaRegistry,
    stack: Vec<Nfa>,
    /// Position just past the last consumed token.
    end: Position,
}

impl<'r, I: Iterator<Item = Token<RegexKind>>> Compiler<'r, I> {
    fn new(tokens: I, registry: &'r NfaRegistry) -> Self {
        Self {
            tokens: tokens.peekable(),
            registry,
            stack: Vec::new(),
            end: Position::new(1, 1),
        }
    }

    fn with_origin(mut self, origin: Position) -> Self {
        self.end = origin;
        self
    }

    fn run(mut self) -> Result<NfaIdentifier, GenError> {
        let mut ctx = Context::new();
        self.stack.push(Nfa::new());
        self.regex(&mut ctx)?;
        if let Some(tok) = self.tokens.peek() {
            return Err(unexpected(tok));
        }
        let mut nfa = self.pop()?;
        nfa.finalize();
        if !self.stack.is_empty() {
            return Err(GenError::structural("unbalanced operand stack", self.end));
        }
        let class = ctx.into_class();
        log::trace!(
            "[regex] compiled {} states, char class: {}",
            nfa.len(),
            class.is_some()
        );
        Ok(NfaIdentifier::new(nfa, class))
    }

    fn peek_kind(&mut self) -> Option<RegexKind> {
        self.tokens.peek().map(|t| t.kind)
    }

    fn advance(&mut self) -> Option<Token<RegexKind>> {
        let tok = self.tokens.next()?;
        self.end = Position::new(tok.line, tok.column + tok.value.len());
        Some(tok)
    }

    /// Consumes a token of `kind`; `what` names the construct left open
    /// when the input ends instead.
    fn expect(&mut self, kind: RegexKind, what: &str) -> Result<Token<RegexKind>, GenError> {
        match self.peek_kind() {
            Some(k) if k == kind => self.advance().ok_or_else(|| self.eoi(what)),
            _ => Err(self.unexpected_here(what)),
        }
    }

    /// Error for the token under the cursor, or for running out of input
    /// inside `what`.
    fn unexpected_here(&mut self, what: &str) -> GenError {
        match self.tokens.peek() {
            Some(tok) => unexpected(tok),
            None => self.eoi(what),
        }
    }

    fn peek_position(&mut self) -> Position {
        let end = self.end;
        self.tokens.peek().map(|t| t.position()).unwrap_or(end)
    }

    fn eoi(&self, what: &str) -> GenError {
        GenError::structural(format!("unterminated {}", what), self.end)
    }

    fn top(&mut self) -> Result<&mut Nfa, GenError> {
        let end = self.end;
        self.stack
            .last_mut()
            .ok_or_else(|| GenError::structural("empty operand stack", end))
    }

    fn pop(&mut self) -> Result<Nfa, GenError> {
        self.stack
            .pop()
            .ok_or_else(|| GenError::structural("empty operand stack", self.end))
    }

    /// regex -> branch ( '|' branch )*
    fn regex(&mut self, ctx: &mut Context) -> Result<(), GenError> {
        self.branch(ctx)?;
        while self.peek_kind() == Some(RegexKind::Union) {
            self.advance();
            log::trace!("[regex] union at {}", self.end);
            ctx.pure = false;
            self.top()?.alternate();
            self.branch(ctx)?;
        }
        Ok(())
    }

    fn starts_atom(&mut self) -> bool {
        match self.tokens.peek() {
            Some(tok) => match tok.kind {
                RegexKind::LParen | RegexKind::Dot | RegexKind::LBracket | RegexKind::Defined => {
                    true
                }
                RegexKind::Literal => charset::regex_literal(&tok.value).is_some(),
                _ => false,
            },
            None => false,
        }
    }

    /// branch -> ( atom repeat? )*
    fn branch(&mut self, ctx: &mut Context) -> Result<(), GenError> {
        while self.starts_atom() {
            let atom = self.atom(ctx)?;
            self.repeat(atom, ctx)?;
        }
        Ok(())
    }

    fn atom(&mut self, ctx: &mut Context) -> Result<Atom, GenError> {
        let Some(tok) = self.advance() else {
            return Err(self.eoi("regex"));
        };
        match tok.kind {
            RegexKind::LParen => {
                log::trace!("[regex] group opened at {}", tok.position());
                ctx.note_other();
                self.stack.push(Nfa::new());
                self.regex(ctx)?;
                self.expect(RegexKind::RParen, "group")?;
                Ok(Atom::Group)
            }
            RegexKind::Literal => {
                let c = charset::regex_literal(&tok.value).ok_or_else(|| invalid_literal(&tok))?;
                ctx.note_other();
                self.top()?.concatenate_char(c);
                Ok(Atom::Single)
            }
            RegexKind::Dot => {
                self.top()?.concatenate_set(&DOT);
                ctx.note_class((*DOT).clone());
                Ok(Atom::Single)
            }
            RegexKind::LBracket => {
                let set = if self.peek_kind() == Some(RegexKind::Caret) {
                    self.exclusion()?
                } else {
                    let set = self.members()?;
                    self.expect(RegexKind::RBracket, "character class")?;
                    set
                };
                self.top()?.concatenate_set(&set);
                ctx.note_class(set);
                Ok(Atom::Single)
            }
            RegexKind::Defined => {
                let ident = self.lookup(&tok)?;
                let (nfa, class) = (ident.nfa.clone(), ident.class.clone());
                self.top()?.concatenate(nfa);
                match class {
                    Some(set) => ctx.note_class(set),
                    None => ctx.note_other(),
                }
                Ok(Atom::Single)
            }
            _ => Err(unexpected(&tok)),
        }
    }

    /// Applies an optional `*`/`+` to the atom just parsed and, for a
    /// group, splices its fragment back into the enclosing one.
    fn repeat(&mut self, atom: Atom, ctx: &mut Context) -> Result<(), GenError> {
        let op = match self.peek_kind() {
            Some(RegexKind::Kleene) => Some(Repeat::Kleene),
            Some(RegexKind::Plus) => Some(Repeat::Plus),
            _ => None,
        };
        if op.is_some() {
            self.advance();
            ctx.pure = false;
        }
        match atom {
            Atom::Group => {
                let mut group = self.pop()?;
                match op {
                    Some(Repeat::Kleene) => group.repeat_kleene_whole(),
                    Some(Repeat::Plus) => group.repeat_plus_whole(),
                    None => {}
                }
                log::trace!("[regex] group closed, repeat: {:?}", op);
                self.top()?.concatenate(group);
            }
            Atom::Single => match op {
                Some(Repeat::Kleene) => self.top()?.repeat_kleene(),
                Some(Repeat::Plus) => self.top()?.repeat_plus(),
                None => {}
            },
        }
        Ok(())
    }

    /// member+ ; stops before `]`.
    fn members(&mut self) -> Result<CharSet, GenError> {
        let mut set = CharSet::new();
        loop {
            match self.peek_kind() {
                Some(RegexKind::Literal) => self.member(&mut set)?,
                Some(RegexKind::RBracket) if !set.is_empty() => return Ok(set),
                Some(RegexKind::RBracket) => {
                    return Err(GenError::syntax("empty character class", self.peek_position()));
                }
                Some(RegexKind::Caret) => {
                    return Err(GenError::syntax(
                        "`^` must be escaped inside a character class",
                        self.peek_position(),
                    ));
                }
                Some(RegexKind::Dash) => {
                    return Err(GenError::syntax(
                        "range without a start character",
                        self.peek_position(),
                    ));
                }
                _ => return Err(self.unexpected_here("character class")),
            }
        }
    }

    /// member -> CLS_CHAR ( '-' CLS_CHAR )?
    fn member(&mut self, set: &mut CharSet) -> Result<(), GenError> {
        let Some(tok) = self.advance() else {
            return Err(self.eoi("character class"));
        };
        let lo = charset::class_literal(&tok.value).ok_or_else(|| invalid_literal(&tok))?;
        if self.peek_kind() != Some(RegexKind::Dash) {
            set.insert(lo);
            return Ok(());
        }
        self.advance();
        let hi_tok = self.expect(RegexKind::Literal, "character range")?;
        let hi = charset::class_literal(&hi_tok.value).ok_or_else(|| invalid_literal(&hi_tok))?;
        if !set.insert_range(lo, hi) {
            return Err(GenError::syntax(
                format!("empty range `{}-{}`", lo, hi),
                tok.position(),
            ));
        }
        Ok(())
    }

    /// '^' member+ ']' IN operand, as the single set difference
    /// `operand - members`.
    fn exclusion(&mut self) -> Result<CharSet, GenError> {
        self.expect(RegexKind::Caret, "exclusion")?;
        let excluded = self.members()?;
        self.expect(RegexKind::RBracket, "exclusion")?;
        self.expect(RegexKind::In, "exclusion")?;
        let operand = match self.peek_kind() {
            Some(RegexKind::LBracket) => {
                self.advance();
                if self.peek_kind() == Some(RegexKind::Caret) {
                    return Err(GenError::structural(
                        "nested exclusion is not supported",
                        self.peek_position(),
                    ));
                }
                let set = self.members()?;
                self.expect(RegexKind::RBracket, "character class")?;
                set
            }
            Some(RegexKind::Defined) => {
                let Some(tok) = self.advance() else {
                    return Err(self.eoi("exclusion"));
                };
                let ident = self.lookup(&tok)?;
                ident.class.clone().ok_or_else(|| GenError::NotACharClass {
                    name: name_of(&tok).into(),
                    pos: tok.position(),
                })?
            }
            _ => return Err(self.unexpected_here("exclusion")),
        };
        let set = operand.difference(&excluded);
        log::trace!("[regex] exclusion {} IN {} = {}", excluded, operand, set);
        Ok(set)
    }

    fn lookup(&self, tok: &Token<RegexKind>) -> Result<&'r NfaIdentifier, GenError> {
        let registry: &'r NfaRegistry = self.registry;
        registry
            .get(name_of(tok))
            .ok_or_else(|| GenError::UndefinedReference {
                name: name_of(tok).into(),
                pos: tok.position(),
            })
    }
}

/// `$DIGIT` -> `DIGIT`
fn name_of(tok: &Token<RegexKind>) -> &str {
    tok.value.strip_prefix('$').unwrap_or(&tok.value)
}

fn invalid_literal(tok: &Token<RegexKind>) -> GenError {
    GenError::syntax(
        format!("`{}` is not a valid character here", tok.value),
        tok.position(),
    )
}

fn unexpected(tok: &Token<RegexKind>) -> GenError {
    if tok.kind == RegexKind::Literal {
        invalid_literal(tok)
    } else {
        GenError::syntax(format!("unexpected `{}`", tok.value), tok.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(regex: &str, registry: &NfaRegistry) -> Result<NfaIdentifier, GenError> {
        compile_str(regex, Position::new(1, 1), registry)
    }

    fn nfa(regex: &str) -> Nfa {
        build(regex, &NfaRegistry::new()).unwrap().nfa
    }

    fn printable() -> impl Iterator<Item = char> {
        ' '..='~'
    }

    #[test]
    fn union_accepts_exactly_its_branches() {
        let n = nfa("a|b");
        assert!(n.accepts("a"));
        assert!(n.accepts("b"));
        assert!(!n.accepts(""));
        assert!(!n.accepts("ab"));
        assert!(!n.accepts("c"));
    }

    #[test]
    fn kleene_star() {
        let n = nfa("a*");
        assert!(n.accepts(""));
        assert!(n.accepts("a"));
        assert!(n.accepts("aaaa"));
        assert!(!n.accepts("ab"));
        assert!(!n.accepts("b"));
    }

    #[test]
    fn range_class() {
        let n = nfa("[a-c]");
        for c in printable() {
            assert_eq!(n.accepts(&c.to_string()), ('a'..='c').contains(&c), "{c:?}");
        }
        assert!(!n.accepts("ab"));
    }

    #[test]
    fn exclusion_class() {
        let ident = build("[^a]IN[a-c]", &NfaRegistry::new()).unwrap();
        assert!(ident.is_char_class());
        let n = ident.nfa;
        assert!(!n.accepts("a"));
        assert!(n.accepts("b"));
        assert!(n.accepts("c"));
        assert!(!n.accepts("d"));
    }

    #[test]
    fn grouped_plus_repeats_whole_group() {
        let n = nfa("(ab)+");
        assert!(n.accepts("ab"));
        assert!(n.accepts("abab"));
        assert!(n.accepts("ababab"));
        assert!(!n.accepts(""));
        assert!(!n.accepts("a"));
        assert!(!n.accepts("b"));
        assert!(!n.accepts("aba"));
    }

    #[test]
    fn repetition_binds_to_last_atom() {
        let n = nfa("ab*");
        assert!(n.accepts("a"));
        assert!(n.accepts("abbb"));
        assert!(!n.accepts("abab"));
    }

    #[test]
    fn union_has_lowest_precedence() {
        let n = nfa("ab|cd*");
        assert!(n.accepts("ab"));
        assert!(n.accepts("c"));
        assert!(n.accepts("cddd"));
        assert!(!n.accepts("abd"));
        assert!(!n.accepts("ad"));
    }

    #[test]
    fn nested_groups_and_union() {
        let n = nfa("x(a|(bc)*)y");
        assert!(n.accepts("xay"));
        assert!(n.accepts("xy"));
        assert!(n.accepts("xbcbcy"));
        assert!(!n.accepts("xaay"));
        assert!(!n.accepts("xby"));
    }

    #[test]
    fn dot_is_complement_of_reserved() {
        let n = nfa(".");
        assert!(n.accepts("a"));
        assert!(n.accepts("-"));
        assert!(!n.accepts("*"));
        assert!(!n.accepts("("));
        assert!(!n.accepts("\""));
    }

    #[test]
    fn escapes_in_both_positions() {
        let n = nfa("\\*\\ [\\-\\]]");
        assert!(n.accepts("* -"));
        assert!(n.accepts("* ]"));
        assert!(!n.accepts("*-"));
    }

    #[test]
    fn dash_outside_class_bare_or_escaped() {
        let escaped = nfa("a\\-b");
        assert!(escaped.accepts("a-b"));
        assert!(!escaped.accepts("ab"));
        let bare = nfa("a-b");
        assert!(bare.accepts("a-b"));
    }

    #[test]
    fn reference_equals_inlining() {
        let mut reg = NfaRegistry::new();
        assert!(reg.define("DIGIT", build("[0-9]", &reg).unwrap()));
        let referenced = build("x$DIGIT+", &reg).unwrap().nfa;
        let inlined = nfa("x[0-9]+");
        for input in ["x", "x0", "x42", "x9x", "0", "xa", "x0123456789"] {
            assert_eq!(referenced.accepts(input), inlined.accepts(input), "{input}");
        }
    }

    #[test]
    fn exclusion_against_named_class() {
        let mut reg = NfaRegistry::new();
        assert!(reg.define("DIGIT", build("[0-9]", &reg).unwrap()));
        let ident = build("[^0] IN $DIGIT", &reg).unwrap();
        assert!(ident.is_char_class());
        assert!(!ident.nfa.accepts("0"));
        assert!(ident.nfa.accepts("7"));
    }

    #[test]
    fn purity_of_definitions() {
        let reg = NfaRegistry::new();
        assert!(build("[a-z]", &reg).unwrap().is_char_class());
        assert!(build(".", &reg).unwrap().is_char_class());
        assert!(!build("a", &reg).unwrap().is_char_class());
        assert!(!build("[a-z]*", &reg).unwrap().is_char_class());
        assert!(!build("[a-z][0-9]", &reg).unwrap().is_char_class());
        assert!(!build("[a-z]|[0-9]", &reg).unwrap().is_char_class());
        assert!(!build("([a-z])", &reg).unwrap().is_char_class());
    }

    #[test]
    fn exclusion_operand_must_be_a_class() {
        let mut reg = NfaRegistry::new();
        assert!(reg.define("WORD", build("[a-z]+", &reg).unwrap()));
        let err = build("[^a] IN $WORD", &reg).unwrap_err();
        assert!(matches!(err, GenError::NotACharClass { ref name, .. } if name == "WORD"));
    }

    #[test]
    fn forward_reference_fails() {
        let err = build("$LATER", &NfaRegistry::new()).unwrap_err();
        assert!(matches!(err, GenError::UndefinedReference { ref name, .. } if name == "LATER"));
    }

    #[test]
    fn invalid_literals_by_context() {
        let reg = NfaRegistry::new();
        assert!(matches!(build("[-a]", &reg), Err(GenError::Syntax { .. })));
        assert!(matches!(build("a]", &reg), Err(GenError::Syntax { .. })));
        assert!(matches!(build("\\q", &reg), Err(GenError::Syntax { .. })));
        assert!(matches!(build("[a^]", &reg), Err(GenError::Syntax { .. })));
        assert!(matches!(build("[z-a]", &reg), Err(GenError::Syntax { .. })));
        assert!(matches!(build("*a", &reg), Err(GenError::Syntax { .. })));
        assert!(build("-", &reg).is_ok());
        assert!(build("\\-", &reg).is_ok());
        assert!(build("[\\-]", &reg).is_ok());
    }

    #[test]
    fn unterminated_constructs_are_structural() {
        let reg = NfaRegistry::new();
        assert!(matches!(build("(ab", &reg), Err(GenError::Structural { .. })));
        assert!(matches!(build("[ab", &reg), Err(GenError::Structural { .. })));
        assert!(matches!(build("[a-", &reg), Err(GenError::Structural { .. })));
        assert!(matches!(build("[^a] IN", &reg), Err(GenError::Structural { .. })));
        assert!(matches!(build("ab)", &reg), Err(GenError::Syntax { .. })));
    }

    #[test]
    fn nested_exclusion_is_structural() {
        let err = build("[^a] IN [^b] IN [a-z]", &NfaRegistry::new()).unwrap_err();
        assert!(matches!(err, GenError::Structural { .. }));
    }

    #[test]
    fn empty_regex_matches_empty_string() {
        let n = nfa("");
        assert!(n.accepts(""));
        assert!(!n.accepts("a"));
        let n = nfa("a|");
        assert!(n.accepts(""));
        assert!(n.accepts("a"));
    }

    #[test]
    fn error_positions_point_at_offending_token() {
        let err = compile_str("ab[x", Position::new(7, 10), &NfaRegistry::new()).unwrap_err();
        assert_eq!(err.position(), Some(Position::new(7, 14)));
        let err = compile_str("a $NOPE", Position::new(2, 5), &NfaRegistry::new()).unwrap_err();
        assert_eq!(err.position(), Some(Position::new(2, 7)));
    }

    #[test]
    fn compile_accepts_prebuilt_token_streams() {
        let toks = vec![
            Token::new(RegexKind::Literal, "a", 1, 1),
            Token::new(RegexKind::Union, "|", 1, 2),
            Token::new(RegexKind::Literal, "b", 1, 3),
        ];
        let ident = compile(toks, &NfaRegistry::new()).unwrap();
        assert!(ident.nfa.accepts("b"));
        assert!(ident.name.is_none());
    }
}
