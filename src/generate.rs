//! Generator driver.
//!
//! Runs a specification through every stage: token definitions are
//! compiled into NFAs in file order, the productions become a
//! [`Grammar`], FIRST/FOLLOW sets are computed, and the LL(1)
//! [`ParseTable`] is built. [`generate`] additionally writes a plain-text
//! report of the run.

use crate::error::GenError;
use crate::ll1::{FirstFollow, Grammar, ParseTable, write_first_follow};
use crate::nfa::NfaRegistry;
use crate::regex::compile_str;
use crate::spec::{self, Definition};
use anyhow::Context;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Everything produced from one specification.
#[derive(Debug, Clone)]
pub struct Generated {
    pub registry: NfaRegistry,
    pub grammar: Grammar,
    pub sets: FirstFollow,
    pub table: ParseTable,
}

/// Compiles token definitions in order. A definition may only reference
/// names defined above it, and a name may be defined once.
pub fn compile_definitions(definitions: &[Definition]) -> Result<NfaRegistry, GenError> {
    let mut registry = NfaRegistry::new();
    for def in definitions {
        let ident = compile_str(&def.regex.value, def.regex.position(), &registry)?;
        log::debug!(
            "${}: {} states{}",
            def.name.value,
            ident.nfa.len(),
            if ident.is_char_class() { ", character class" } else { "" }
        );
        if !registry.define(&def.name.value, ident) {
            return Err(GenError::syntax(
                format!("`${}` is already defined", def.name.value),
                def.name.position(),
            ));
        }
    }
    Ok(registry)
}

/// Runs the generator on specification text.
pub fn generate_from_str(input: &str) -> Result<Generated, GenError> {
    let spec = spec::parse_str(input)?;
    let registry = compile_definitions(&spec.definitions)?;
    let grammar = Grammar::new(spec.rules)?;
    let sets = FirstFollow::compute(&grammar);
    let table = ParseTable::build(&grammar, &sets)?;
    Ok(Generated {
        registry,
        grammar,
        sets,
        table,
    })
}

/// Reads and runs the specification at `spec_path`.
pub fn load<P: AsRef<Path>>(spec_path: P) -> anyhow::Result<Generated> {
    let path = spec_path.as_ref();
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read specification {}", path.display()))?;
    let generated =
        generate_from_str(&input).with_context(|| format!("in specification {}", path.display()))?;
    Ok(generated)
}

/// Runs the specification at `spec_path` and writes the report to
/// `<output_dir>/<name>.txt`.
pub fn generate<P: AsRef<Path>, Q: AsRef<Path>>(
    spec_path: P,
    output_dir: Q,
    name: &str,
    debug: bool,
) -> anyhow::Result<Generated> {
    let generated = load(spec_path)?;
    let out_path = output_dir.as_ref().join(format!("{}.txt", name));
    let file = File::create(&out_path)
        .with_context(|| format!("cannot create report {}", out_path.display()))?;
    let mut out = BufWriter::new(file);
    write_report(&mut out, &generated, debug)?;
    out.flush()?;
    log::info!("report written to {}", out_path.display());
    Ok(generated)
}

/// Writes the report of a run.
///
/// # Output Format
/// ```text
/// DS,<number of definitions>
/// D,<name>,<class|regex>,<number of NFA states>
///
/// PS,<number of rules>
/// P,<index>,<head> -> <body>
///
/// FIRST,<non-terminal>,{...}
/// FOLLOW,<non-terminal>,{...}
///
/// TABLE
/// non-terminal: <name>
///     rule: "<rule>", on: <terminal>
/// ```
///
/// With `debug`, the automaton of every definition follows as
/// `NFA,<name>` and its transition listing.
pub fn write_report<W: Write>(out: &mut W, generated: &Generated, debug: bool) -> io::Result<()> {
    let registry = &generated.registry;
    writeln!(out, "DS,{}", registry.len())?;
    for ident in registry.iter() {
        writeln!(
            out,
            "D,{},{},{}",
            ident.name.as_deref().unwrap_or("?"),
            if ident.is_char_class() { "class" } else { "regex" },
            ident.nfa.len()
        )?;
    }
    writeln!(out)?;

    let rules = generated.grammar.rules();
    writeln!(out, "PS,{}", rules.len())?;
    for (i, rule) in rules.iter().enumerate() {
        writeln!(out, "P,{},{}", i, rule)?;
    }
    writeln!(out)?;

    write_first_follow(out, &generated.grammar, &generated.sets)?;
    writeln!(out)?;

    writeln!(out, "TABLE")?;
    write!(out, "{}", generated.table)?;

    if debug {
        for ident in registry.iter() {
            writeln!(out)?;
            writeln!(out, "NFA,{}", ident.name.as_deref().unwrap_or("?"))?;
            write!(out, "{}", ident.nfa)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Position;

    const SAMPLE: &str = "\
$DIGIT  [0-9]
$ID     [a-z]([a-z]|$DIGIT)*
$NOTA   [^a] IN [a-c]
%%
<program> -> begin <stmts> end
<stmts>   -> <stmt> <stmts> | EPSILON
<stmt>    -> ID = <expr> ;
<expr>    -> ID | ( <expr> )
%%
";

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn sample_specification() {
        init();
        let generated = generate_from_str(SAMPLE).unwrap();
        assert_eq!(generated.registry.len(), 3);
        assert!(generated.registry.get("DIGIT").unwrap().is_char_class());
        assert!(!generated.registry.get("ID").unwrap().is_char_class());
        assert!(generated.registry.get("NOTA").unwrap().is_char_class());
        assert!(generated.registry.get("ID").unwrap().nfa.accepts("x42"));

        let table = &generated.table;
        assert_eq!(
            table.lookup("<expr>", "(").map(|r| r.to_string()),
            Some("<expr> -> ( <expr> )".to_string())
        );
        assert!(table.lookup("<stmts>", "end").unwrap().is_epsilon());
        assert!(table.lookup("<program>", "ID").is_none());
    }

    #[test]
    fn definitions_are_ordered() {
        let err = generate_from_str("$A $B\n$B b\n%%\n").unwrap_err();
        assert_eq!(
            err,
            GenError::UndefinedReference {
                name: "B".into(),
                pos: Position::new(1, 4),
            }
        );
    }

    #[test]
    fn redefinition_is_rejected() {
        let err = generate_from_str("$A a\n$A b\n%%\n").unwrap_err();
        assert!(matches!(err, GenError::Syntax { pos, .. } if pos == Position::new(2, 1)));
    }

    #[test]
    fn conflict_aborts_generation() {
        let err = generate_from_str("%%\n<s> -> a b | a c\n").unwrap_err();
        assert!(matches!(err, GenError::GrammarConflict { .. }));
    }

    #[test]
    fn report_is_written() {
        init();
        let dir = tempfile::tempdir().unwrap();
        let spec_path = dir.path().join("sample.spec");
        std::fs::write(&spec_path, SAMPLE).unwrap();

        generate(&spec_path, dir.path(), "sample", true).unwrap();

        let report = std::fs::read_to_string(dir.path().join("sample.txt")).unwrap();
        assert!(report.starts_with("DS,3\nD,DIGIT,class,"));
        assert!(report.contains("P,0,<program> -> begin <stmts> end\n"));
        assert!(report.contains("FOLLOW,<program>,{$, }\n"));
        assert!(report.contains("TABLE\nnon-terminal: <program>\n"));
        assert!(report.contains("NFA,ID\n"));
    }

    #[test]
    fn missing_file_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path().join("absent.spec")).unwrap_err();
        assert!(err.to_string().contains("cannot read specification"));
    }
}
