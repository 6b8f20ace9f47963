//! The compiler driver: source parsing, tail-chain optimization and dead-rule elimination,
//! run in that order over one compilation's rule table.

use crate::analyzer::eliminate_unreachable;
use crate::loader::{FileSystemSource, ModuleSource, ProgramLoader};
use crate::optimizer::optimize;
use crate::source::parse_source;
use crate::types::{AquaError, Program, COMPILED_EXTENSION};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// The result of a successful compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    /// The optimized table, free of unreachable rules.
    pub program: Program,
    /// Modules that were declared but never called.
    pub unused_modules: Vec<String>,
    /// Rule count right after parsing.
    pub parsed_rules: usize,
    /// Rules rewritten by the tail-chain optimizer.
    pub collapsed_rules: usize,
    /// Rules removed as unreachable.
    pub removed_rules: usize,
}

/// Compiles sources, loading the modules they declare from `S`.
pub struct Compiler<S> {
    modules: S,
}

impl<S: ModuleSource> Compiler<S> {
    pub fn new(modules: S) -> Self {
        Self { modules }
    }

    /// Compiles source text into a program.
    ///
    /// Any error aborts the whole compilation; nothing of it is kept.
    pub fn compile(&self, source: &str) -> Result<Compilation, AquaError> {
        let started = Instant::now();

        let (mut program, registry) = parse_source(source, &self.modules)?;
        let parsed_rules = program.rules.len();
        tracing::info!(rules = parsed_rules, modules = registry.len(), "source parsed");
        log_table("parsed", &program);

        let collapsed_rules = optimize(&mut program.rules, &program.end_states)?;
        tracing::info!(collapsed = collapsed_rules, "no-motion chains collapsed");
        log_table("optimized", &program);

        let removed_rules = eliminate_unreachable(&mut program);
        tracing::info!(
            removed = removed_rules,
            rules = program.rules.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "compilation complete"
        );

        let unused_modules = registry.unused();
        for name in &unused_modules {
            tracing::warn!(module = %name, "module was not used");
        }

        Ok(Compilation {
            program,
            unused_modules,
            parsed_rules,
            collapsed_rules,
            removed_rules,
        })
    }
}

/// Compiles the source file at `path`, looking for modules in the current directory and in
/// `search_path`. Nothing is written.
pub fn compile_file(path: &Path, search_path: Option<&Path>) -> Result<Compilation, AquaError> {
    let source = fs::read_to_string(path).map_err(|e| {
        AquaError::FileError(format!("Failed to read file {}: {}", path.display(), e))
    })?;

    tracing::info!(path = %path.display(), "compiling");
    Compiler::new(FileSystemSource::new(search_path)).compile(&source)
}

/// Compiles the source file at `path` and writes the table next to it.
///
/// # Returns
///
/// The compilation and the path of the written table. On error no file is written.
pub fn compile_file_to_table(
    path: &Path,
    search_path: Option<&Path>,
) -> Result<(Compilation, PathBuf), AquaError> {
    let compilation = compile_file(path, search_path)?;
    let output = table_path(path);
    ProgramLoader::write_program(&output, &compilation.program)?;
    Ok((compilation, output))
}

/// The table file a source file compiles to: same name, compiled extension.
pub fn table_path(source: &Path) -> PathBuf {
    source.with_extension(COMPILED_EXTENSION)
}

fn log_table(phase: &str, program: &Program) {
    if tracing::enabled!(tracing::Level::TRACE) {
        for rule in &program.rules {
            tracing::trace!(phase, "{}", rule);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::reachable_states;
    use crate::machine::Machine;
    use crate::types::{Direction, Halt, Step};
    use std::collections::{HashMap, HashSet};
    use tempfile::tempdir;

    const INCREMENT: &str = include_str!("../demos/increment.aquacomp");
    const BRANCH: &str = include_str!("../demos/branch.aquacomp");
    const FLIP: &str = include_str!("../demos/flip.aquacomp");
    const ADD_TWO: &str = include_str!("../demos/add_two.aquasrc");
    const INVERT_PAIR: &str = include_str!("../demos/invert_pair.aquasrc");

    fn modules() -> HashMap<String, String> {
        let mut modules = HashMap::new();
        modules.insert("increment".to_string(), INCREMENT.to_string());
        modules.insert("branch".to_string(), BRANCH.to_string());
        modules.insert("flip".to_string(), FLIP.to_string());
        modules
    }

    fn compile(source: &str) -> Result<Compilation, AquaError> {
        Compiler::new(modules()).compile(source)
    }

    fn run(program: Program, tape: &str) -> Machine {
        let mut machine = Machine::new(program);
        machine.set_tape(tape, 0).unwrap();
        assert_eq!(machine.run(), Step::Halt(Halt::Ok));
        machine
    }

    #[test]
    fn test_literal_writes() {
        let compilation = compile("A END\n01\n").unwrap();
        let lines: Vec<String> = compilation
            .program
            .rules
            .iter()
            .map(|r| r.to_string())
            .collect();

        assert_eq!(lines, vec!["A 0 END 1 -", "A 1 END 1 -"]);
        assert_eq!(compilation.parsed_rules, 6);
        assert_eq!(compilation.removed_rules, 4);

        let machine = run(compilation.program, "0");
        assert_eq!(machine.state(), "END");
        assert_eq!(machine.tape_string(), "1");
    }

    #[test]
    fn test_no_unreachable_rules_survive() {
        let compilation = compile(ADD_TWO).unwrap();
        let program = &compilation.program;

        let reachable = reachable_states(&program.rules, &program.start_state);
        assert!(program.rules.iter().all(|r| reachable.contains(&r.old_state)));
    }

    #[test]
    fn test_every_target_is_defined_or_final() {
        let compilation = compile(ADD_TWO).unwrap();
        let program = &compilation.program;

        let origins: HashSet<&str> = program.rules.iter().map(|r| r.old_state.as_str()).collect();
        for rule in &program.rules {
            assert!(
                origins.contains(rule.new_state.as_str()) || program.is_end_state(&rule.new_state),
                "dangling target in {}",
                rule
            );
        }
    }

    #[test]
    fn test_only_final_rules_stay() {
        let compilation = compile(ADD_TWO).unwrap();
        let program = &compilation.program;

        for rule in program.rules.iter().filter(|r| r.direction == Direction::Stay) {
            assert!(program.is_end_state(&rule.new_state));
        }
    }

    #[test]
    fn test_table_is_deterministic() {
        let compilation = compile(ADD_TWO).unwrap();
        let mut keys = HashSet::new();
        for rule in &compilation.program.rules {
            assert!(keys.insert((rule.old_state.clone(), rule.old_symbol)));
        }
    }

    #[test]
    fn test_add_two() {
        let compilation = compile(ADD_TWO).unwrap();
        assert!(compilation.unused_modules.is_empty());

        // Least significant bit first: 1 + 2 = 3.
        let machine = run(compilation.program.clone(), "100");
        assert_eq!(machine.tape_string(), "110");

        // 3 + 2 = 5.
        let machine = run(compilation.program.clone(), "110");
        assert_eq!(machine.tape_string(), "101");

        // The tape grows on the right: 1 + 2 = 3.
        let machine = run(compilation.program, "1");
        assert_eq!(machine.tape_string(), "11");
    }

    #[test]
    fn test_module_called_twice() {
        let compilation = compile(INVERT_PAIR).unwrap();

        let machine = run(compilation.program, "01");
        assert_eq!(machine.tape_string(), "10");
        assert_eq!(machine.head(), 0);
    }

    #[test]
    fn test_bound_exits() {
        let source = "!module branch\nA ZERO ONE\nbranch(zero:ZERO one:ONE)\n";
        let compilation = compile(source).unwrap();

        let machine = run(compilation.program.clone(), "0");
        assert_eq!(machine.state(), "ZERO");

        let machine = run(compilation.program, "1");
        assert_eq!(machine.state(), "ONE");
    }

    #[test]
    fn test_unused_module_is_reported() {
        let with_module = compile("!module increment\nA END\n>\n").unwrap();
        let without_module = compile("A END\n>\n").unwrap();

        assert_eq!(with_module.unused_modules, vec!["increment"]);
        assert_eq!(with_module.program, without_module.program);
    }

    #[test]
    fn test_explicit_loop() {
        // Moves right over ones until it finds a zero.
        let source = "!module branch\nA END\nskip: > branch(zero:END one:skip)\n";
        let compilation = compile(source).unwrap();

        let machine = run(compilation.program, "1110");
        assert_eq!(machine.head(), 3);
    }

    #[test]
    fn test_errors_abort_compilation() {
        assert!(matches!(
            compile("!module missing\nA END\n"),
            Err(AquaError::ModuleNotFound { .. })
        ));
        assert!(matches!(
            compile("A END\nx: x:\n"),
            Err(AquaError::CyclicChain { .. })
        ));
        assert!(matches!(
            compile("!module branch\nA END\nbranch(one:nowhere)\n"),
            Err(AquaError::DanglingChainTarget { .. })
        ));
        assert!(matches!(
            compile("A END\n>\n!module increment\nincrement(x y)\n"),
            Err(AquaError::BindingAfterPureType1 { .. })
        ));
    }

    #[test]
    fn test_compile_file_writes_table() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("increment.aquacomp"), INCREMENT).unwrap();
        let source_path = dir.path().join("add_two.aquasrc");
        fs::write(&source_path, ADD_TWO).unwrap();

        let (compilation, output) = compile_file_to_table(&source_path, Some(dir.path())).unwrap();

        assert_eq!(output, dir.path().join("add_two.aquacomp"));
        let written = ProgramLoader::load_program(&output).unwrap();
        assert_eq!(written, compilation.program);
    }

    #[test]
    fn test_failed_compile_writes_nothing() {
        let dir = tempdir().unwrap();
        let source_path = dir.path().join("broken.aquasrc");
        fs::write(&source_path, "!module nowhere_to_be_found\nA END\n").unwrap();

        assert!(compile_file_to_table(&source_path, Some(dir.path())).is_err());
        assert!(!table_path(&source_path).exists());
    }
}
