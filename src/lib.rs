//! This crate compiles binary-tape state machine sources into flat transition tables and
//! executes them. Sources can declare compiled tables as modules and call them like
//! subroutines; the compiler inlines every call under its own scope, collapses non-moving
//! transition chains and drops unreachable rules.

pub mod analyzer;
pub mod binding;
pub mod compiler;
pub mod config;
pub mod encoder;
pub mod inliner;
pub mod loader;
pub mod machine;
pub mod module;
pub mod optimizer;
pub mod parser;
pub mod source;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the reachability analysis from the analyzer module.
pub use analyzer::{eliminate_unreachable, reachable_states};
/// Re-exports the binding resolver.
pub use binding::resolve;
/// Re-exports the compiler driver.
pub use compiler::{compile_file, compile_file_to_table, table_path, Compilation, Compiler};
/// Re-exports the configuration.
pub use config::Config;
/// Re-exports the encoding functions from the encoder module.
pub use encoder::{encode, encode_json};
/// Re-exports the module instantiator.
pub use inliner::instantiate;
/// Re-exports the loaders and module sources.
pub use loader::{FileSystemSource, ModuleSource, ProgramLoader};
/// Re-exports the `Machine` struct from the machine module.
pub use machine::Machine;
/// Re-exports the module types.
pub use module::{Module, ModuleEntry, ModuleRegistry};
/// Re-exports the tail-chain optimizer.
pub use optimizer::optimize;
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports the source parser.
pub use source::{parse_source, SourceParser};
/// Re-exports the data model and error types.
pub use types::{AquaError, Direction, Halt, Program, Step, Symbol, Transition};
