//! This module defines the core data structures shared by the compiler and the interpreter:
//! tape symbols, head directions, transition rules, compiled programs and the error type.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::Rule;

/// Marks a comment, both in compiled tables (whole line) and in sources (rest of line).
pub const COMMENT_CHAR: char = '#';
/// Starts a directive line in sources and a broadcast binding inside `(...)`.
pub const ACTION_CHAR: char = '!';
/// Keyword of the module declaration directive.
pub const MODULE_KEYWORD: &str = "module";
/// Opens a binding list, and separates a module name from its local state names.
pub const BINDING_OPEN: char = '(';
/// Closes a binding list, and terminates an invocation scope suffix.
pub const BINDING_CLOSE: char = ')';
/// Separates an end state from its target in explicit bindings, and marks state jumps.
pub const EXPLICIT_STATE: char = ':';
/// Head movement markers.
pub const LEFT_CHAR: char = '<';
pub const RIGHT_CHAR: char = '>';
pub const STAY_CHAR: char = '-';

/// Extension of source files.
pub const SOURCE_EXTENSION: &str = "aquasrc";
/// Extension of compiled tables, which are also the module format.
pub const COMPILED_EXTENSION: &str = "aquacomp";

/// The maximum number of steps to execute before halting.
pub const MAX_EXECUTION_STEPS: usize = 10000;

/// A tape cell value. The machine works on a binary alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbol {
    #[serde(rename = "0")]
    Zero,
    #[serde(rename = "1")]
    One,
}

impl Symbol {
    /// Both symbols, in the order rules are emitted for them.
    pub const ALL: [Symbol; 2] = [Symbol::Zero, Symbol::One];

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Symbol::Zero),
            '1' => Some(Symbol::One),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Symbol::Zero => '0',
            Symbol::One => '1',
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Represents the possible directions the head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
    /// Keep the head in the same position.
    Stay,
}

impl Direction {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            LEFT_CHAR => Some(Direction::Left),
            RIGHT_CHAR => Some(Direction::Right),
            STAY_CHAR => Some(Direction::Stay),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Direction::Left => LEFT_CHAR,
            Direction::Right => RIGHT_CHAR,
            Direction::Stay => STAY_CHAR,
        }
    }

    /// Returns `true` for `Left` and `Right`.
    pub fn moves(self) -> bool {
        self != Direction::Stay
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A single transition rule, addressed by `(old_state, old_symbol)`.
///
/// When the machine is in `old_state` reading `old_symbol`, it writes `new_symbol`,
/// moves the head in `direction` and continues in `new_state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub old_state: String,
    pub old_symbol: Symbol,
    pub new_state: String,
    pub new_symbol: Symbol,
    pub direction: Direction,
}

impl Transition {
    pub fn new(
        old_state: impl Into<String>,
        old_symbol: Symbol,
        new_state: impl Into<String>,
        new_symbol: Symbol,
        direction: Direction,
    ) -> Self {
        Self {
            old_state: old_state.into(),
            old_symbol,
            new_state: new_state.into(),
            new_symbol,
            direction,
        }
    }

    /// The pair of symbol-preserving, non-moving rules that hand control from `from` to `to`.
    pub fn passthrough(from: &str, to: &str) -> [Transition; 2] {
        Symbol::ALL.map(|symbol| Transition::new(from, symbol, to, symbol, Direction::Stay))
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.old_state, self.old_symbol, self.new_state, self.new_symbol, self.direction
        )
    }
}

/// A compiled transition table: a start state, ordered end states and the rules.
///
/// This is both the compiler's output and the format modules are loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// The state the machine starts in.
    pub start_state: String,
    /// The exit states. Their order is significant for module bindings.
    pub end_states: Vec<String>,
    /// The transition rules, in emission order.
    pub rules: Vec<Transition>,
}

impl Program {
    /// Checks whether `state` is one of the program's end states.
    pub fn is_end_state(&self, state: &str) -> bool {
        self.end_states.iter().any(|es| es == state)
    }

    /// Finds the rule for `(state, symbol)`, if any.
    pub fn rule(&self, state: &str, symbol: Symbol) -> Option<&Transition> {
        self.rules
            .iter()
            .find(|r| r.old_state == state && r.old_symbol == symbol)
    }
}

/// Represents the outcome of an interpreter step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The machine performed a step and continues execution.
    Continue,
    /// The machine has halted.
    Halt(Halt),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Halt {
    /// Halted in an end state.
    Ok,
    /// Gave up after the configured number of steps.
    StepLimit,

    Err(AquaError),
}

/// Every failure the compiler, the loaders and the interpreter can report.
///
/// All of them are fatal to the operation that raised them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AquaError {
    /// No compiled table for the module exists in any searched location.
    #[error("Module {name} not found, searched: {searched}")]
    ModuleNotFound { name: String, searched: String },
    /// A second `!module` directive for the same name.
    #[error("Module {0} already loaded")]
    DuplicateModule(String),
    /// A program line calls a module that was never declared.
    #[error("Module {name} not loaded, called on line: {line}")]
    UnknownModule { name: String, line: String },
    /// The state header has fewer than two tokens.
    #[error("Invalid state header, expected a start state and at least one end state: {0}")]
    MalformedHeader(String),
    /// The source ended before a state header was seen.
    #[error("Missing state header")]
    MissingHeader,
    /// A rule line does not consist of exactly five tokens.
    #[error("Invalid rule, expected 5 tokens: {0}")]
    MalformedRule(String),
    /// A symbol token is not `0` or `1`.
    #[error("Invalid symbol '{token}' in rule: {line}")]
    InvalidSymbol { token: String, line: String },
    /// An action token is not `<`, `>` or `-`.
    #[error("Invalid move '{token}' in rule: {line}")]
    InvalidAction { token: String, line: String },
    /// The number of bindings differs from the module's end state count.
    #[error("Can't bind {end_states} end states of module {module} to {bindings} exits")]
    BindingArityMismatch {
        module: String,
        end_states: usize,
        bindings: usize,
    },
    /// A bare single binding was used on a module with several end states.
    #[error("Pure type 1 binding not allowed with multiple end states of module {module}: {binding}")]
    PureBindingArityMismatch { module: String, binding: String },
    /// A bare binding token was combined with further tokens.
    #[error("No bindings allowed after type 1 binding: {binding}")]
    BindingAfterPureType1 { binding: String },
    /// A binding names no target state.
    #[error("Empty binding target: {binding}")]
    EmptyBindingTarget { binding: String },
    /// A `(` without a matching `)` on the same line.
    #[error("Unterminated {} on line: {line}", BINDING_OPEN)]
    UnterminatedBinding { line: String },
    /// A character the program-line syntax does not accept at this position.
    #[error("Invalid character '{character}' on line: {line}")]
    InvalidCharacter { character: char, line: String },
    /// A `(` binding or `!module` directive without a module name.
    #[error("Missing module name on line: {line}")]
    MissingModuleName { line: String },
    /// A no-motion chain points at a `(state, symbol)` pair with no rule.
    #[error("No rule for state {state} and symbol {symbol} while collapsing no-motion chains")]
    DanglingChainTarget { state: String, symbol: Symbol },
    /// A no-motion chain never reaches a move or an end state.
    #[error("No-motion chain loops at state {state} and symbol {symbol}")]
    CyclicChain { state: String, symbol: Symbol },
    /// The table tokenizer rejected its input.
    #[error("Table parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// File system operations, such as reading sources or writing tables.
    #[error("File error: {0}")]
    FileError(String),
    /// Initial tape contents contain something other than `0` and `1`.
    #[error("Invalid tape contents: {tape}")]
    InvalidTape { tape: String },
    /// The initial head offset lies outside the tape.
    #[error("Head position {head} is outside the tape of length {len}")]
    InvalidHead { head: usize, len: usize },
    /// The interpreter found no rule for the current state and symbol.
    #[error("No rule found for state {state} and symbol {symbol}")]
    UndefinedTransition { state: String, symbol: Symbol },
}
