//! This module provides the parser for source programs.
//!
//! Sources are read line by line. `!module name` directives declare modules, the first other
//! line is the state header, and every later line is program text read one character at a
//! time. Program text is turned into rules over implicit states, which are named by a
//! counter (`0`, `1`, ...) and so never clash with identifiers, which start with a letter.
//!
//! | text        | effect                                                              |
//! |-------------|---------------------------------------------------------------------|
//! | `<` / `>`   | move the head left / right                                          |
//! | `0` / `1`   | write the symbol                                                    |
//! | `name `     | call module `name`, all end states continue with the next text      |
//! | `name(...)` | call module `name` with bindings for its end states                 |
//! | `name:`     | continue at state `name`                                            |
//! | `# ...`     | comment until end of line                                           |

use crate::binding::resolve;
use crate::inliner::instantiate;
use crate::loader::ModuleSource;
use crate::module::ModuleRegistry;
use crate::parser::parse_header;
use crate::types::{
    AquaError, Direction, Program, Symbol, Transition, ACTION_CHAR, BINDING_CLOSE, BINDING_OPEN,
    COMMENT_CHAR, EXPLICIT_STATE, LEFT_CHAR, MODULE_KEYWORD, RIGHT_CHAR,
};
use std::mem;

/// Parses a whole source text. Returns the unoptimized program and the modules it declared.
pub fn parse_source<S: ModuleSource>(
    input: &str,
    modules: &S,
) -> Result<(Program, ModuleRegistry), AquaError> {
    let mut parser = SourceParser::new(modules);
    for line in input.lines() {
        parser.parse_line(line)?;
    }
    parser.finish()
}

/// The state of one compilation while its source is being read.
pub struct SourceParser<'m, S> {
    modules: &'m S,
    registry: ModuleRegistry,
    rules: Vec<Transition>,
    header: Option<(String, Vec<String>)>,
    current_state: String,
    next_implicit_state: usize,
}

impl<'m, S: ModuleSource> SourceParser<'m, S> {
    pub fn new(modules: &'m S) -> Self {
        Self {
            modules,
            registry: ModuleRegistry::new(),
            rules: Vec::new(),
            header: None,
            current_state: String::new(),
            next_implicit_state: 0,
        }
    }

    /// Consumes a single source line.
    pub fn parse_line(&mut self, line: &str) -> Result<(), AquaError> {
        if line.trim().is_empty() || line.starts_with(COMMENT_CHAR) {
            return Ok(());
        }

        if let Some(directive) = line.strip_prefix(ACTION_CHAR) {
            return self.parse_directive(directive, line);
        }

        if self.header.is_none() {
            let header = line
                .split_once(COMMENT_CHAR)
                .map_or(line, |(header, _)| header);
            let (start, ends) = parse_header(header)?;
            tracing::debug!(start = %start, ends = ?ends, "state header loaded");
            self.current_state = start.clone();
            self.header = Some((start, ends));
            return Ok(());
        }

        self.parse_program_line(line)
    }

    /// Ends the source: the current state falls through to the first end state.
    pub fn finish(mut self) -> Result<(Program, ModuleRegistry), AquaError> {
        let (start_state, end_states) = self.header.take().ok_or(AquaError::MissingHeader)?;

        self.rules
            .extend(Transition::passthrough(&self.current_state, &end_states[0]));

        let program = Program {
            start_state,
            end_states,
            rules: self.rules,
        };
        Ok((program, self.registry))
    }

    fn parse_directive(&mut self, directive: &str, line: &str) -> Result<(), AquaError> {
        let mut tokens = directive.split_whitespace();
        match tokens.next() {
            Some(MODULE_KEYWORD) => {
                let name = tokens.next().ok_or_else(|| AquaError::MissingModuleName {
                    line: line.to_string(),
                })?;
                tracing::info!(module = name, "loading module");
                self.registry.declare(name, self.modules)
            }
            _ => {
                tracing::warn!(line, "ignoring unknown directive");
                Ok(())
            }
        }
    }

    fn parse_program_line(&mut self, line: &str) -> Result<(), AquaError> {
        let mut pending = String::new();
        let mut pos = 0;

        while let Some(c) = line[pos..].chars().next() {
            pos += c.len_utf8();

            if pending.is_empty() {
                if let Some(symbol) = Symbol::from_char(c) {
                    self.emit_write(symbol);
                    continue;
                }
            }

            match c {
                COMMENT_CHAR => break,
                c if c.is_ascii_whitespace() => self.flush_call(&mut pending, line)?,
                BINDING_OPEN => {
                    if pending.is_empty() {
                        return Err(AquaError::MissingModuleName {
                            line: line.to_string(),
                        });
                    }
                    let close = line[pos..].find(BINDING_CLOSE).ok_or_else(|| {
                        AquaError::UnterminatedBinding {
                            line: line.to_string(),
                        }
                    })?;
                    let binding = &line[pos..pos + close];
                    pos += close + BINDING_CLOSE.len_utf8();

                    self.call(&mem::take(&mut pending), binding, line)?;
                }
                EXPLICIT_STATE if !pending.is_empty() => self.jump(mem::take(&mut pending)),
                LEFT_CHAR if pending.is_empty() => self.emit_move(Direction::Left),
                RIGHT_CHAR if pending.is_empty() => self.emit_move(Direction::Right),
                c if is_identifier_start(c) || (!pending.is_empty() && c.is_ascii_digit()) => {
                    pending.push(c)
                }
                character => {
                    return Err(AquaError::InvalidCharacter {
                        character,
                        line: line.to_string(),
                    })
                }
            }
        }

        self.flush_call(&mut pending, line)
    }

    /// Resolves a pending identifier as an unbound module call.
    fn flush_call(&mut self, pending: &mut String, line: &str) -> Result<(), AquaError> {
        if pending.is_empty() {
            return Ok(());
        }
        self.call(&mem::take(pending), "", line)
    }

    fn call(&mut self, name: &str, binding: &str, line: &str) -> Result<(), AquaError> {
        let entry = self
            .registry
            .get_mut(name)
            .ok_or_else(|| AquaError::UnknownModule {
                name: name.to_string(),
                line: line.to_string(),
            })?;

        let continuation = self.next_implicit_state.to_string();
        let exits = resolve(&entry.module, binding, &continuation)?;
        instantiate(entry, &mut self.rules, &self.current_state, &exits)?;

        self.advance_to(continuation);
        Ok(())
    }

    fn jump(&mut self, target: String) {
        self.rules
            .extend(Transition::passthrough(&self.current_state, &target));
        self.current_state = target;
    }

    fn emit_move(&mut self, direction: Direction) {
        let next = self.next_implicit_state.to_string();
        self.rules.extend(
            Symbol::ALL.map(|s| Transition::new(&self.current_state, s, &next, s, direction)),
        );
        self.advance_to(next);
    }

    fn emit_write(&mut self, symbol: Symbol) {
        let next = self.next_implicit_state.to_string();
        self.rules.extend(
            Symbol::ALL
                .map(|s| Transition::new(&self.current_state, s, &next, symbol, Direction::Stay)),
        );
        self.advance_to(next);
    }

    /// Makes the freshly allocated implicit state `next` the current one.
    fn advance_to(&mut self, next: String) {
        self.current_state = next;
        self.next_implicit_state += 1;
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}
