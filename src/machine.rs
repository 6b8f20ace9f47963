//! This module defines the `Machine` struct, which executes a compiled program on a binary
//! tape. It handles the current state, the tape, head movement and rule lookup.

use crate::types::{AquaError, Direction, Halt, Program, Step, Symbol, Transition, MAX_EXECUTION_STEPS};
use std::collections::HashMap;

/// Executes a compiled `Program` one rule at a time.
///
/// The tape grows with `0` cells whenever the head moves past either edge.
pub struct Machine {
    state: String,
    tape: Vec<Symbol>,
    head: usize,
    program: Program,
    index: HashMap<(String, Symbol), usize>,
    step_count: usize,
    max_steps: usize,
}

impl Machine {
    /// Creates a new `Machine` in the program's start state, on a tape holding a single `0`.
    pub fn new(program: Program) -> Self {
        let mut index = HashMap::with_capacity(program.rules.len());
        for (i, rule) in program.rules.iter().enumerate() {
            index
                .entry((rule.old_state.clone(), rule.old_symbol))
                .or_insert(i);
        }

        Self {
            state: program.start_state.clone(),
            tape: vec![Symbol::Zero],
            head: 0,
            program,
            index,
            step_count: 0,
            max_steps: MAX_EXECUTION_STEPS,
        }
    }

    /// Sets the step limit used by `run`.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Replaces the tape and head position.
    ///
    /// # Returns
    ///
    /// * `Err(AquaError::InvalidTape)` if `tape` is empty or holds anything but `0` and `1`.
    /// * `Err(AquaError::InvalidHead)` if `head` lies outside the tape.
    pub fn set_tape(&mut self, tape: &str, head: usize) -> Result<(), AquaError> {
        let cells = tape
            .chars()
            .map(Symbol::from_char)
            .collect::<Option<Vec<_>>>()
            .filter(|cells| !cells.is_empty())
            .ok_or_else(|| AquaError::InvalidTape {
                tape: tape.to_string(),
            })?;

        if head >= cells.len() {
            return Err(AquaError::InvalidHead {
                head,
                len: cells.len(),
            });
        }

        self.tape = cells;
        self.head = head;
        Ok(())
    }

    /// Executes a single step.
    ///
    /// # Returns
    ///
    /// * `Step::Continue` if a rule was applied and the new state is not an end state.
    /// * `Step::Halt(Halt::Ok)` once an end state is reached.
    /// * `Step::Halt(Halt::Err(_))` if no rule matches the current state and symbol.
    pub fn step(&mut self) -> Step {
        if self.is_halted() {
            return Step::Halt(Halt::Ok);
        }

        let rule = match self.transition().cloned() {
            Some(rule) => rule,
            None => {
                return Step::Halt(Halt::Err(AquaError::UndefinedTransition {
                    state: self.state.clone(),
                    symbol: self.symbol(),
                }))
            }
        };

        self.tape[self.head] = rule.new_symbol;

        match rule.direction {
            Direction::Left => {
                if self.head == 0 {
                    // Extend tape to the left
                    self.tape.insert(0, Symbol::Zero);
                } else {
                    self.head -= 1;
                }
            }
            Direction::Right => {
                self.head += 1;
                if self.head >= self.tape.len() {
                    self.tape.push(Symbol::Zero);
                }
            }
            Direction::Stay => {}
        }

        tracing::trace!(rule = %rule, head = self.head, "step");
        self.state = rule.new_state;
        self.step_count += 1;

        if self.is_halted() {
            Step::Halt(Halt::Ok)
        } else {
            Step::Continue
        }
    }

    /// Runs until the machine halts or the step limit is reached.
    pub fn run(&mut self) -> Step {
        self.run_with(|_| {})
    }

    /// Like `run`, calling `on_step` after every step that leaves the machine running.
    pub fn run_with<F>(&mut self, mut on_step: F) -> Step
    where
        F: FnMut(&Machine),
    {
        for _ in 0..self.max_steps {
            match self.step() {
                Step::Continue => on_step(self),
                halt => return halt,
            }
        }

        if self.is_halted() {
            Step::Halt(Halt::Ok)
        } else {
            Step::Halt(Halt::StepLimit)
        }
    }

    /// Finds the rule for the current state and the symbol under the head.
    pub fn transition(&self) -> Option<&Transition> {
        self.index
            .get(&(self.state.clone(), self.symbol()))
            .map(|&i| &self.program.rules[i])
    }

    /// Checks whether the machine is in one of the program's end states.
    pub fn is_halted(&self) -> bool {
        self.program.is_end_state(&self.state)
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn symbol(&self) -> Symbol {
        self.tape[self.head]
    }

    pub fn tape_string(&self) -> String {
        self.tape.iter().map(|s| s.as_char()).collect()
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }
}
