//! Modules and the per-compilation module registry.
//!
//! A module is a compiled table used as a sub-machine. When declared, all of its state names
//! are moved into the module's namespace (`name(state`), so two different modules never share
//! a state name. Each instantiation later appends a unique invocation scope (`_iN)`).

use crate::loader::ModuleSource;
use crate::types::{AquaError, Program, Transition, BINDING_CLOSE, BINDING_OPEN};

/// A named, reusable sub-machine with one start state and ordered end states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub start_state: String,
    pub end_states: Vec<String>,
    pub rules: Vec<Transition>,
}

impl Module {
    /// Wraps a loaded table without touching its state names.
    pub fn new(name: impl Into<String>, program: Program) -> Self {
        Self {
            name: name.into(),
            start_state: program.start_state,
            end_states: program.end_states,
            rules: program.rules,
        }
    }

    /// Wraps a loaded table and prefixes every state name with `name(`.
    pub fn declare(name: impl Into<String>, program: Program) -> Self {
        let mut module = Self::new(name, program);
        let namespace = module.namespace();

        let scope = |state: &mut String| state.insert_str(0, &namespace);
        scope(&mut module.start_state);
        module.end_states.iter_mut().for_each(scope);
        for rule in &mut module.rules {
            scope(&mut rule.old_state);
            scope(&mut rule.new_state);
        }

        module
    }

    /// The declaration-time prefix of this module's states.
    pub fn namespace(&self) -> String {
        format!("{}{}", self.name, BINDING_OPEN)
    }

    /// Strips the declaration-time prefix from `state`, if present.
    pub fn local_name<'a>(&self, state: &'a str) -> Option<&'a str> {
        state
            .strip_prefix(self.name.as_str())
            .and_then(|rest| rest.strip_prefix(BINDING_OPEN))
    }
}

/// The suffix that separates one instantiation of a module from all others.
pub fn invocation_scope(invocation: usize) -> String {
    format!("_i{invocation}{BINDING_CLOSE}")
}

/// A declared module and how often it has been instantiated so far.
#[derive(Debug, Clone)]
pub struct ModuleEntry {
    pub module: Module,
    invocations: usize,
}

impl ModuleEntry {
    pub fn new(module: Module) -> Self {
        Self {
            module,
            invocations: 0,
        }
    }

    pub fn invocations(&self) -> usize {
        self.invocations
    }

    /// Returns a fresh invocation scope and advances the counter.
    pub fn next_scope(&mut self) -> String {
        let scope = invocation_scope(self.invocations);
        self.invocations += 1;
        scope
    }
}

/// All modules declared during one compilation, in declaration order.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    entries: Vec<ModuleEntry>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the module `name` from `source` and registers it with its namespace applied.
    ///
    /// # Returns
    ///
    /// * `Err(AquaError::DuplicateModule)` if `name` was already declared.
    /// * Any error of the module source.
    pub fn declare(&mut self, name: &str, source: &impl ModuleSource) -> Result<(), AquaError> {
        if self.get(name).is_some() {
            return Err(AquaError::DuplicateModule(name.to_string()));
        }

        let program = source.load(name)?;
        let module = Module::declare(name, program);
        tracing::debug!(
            module = name,
            rules = module.rules.len(),
            end_states = module.end_states.len(),
            "module declared"
        );

        self.entries.push(ModuleEntry::new(module));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ModuleEntry> {
        self.entries.iter().find(|e| e.module.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ModuleEntry> {
        self.entries.iter_mut().find(|e| e.module.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of declared modules that were never instantiated.
    pub fn unused(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.invocations == 0)
            .map(|e| e.module.name.clone())
            .collect()
    }
}
