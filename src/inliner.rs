//! Module instantiation: copying a module's rules into the program under a fresh scope.

use crate::module::ModuleEntry;
use crate::types::{AquaError, Transition};
use std::collections::HashMap;

/// Inlines one call of a module into `target`.
///
/// Emits two entry rules from `entry_state` into the scoped start state, then a copy of every
/// module rule. Origin states always get the invocation scope. Targets that are end states of
/// the module are replaced by the matching entry of `exits`, all others get the invocation
/// scope too. The module's invocation counter advances, so no two calls share internal states.
///
/// # Returns
///
/// * `Err(AquaError::BindingArityMismatch)` if `exits` and the module's end states differ in length.
pub fn instantiate(
    entry: &mut ModuleEntry,
    target: &mut Vec<Transition>,
    entry_state: &str,
    exits: &[String],
) -> Result<(), AquaError> {
    let end_count = entry.module.end_states.len();
    if end_count != exits.len() {
        return Err(AquaError::BindingArityMismatch {
            module: entry.module.name.clone(),
            end_states: end_count,
            bindings: exits.len(),
        });
    }

    let scope = entry.next_scope();
    let module = &entry.module;

    // Duplicate end states bind to their first position.
    let mut bindings: HashMap<&str, &str> = HashMap::with_capacity(exits.len());
    for (end_state, exit) in module.end_states.iter().zip(exits) {
        bindings.entry(end_state.as_str()).or_insert(exit.as_str());
    }

    target.reserve(module.rules.len() + 2);
    target.extend(Transition::passthrough(
        entry_state,
        &format!("{}{}", module.start_state, scope),
    ));

    target.extend(module.rules.iter().map(|rule| {
        let new_state = match bindings.get(rule.new_state.as_str()) {
            Some(exit) => exit.to_string(),
            None => format!("{}{}", rule.new_state, scope),
        };

        Transition {
            old_state: format!("{}{}", rule.old_state, scope),
            new_state,
            ..rule.clone()
        }
    }));

    tracing::trace!(
        module = %module.name,
        scope = %scope,
        entry = entry_state,
        rules = module.rules.len(),
        "module instantiated"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Module;
    use crate::parser::parse;
    use crate::types::{Direction, Symbol};
    use std::collections::HashSet;

    fn exits(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn entry() -> ModuleEntry {
        let program = parse("s a b\ns 0 a 1 >\ns 1 m 1 <\nm 0 b 0 -\nm 1 s 0 >\n").unwrap();
        ModuleEntry::new(Module::declare("two", program))
    }

    #[test]
    fn test_instantiate_rewrites_states() {
        let mut entry = entry();
        let mut rules = Vec::new();

        instantiate(&mut entry, &mut rules, "A", &exits(&["x", "y"])).unwrap();

        let lines: Vec<String> = rules.iter().map(|r| r.to_string()).collect();
        assert_eq!(
            lines,
            vec![
                "A 0 two(s_i0) 0 -",
                "A 1 two(s_i0) 1 -",
                "two(s_i0) 0 x 1 >",
                "two(s_i0) 1 two(m_i0) 1 <",
                "two(m_i0) 0 y 0 -",
                "two(m_i0) 1 two(s_i0) 0 >",
            ]
        );
        assert_eq!(entry.invocations(), 1);
    }

    #[test]
    fn test_instantiations_share_no_internal_state() {
        let mut entry = entry();
        let mut first = Vec::new();
        let mut second = Vec::new();

        instantiate(&mut entry, &mut first, "A", &exits(&["x", "y"])).unwrap();
        instantiate(&mut entry, &mut second, "B", &exits(&["x", "y"])).unwrap();

        let states = |rules: &[Transition]| -> HashSet<String> {
            rules
                .iter()
                .skip(2)
                .map(|r| r.old_state.clone())
                .collect()
        };
        assert!(states(&first).is_disjoint(&states(&second)));
        assert_eq!(entry.invocations(), 2);
    }

    #[test]
    fn test_instantiate_does_not_touch_module() {
        let mut entry = entry();
        let before = entry.module.clone();
        let mut rules = Vec::new();

        instantiate(&mut entry, &mut rules, "A", &exits(&["x", "y"])).unwrap();

        assert_eq!(entry.module, before);
    }

    #[test]
    fn test_instantiate_arity_mismatch() {
        let mut entry = entry();
        let mut rules = Vec::new();

        let error = instantiate(&mut entry, &mut rules, "A", &exits(&["x"])).unwrap_err();
        assert_eq!(
            error,
            AquaError::BindingArityMismatch {
                module: "two".into(),
                end_states: 2,
                bindings: 1,
            }
        );
        assert!(rules.is_empty());
        assert_eq!(entry.invocations(), 0);
    }

    #[test]
    fn test_entry_rules_preserve_symbol() {
        let mut entry = entry();
        let mut rules = Vec::new();
        instantiate(&mut entry, &mut rules, "A", &exits(&["x", "y"])).unwrap();

        for rule in &rules[..2] {
            assert_eq!(rule.old_symbol, rule.new_symbol);
            assert_eq!(rule.direction, Direction::Stay);
        }
        assert_eq!(rules[1].old_symbol, Symbol::One);
    }
}
