//! This module provides reachability analysis for compiled programs and the dead-rule
//! elimination built on it.
//!
//! It runs after tail-chain optimization, when the only non-moving rules left are the ones
//! landing on an end state. Those can't lead anywhere new, so only moving rules are followed.

use crate::types::{Program, Transition};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Collects every state reachable from `start_state` through moving rules.
///
/// The start state itself is always part of the result.
pub fn reachable_states(rules: &[Transition], start_state: &str) -> HashSet<String> {
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
    for rule in rules.iter().filter(|r| r.direction.moves()) {
        successors
            .entry(rule.old_state.as_str())
            .or_default()
            .push(rule.new_state.as_str());
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack = vec![start_state];

    while let Some(state) = stack.pop() {
        if !visited.insert(state) {
            continue;
        }

        if let Some(next) = successors.get(state) {
            stack.extend(next.iter().filter(|s| !visited.contains(*s)));
        }
    }

    visited.into_iter().map(str::to_string).collect()
}

/// Removes every rule whose origin state is unreachable from the program's start state.
///
/// The relative order of the remaining rules is preserved.
///
/// # Returns
///
/// The number of removed rules.
pub fn eliminate_unreachable(program: &mut Program) -> usize {
    let reachable = reachable_states(&program.rules, &program.start_state);
    let unreachable: BTreeSet<&str> = program
        .rules
        .iter()
        .map(|r| r.old_state.as_str())
        .filter(|s| !reachable.contains(*s))
        .collect();
    tracing::debug!(
        reachable = reachable.len(),
        unreachable = ?unreachable,
        "reachable states found"
    );

    let before = program.rules.len();
    program
        .rules
        .retain(|rule| reachable.contains(&rule.old_state));
    before - program.rules.len()
}
