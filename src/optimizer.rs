//! Tail-chain optimization.
//!
//! Parsing and module instantiation produce many rules that neither move the head nor branch,
//! e.g. the entry rules of every module call. Each such rule is rewritten to the effect of the
//! first rule along its chain that moves the head or lands on an end state.

use crate::types::{AquaError, Direction, Symbol, Transition};
use std::collections::{HashMap, HashSet};

/// Collapses no-motion chains in place.
///
/// Every rule with `Direction::Stay` whose target is not an end state takes over the target,
/// symbol and direction of the rule for its `(new_state, new_symbol)`, repeatedly, until the
/// result moves or targets an end state. Running it on its own output changes nothing.
///
/// # Returns
///
/// * `Err(AquaError::DanglingChainTarget)` if a chain reaches a pair without a rule.
/// * `Err(AquaError::CyclicChain)` if a chain revisits a pair without ever moving.
pub fn optimize(rules: &mut [Transition], end_states: &[String]) -> Result<usize, AquaError> {
    let ends: HashSet<&str> = end_states.iter().map(String::as_str).collect();

    // First rule wins if a pair is defined twice.
    let mut index: HashMap<(String, Symbol), usize> = HashMap::with_capacity(rules.len());
    for (i, rule) in rules.iter().enumerate() {
        index
            .entry((rule.old_state.clone(), rule.old_symbol))
            .or_insert(i);
    }

    let mut collapsed = 0;
    for i in 0..rules.len() {
        if !is_open(&rules[i], &ends) {
            continue;
        }

        let tail = follow_chain(rules, i, &index, &ends)?;
        rules[i] = tail;
        collapsed += 1;
    }

    Ok(collapsed)
}

/// A rule that neither moves nor ends yet.
fn is_open(rule: &Transition, ends: &HashSet<&str>) -> bool {
    rule.direction == Direction::Stay && !ends.contains(rule.new_state.as_str())
}

fn follow_chain(
    rules: &[Transition],
    start: usize,
    index: &HashMap<(String, Symbol), usize>,
    ends: &HashSet<&str>,
) -> Result<Transition, AquaError> {
    let mut rule = rules[start].clone();
    let mut visited = HashSet::new();

    while is_open(&rule, ends) {
        let key = (rule.new_state.clone(), rule.new_symbol);
        if !visited.insert(key.clone()) {
            return Err(AquaError::CyclicChain {
                state: key.0,
                symbol: key.1,
            });
        }

        let next = index
            .get(&key)
            .map(|&i| &rules[i])
            .ok_or_else(|| AquaError::DanglingChainTarget {
                state: rule.new_state.clone(),
                symbol: rule.new_symbol,
            })?;

        rule.new_state = next.new_state.clone();
        rule.new_symbol = next.new_symbol;
        rule.direction = next.direction;
    }

    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn optimized(table: &str) -> Result<Vec<String>, AquaError> {
        let mut program = parse(table)?;
        optimize(&mut program.rules, &program.end_states)?;
        Ok(program.rules.iter().map(|r| r.to_string()).collect())
    }

    #[test]
    fn test_collapses_to_first_move() {
        let rules = optimized("A E\nA 0 b 0 -\nA 1 b 1 -\nb 0 c 1 -\nb 1 c 1 -\nc 0 E 0 >\nc 1 E 1 <\n")
            .unwrap();
        assert_eq!(
            rules,
            vec![
                "A 0 E 1 <",
                "A 1 E 1 <",
                "b 0 E 1 <",
                "b 1 E 1 <",
                "c 0 E 0 >",
                "c 1 E 1 <",
            ]
        );
    }

    #[test]
    fn test_stops_at_end_state() {
        let rules = optimized("A E\nA 0 b 1 -\nA 1 b 0 -\nb 0 E 0 -\nb 1 E 1 -\n").unwrap();
        assert_eq!(rules[0], "A 0 E 1 -");
        assert_eq!(rules[1], "A 1 E 0 -");
    }

    #[test]
    fn test_moves_are_untouched() {
        let table = "A E\nA 0 A 1 >\nA 1 E 1 <\n";
        let rules = optimized(table).unwrap();
        assert_eq!(rules, vec!["A 0 A 1 >", "A 1 E 1 <"]);
    }

    #[test]
    fn test_is_idempotent() {
        let mut program =
            parse("A E\nA 0 b 0 -\nA 1 b 1 -\nb 0 c 1 -\nb 1 E 0 -\nc 1 c 0 >\n").unwrap();
        optimize(&mut program.rules, &program.end_states).unwrap();
        let once = program.rules.clone();

        let collapsed = optimize(&mut program.rules, &program.end_states).unwrap();
        assert_eq!(collapsed, 0);
        assert_eq!(program.rules, once);
    }

    #[test]
    fn test_dangling_chain_target() {
        let error = optimized("A E\nA 0 b 0 -\n").unwrap_err();
        assert_eq!(
            error,
            AquaError::DanglingChainTarget {
                state: "b".to_string(),
                symbol: Symbol::Zero,
            }
        );
    }

    #[test]
    fn test_cyclic_chain() {
        let error = optimized("A E\nA 0 b 0 -\nb 0 c 0 -\nc 0 b 0 -\n").unwrap_err();
        assert!(matches!(error, AquaError::CyclicChain { .. }));

        let error = optimized("A E\nA 1 A 1 -\n").unwrap_err();
        assert_eq!(
            error,
            AquaError::CyclicChain {
                state: "A".to_string(),
                symbol: Symbol::One,
            }
        );
    }
}
