//! This module renders programs in the compiled table format, the counterpart of the table
//! parser, and as JSON for other tools.

use crate::types::{AquaError, Program};

/// Encodes a program as table text.
///
/// Format:
/// - first line: start state and end states, space separated.
/// - one line per rule: `old_state old_symbol new_state new_symbol action`.
///
/// Every line, including the last, ends with a newline. No comments are emitted.
pub fn encode(program: &Program) -> String {
    let mut out = header(program);
    out.push('\n');

    for rule in &program.rules {
        out.push_str(&rule.to_string());
        out.push('\n');
    }

    out
}

/// Encodes a program as pretty-printed JSON.
pub fn encode_json(program: &Program) -> Result<String, AquaError> {
    serde_json::to_string_pretty(program)
        .map_err(|e| AquaError::FileError(format!("Failed to serialize program: {}", e)))
}

fn header(program: &Program) -> String {
    std::iter::once(program.start_state.as_str())
        .chain(program.end_states.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::types::{Direction, Symbol, Transition};

    fn program() -> Program {
        Program {
            start_state: "A".to_string(),
            end_states: vec!["E".to_string(), "F".to_string()],
            rules: vec![
                Transition::new("A", Symbol::Zero, "E", Symbol::One, Direction::Right),
                Transition::new("A", Symbol::One, "F", Symbol::One, Direction::Stay),
            ],
        }
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode(&program()), "A E F\nA 0 E 1 >\nA 1 F 1 -\n");
    }

    #[test]
    fn test_encoded_table_parses_back() {
        let program = program();
        assert_eq!(parse(&encode(&program)).unwrap(), program);
    }

    #[test]
    fn test_encode_json() {
        let json = encode_json(&program()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["start_state"], "A");
        assert_eq!(value["end_states"][1], "F");
        assert_eq!(value["rules"][0]["new_symbol"], "1");
        assert_eq!(value["rules"][0]["direction"], "Right");
    }
}
