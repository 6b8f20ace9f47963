//! This module provides the parser for compiled transition tables, utilizing the `pest` crate.
//! The grammar in `grammar.pest` splits the text into comment lines and lines of fields; the
//! functions here turn those fields into a `Program`, validating the header and every rule.

use crate::types::{AquaError, Direction, Program, Symbol, Transition};
use pest::{iterators::Pair, Parser as PestParser};
use pest_derive::Parser as PestParser;

/// Number of fields on a rule line: `old_state old_symbol new_state new_symbol action`.
pub const RULE_TOKEN_COUNT: usize = 5;

/// Derives a `PestParser` for the table grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct TableParser;

/// Parses compiled table text into a `Program`.
///
/// The first non-comment, non-blank line is the state header, every following one a rule.
/// Lines starting with `#` are skipped.
///
/// # Arguments
///
/// * `input` - A string slice containing the table.
///
/// # Returns
///
/// * `Ok(Program)` if the header and all rules are valid.
/// * `Err(AquaError::MalformedHeader)` if the header has fewer than two tokens.
/// * `Err(AquaError::MalformedRule)` if a rule line does not have exactly five tokens.
/// * `Err(AquaError::InvalidSymbol)` / `Err(AquaError::InvalidAction)` for bad rule fields.
pub fn parse(input: &str) -> Result<Program, AquaError> {
    let pairs = TableParser::parse(Rule::table, input)
        .map_err(|e| AquaError::ParseError(Box::new(e)))?;

    let mut header: Option<(String, Vec<String>)> = None;
    let mut rules = Vec::new();

    for line in pairs.flat_map(|table| table.into_inner()) {
        if line.as_rule() != Rule::line {
            continue; // EOI
        }

        let text = line.as_str();
        let Some(fields) = line_fields(line) else {
            continue; // comment
        };
        if fields.is_empty() {
            continue;
        }

        match header {
            None => header = Some(header_from_tokens(&fields, text)?),
            Some(_) => rules.push(rule_from_tokens(&fields, text)?),
        }
    }

    let (start_state, end_states) = header.ok_or(AquaError::MissingHeader)?;

    Ok(Program {
        start_state,
        end_states,
        rules,
    })
}

/// Parses a state header line: the start state followed by one or more end states.
pub fn parse_header(line: &str) -> Result<(String, Vec<String>), AquaError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    header_from_tokens(&tokens, line)
}

/// Extracts the fields of a `line` pair, or `None` for a comment line.
fn line_fields<'i>(line: Pair<'i, Rule>) -> Option<Vec<&'i str>> {
    let inner = line.into_inner().next()?;
    match inner.as_rule() {
        Rule::fields => Some(inner.into_inner().map(|field| field.as_str()).collect()),
        _ => None,
    }
}

fn header_from_tokens(tokens: &[&str], line: &str) -> Result<(String, Vec<String>), AquaError> {
    match tokens {
        [start, ends @ ..] if !ends.is_empty() => Ok((
            start.to_string(),
            ends.iter().map(|s| s.to_string()).collect(),
        )),
        _ => Err(AquaError::MalformedHeader(line.to_string())),
    }
}

fn rule_from_tokens(tokens: &[&str], line: &str) -> Result<Transition, AquaError> {
    let [old_state, old_symbol, new_state, new_symbol, action] = tokens else {
        return Err(AquaError::MalformedRule(line.to_string()));
    };

    Ok(Transition {
        old_state: old_state.to_string(),
        old_symbol: parse_symbol(old_symbol, line)?,
        new_state: new_state.to_string(),
        new_symbol: parse_symbol(new_symbol, line)?,
        direction: parse_direction(action, line)?,
    })
}

/// Parses a symbol token, which must be exactly `0` or `1`.
fn parse_symbol(token: &str, line: &str) -> Result<Symbol, AquaError> {
    single_char(token)
        .and_then(Symbol::from_char)
        .ok_or_else(|| AquaError::InvalidSymbol {
            token: token.to_string(),
            line: line.to_string(),
        })
}

/// Parses an action token: `<` for Left, `>` for Right and `-` for Stay.
fn parse_direction(token: &str, line: &str) -> Result<Direction, AquaError> {
    single_char(token)
        .and_then(Direction::from_char)
        .ok_or_else(|| AquaError::InvalidAction {
            token: token.to_string(),
            line: line.to_string(),
        })
}

fn single_char(token: &str) -> Option<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
