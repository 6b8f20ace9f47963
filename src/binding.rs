//! Resolution of call-site bindings: which caller state each end state of a module leads to.
//!
//! Three forms are accepted inside the parentheses of a module call:
//!
//! * type 0, empty: every end state continues at the default state.
//! * type 1, a single token: `target` for a module with one end state, or `!target` to send
//!   every end state to `target`.
//! * type 2, `end:target` tokens: named end states go to their target, all others to the
//!   default state. Names that match no end state are ignored.

use crate::module::Module;
use crate::types::{AquaError, ACTION_CHAR, EXPLICIT_STATE};

/// Computes the continuation state of every end state of `module`, in end state order.
///
/// # Arguments
///
/// * `module` - The declared module being called.
/// * `binding_text` - The text between the call's parentheses; empty for unbound calls.
/// * `default_target` - The implicit state following the call.
pub fn resolve(
    module: &Module,
    binding_text: &str,
    default_target: &str,
) -> Result<Vec<String>, AquaError> {
    let tokens: Vec<&str> = binding_text.split_whitespace().collect();
    let end_count = module.end_states.len();

    if tokens.is_empty() {
        return Ok(vec![default_target.to_string(); end_count]);
    }

    if !tokens.iter().any(|t| t.contains(EXPLICIT_STATE)) {
        let [token] = tokens.as_slice() else {
            return Err(AquaError::BindingAfterPureType1 {
                binding: binding_text.to_string(),
            });
        };

        if let Some(target) = token.strip_prefix(ACTION_CHAR) {
            return Ok(vec![non_empty(target, binding_text)?; end_count]);
        }

        if end_count > 1 {
            return Err(AquaError::PureBindingArityMismatch {
                module: module.name.clone(),
                binding: binding_text.to_string(),
            });
        }
        return Ok(vec![token.to_string()]);
    }

    let explicit = tokens
        .iter()
        .map(|token| match token.split_once(EXPLICIT_STATE) {
            Some((end, target)) => Ok((end, non_empty(target, binding_text)?)),
            None => Err(AquaError::BindingAfterPureType1 {
                binding: binding_text.to_string(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(module
        .end_states
        .iter()
        .map(|es| {
            let local = module.local_name(es).unwrap_or(es.as_str());
            explicit
                .iter()
                .find(|(end, _)| *end == local)
                .map(|(_, target)| target.clone())
                .unwrap_or_else(|| default_target.to_string())
        })
        .collect())
}

fn non_empty(target: &str, binding_text: &str) -> Result<String, AquaError> {
    if target.is_empty() {
        return Err(AquaError::EmptyBindingTarget {
            binding: binding_text.to_string(),
        });
    }
    Ok(target.to_string())
}
