//! Safety limit checks for robot commands

use crate::policy::SafetyConstraint;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Outcome of checking one command parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyCheck {
    pub parameter: String,
    pub value: f64,
    pub passed: bool,
    pub violations: Vec<String>,
}

/// Check a command value against every constraint on its parameter
///
/// A parameter with no constraint passes.
pub fn check_command(constraints: &[SafetyConstraint], parameter: &str, value: f64) -> SafetyCheck {
    let violations: Vec<String> = constraints
        .iter()
        .filter(|c| c.parameter == parameter)
        .filter(|c| !c.operator.compare_numbers(value, c.value))
        .map(|c| {
            let message = violation_message(c, value);
            warn!(constraint_id = %c.id, parameter, value, limit = c.value, "safety violation");
            message
        })
        .collect();

    SafetyCheck {
        parameter: parameter.to_string(),
        value,
        passed: violations.is_empty(),
        violations,
    }
}

/// Check several command parameters at once
pub fn check_params<'a>(
    constraints: &[SafetyConstraint],
    params: impl IntoIterator<Item = (&'a str, f64)>,
) -> Vec<SafetyCheck> {
    params
        .into_iter()
        .map(|(parameter, value)| check_command(constraints, parameter, value))
        .collect()
}

fn violation_message(constraint: &SafetyConstraint, value: f64) -> String {
    let mut message = format!(
        "{} = {}{} violates {} ({} {} {}{})",
        constraint.parameter,
        value,
        constraint.unit,
        constraint.id,
        constraint.parameter,
        constraint.operator,
        constraint.value,
        constraint.unit
    );
    if let Some(source) = &constraint.source {
        message.push_str(&format!(" [from: {}]", source));
    }
    message
}
