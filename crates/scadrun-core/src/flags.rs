//! Parameter-to-flag translation.
//!
//! Each parameter becomes one `-D<name>=<literal>` argument for the external
//! tool. The literal is chosen by a cascading type-inference policy, kept as
//! an explicit ordered rule table so each rule stays testable on its own.
//! Translation never fails: anything no rule claims is emitted as a quoted
//! string.

use serde_json::Value;

use crate::params::ParameterSet;

/// One inference rule: returns the rendered literal when the rule applies.
type Rule = fn(&Value) -> Option<String>;

/// Inference rules in precedence order. The first rule that applies wins;
/// [`quoted_fallback`] handles the rest.
const RULES: &[(&str, Rule)] = &[
    ("native-bool", native_bool),
    ("native-number", native_number),
    ("boolean-word", boolean_word),
    ("bracketed-literal", bracketed_literal),
    ("numeric-string", numeric_string),
];

/// Translate one parameter set into the ordered `-D` flag list.
///
/// Translating the same set twice yields identical sequences; flag order
/// follows parameter order.
pub fn translate(set: &ParameterSet) -> Vec<String> {
    set.params()
        .iter()
        .map(|(name, value)| format!("-D{}={}", name, render_value(value)))
        .collect()
}

/// Render one value through the rule cascade.
pub fn render_value(value: &Value) -> String {
    for (_, rule) in RULES {
        if let Some(rendered) = rule(value) {
            return rendered;
        }
    }
    quoted_fallback(value)
}

/// Native booleans become bare lowercase literals.
fn native_bool(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Native numbers pass through exactly as given.
fn native_number(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Strings spelling a boolean (any casing) become bare boolean literals.
fn boolean_word(value: &Value) -> Option<String> {
    let s = value.as_str()?;
    if s.eq_ignore_ascii_case("true") {
        Some("true".to_string())
    } else if s.eq_ignore_ascii_case("false") {
        Some("false".to_string())
    } else {
        None
    }
}

/// Strings shaped like an array or object literal pass through unquoted for
/// the tool to evaluate.
fn bracketed_literal(value: &Value) -> Option<String> {
    let s = value.as_str()?;
    let trimmed = s.trim();
    let bracketed = (trimmed.starts_with('[') && trimmed.ends_with(']'))
        || (trimmed.starts_with('{') && trimmed.ends_with('}'));
    if bracketed && trimmed.len() >= 2 {
        Some(s.to_string())
    } else {
        None
    }
}

/// Numeric strings are coerced: a whole-valued float is emitted as an
/// integer literal, anything fractional is emitted as-is.
fn numeric_string(value: &Value) -> Option<String> {
    let s = value.as_str()?;
    let trimmed = s.trim();
    let parsed: f64 = trimmed.parse().ok()?;
    if parsed.fract() == 0.0 && parsed.is_finite() && parsed.abs() <= i64::MAX as f64 {
        Some((parsed as i64).to_string())
    } else {
        Some(trimmed.to_string())
    }
}

/// Everything else is stringified and double-quoted.
fn quoted_fallback(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{s}\""),
        other => format!("\"{other}\""),
    }
}
