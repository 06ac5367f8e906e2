//! Shared validation helpers used by all section validators.

/// Push an error if `value` is outside `[min, max]` (integer).
pub(crate) fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Push an error if `value` is outside `[min, max]` (float).
pub(crate) fn validate_range_f64(
    errors: &mut Vec<String>,
    name: &str,
    value: f64,
    min: f64,
    max: f64,
) {
    if !(min..=max).contains(&value) {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Push an error if `value` is blank or longer than `max_chars`.
pub(crate) fn validate_text(errors: &mut Vec<String>, name: &str, value: &str, max_chars: usize) {
    if value.trim().is_empty() {
        errors.push(format!("{name} must not be empty"));
        return;
    }
    let len = value.chars().count();
    if len > max_chars {
        errors.push(format!("{name} is {len} characters, max is {max_chars}"));
    }
}
