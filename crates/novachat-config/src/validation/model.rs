//! Model section validation.

use crate::schema::NovachatConfig;

use super::helpers::{validate_range, validate_range_f64};

pub(crate) fn validate_model(errors: &mut Vec<String>, config: &NovachatConfig) {
    if config.model.name.trim().is_empty() {
        errors.push("model.name must not be empty".into());
    }
    validate_range(
        errors,
        "model.max_tokens",
        config.model.max_tokens,
        1,
        65_536,
    );
    validate_range_f64(
        errors,
        "model.temperature",
        config.model.temperature,
        0.0,
        2.0,
    );
}
