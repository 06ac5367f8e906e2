//! Session section validation.

use crate::schema::NovachatConfig;

use super::helpers::{validate_range, validate_text};

pub(crate) fn validate_session(errors: &mut Vec<String>, config: &NovachatConfig) {
    let session = &config.session;
    validate_range(
        errors,
        "session.stall_timeout_secs",
        session.stall_timeout_secs,
        1,
        600,
    );
    validate_text(
        errors,
        "session.failure_message",
        &session.failure_message,
        500,
    );
    validate_text(
        errors,
        "session.unavailable_message",
        &session.unavailable_message,
        500,
    );
}
