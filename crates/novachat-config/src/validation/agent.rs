//! Agent section validation.

use crate::embed::is_valid_project_key;
use crate::schema::NovachatConfig;

use super::helpers::validate_text;

const MAX_BOT_NAME: usize = 60;
const MAX_WELCOME: usize = 500;
const MAX_INSTRUCTION: usize = 20_000;

pub(crate) fn validate_agent(errors: &mut Vec<String>, config: &NovachatConfig) {
    let agent = &config.agent;
    validate_text(errors, "agent.bot_name", &agent.bot_name, MAX_BOT_NAME);
    validate_text(
        errors,
        "agent.welcome_message",
        &agent.welcome_message,
        MAX_WELCOME,
    );

    // An empty instruction is allowed and selects the built-in persona.
    let len = agent.system_instruction.chars().count();
    if len > MAX_INSTRUCTION {
        errors.push(format!(
            "agent.system_instruction is {len} characters, max is {MAX_INSTRUCTION}"
        ));
    }

    if !is_valid_project_key(&agent.project_api_key) {
        errors.push(format!(
            "agent.project_api_key '{}' is not a pk_live_tn_ key",
            agent.project_api_key
        ));
    }
}
