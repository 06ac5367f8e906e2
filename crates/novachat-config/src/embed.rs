//! Widget integration helpers: project keys and the embed snippet.

use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

use crate::schema::AgentConfig;

/// Prefix of every public project key.
pub const PROJECT_KEY_PREFIX: &str = "pk_live_tn_";

/// Where the loader script is served from.
pub const LOADER_URL: &str = "https://cdn.technova.com.br/chat-widget/v2.5/loader.js";

const KEY_SUFFIX_LEN: usize = 13;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

static PROJECT_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^pk_live_tn_[0-9a-z]{8,32}$").expect("project key pattern compiles")
});

/// Generate a fresh public project key.
///
/// The key is a client-side identifier only; nothing validates it remotely.
pub fn generate_project_key() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..KEY_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{PROJECT_KEY_PREFIX}{suffix}")
}

/// Replace the agent's project key with a new one, returning the old key.
pub fn rotate_project_key(agent: &mut AgentConfig) -> String {
    let new_key = generate_project_key();
    tracing::info!("project key rotated");
    std::mem::replace(&mut agent.project_api_key, new_key)
}

/// Whether `key` has the `pk_live_tn_<base36>` shape.
pub fn is_valid_project_key(key: &str) -> bool {
    PROJECT_KEY_RE.is_match(key)
}

/// Rough token count of an instruction (four characters per token).
pub fn estimated_tokens(instruction: &str) -> usize {
    instruction.chars().count() / 4
}

/// Render the HTML snippet a site owner pastes before `</body>`.
pub fn embed_snippet(agent: &AgentConfig) -> String {
    format!(
        "<script>\n  window.TECHNOVA_CHAT_CONFIG = {{\n    apiKey: \"{}\",\n    botName: \"{}\",\n    theme: \"{}\",\n  }};\n</script>\n<script src=\"{LOADER_URL}\" async></script>",
        escape_js(&agent.project_api_key),
        escape_js(&agent.bot_name),
        agent.primary_color.as_str(),
    )
}

fn escape_js(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '<' => out.push_str("\\u003c"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}
