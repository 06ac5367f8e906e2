//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
///
/// The project key is written out so it stays stable across restarts.
pub(crate) fn default_config_toml(project_api_key: &str) -> String {
    format!(
        r##"# NovaChat Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[agent]
# bot_name = "Sofia - TechNova"
# welcome_message = "Olá! Como posso ajudar você a transformar seu negócio hoje?"
# primary_color = "indigo"   # indigo | blue | green | rose | orange
# system_instruction = """
# Você é um assistente virtual da empresa TechNova.
# """
project_api_key = "{project_api_key}"

[model]
# name = "gemini-2.5-flash"
# max_tokens = 4096          # 1-65536
# temperature = 0.7          # 0.0-2.0

[session]
# stall_timeout_secs = 30    # 1-600
# failure_message = "Desculpe, estou com dificuldades de conexão no momento. Tente novamente mais tarde."
# unavailable_message = "Não foi possível conectar ao serviço de IA."

[logging]
# level = "info"             # trace | debug | info | warn | error
"##
    )
}
