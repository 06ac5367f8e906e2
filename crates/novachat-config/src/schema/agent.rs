//! Agent persona configuration: what the widget says and how it looks.

use serde::{Deserialize, Serialize};

use crate::embed::generate_project_key;

/// Instruction used when `agent.system_instruction` is left at its default.
pub const DEFAULT_AGENT_INSTRUCTION: &str = "Você é um assistente virtual da empresa TechNova.
Seus objetivos são:
1. Responder dúvidas sobre nossos planos SaaS.
2. Agendar demonstrações técnicas.
3. Ser cordial e direto.

Informações da Empresa:
- Planos começam em R$99/mês.
- Atendemos 24/7.
- Garantia de 30 dias de reembolso.";

/// Accent color of the embedded widget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WidgetColor {
    #[default]
    Indigo,
    Blue,
    Green,
    Rose,
    Orange,
}

impl WidgetColor {
    pub const ALL: [WidgetColor; 5] = [
        WidgetColor::Indigo,
        WidgetColor::Blue,
        WidgetColor::Green,
        WidgetColor::Rose,
        WidgetColor::Orange,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WidgetColor::Indigo => "indigo",
            WidgetColor::Blue => "blue",
            WidgetColor::Green => "green",
            WidgetColor::Rose => "rose",
            WidgetColor::Orange => "orange",
        }
    }
}

/// Agent persona and integration settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    pub bot_name: String,
    /// First bot message of every session.
    pub welcome_message: String,
    pub primary_color: WidgetColor,
    /// Steers the remote model. Empty means the built-in support persona.
    pub system_instruction: String,
    /// Public key pasted into the embed snippet (`pk_live_tn_...`).
    ///
    /// Empty when the file has none; the loader then generates and saves one.
    #[serde(default)]
    pub project_api_key: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            bot_name: "Sofia - TechNova".into(),
            welcome_message: "Olá! Como posso ajudar você a transformar seu negócio hoje?".into(),
            primary_color: WidgetColor::Indigo,
            system_instruction: DEFAULT_AGENT_INSTRUCTION.into(),
            project_api_key: generate_project_key(),
        }
    }
}

impl AgentConfig {
    /// Defaults without a project key, as read from a file that has none.
    pub(crate) fn keyless() -> Self {
        Self {
            project_api_key: String::new(),
            ..Self::default()
        }
    }

    /// True if `other` would require a chat session reset.
    pub fn session_differs(&self, other: &AgentConfig) -> bool {
        self.system_instruction != other.system_instruction
            || self.welcome_message != other.welcome_message
    }
}
