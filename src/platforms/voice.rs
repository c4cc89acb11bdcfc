use serde::Serialize;

use crate::config::AppConfig;

/// Persona handed verbatim to the external streaming-agent runtime. The
/// backend assembles it and stays out of the conversation loop entirely.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoicePersona {
    pub name: String,
    pub voice: String,
    pub instructions: String,
    pub temperature: f64,
    pub greeting: String,
}

pub fn build_persona(config: &AppConfig) -> VoicePersona {
    let name = config.voice_agent_name.clone();
    VoicePersona {
        greeting: format!(
            "Hi, I'm {name}, your content strategist. What are we posting today?"
        ),
        instructions: format!(
            "You are {name}, a social-media content strategist. Help the user plan, \
             draft, and schedule posts. Keep answers short and conversational; \
             confirm before publishing anything."
        ),
        name,
        voice: config.voice_agent_voice.clone(),
        temperature: 0.7,
    }
}
