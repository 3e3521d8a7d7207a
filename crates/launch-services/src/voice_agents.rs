use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ServiceResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Conversation turn-taking modes supported by the voice service.
pub enum TurnMode {
    #[default]
    TurnBased,
    Silence,
}

impl TurnMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TurnBased => "turn_based",
            Self::Silence => "silence",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `RemoteAgent` used across launch components.
pub struct RemoteAgent {
    pub agent_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Full conversational-agent configuration for creation.
pub struct NewAgent {
    pub name: String,
    pub prompt: String,
    pub first_message: String,
    pub voice_id: String,
    pub language: String,
    pub tts_model: String,
    pub turn_mode: TurnMode,
}

#[async_trait]
/// Trait contract for conversational voice-agent services.
pub trait VoiceAgents: Send + Sync {
    fn service_name(&self) -> &'static str;

    async fn list_agents(&self) -> ServiceResult<Vec<RemoteAgent>>;

    async fn create_agent(&self, agent: &NewAgent) -> ServiceResult<RemoteAgent>;

    /// Signed URL for starting a conversation with `agent_id`.
    async fn session_url(&self, agent_id: &str) -> ServiceResult<String>;
}
