use std::sync::Arc;

use launch_core::{
    InterviewTone, Readiness, ResourceKind, ResourceOrigin, ResourceRecord, TenantMetadata,
    TenantName, VoiceSelection,
};
use launch_services::{NewAgent, ServiceError, ServiceResult, TurnMode, VoiceAgents};

use crate::existence::{lookup, Lookup};

pub const SETUP_FIRST_MESSAGE: &str = "Hi, I'm your AI setup assistant. I'll help you create a custom AI voice interviewer in just a few minutes. What's your name?";

pub const SETUP_AGENT_PROMPT: &str = r#"You are a Setup Agent for an AI Interview Platform. Your job is to help users design their custom AI interviewer through voice conversation.

## Opening
Greet the user, introduce yourself as their setup assistant and ask for their name.

Then ask what they would like their AI interviewer to help with, for example customer feedback, user research, job screening or surveys.

## Gather These Details (one at a time)
1. Interview purpose - what they want to learn
2. Target audience - who will be interviewed
3. Tone - professional, friendly, or casual
4. Duration - how long interviews should take
5. Key topics - main areas to cover
6. Constraints - topics to avoid

## Rules
- ONE question at a time
- Under 30 words per response
- Be warm and encouraging
- Confirm before moving on

## Wrap Up
Summarize what you learned, then tell the user they can hang up, check their screen for the summary and expect their interview link by email shortly."#;

/// Agent display name for a tenant, using the setup template.
pub fn agent_display_name(metadata: &TenantMetadata) -> String {
    AgentTemplate::setup().display_name(metadata)
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// How an agent opens the conversation.
pub enum Opening {
    /// Same utterance whatever voice is selected.
    Fixed(String),
    /// Interviewer greeting for the selected tone, professional otherwise.
    ToneGreeting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Prompt, opening and naming for one kind of agent.
pub struct AgentTemplate {
    pub role: String,
    pub prompt: String,
    pub opening: Opening,
}

impl AgentTemplate {
    /// The setup assistant provisioned for every new tenant.
    pub fn setup() -> Self {
        Self {
            role: "Setup Agent".to_string(),
            prompt: SETUP_AGENT_PROMPT.to_string(),
            opening: Opening::Fixed(SETUP_FIRST_MESSAGE.to_string()),
        }
    }

    pub fn interviewer(prompt: impl Into<String>) -> Self {
        Self {
            role: "Interviewer".to_string(),
            prompt: prompt.into(),
            opening: Opening::ToneGreeting,
        }
    }

    pub fn display_name(&self, metadata: &TenantMetadata) -> String {
        format!("{} {}", metadata.display_name(), self.role)
    }

    pub fn first_message(&self, metadata: &TenantMetadata, voice: VoiceSelection) -> String {
        match &self.opening {
            Opening::Fixed(message) => message.clone(),
            Opening::ToneGreeting => {
                let tone = match voice {
                    VoiceSelection::Tone(tone) => tone,
                    VoiceSelection::Gender(_) | VoiceSelection::Default => {
                        InterviewTone::Professional
                    }
                };
                tone.greeting(metadata.display_name())
            }
        }
    }
}

impl Default for AgentTemplate {
    fn default() -> Self {
        Self::setup()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Outcome of [`AgentProvisioner::ensure_agent`].
pub struct AgentOutcome {
    pub agent_id: String,
    pub display_name: String,
    pub record: ResourceRecord,
}

/// Creates or reuses the tenant's conversational voice agent.
pub struct AgentProvisioner {
    agents: Arc<dyn VoiceAgents>,
    language: String,
    tts_model: String,
    turn_mode: TurnMode,
}

impl AgentProvisioner {
    pub fn new(
        agents: Arc<dyn VoiceAgents>,
        language: impl Into<String>,
        tts_model: impl Into<String>,
        turn_mode: TurnMode,
    ) -> Self {
        Self {
            agents,
            language: language.into(),
            tts_model: tts_model.into(),
            turn_mode,
        }
    }

    /// Full creation payload for `template`, `metadata` and `voice`.
    pub fn agent_config(
        &self,
        template: &AgentTemplate,
        metadata: &TenantMetadata,
        voice: VoiceSelection,
    ) -> NewAgent {
        NewAgent {
            name: template.display_name(metadata),
            prompt: template.prompt.clone(),
            first_message: template.first_message(metadata, voice),
            voice_id: voice.voice_id().to_string(),
            language: self.language.clone(),
            tts_model: self.tts_model.clone(),
            turn_mode: self.turn_mode,
        }
    }

    /// Reuses `known_agent_id` when given, else matches by exact display name
    /// (first match wins), else creates. Creation errors propagate.
    #[tracing::instrument(
        name = "launch.provision.agent",
        skip_all,
        fields(tenant = %tenant, service = self.agents.service_name())
    )]
    pub async fn ensure_agent(
        &self,
        tenant: &TenantName,
        template: &AgentTemplate,
        metadata: &TenantMetadata,
        voice: VoiceSelection,
        known_agent_id: Option<&str>,
    ) -> ServiceResult<AgentOutcome> {
        let display_name = template.display_name(metadata);
        let record = |agent_id: &str, origin: ResourceOrigin| ResourceRecord {
            kind: ResourceKind::Agent,
            external_id: agent_id.to_string(),
            canonical_name: tenant.clone(),
            url: None,
            origin,
            readiness: Readiness::Ready,
        };

        if let Some(agent_id) = known_agent_id.map(str::trim).filter(|id| !id.is_empty()) {
            tracing::info!(agent_id, "reusing agent id from secret bundle");
            return Ok(AgentOutcome {
                agent_id: agent_id.to_string(),
                record: record(agent_id, ResourceOrigin::Existing),
                display_name,
            });
        }

        let existing = lookup(self.agents.service_name(), &display_name, async {
            let agents = self.agents.list_agents().await?;
            Ok::<_, ServiceError>(agents.into_iter().find(|agent| agent.name == display_name))
        })
        .await;

        if let Lookup::Found(agent) = existing {
            tracing::info!(agent_id = %agent.agent_id, "reusing existing agent");
            return Ok(AgentOutcome {
                record: record(&agent.agent_id, ResourceOrigin::Existing),
                agent_id: agent.agent_id,
                display_name,
            });
        }

        let created = self
            .agents
            .create_agent(&self.agent_config(template, metadata, voice))
            .await?;
        tracing::info!(agent_id = %created.agent_id, "created agent");
        Ok(AgentOutcome {
            record: record(&created.agent_id, ResourceOrigin::Created),
            agent_id: created.agent_id,
            display_name,
        })
    }
}
