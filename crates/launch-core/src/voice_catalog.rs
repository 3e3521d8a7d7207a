//! Fixed voice catalogue for conversational agents.
//!
//! Free-form gender/tone strings are parsed into closed enums up front; every
//! unrecognized value resolves to [`VoiceSelection::Default`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Catalogue entries offered by the voice service.
pub enum CatalogVoice {
    Adam,
    Sarah,
    Rachel,
    Domi,
}

impl CatalogVoice {
    pub fn voice_id(self) -> &'static str {
        match self {
            Self::Adam => "pNInz6obpgDQGcFmaJgB",
            Self::Sarah => "EXAVITQu4vr4xnSDxMaL",
            Self::Rachel => "21m00Tcm4TlvDq8ikWAM",
            Self::Domi => "AZnzlk1XvdvUeBnXmlld",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Enumerates supported `VoiceGender` values.
pub enum VoiceGender {
    Female,
    Male,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Enumerates supported `InterviewTone` values.
pub enum InterviewTone {
    Formal,
    Professional,
    Friendly,
    Casual,
}

impl InterviewTone {
    /// Opening utterance used by interviewers configured with this tone.
    pub fn greeting(self, company_name: &str) -> String {
        match self {
            Self::Formal => format!(
                "Good day. Thank you for joining this {company_name} interview. I appreciate you taking the time to speak with me today. May I ask your name?"
            ),
            Self::Professional => format!(
                "Hi there! Thank you for joining this interview with {company_name}. I really appreciate you taking the time. Before we begin, may I ask your name?"
            ),
            Self::Friendly => "Hey! Thanks so much for chatting with me today. I'm really looking forward to hearing your thoughts. What's your name?".to_string(),
            Self::Casual => "Hi! Thanks for hopping on. I'd love to hear your perspective. First off, what's your name?".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Requested agent voice.
pub enum VoiceSelection {
    Gender(VoiceGender),
    Tone(InterviewTone),
    #[default]
    Default,
}

impl VoiceSelection {
    pub const DEFAULT_VOICE: CatalogVoice = CatalogVoice::Sarah;

    /// Parses a user-provided selection; unknown or blank input maps to
    /// [`VoiceSelection::Default`].
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" => Self::Gender(VoiceGender::Male),
            "female" => Self::Gender(VoiceGender::Female),
            "formal" => Self::Tone(InterviewTone::Formal),
            "professional" => Self::Tone(InterviewTone::Professional),
            "friendly" => Self::Tone(InterviewTone::Friendly),
            "casual" => Self::Tone(InterviewTone::Casual),
            _ => Self::Default,
        }
    }

    pub fn voice(self) -> CatalogVoice {
        match self {
            Self::Gender(VoiceGender::Male) => CatalogVoice::Adam,
            Self::Gender(VoiceGender::Female) => CatalogVoice::Sarah,
            Self::Tone(InterviewTone::Formal) => CatalogVoice::Adam,
            Self::Tone(InterviewTone::Professional) => CatalogVoice::Sarah,
            Self::Tone(InterviewTone::Friendly) => CatalogVoice::Rachel,
            Self::Tone(InterviewTone::Casual) => CatalogVoice::Domi,
            Self::Default => Self::DEFAULT_VOICE,
        }
    }

    pub fn voice_id(self) -> &'static str {
        self.voice().voice_id()
    }
}
