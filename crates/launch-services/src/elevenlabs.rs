use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_json::json;

use crate::transport::{trim_api_base, HttpTransport, DEFAULT_REQUEST_TIMEOUT_MS};
use crate::{NewAgent, RemoteAgent, RetryPolicy, ServiceError, ServiceResult, VoiceAgents};

const SERVICE: &str = "elevenlabs";
const AGENT_PAGE_SIZE: &str = "100";
const MAX_AGENT_PAGES: usize = 50;

#[derive(Debug, Clone)]
/// Public struct `ElevenLabsConfig` used across launch components.
pub struct ElevenLabsConfig {
    pub api_base: String,
    pub api_key: String,
    pub request_timeout_ms: u64,
    pub retry: RetryPolicy,
}

impl ElevenLabsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base: "https://api.elevenlabs.io".to_string(),
            api_key: api_key.into(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AgentPage {
    #[serde(default)]
    agents: Vec<AgentSummary>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AgentSummary {
    agent_id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedAgent {
    agent_id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignedUrl {
    signed_url: String,
}

#[derive(Debug, Clone)]
/// ElevenLabs conversational-AI client.
pub struct ElevenLabsClient {
    transport: HttpTransport,
    api_base: String,
}

impl ElevenLabsClient {
    pub fn new(config: ElevenLabsConfig) -> ServiceResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ServiceError::MissingCredential {
                service: SERVICE,
                name: "api_key",
            });
        }
        let mut headers = HeaderMap::new();
        headers.insert(
            "xi-api-key",
            HttpTransport::header_value(SERVICE, &config.api_key)?,
        );
        let transport =
            HttpTransport::new(SERVICE, headers, config.request_timeout_ms, config.retry)?;
        Ok(Self {
            transport,
            api_base: trim_api_base(&config.api_base),
        })
    }
}

#[async_trait]
impl VoiceAgents for ElevenLabsClient {
    fn service_name(&self) -> &'static str {
        SERVICE
    }

    async fn list_agents(&self) -> ServiceResult<Vec<RemoteAgent>> {
        let url = format!("{}/v1/convai/agents", self.api_base);
        let mut rows = Vec::new();
        let mut cursor: Option<String> = None;
        for _ in 0..MAX_AGENT_PAGES {
            let page: AgentPage = self
                .transport
                .json("list agents", |http| {
                    let request = http.get(&url).query(&[("page_size", AGENT_PAGE_SIZE)]);
                    match cursor.as_deref() {
                        Some(cursor) => request.query(&[("cursor", cursor)]),
                        None => request,
                    }
                })
                .await?;
            rows.extend(page.agents.into_iter().map(|agent| RemoteAgent {
                agent_id: agent.agent_id,
                name: agent.name,
            }));
            match page.next_cursor {
                Some(next) if page.has_more && !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }
        Ok(rows)
    }

    async fn create_agent(&self, agent: &NewAgent) -> ServiceResult<RemoteAgent> {
        let url = format!("{}/v1/convai/agents/create", self.api_base);
        let payload = json!({
            "name": agent.name,
            "conversation_config": {
                "agent": {
                    "prompt": { "prompt": agent.prompt },
                    "first_message": agent.first_message,
                    "language": agent.language,
                },
                "tts": {
                    "voice_id": agent.voice_id,
                    "model_id": agent.tts_model,
                },
                "stt": { "provider": "elevenlabs" },
                "turn": { "mode": agent.turn_mode.as_str() },
            },
        });
        let created: CreatedAgent = self
            .transport
            .json("create agent", |http| http.post(&url).json(&payload))
            .await?;
        Ok(RemoteAgent {
            agent_id: created.agent_id,
            name: created.name.unwrap_or_else(|| agent.name.clone()),
        })
    }

    async fn session_url(&self, agent_id: &str) -> ServiceResult<String> {
        let url = format!("{}/v1/convai/conversation/get_signed_url", self.api_base);
        let signed: SignedUrl = self
            .transport
            .json("get session url", |http| {
                http.get(&url).query(&[("agent_id", agent_id)])
            })
            .await?;
        Ok(signed.signed_url)
    }
}

#[cfg(test)]
mod tests {
    use super::{ElevenLabsClient, ElevenLabsConfig};
    use crate::ServiceError;

    #[test]
    fn unit_client_requires_api_key() {
        let error = ElevenLabsClient::new(ElevenLabsConfig::new("  ")).expect_err("missing key");
        assert!(matches!(
            error,
            ServiceError::MissingCredential {
                service: "elevenlabs",
                name: "api_key"
            }
        ));
    }
}
