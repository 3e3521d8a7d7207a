use serde::{Deserialize, Serialize};

use crate::{ConfigError, TenantName, VoiceSelection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Descriptive tenant metadata collected by the setup flow.
pub struct TenantMetadata {
    pub platform_name: String,
    pub company_name: Option<String>,
    pub description: Option<String>,
}

impl TenantMetadata {
    pub fn new(platform_name: impl Into<String>) -> Self {
        Self {
            platform_name: platform_name.into(),
            company_name: None,
            description: None,
        }
    }

    /// Company name when provided, platform name otherwise.
    pub fn display_name(&self) -> &str {
        self.company_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(self.platform_name.trim())
    }
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Credentials and identifiers carried between provisioning steps.
pub struct SecretBundle {
    pub datastore_url: Option<String>,
    pub datastore_anon_key: Option<String>,
    pub datastore_service_key: Option<String>,
    pub voice_api_key: Option<String>,
    /// Agent id from a previous run; makes the agent step re-entrant.
    pub agent_id: Option<String>,
}

impl std::fmt::Debug for SecretBundle {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(value: &Option<String>) -> &'static str {
            match value {
                Some(_) => "<redacted>",
                None => "<unset>",
            }
        }
        formatter
            .debug_struct("SecretBundle")
            .field("datastore_url", &self.datastore_url)
            .field("datastore_anon_key", &redact(&self.datastore_anon_key))
            .field("datastore_service_key", &redact(&self.datastore_service_key))
            .field("voice_api_key", &redact(&self.voice_api_key))
            .field("agent_id", &self.agent_id)
            .finish()
    }
}

#[derive(Debug, Clone)]
/// One tenant setup request, consumed by the orchestrator.
pub struct ProvisioningRequest {
    pub tenant: TenantName,
    pub metadata: TenantMetadata,
    pub secrets: SecretBundle,
    pub voice: VoiceSelection,
}

impl ProvisioningRequest {
    pub fn builder(platform_name: impl Into<String>) -> ProvisioningRequestBuilder {
        ProvisioningRequestBuilder {
            tenant_seed: None,
            metadata: TenantMetadata::new(platform_name),
            secrets: SecretBundle::default(),
            voice: VoiceSelection::Default,
        }
    }
}

#[derive(Debug, Clone)]
/// Incremental builder for [`ProvisioningRequest`].
pub struct ProvisioningRequestBuilder {
    tenant_seed: Option<String>,
    metadata: TenantMetadata,
    secrets: SecretBundle,
    voice: VoiceSelection,
}

impl ProvisioningRequestBuilder {
    /// Overrides the canonical-name seed (defaults to the platform name).
    pub fn tenant_seed(mut self, seed: impl Into<String>) -> Self {
        self.tenant_seed = Some(seed.into());
        self
    }

    pub fn company_name(mut self, company_name: impl Into<String>) -> Self {
        self.metadata.company_name = non_blank(company_name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = non_blank(description.into());
        self
    }

    pub fn secrets(mut self, secrets: SecretBundle) -> Self {
        self.secrets = secrets;
        self
    }

    pub fn voice(mut self, voice: VoiceSelection) -> Self {
        self.voice = voice;
        self
    }

    pub fn build(self) -> Result<ProvisioningRequest, ConfigError> {
        if self.metadata.platform_name.trim().is_empty() {
            return Err(ConfigError::MissingPlatformName);
        }
        let seed = self
            .tenant_seed
            .as_deref()
            .unwrap_or(self.metadata.platform_name.as_str());
        let tenant = TenantName::new(seed)?;
        Ok(ProvisioningRequest {
            tenant,
            metadata: self.metadata,
            secrets: self.secrets,
            voice: self.voice,
        })
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
