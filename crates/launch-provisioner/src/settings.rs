use launch_core::ConfigError;
use launch_services::{
    BuildProfile, ElevenLabsConfig, GithubConfig, RetryPolicy, TurnMode, VercelConfig,
    DEFAULT_REQUEST_TIMEOUT_MS,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TEMPLATE_REPO: &str = "connexions-template";
pub const DEFAULT_PUBLIC_DOMAIN: &str = "vercel.app";
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Non-secret provisioner settings. Loadable from a TOML file.
pub struct ProvisionerSettings {
    pub template_repo: String,
    pub public_domain: String,
    /// Wait after repository creation before the configuration file write.
    pub settle_delay_ms: u64,
    pub config_file_path: String,
    pub git_ref: String,
    pub language: String,
    pub tts_model: String,
    pub turn_mode: TurnMode,
    pub build: BuildProfile,
    pub request_timeout_ms: u64,
    pub retry: RetryPolicy,
    pub github_api_base: String,
    pub vercel_api_base: String,
    pub elevenlabs_api_base: String,
}

impl Default for ProvisionerSettings {
    fn default() -> Self {
        Self {
            template_repo: DEFAULT_TEMPLATE_REPO.to_string(),
            public_domain: DEFAULT_PUBLIC_DOMAIN.to_string(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            config_file_path: "README.md".to_string(),
            git_ref: "main".to_string(),
            language: "en".to_string(),
            tts_model: "eleven_turbo_v2_5".to_string(),
            turn_mode: TurnMode::TurnBased,
            build: BuildProfile::default(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            retry: RetryPolicy::default(),
            github_api_base: "https://api.github.com".to_string(),
            vercel_api_base: "https://api.vercel.com".to_string(),
            elevenlabs_api_base: "https://api.elevenlabs.io".to_string(),
        }
    }
}

impl ProvisionerSettings {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(raw).map_err(|error| ConfigError::InvalidSetting {
            name: "settings",
            reason: error.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("template_repo", &self.template_repo),
            ("public_domain", &self.public_domain),
            ("config_file_path", &self.config_file_path),
            ("git_ref", &self.git_ref),
            ("language", &self.language),
            ("tts_model", &self.tts_model),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidSetting {
                    name,
                    reason: "must not be empty".to_string(),
                });
            }
        }
        if self.public_domain.contains('/') || self.public_domain.starts_with('.') {
            return Err(ConfigError::InvalidSetting {
                name: "public_domain",
                reason: format!("'{}' is not a bare domain", self.public_domain),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "request_timeout_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
/// Service credentials. Never serialised, never logged.
pub struct ServiceCredentials {
    pub github_token: Option<String>,
    pub github_owner: Option<String>,
    pub vercel_token: Option<String>,
    pub vercel_team_id: Option<String>,
    pub elevenlabs_api_key: Option<String>,
}

impl std::fmt::Debug for ServiceCredentials {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ServiceCredentials")
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .field("github_owner", &self.github_owner)
            .field("vercel_token", &self.vercel_token.as_ref().map(|_| "<redacted>"))
            .field("vercel_team_id", &self.vercel_team_id)
            .field(
                "elevenlabs_api_key",
                &self.elevenlabs_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Credentials that passed pre-flight, with blanks already rejected.
#[derive(Clone)]
pub(crate) struct ValidatedCredentials<'a> {
    pub github_token: &'a str,
    pub github_owner: &'a str,
    pub vercel_token: &'a str,
    pub vercel_team_id: Option<&'a str>,
    pub elevenlabs_api_key: &'a str,
}

impl ServiceCredentials {
    /// Pre-flight check. Lists every missing credential at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validated().map(|_| ())
    }

    pub(crate) fn validated(&self) -> Result<ValidatedCredentials<'_>, ConfigError> {
        let github_token = present(&self.github_token);
        let github_owner = present(&self.github_owner);
        let vercel_token = present(&self.vercel_token);
        let elevenlabs_api_key = present(&self.elevenlabs_api_key);

        let mut missing = Vec::new();
        if github_token.is_none() {
            missing.push("github token");
        }
        if github_owner.is_none() {
            missing.push("github owner");
        }
        if vercel_token.is_none() {
            missing.push("vercel token");
        }
        if elevenlabs_api_key.is_none() {
            missing.push("elevenlabs api key");
        }

        match (github_token, github_owner, vercel_token, elevenlabs_api_key) {
            (Some(github_token), Some(github_owner), Some(vercel_token), Some(elevenlabs_api_key)) => {
                Ok(ValidatedCredentials {
                    github_token,
                    github_owner,
                    vercel_token,
                    vercel_team_id: present(&self.vercel_team_id),
                    elevenlabs_api_key,
                })
            }
            _ => Err(ConfigError::MissingCredentials(missing)),
        }
    }
}

impl ValidatedCredentials<'_> {
    pub(crate) fn github_config(&self, settings: &ProvisionerSettings) -> GithubConfig {
        GithubConfig {
            api_base: settings.github_api_base.clone(),
            token: self.github_token.to_string(),
            owner: self.github_owner.to_string(),
            request_timeout_ms: settings.request_timeout_ms,
            retry: settings.retry.clone(),
        }
    }

    pub(crate) fn vercel_config(&self, settings: &ProvisionerSettings) -> VercelConfig {
        VercelConfig {
            api_base: settings.vercel_api_base.clone(),
            token: self.vercel_token.to_string(),
            team_id: self.vercel_team_id.map(str::to_string),
            request_timeout_ms: settings.request_timeout_ms,
            retry: settings.retry.clone(),
        }
    }

    pub(crate) fn elevenlabs_config(&self, settings: &ProvisionerSettings) -> ElevenLabsConfig {
        ElevenLabsConfig {
            api_base: settings.elevenlabs_api_base.clone(),
            api_key: self.elevenlabs_api_key.to_string(),
            request_timeout_ms: settings.request_timeout_ms,
            retry: settings.retry.clone(),
        }
    }
}
