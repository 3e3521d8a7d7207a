use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use launch_core::{
    EnvironmentVariableSet, ProvisioningReport, ProvisioningRequest, ProvisioningStep,
    SessionStore, StepOutcome,
};
use launch_services::{
    ElevenLabsClient, GithubClient, Hosting, SourceControl, VercelClient, VoiceAgents,
};

use crate::agent::{AgentProvisioner, AgentTemplate};
use crate::deployment::DeploymentProvisioner;
use crate::error::ProvisionError;
use crate::repository::RepositoryProvisioner;
use crate::settings::{ProvisionerSettings, ServiceCredentials};

static RUN_COUNTER: AtomicU64 = AtomicU64::new(1);

fn new_run_id() -> String {
    let count = RUN_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("provision-{}-{count}", Utc::now().timestamp_millis())
}

#[derive(Clone)]
/// The three collaborator services a run talks to.
pub struct ServiceSet {
    pub source_control: Arc<dyn SourceControl>,
    pub hosting: Arc<dyn Hosting>,
    pub voice_agents: Arc<dyn VoiceAgents>,
}

/// Variables pushed to the hosting project for a tenant.
pub fn target_variables(
    request: &ProvisioningRequest,
    agent_id: &str,
    public_url: &str,
    fallback_voice_api_key: Option<&str>,
) -> EnvironmentVariableSet {
    let secrets = &request.secrets;
    let value = |field: &Option<String>| field.as_deref().unwrap_or_default().to_string();
    let voice_api_key = secrets
        .voice_api_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .or(fallback_voice_api_key)
        .unwrap_or_default();

    EnvironmentVariableSet::new()
        .with("NEXT_PUBLIC_SUPABASE_URL", value(&secrets.datastore_url))
        .with("NEXT_PUBLIC_SUPABASE_ANON_KEY", value(&secrets.datastore_anon_key))
        .with("SUPABASE_SERVICE_ROLE_KEY", value(&secrets.datastore_service_key))
        .with("ELEVENLABS_API_KEY", voice_api_key)
        .with("ELEVENLABS_SETUP_AGENT_ID", agent_id)
        .with("NEXT_PUBLIC_APP_URL", public_url)
        .with(
            "NEXT_PUBLIC_COMPANY_NAME",
            value(&request.metadata.company_name),
        )
}

/// Sequences agent, repository and deployment provisioning for one tenant.
///
/// [`Orchestrator::provision`] never returns an error: every failure is
/// folded into the [`ProvisioningReport`], which is also stored in the
/// injected [`SessionStore`] under its request id.
pub struct Orchestrator {
    agents: AgentProvisioner,
    agent_template: AgentTemplate,
    repositories: RepositoryProvisioner,
    deployments: DeploymentProvisioner,
    sessions: Arc<dyn SessionStore>,
    fallback_voice_api_key: Option<String>,
}

impl Orchestrator {
    pub fn new(
        services: ServiceSet,
        settings: &ProvisionerSettings,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, ProvisionError> {
        settings.validate()?;
        Ok(Self {
            agents: AgentProvisioner::new(
                services.voice_agents,
                settings.language.clone(),
                settings.tts_model.clone(),
                settings.turn_mode,
            ),
            agent_template: AgentTemplate::setup(),
            repositories: RepositoryProvisioner::new(
                services.source_control,
                settings.template_repo.clone(),
                Duration::from_millis(settings.settle_delay_ms),
                settings.config_file_path.clone(),
            ),
            deployments: DeploymentProvisioner::new(
                services.hosting,
                settings.public_domain.clone(),
                settings.build.clone(),
                settings.git_ref.clone(),
            ),
            sessions,
            fallback_voice_api_key: None,
        })
    }

    /// Pre-flights credentials and builds the HTTP clients. Fails before any
    /// remote call when a credential is missing.
    pub fn from_settings(
        settings: &ProvisionerSettings,
        credentials: &ServiceCredentials,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, ProvisionError> {
        let validated = credentials.validated()?;
        let github = GithubClient::new(validated.github_config(settings))
            .map_err(|source| ProvisionError::Client {
                service: "github",
                source,
            })?;
        let vercel = VercelClient::new(validated.vercel_config(settings))
            .map_err(|source| ProvisionError::Client {
                service: "vercel",
                source,
            })?;
        let elevenlabs = ElevenLabsClient::new(validated.elevenlabs_config(settings))
            .map_err(|source| ProvisionError::Client {
                service: "elevenlabs",
                source,
            })?;
        let services = ServiceSet {
            source_control: Arc::new(github),
            hosting: Arc::new(vercel),
            voice_agents: Arc::new(elevenlabs),
        };
        Ok(Self::new(services, settings, sessions)?
            .with_fallback_voice_api_key(validated.elevenlabs_api_key))
    }

    /// Voice API key pushed to the project when the request carries none.
    pub fn with_fallback_voice_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.fallback_voice_api_key = (!key.trim().is_empty()).then_some(key);
        self
    }

    /// Template used when the agent step has to create an agent.
    pub fn with_agent_template(mut self, template: AgentTemplate) -> Self {
        self.agent_template = template;
        self
    }

    pub async fn provision(&self, request: &ProvisioningRequest) -> ProvisioningReport {
        self.provision_with_id(new_run_id(), request).await
    }

    #[tracing::instrument(
        name = "launch.provision",
        skip_all,
        fields(request_id = %request_id, tenant = %request.tenant)
    )]
    pub async fn provision_with_id(
        &self,
        request_id: String,
        request: &ProvisioningRequest,
    ) -> ProvisioningReport {
        let tenant = &request.tenant;
        let mut report = ProvisioningReport::begin(request_id, tenant.as_str());

        let agent = match self
            .agents
            .ensure_agent(
                tenant,
                &self.agent_template,
                &request.metadata,
                request.voice,
                request.secrets.agent_id.as_deref(),
            )
            .await
        {
            Ok(agent) => agent,
            Err(error) => {
                let message = error.to_string();
                tracing::error!(
                    error = %ProvisionError::step(ProvisioningStep::Agent, error),
                    "aborting run"
                );
                report.record(
                    ProvisioningStep::Agent,
                    StepOutcome::Failed { error: message },
                    None,
                );
                return self.complete(report).await;
            }
        };
        report.agent_id = Some(agent.agent_id.clone());
        report.agent_already_exists = agent.record.already_exists();
        report.record(
            ProvisioningStep::Agent,
            StepOutcome::Succeeded,
            Some(agent.record),
        );

        let repository = match self
            .repositories
            .ensure_repository(tenant, &request.metadata, &request.secrets)
            .await
        {
            Ok(outcome) => {
                report.repository_url = outcome.record.url.clone();
                report.repository_already_exists = outcome.record.already_exists();
                report.record(
                    ProvisioningStep::Repository,
                    StepOutcome::from_warnings(outcome.warnings),
                    Some(outcome.record),
                );
                outcome.reference
            }
            Err(error) => {
                let derived = self.repositories.derived_reference(tenant);
                tracing::warn!(
                    error = %error,
                    repository = %derived,
                    "repository provisioning failed; continuing with derived reference"
                );
                report.record(
                    ProvisioningStep::Repository,
                    StepOutcome::Failed {
                        error: error.to_string(),
                    },
                    None,
                );
                derived
            }
        };

        let public_url = self.deployments.public_url(tenant);
        let variables = target_variables(
            request,
            &agent.agent_id,
            &public_url,
            self.fallback_voice_api_key.as_deref(),
        );
        match self
            .deployments
            .ensure_deployment(tenant, &repository, &variables)
            .await
        {
            Ok(outcome) => {
                report.deployment_url = Some(outcome.public_url);
                report.deployment_already_exists = outcome.record.already_exists();
                report.record(
                    ProvisioningStep::Deployment,
                    StepOutcome::from_warnings(outcome.warnings),
                    Some(outcome.record),
                );
            }
            Err(error) => {
                tracing::error!(error = %error, "project provisioning failed");
                report.record(
                    ProvisioningStep::Deployment,
                    StepOutcome::Failed {
                        error: error.to_string(),
                    },
                    None,
                );
            }
        }

        self.complete(report).await
    }

    async fn complete(&self, report: ProvisioningReport) -> ProvisioningReport {
        let report = report.finish();
        tracing::info!(
            success = report.success,
            agent_id = report.agent_id.as_deref().unwrap_or(""),
            deployment_url = report.deployment_url.as_deref().unwrap_or(""),
            "provisioning finished"
        );
        self.sessions.put(report.clone()).await;
        report
    }
}
