use std::sync::Arc;

use anyhow::{bail, Context, Result};
use launch_core::{
    canonical_name, ConfigError, InMemorySessionStore, ProvisioningReport, ProvisioningRequest,
    SecretBundle, VoiceSelection,
};
use launch_provisioner::{Orchestrator, ProvisionerSettings, ServiceSet};
use launch_services::{
    ElevenLabsClient, ElevenLabsConfig, InMemoryHosting, InMemorySourceControl,
    InMemoryVoiceAgents, VoiceAgents,
};

use crate::cli_args::{ProvisionArgs, SessionUrlArgs, SlugArgs};

const DRY_RUN_OWNER: &str = "dry-run";

pub(crate) fn apply_overrides(settings: &mut ProvisionerSettings, args: &ProvisionArgs) {
    if let Some(template_repo) = &args.template_repo {
        settings.template_repo = template_repo.clone();
    }
    if let Some(public_domain) = &args.public_domain {
        settings.public_domain = public_domain.clone();
    }
    if let Some(settle_delay_ms) = args.settle_delay_ms {
        settings.settle_delay_ms = settle_delay_ms;
    }
    if let Some(request_timeout_ms) = args.request_timeout_ms {
        settings.request_timeout_ms = request_timeout_ms;
    }
    if let Some(max_retries) = args.max_retries {
        settings.retry.max_retries = max_retries;
    }
}

pub(crate) fn build_request(args: &ProvisionArgs) -> Result<ProvisioningRequest> {
    let mut builder = ProvisioningRequest::builder(args.platform_name.clone())
        .voice(VoiceSelection::parse(&args.voice))
        .secrets(SecretBundle {
            datastore_url: args.datastore_url.clone(),
            datastore_anon_key: args.datastore_anon_key.clone(),
            datastore_service_key: args.datastore_service_key.clone(),
            voice_api_key: args.voice_api_key.clone(),
            agent_id: args.agent_id.clone(),
        });
    if let Some(company_name) = &args.company_name {
        builder = builder.company_name(company_name.clone());
    }
    if let Some(description) = &args.description {
        builder = builder.description(description.clone());
    }
    if let Some(seed) = &args.tenant_seed {
        builder = builder.tenant_seed(seed.clone());
    }
    builder.build().context("invalid provisioning request")
}

/// In-memory services seeded with the configured template repository.
async fn dry_run_orchestrator(
    settings: &ProvisionerSettings,
    args: &ProvisionArgs,
) -> Result<Orchestrator> {
    let owner = args
        .credentials
        .github_owner
        .clone()
        .filter(|owner| !owner.trim().is_empty())
        .unwrap_or_else(|| DRY_RUN_OWNER.to_string());
    let source = InMemorySourceControl::new(owner);
    let readme = format!("# {}\n", settings.template_repo);
    source
        .add_template(
            &settings.template_repo,
            &[(settings.config_file_path.as_str(), readme.as_str())],
        )
        .await;
    let services = ServiceSet {
        source_control: Arc::new(source),
        hosting: Arc::new(InMemoryHosting::new()),
        voice_agents: Arc::new(InMemoryVoiceAgents::new()),
    };
    let orchestrator = Orchestrator::new(services, settings, Arc::new(InMemorySessionStore::new()))
        .context("invalid provisioner settings")?;
    Ok(match args.credentials.elevenlabs_api_key.as_deref() {
        Some(key) => orchestrator.with_fallback_voice_api_key(key),
        None => orchestrator,
    })
}

/// Runs one provisioning pass. Returns the report; callers decide the exit code.
pub(crate) async fn run_provision(
    mut settings: ProvisionerSettings,
    args: &ProvisionArgs,
) -> Result<ProvisioningReport> {
    apply_overrides(&mut settings, args);
    let request = build_request(args)?;

    let orchestrator = if args.dry_run {
        tracing::info!(tenant = %request.tenant, "dry run against in-memory services");
        dry_run_orchestrator(&settings, args).await?
    } else {
        Orchestrator::from_settings(
            &settings,
            &args.credentials.to_credentials(),
            Arc::new(InMemorySessionStore::new()),
        )
        .context("failed to prepare provisioning services")?
    };

    Ok(orchestrator.provision(&request).await)
}

pub(crate) fn render_report(report: &ProvisioningReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to render provisioning report")
}

pub(crate) fn run_slug(args: &SlugArgs) -> Result<String> {
    let slug = canonical_name(&args.name);
    if slug.is_empty() {
        bail!("'{}' has no identifier-safe characters", args.name);
    }
    Ok(slug)
}

pub(crate) async fn run_session_url(
    settings: &ProvisionerSettings,
    args: &SessionUrlArgs,
) -> Result<String> {
    let api_key = args
        .elevenlabs_api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(ConfigError::MissingCredentials(vec!["elevenlabs api key"]))?;
    let client = ElevenLabsClient::new(ElevenLabsConfig {
        api_base: settings.elevenlabs_api_base.clone(),
        api_key: api_key.to_string(),
        request_timeout_ms: settings.request_timeout_ms,
        retry: settings.retry.clone(),
    })
    .context("failed to build elevenlabs client")?;
    client
        .session_url(&args.agent_id)
        .await
        .with_context(|| format!("failed to fetch session url for agent {}", args.agent_id))
}
