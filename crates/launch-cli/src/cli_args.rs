use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use launch_provisioner::ServiceCredentials;

fn parse_non_empty(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("value must not be empty".to_string());
    }
    Ok(trimmed.to_string())
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "launch",
    about = "Provision a tenant's voice agent, repository and hosting project",
    version
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "LAUNCH_CONFIG",
        help = "Path to a TOML file with non-secret provisioner settings"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Log progress at info level (RUST_LOG still wins when set)"
    )]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Create or reuse the agent, repository and project for one tenant.
    Provision(ProvisionArgs),
    /// Print the canonical name derived from a raw tenant name.
    Slug(SlugArgs),
    /// Print a signed conversation URL for an existing agent.
    SessionUrl(SessionUrlArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct CredentialArgs {
    #[arg(
        long,
        env = "LAUNCH_GITHUB_TOKEN",
        hide_env_values = true,
        help = "GitHub token used for repository operations"
    )]
    pub github_token: Option<String>,

    #[arg(
        long,
        env = "LAUNCH_GITHUB_OWNER",
        help = "GitHub user or organisation that owns tenant repositories"
    )]
    pub github_owner: Option<String>,

    #[arg(
        long,
        env = "LAUNCH_VERCEL_TOKEN",
        hide_env_values = true,
        help = "Vercel token used for project and deployment operations"
    )]
    pub vercel_token: Option<String>,

    #[arg(
        long,
        env = "LAUNCH_VERCEL_TEAM_ID",
        help = "Optional Vercel team id scoping every hosting call"
    )]
    pub vercel_team_id: Option<String>,

    #[arg(
        long,
        env = "LAUNCH_ELEVENLABS_API_KEY",
        hide_env_values = true,
        help = "ElevenLabs API key used for agent operations"
    )]
    pub elevenlabs_api_key: Option<String>,
}

impl CredentialArgs {
    pub fn to_credentials(&self) -> ServiceCredentials {
        ServiceCredentials {
            github_token: self.github_token.clone(),
            github_owner: self.github_owner.clone(),
            vercel_token: self.vercel_token.clone(),
            vercel_team_id: self.vercel_team_id.clone(),
            elevenlabs_api_key: self.elevenlabs_api_key.clone(),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ProvisionArgs {
    #[arg(
        long,
        value_parser = parse_non_empty,
        help = "Platform name; seeds the canonical tenant name"
    )]
    pub platform_name: String,

    #[arg(long, help = "Company name shown to interviewees")]
    pub company_name: Option<String>,

    #[arg(long, help = "Free-form platform description")]
    pub description: Option<String>,

    #[arg(
        long,
        help = "Override the canonical-name seed (defaults to --platform-name)"
    )]
    pub tenant_seed: Option<String>,

    #[arg(
        long,
        default_value = "",
        help = "Voice selection: male, female, or an interview tone such as friendly"
    )]
    pub voice: String,

    #[arg(
        long,
        env = "LAUNCH_SUPABASE_URL",
        help = "Tenant datastore URL pushed to the hosting project"
    )]
    pub datastore_url: Option<String>,

    #[arg(
        long,
        env = "LAUNCH_SUPABASE_ANON_KEY",
        hide_env_values = true,
        help = "Tenant datastore anonymous key"
    )]
    pub datastore_anon_key: Option<String>,

    #[arg(
        long,
        env = "LAUNCH_SUPABASE_SERVICE_ROLE_KEY",
        hide_env_values = true,
        help = "Tenant datastore service role key"
    )]
    pub datastore_service_key: Option<String>,

    #[arg(
        long,
        env = "LAUNCH_TENANT_VOICE_API_KEY",
        hide_env_values = true,
        help = "Voice API key for the tenant deployment (defaults to the operator key)"
    )]
    pub voice_api_key: Option<String>,

    #[arg(long, help = "Agent id from a previous run; skips agent lookup")]
    pub agent_id: Option<String>,

    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Run against in-memory services instead of the real APIs"
    )]
    pub dry_run: bool,

    #[arg(long, value_parser = parse_non_empty, help = "Template repository name")]
    pub template_repo: Option<String>,

    #[arg(long, value_parser = parse_non_empty, help = "Domain suffix for public URLs")]
    pub public_domain: Option<String>,

    #[arg(long, help = "Wait after repository creation, in milliseconds")]
    pub settle_delay_ms: Option<u64>,

    #[arg(
        long,
        value_parser = parse_positive_u64,
        help = "Per-request timeout for service calls, in milliseconds"
    )]
    pub request_timeout_ms: Option<u64>,

    #[arg(long, help = "Retries for rate limits, and for 5xx on idempotent calls")]
    pub max_retries: Option<usize>,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

#[derive(Debug, Clone, Args)]
pub struct SlugArgs {
    #[arg(help = "Raw tenant name")]
    pub name: String,
}

#[derive(Debug, Clone, Args)]
pub struct SessionUrlArgs {
    #[arg(long, value_parser = parse_non_empty, help = "Agent id to open a session for")]
    pub agent_id: String,

    #[arg(
        long,
        env = "LAUNCH_ELEVENLABS_API_KEY",
        hide_env_values = true,
        help = "ElevenLabs API key used for agent operations"
    )]
    pub elevenlabs_api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{parse_positive_u64, Cli, CliCommand};

    #[test]
    fn unit_parse_positive_u64_rejects_zero() {
        assert_eq!(parse_positive_u64("250"), Ok(250));
        assert!(parse_positive_u64("0").is_err());
        assert!(parse_positive_u64("soon").is_err());
    }

    #[test]
    fn functional_provision_args_collect_overrides_and_credentials() {
        let cli = Cli::try_parse_from([
            "launch",
            "--verbose",
            "provision",
            "--platform-name",
            "Acme Co",
            "--voice",
            "friendly",
            "--dry-run",
            "--settle-delay-ms",
            "0",
            "--github-owner",
            "acme-org",
        ])
        .expect("parse");

        assert!(cli.verbose);
        let CliCommand::Provision(args) = cli.command else {
            panic!("expected provision command");
        };
        assert_eq!(args.platform_name, "Acme Co");
        assert_eq!(args.voice, "friendly");
        assert!(args.dry_run);
        assert_eq!(args.settle_delay_ms, Some(0));
        assert_eq!(args.credentials.github_owner.as_deref(), Some("acme-org"));
    }

    #[test]
    fn regression_blank_platform_name_is_rejected() {
        let result = Cli::try_parse_from(["launch", "provision", "--platform-name", "   "]);
        assert!(result.is_err());
    }
}
