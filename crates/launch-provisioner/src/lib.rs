//! Tenant provisioning: existence checks, the agent, repository and
//! deployment provisioners, environment variable sync and the orchestrator
//! that sequences them.
mod agent;
mod deployment;
mod env_sync;
mod error;
mod existence;
mod orchestrator;
mod repository;
mod settings;

pub use agent::{
    agent_display_name, AgentOutcome, AgentProvisioner, AgentTemplate, Opening, SETUP_AGENT_PROMPT,
    SETUP_FIRST_MESSAGE,
};
pub use deployment::{public_url, DeploymentOutcome, DeploymentProvisioner};
pub use env_sync::{EnvSynchronizer, SyncReport};
pub use error::ProvisionError;
pub use existence::{lookup, Lookup};
pub use orchestrator::{target_variables, Orchestrator, ServiceSet};
pub use repository::{render_config_file, RepositoryOutcome, RepositoryProvisioner};
pub use settings::{
    ProvisionerSettings, ServiceCredentials, DEFAULT_PUBLIC_DOMAIN, DEFAULT_SETTLE_DELAY_MS,
    DEFAULT_TEMPLATE_REPO,
};
