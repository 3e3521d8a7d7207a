//! External service clients for tenant launch provisioning.
mod elevenlabs;
mod error;
mod github;
mod hosting;
mod in_memory;
mod retry;
mod source_control;
mod transport;
mod vercel;
mod voice_agents;

pub use elevenlabs::{ElevenLabsClient, ElevenLabsConfig};
pub use error::{ServiceError, ServiceResult};
pub use github::{GithubClient, GithubConfig};
pub use hosting::{
    BuildProfile, DeploymentTrigger, Hosting, NewEnvVar, NewProject, RemoteDeployment,
    RemoteEnvVar, RemoteProject,
};
pub use in_memory::{InMemoryHosting, InMemorySourceControl, InMemoryVoiceAgents, StoredEnvVar};
pub use retry::RetryPolicy;
pub use source_control::{FileWrite, NewRepository, RemoteFile, RemoteRepository, SourceControl};
pub use transport::DEFAULT_REQUEST_TIMEOUT_MS;
pub use vercel::{VercelClient, VercelConfig};
pub use voice_agents::{NewAgent, RemoteAgent, TurnMode, VoiceAgents};
