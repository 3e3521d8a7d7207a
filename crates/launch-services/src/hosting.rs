use async_trait::async_trait;
use launch_core::{EnvTarget, EnvVarKind, RepositoryRef};
use serde::{Deserialize, Serialize};

use crate::ServiceResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Fixed build profile applied to newly created hosting projects.
pub struct BuildProfile {
    pub framework: String,
    pub build_command: String,
    pub install_command: String,
    pub output_directory: String,
}

impl Default for BuildProfile {
    fn default() -> Self {
        Self {
            framework: "nextjs".to_string(),
            build_command: "npm run build".to_string(),
            install_command: "npm install".to_string(),
            output_directory: ".next".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `RemoteProject` used across launch components.
pub struct RemoteProject {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `NewProject` used across launch components.
pub struct NewProject {
    pub name: String,
    pub repository: RepositoryRef,
    pub build: BuildProfile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Live environment variable on a hosting project. Values are never read back.
pub struct RemoteEnvVar {
    pub id: String,
    pub key: String,
    pub kind: Option<String>,
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `NewEnvVar` used across launch components.
pub struct NewEnvVar {
    pub key: String,
    pub value: String,
    pub kind: EnvVarKind,
    pub targets: Vec<EnvTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request for a fresh deployment of a project at a git ref.
pub struct DeploymentTrigger {
    pub name: String,
    pub project_id: String,
    pub repository: RepositoryRef,
    pub git_ref: String,
    pub target: EnvTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `RemoteDeployment` used across launch components.
pub struct RemoteDeployment {
    pub id: String,
    pub url: Option<String>,
}

#[async_trait]
/// Trait contract for hosting (project + deployment) services.
pub trait Hosting: Send + Sync {
    fn service_name(&self) -> &'static str;

    async fn find_project(&self, name: &str) -> ServiceResult<Option<RemoteProject>>;

    async fn create_project(&self, project: &NewProject) -> ServiceResult<RemoteProject>;

    async fn list_env_vars(&self, project_id: &str) -> ServiceResult<Vec<RemoteEnvVar>>;

    async fn create_env_var(&self, project_id: &str, env_var: &NewEnvVar) -> ServiceResult<()>;

    async fn update_env_var(
        &self,
        project_id: &str,
        env_id: &str,
        value: &str,
        targets: &[EnvTarget],
    ) -> ServiceResult<()>;

    async fn trigger_deployment(
        &self,
        trigger: &DeploymentTrigger,
    ) -> ServiceResult<RemoteDeployment>;
}
