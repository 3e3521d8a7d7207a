use async_trait::async_trait;
use launch_core::EnvTarget;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use serde::Deserialize;
use serde_json::json;

use crate::transport::{trim_api_base, HttpTransport, DEFAULT_REQUEST_TIMEOUT_MS};
use crate::{
    DeploymentTrigger, Hosting, NewEnvVar, NewProject, RemoteDeployment, RemoteEnvVar,
    RemoteProject, RetryPolicy, ServiceError, ServiceResult,
};

const SERVICE: &str = "vercel";

#[derive(Debug, Clone)]
/// Public struct `VercelConfig` used across launch components.
pub struct VercelConfig {
    pub api_base: String,
    pub token: String,
    /// Sent as the `teamId` query parameter on every request when set.
    pub team_id: Option<String>,
    pub request_timeout_ms: u64,
    pub retry: RetryPolicy,
}

impl VercelConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_base: "https://api.vercel.com".to_string(),
            token: token.into(),
            team_id: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VercelProject {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct VercelEnvList {
    #[serde(default)]
    envs: Vec<VercelEnv>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct VercelEnv {
    id: String,
    key: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    target: Option<OneOrMany>,
}

#[derive(Debug, Deserialize)]
struct VercelDeployment {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

fn target_names(targets: &[EnvTarget]) -> Vec<&'static str> {
    targets.iter().map(|target| target.as_str()).collect()
}

#[derive(Debug, Clone)]
/// Vercel REST client for project, env var and deployment provisioning.
pub struct VercelClient {
    transport: HttpTransport,
    api_base: String,
    team_id: Option<String>,
}

impl VercelClient {
    pub fn new(config: VercelConfig) -> ServiceResult<Self> {
        if config.token.trim().is_empty() {
            return Err(ServiceError::MissingCredential {
                service: SERVICE,
                name: "token",
            });
        }
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HttpTransport::header_value(SERVICE, &format!("Bearer {}", config.token.trim()))?,
        );
        let transport =
            HttpTransport::new(SERVICE, headers, config.request_timeout_ms, config.retry)?;
        Ok(Self {
            transport,
            api_base: trim_api_base(&config.api_base),
            team_id: config
                .team_id
                .map(|team| team.trim().to_string())
                .filter(|team| !team.is_empty()),
        })
    }

    fn scoped(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.team_id.as_deref() {
            Some(team_id) => request.query(&[("teamId", team_id)]),
            None => request,
        }
    }
}

#[async_trait]
impl Hosting for VercelClient {
    fn service_name(&self) -> &'static str {
        SERVICE
    }

    async fn find_project(&self, name: &str) -> ServiceResult<Option<RemoteProject>> {
        let url = format!("{}/v9/projects/{}", self.api_base, name);
        let project: Option<VercelProject> = self
            .transport
            .optional_json("get project", |http| self.scoped(http.get(&url)))
            .await?;
        Ok(project.map(|project| RemoteProject {
            id: project.id,
            name: project.name,
        }))
    }

    async fn create_project(&self, project: &NewProject) -> ServiceResult<RemoteProject> {
        let url = format!("{}/v10/projects", self.api_base);
        let payload = json!({
            "name": project.name,
            "framework": project.build.framework,
            "gitRepository": {
                "type": "github",
                "repo": project.repository.full_name(),
            },
            "buildCommand": project.build.build_command,
            "installCommand": project.build.install_command,
            "outputDirectory": project.build.output_directory,
        });
        let created: VercelProject = self
            .transport
            .json("create project", |http| {
                self.scoped(http.post(&url)).json(&payload)
            })
            .await?;
        Ok(RemoteProject {
            id: created.id,
            name: created.name,
        })
    }

    async fn list_env_vars(&self, project_id: &str) -> ServiceResult<Vec<RemoteEnvVar>> {
        let url = format!("{}/v9/projects/{}/env", self.api_base, project_id);
        let listed: VercelEnvList = self
            .transport
            .json("list env vars", |http| self.scoped(http.get(&url)))
            .await?;
        Ok(listed
            .envs
            .into_iter()
            .map(|env| RemoteEnvVar {
                id: env.id,
                key: env.key,
                kind: env.kind,
                targets: match env.target {
                    Some(OneOrMany::One(target)) => vec![target],
                    Some(OneOrMany::Many(targets)) => targets,
                    None => Vec::new(),
                },
            })
            .collect())
    }

    async fn create_env_var(&self, project_id: &str, env_var: &NewEnvVar) -> ServiceResult<()> {
        let url = format!("{}/v10/projects/{}/env", self.api_base, project_id);
        let payload = json!({
            "key": env_var.key,
            "value": env_var.value,
            "type": env_var.kind.wire_name(),
            "target": target_names(&env_var.targets),
        });
        self.transport
            .send("create env var", |http| {
                self.scoped(http.post(&url)).json(&payload)
            })
            .await?;
        Ok(())
    }

    async fn update_env_var(
        &self,
        project_id: &str,
        env_id: &str,
        value: &str,
        targets: &[EnvTarget],
    ) -> ServiceResult<()> {
        let url = format!("{}/v9/projects/{}/env/{}", self.api_base, project_id, env_id);
        let payload = json!({
            "value": value,
            "target": target_names(targets),
        });
        self.transport
            .send("update env var", |http| {
                self.scoped(http.patch(&url)).json(&payload)
            })
            .await?;
        Ok(())
    }

    async fn trigger_deployment(
        &self,
        trigger: &DeploymentTrigger,
    ) -> ServiceResult<RemoteDeployment> {
        let url = format!("{}/v13/deployments", self.api_base);
        let payload = json!({
            "name": trigger.name,
            "project": trigger.project_id,
            "target": trigger.target.as_str(),
            "gitSource": {
                "type": "github",
                "repo": trigger.repository.full_name(),
                "ref": trigger.git_ref,
            },
        });
        let deployment: VercelDeployment = self
            .transport
            .json("trigger deployment", |http| {
                self.scoped(http.post(&url)).json(&payload)
            })
            .await?;
        Ok(RemoteDeployment {
            id: deployment.id,
            url: deployment.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{target_names, VercelClient, VercelConfig};
    use crate::ServiceError;
    use launch_core::EnvTarget;

    #[test]
    fn unit_client_requires_token() {
        assert!(matches!(
            VercelClient::new(VercelConfig::new("")),
            Err(ServiceError::MissingCredential { .. })
        ));
    }

    #[test]
    fn unit_blank_team_id_is_dropped() {
        let mut config = VercelConfig::new("token");
        config.team_id = Some("  ".to_string());
        let client = VercelClient::new(config).expect("client");
        assert!(client.team_id.is_none());
    }

    #[test]
    fn unit_target_names_preserve_full_target_order() {
        assert_eq!(
            target_names(&EnvTarget::ALL),
            vec!["production", "preview", "development"]
        );
    }
}
