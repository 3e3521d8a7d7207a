use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use launch_core::RepositoryRef;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde_json::json;

use crate::transport::{trim_api_base, HttpTransport, DEFAULT_REQUEST_TIMEOUT_MS};
use crate::{
    FileWrite, NewRepository, RemoteFile, RemoteRepository, RetryPolicy, ServiceError,
    ServiceResult, SourceControl,
};

const SERVICE: &str = "github";

#[derive(Debug, Clone)]
/// Public struct `GithubConfig` used across launch components.
pub struct GithubConfig {
    pub api_base: String,
    pub token: String,
    pub owner: String,
    pub request_timeout_ms: u64,
    pub retry: RetryPolicy,
}

impl GithubConfig {
    pub fn new(token: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            token: token.into(),
            owner: owner.into(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GithubRepository {
    id: u64,
    name: String,
    owner: GithubOwner,
    html_url: String,
    #[serde(default)]
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubOwner {
    login: String,
}

impl From<GithubRepository> for RemoteRepository {
    fn from(repo: GithubRepository) -> Self {
        Self {
            id: repo.id.to_string(),
            reference: RepositoryRef::new(repo.owner.login, repo.name),
            html_url: repo.html_url,
            default_branch: repo.default_branch,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GithubContent {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubContentWrite {
    content: GithubContentSha,
}

#[derive(Debug, Deserialize)]
struct GithubContentSha {
    sha: String,
}

#[derive(Debug, Clone)]
/// GitHub REST client for repository provisioning.
pub struct GithubClient {
    transport: HttpTransport,
    api_base: String,
    owner: String,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> ServiceResult<Self> {
        if config.token.trim().is_empty() {
            return Err(ServiceError::MissingCredential {
                service: SERVICE,
                name: "token",
            });
        }
        if config.owner.trim().is_empty() {
            return Err(ServiceError::MissingCredential {
                service: SERVICE,
                name: "owner",
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("x-github-api-version", HeaderValue::from_static("2022-11-28"));
        headers.insert(
            AUTHORIZATION,
            HttpTransport::header_value(SERVICE, &format!("Bearer {}", config.token.trim()))?,
        );
        let transport =
            HttpTransport::new(SERVICE, headers, config.request_timeout_ms, config.retry)?;
        Ok(Self {
            transport,
            api_base: trim_api_base(&config.api_base),
            owner: config.owner.trim().to_string(),
        })
    }

    fn contents_url(&self, repository: &RepositoryRef, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            repository.owner,
            repository.name,
            path.trim_start_matches('/')
        )
    }
}

/// GitHub answers 404 for a missing template and 422 for a repository that
/// exists but is not marked as a template.
fn is_missing_template(error: &ServiceError) -> bool {
    match error {
        ServiceError::Status { status: 404, .. } => true,
        ServiceError::Status {
            status: 422, body, ..
        } => body.to_ascii_lowercase().contains("template"),
        _ => false,
    }
}

fn decode_content(raw: GithubContent) -> ServiceResult<RemoteFile> {
    let content = match raw.encoding.as_deref() {
        Some("base64") | None => {
            let compact = raw
                .content
                .chars()
                .filter(|ch| !ch.is_ascii_whitespace())
                .collect::<String>();
            let bytes = BASE64_STANDARD
                .decode(compact.as_bytes())
                .map_err(|error| ServiceError::InvalidResponse {
                    service: SERVICE,
                    operation: "get file",
                    message: format!("invalid base64 content: {error}"),
                })?;
            String::from_utf8_lossy(&bytes).into_owned()
        }
        Some(_) => raw.content,
    };
    Ok(RemoteFile {
        revision: raw.sha,
        content,
    })
}

#[async_trait]
impl SourceControl for GithubClient {
    fn service_name(&self) -> &'static str {
        SERVICE
    }

    fn owner(&self) -> &str {
        &self.owner
    }

    async fn find_repository(&self, name: &str) -> ServiceResult<Option<RemoteRepository>> {
        let url = format!("{}/repos/{}/{}", self.api_base, self.owner, name);
        let repo: Option<GithubRepository> = self
            .transport
            .optional_json("get repository", |http| http.get(&url))
            .await?;
        Ok(repo.map(RemoteRepository::from))
    }

    async fn create_from_template(
        &self,
        template: &str,
        request: &NewRepository,
    ) -> ServiceResult<RemoteRepository> {
        let url = format!("{}/repos/{}/{}/generate", self.api_base, self.owner, template);
        let payload = json!({
            "owner": self.owner,
            "name": request.name,
            "description": request.description,
            "private": request.private,
            "include_all_branches": false,
        });
        let result: ServiceResult<GithubRepository> = self
            .transport
            .json("create repository from template", |http| {
                http.post(&url).json(&payload)
            })
            .await;
        match result {
            Ok(repo) => Ok(repo.into()),
            Err(error) if is_missing_template(&error) => Err(ServiceError::NotFound {
                service: SERVICE,
                operation: "create repository from template",
                message: error.to_string(),
            }),
            Err(error) => Err(error),
        }
    }

    async fn create_empty(&self, request: &NewRepository) -> ServiceResult<RemoteRepository> {
        let url = format!("{}/user/repos", self.api_base);
        let payload = json!({
            "name": request.name,
            "description": request.description,
            "private": request.private,
            "auto_init": true,
        });
        let repo: GithubRepository = self
            .transport
            .json("create repository", |http| http.post(&url).json(&payload))
            .await?;
        Ok(repo.into())
    }

    async fn get_file(
        &self,
        repository: &RepositoryRef,
        path: &str,
    ) -> ServiceResult<Option<RemoteFile>> {
        let url = self.contents_url(repository, path);
        let raw: Option<GithubContent> = self
            .transport
            .optional_json("get file", |http| http.get(&url))
            .await?;
        raw.map(decode_content).transpose()
    }

    async fn put_file(
        &self,
        repository: &RepositoryRef,
        write: &FileWrite,
    ) -> ServiceResult<String> {
        let url = self.contents_url(repository, &write.path);
        let mut payload = json!({
            "message": write.message,
            "content": BASE64_STANDARD.encode(write.content.as_bytes()),
        });
        if let Some(revision) = write.revision.as_deref() {
            payload["sha"] = json!(revision);
        }
        let written: GithubContentWrite = self
            .transport
            .json("put file", |http| http.put(&url).json(&payload))
            .await?;
        Ok(written.content.sha)
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_content, is_missing_template, GithubClient, GithubConfig, GithubContent};
    use crate::ServiceError;

    #[test]
    fn unit_client_requires_token_and_owner() {
        let missing_token = GithubClient::new(GithubConfig::new(" ", "owner"));
        assert!(matches!(
            missing_token,
            Err(ServiceError::MissingCredential { name: "token", .. })
        ));
        let missing_owner = GithubClient::new(GithubConfig::new("token", ""));
        assert!(matches!(
            missing_owner,
            Err(ServiceError::MissingCredential { name: "owner", .. })
        ));
    }

    #[test]
    fn unit_is_missing_template_matches_404_and_template_422() {
        let not_template = ServiceError::Status {
            service: "github",
            operation: "create repository from template",
            status: 422,
            body: "{\"message\":\"owner/repo is not a template repository\"}".to_string(),
        };
        let name_taken = ServiceError::Status {
            service: "github",
            operation: "create repository from template",
            status: 422,
            body: "{\"message\":\"name already exists on this account\"}".to_string(),
        };
        assert!(is_missing_template(&not_template));
        assert!(!is_missing_template(&name_taken));
    }

    #[test]
    fn unit_decode_content_strips_line_wrapped_base64() {
        let file = decode_content(GithubContent {
            sha: "abc123".to_string(),
            content: "IyBBY21l\nCg==\n".to_string(),
            encoding: Some("base64".to_string()),
        })
        .expect("decode");
        assert_eq!(file.revision, "abc123");
        assert_eq!(file.content, "# Acme\n");
    }
}
