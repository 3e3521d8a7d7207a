use async_trait::async_trait;
use launch_core::RepositoryRef;

use crate::ServiceResult;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Repository as reported by the source-control service.
pub struct RemoteRepository {
    pub id: String,
    pub reference: RepositoryRef,
    pub html_url: String,
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `NewRepository` used across launch components.
pub struct NewRepository {
    pub name: String,
    pub description: String,
    pub private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// File contents plus the revision token needed to overwrite it.
pub struct RemoteFile {
    pub revision: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `FileWrite` used across launch components.
pub struct FileWrite {
    pub path: String,
    pub content: String,
    pub message: String,
    /// Current revision token; required by the service when the file exists.
    pub revision: Option<String>,
}

#[async_trait]
/// Trait contract for source-control (repository) services.
pub trait SourceControl: Send + Sync {
    fn service_name(&self) -> &'static str;

    /// Account that owns every repository this client creates.
    fn owner(&self) -> &str;

    async fn find_repository(&self, name: &str) -> ServiceResult<Option<RemoteRepository>>;

    /// Instantiates `template`. Fails with a not-found class error when the
    /// template does not exist or is not a template.
    async fn create_from_template(
        &self,
        template: &str,
        request: &NewRepository,
    ) -> ServiceResult<RemoteRepository>;

    /// Creates an empty repository with an initial commit.
    async fn create_empty(&self, request: &NewRepository) -> ServiceResult<RemoteRepository>;

    async fn get_file(
        &self,
        repository: &RepositoryRef,
        path: &str,
    ) -> ServiceResult<Option<RemoteFile>>;

    /// Writes a file and returns its new revision token.
    async fn put_file(&self, repository: &RepositoryRef, write: &FileWrite)
        -> ServiceResult<String>;
}
