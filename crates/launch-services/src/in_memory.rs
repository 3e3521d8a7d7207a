//! In-memory service fakes used by dry runs and tests.
//!
//! Each fake keeps its state behind `tokio::sync::Mutex`, records every call
//! in order, and supports failure injection per operation.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use launch_core::{EnvTarget, EnvVarKind, RepositoryRef};
use tokio::sync::Mutex;

use crate::{
    DeploymentTrigger, FileWrite, Hosting, NewAgent, NewEnvVar, NewProject, NewRepository,
    RemoteAgent, RemoteDeployment, RemoteEnvVar, RemoteFile, RemoteProject, RemoteRepository,
    ServiceError, ServiceResult, SourceControl, VoiceAgents,
};

const SOURCE_CONTROL: &str = "memory-source-control";
const HOSTING: &str = "memory-hosting";
const VOICE_AGENTS: &str = "memory-voice-agents";

fn injected(service: &'static str, operation: &'static str) -> ServiceError {
    ServiceError::Status {
        service,
        operation,
        status: 500,
        body: "injected failure".to_string(),
    }
}

#[derive(Debug, Default)]
struct CallLog {
    entries: Mutex<Vec<String>>,
}

impl CallLog {
    async fn push(&self, entry: String) {
        self.entries.lock().await.push(entry);
    }

    async fn snapshot(&self) -> Vec<String> {
        self.entries.lock().await.clone()
    }
}

#[derive(Debug, Default)]
struct SourceControlState {
    repositories: BTreeMap<String, RemoteRepository>,
    templates: HashMap<String, BTreeMap<String, String>>,
    files: HashMap<(String, String), RemoteFile>,
}

/// In-memory source-control service keyed by repository name.
#[derive(Debug)]
pub struct InMemorySourceControl {
    owner: String,
    state: Mutex<SourceControlState>,
    calls: CallLog,
    sequence: AtomicU64,
    fail_lookups: AtomicBool,
    fail_creates: AtomicBool,
    fail_file_writes: AtomicBool,
}

impl InMemorySourceControl {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            state: Mutex::new(SourceControlState::default()),
            calls: CallLog::default(),
            sequence: AtomicU64::new(0),
            fail_lookups: AtomicBool::new(false),
            fail_creates: AtomicBool::new(false),
            fail_file_writes: AtomicBool::new(false),
        }
    }

    fn next_revision(&self) -> String {
        format!("rev-{}", self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn remote(&self, id: u64, name: &str) -> RemoteRepository {
        RemoteRepository {
            id: id.to_string(),
            reference: RepositoryRef::new(self.owner.clone(), name),
            html_url: format!("memory://{}/{}", self.owner, name),
            default_branch: Some("main".to_string()),
        }
    }

    /// Registers a template repository whose files are copied on instantiation.
    pub async fn add_template(&self, name: &str, files: &[(&str, &str)]) {
        let files = files
            .iter()
            .map(|(path, content)| (path.to_string(), content.to_string()))
            .collect();
        self.state
            .lock()
            .await
            .templates
            .insert(name.to_string(), files);
    }

    /// Seeds an existing repository, as if created outside the provisioner.
    pub async fn add_repository(&self, name: &str) -> RemoteRepository {
        let id = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let repo = self.remote(id, name);
        self.state
            .lock()
            .await
            .repositories
            .insert(name.to_string(), repo.clone());
        repo
    }

    pub async fn add_file(&self, repository: &str, path: &str, content: &str) {
        let revision = self.next_revision();
        self.state.lock().await.files.insert(
            (repository.to_string(), path.to_string()),
            RemoteFile {
                revision,
                content: content.to_string(),
            },
        );
    }

    pub fn fail_lookups(&self, enabled: bool) {
        self.fail_lookups.store(enabled, Ordering::SeqCst);
    }

    pub fn fail_creates(&self, enabled: bool) {
        self.fail_creates.store(enabled, Ordering::SeqCst);
    }

    pub fn fail_file_writes(&self, enabled: bool) {
        self.fail_file_writes.store(enabled, Ordering::SeqCst);
    }

    pub async fn repository(&self, name: &str) -> Option<RemoteRepository> {
        self.state.lock().await.repositories.get(name).cloned()
    }

    pub async fn repository_count(&self) -> usize {
        self.state.lock().await.repositories.len()
    }

    pub async fn file(&self, repository: &str, path: &str) -> Option<String> {
        self.state
            .lock()
            .await
            .files
            .get(&(repository.to_string(), path.to_string()))
            .map(|file| file.content.clone())
    }

    /// Operation log in call order, e.g. `find_repository acme`.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.snapshot().await
    }

    async fn insert_new(
        &self,
        request: &NewRepository,
        files: BTreeMap<String, String>,
        operation: &'static str,
    ) -> ServiceResult<RemoteRepository> {
        let mut state = self.state.lock().await;
        if state.repositories.contains_key(&request.name) {
            return Err(ServiceError::Status {
                service: SOURCE_CONTROL,
                operation,
                status: 422,
                body: format!("name already exists: {}", request.name),
            });
        }
        let id = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let repo = self.remote(id, &request.name);
        state
            .repositories
            .insert(request.name.clone(), repo.clone());
        for (path, content) in files {
            let revision = self.next_revision();
            state
                .files
                .insert((request.name.clone(), path), RemoteFile { revision, content });
        }
        Ok(repo)
    }
}

#[async_trait]
impl SourceControl for InMemorySourceControl {
    fn service_name(&self) -> &'static str {
        SOURCE_CONTROL
    }

    fn owner(&self) -> &str {
        &self.owner
    }

    async fn find_repository(&self, name: &str) -> ServiceResult<Option<RemoteRepository>> {
        self.calls.push(format!("find_repository {name}")).await;
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(injected(SOURCE_CONTROL, "get repository"));
        }
        Ok(self.repository(name).await)
    }

    async fn create_from_template(
        &self,
        template: &str,
        request: &NewRepository,
    ) -> ServiceResult<RemoteRepository> {
        self.calls
            .push(format!("create_from_template {template} {}", request.name))
            .await;
        let files = self.state.lock().await.templates.get(template).cloned();
        let Some(files) = files else {
            return Err(ServiceError::NotFound {
                service: SOURCE_CONTROL,
                operation: "create repository from template",
                message: format!("template {template} does not exist"),
            });
        };
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(injected(SOURCE_CONTROL, "create repository from template"));
        }
        self.insert_new(request, files, "create repository from template")
            .await
    }

    async fn create_empty(&self, request: &NewRepository) -> ServiceResult<RemoteRepository> {
        self.calls
            .push(format!("create_empty {}", request.name))
            .await;
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(injected(SOURCE_CONTROL, "create repository"));
        }
        let mut files = BTreeMap::new();
        files.insert("README.md".to_string(), format!("# {}\n", request.name));
        self.insert_new(request, files, "create repository").await
    }

    async fn get_file(
        &self,
        repository: &RepositoryRef,
        path: &str,
    ) -> ServiceResult<Option<RemoteFile>> {
        self.calls
            .push(format!("get_file {} {path}", repository.name))
            .await;
        Ok(self
            .state
            .lock()
            .await
            .files
            .get(&(repository.name.clone(), path.to_string()))
            .cloned())
    }

    async fn put_file(
        &self,
        repository: &RepositoryRef,
        write: &FileWrite,
    ) -> ServiceResult<String> {
        self.calls
            .push(format!("put_file {} {}", repository.name, write.path))
            .await;
        if self.fail_file_writes.load(Ordering::SeqCst) {
            return Err(injected(SOURCE_CONTROL, "put file"));
        }
        let mut state = self.state.lock().await;
        if !state.repositories.contains_key(&repository.name) {
            return Err(ServiceError::Status {
                service: SOURCE_CONTROL,
                operation: "put file",
                status: 404,
                body: format!("repository {} not found", repository.full_name()),
            });
        }
        let key = (repository.name.clone(), write.path.clone());
        let current = state.files.get(&key).map(|file| file.revision.clone());
        if current != write.revision {
            return Err(ServiceError::Status {
                service: SOURCE_CONTROL,
                operation: "put file",
                status: 409,
                body: "revision mismatch".to_string(),
            });
        }
        let revision = self.next_revision();
        state.files.insert(
            key,
            RemoteFile {
                revision: revision.clone(),
                content: write.content.clone(),
            },
        );
        Ok(revision)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Environment variable as stored by [`InMemoryHosting`], value included.
pub struct StoredEnvVar {
    pub id: String,
    pub key: String,
    pub value: String,
    pub kind: EnvVarKind,
    pub targets: Vec<EnvTarget>,
}

#[derive(Debug, Default)]
struct HostingState {
    projects: BTreeMap<String, RemoteProject>,
    env: HashMap<String, Vec<StoredEnvVar>>,
    deployments: Vec<DeploymentTrigger>,
    failing_env_keys: HashSet<String>,
}

/// In-memory hosting service keyed by project name.
#[derive(Debug)]
pub struct InMemoryHosting {
    state: Mutex<HostingState>,
    calls: CallLog,
    sequence: AtomicU64,
    fail_lookups: AtomicBool,
    fail_project_creates: AtomicBool,
    fail_env_listing: AtomicBool,
    fail_deployments: AtomicBool,
}

impl Default for InMemoryHosting {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryHosting {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HostingState::default()),
            calls: CallLog::default(),
            sequence: AtomicU64::new(0),
            fail_lookups: AtomicBool::new(false),
            fail_project_creates: AtomicBool::new(false),
            fail_env_listing: AtomicBool::new(false),
            fail_deployments: AtomicBool::new(false),
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}_{}", self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub async fn add_project(&self, name: &str) -> RemoteProject {
        let project = RemoteProject {
            id: self.next_id("prj"),
            name: name.to_string(),
        };
        self.state
            .lock()
            .await
            .projects
            .insert(name.to_string(), project.clone());
        project
    }

    pub async fn add_env_var(&self, project_id: &str, key: &str, value: &str) {
        let id = self.next_id("env");
        self.state
            .lock()
            .await
            .env
            .entry(project_id.to_string())
            .or_default()
            .push(StoredEnvVar {
                id,
                key: key.to_string(),
                value: value.to_string(),
                kind: EnvVarKind::classify(key),
                targets: EnvTarget::ALL.to_vec(),
            });
    }

    pub fn fail_lookups(&self, enabled: bool) {
        self.fail_lookups.store(enabled, Ordering::SeqCst);
    }

    pub fn fail_project_creates(&self, enabled: bool) {
        self.fail_project_creates.store(enabled, Ordering::SeqCst);
    }

    pub fn fail_env_listing(&self, enabled: bool) {
        self.fail_env_listing.store(enabled, Ordering::SeqCst);
    }

    pub fn fail_deployments(&self, enabled: bool) {
        self.fail_deployments.store(enabled, Ordering::SeqCst);
    }

    /// Makes every create or update of `key` fail.
    pub async fn fail_env_key(&self, key: &str) {
        self.state
            .lock()
            .await
            .failing_env_keys
            .insert(key.to_string());
    }

    pub async fn project(&self, name: &str) -> Option<RemoteProject> {
        self.state.lock().await.projects.get(name).cloned()
    }

    pub async fn project_count(&self) -> usize {
        self.state.lock().await.projects.len()
    }

    pub async fn env_vars(&self, project_id: &str) -> Vec<StoredEnvVar> {
        self.state
            .lock()
            .await
            .env
            .get(project_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn env_value(&self, project_id: &str, key: &str) -> Option<String> {
        self.env_vars(project_id)
            .await
            .into_iter()
            .find(|env| env.key == key)
            .map(|env| env.value)
    }

    pub async fn deployments(&self) -> Vec<DeploymentTrigger> {
        self.state.lock().await.deployments.clone()
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.snapshot().await
    }
}

#[async_trait]
impl Hosting for InMemoryHosting {
    fn service_name(&self) -> &'static str {
        HOSTING
    }

    async fn find_project(&self, name: &str) -> ServiceResult<Option<RemoteProject>> {
        self.calls.push(format!("find_project {name}")).await;
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(injected(HOSTING, "get project"));
        }
        Ok(self.project(name).await)
    }

    async fn create_project(&self, project: &NewProject) -> ServiceResult<RemoteProject> {
        self.calls
            .push(format!("create_project {}", project.name))
            .await;
        if self.fail_project_creates.load(Ordering::SeqCst) {
            return Err(injected(HOSTING, "create project"));
        }
        let mut state = self.state.lock().await;
        if state.projects.contains_key(&project.name) {
            return Err(ServiceError::Status {
                service: HOSTING,
                operation: "create project",
                status: 409,
                body: format!("project {} already exists", project.name),
            });
        }
        let created = RemoteProject {
            id: self.next_id("prj"),
            name: project.name.clone(),
        };
        state.projects.insert(project.name.clone(), created.clone());
        Ok(created)
    }

    async fn list_env_vars(&self, project_id: &str) -> ServiceResult<Vec<RemoteEnvVar>> {
        self.calls.push(format!("list_env_vars {project_id}")).await;
        if self.fail_env_listing.load(Ordering::SeqCst) {
            return Err(injected(HOSTING, "list env vars"));
        }
        Ok(self
            .env_vars(project_id)
            .await
            .into_iter()
            .map(|env| RemoteEnvVar {
                id: env.id,
                key: env.key,
                kind: Some(env.kind.wire_name().to_string()),
                targets: env
                    .targets
                    .iter()
                    .map(|target| target.as_str().to_string())
                    .collect(),
            })
            .collect())
    }

    async fn create_env_var(&self, project_id: &str, env_var: &NewEnvVar) -> ServiceResult<()> {
        self.calls
            .push(format!("create_env_var {project_id} {}", env_var.key))
            .await;
        let id = self.next_id("env");
        let mut state = self.state.lock().await;
        if state.failing_env_keys.contains(&env_var.key) {
            return Err(injected(HOSTING, "create env var"));
        }
        let vars = state.env.entry(project_id.to_string()).or_default();
        if vars.iter().any(|env| env.key == env_var.key) {
            return Err(ServiceError::Status {
                service: HOSTING,
                operation: "create env var",
                status: 400,
                body: format!("env var {} already exists", env_var.key),
            });
        }
        vars.push(StoredEnvVar {
            id,
            key: env_var.key.clone(),
            value: env_var.value.clone(),
            kind: env_var.kind,
            targets: env_var.targets.clone(),
        });
        Ok(())
    }

    async fn update_env_var(
        &self,
        project_id: &str,
        env_id: &str,
        value: &str,
        targets: &[EnvTarget],
    ) -> ServiceResult<()> {
        self.calls
            .push(format!("update_env_var {project_id} {env_id}"))
            .await;
        let mut state = self.state.lock().await;
        let failing = state.failing_env_keys.clone();
        let stored = state
            .env
            .get_mut(project_id)
            .and_then(|vars| vars.iter_mut().find(|env| env.id == env_id));
        let Some(stored) = stored else {
            return Err(ServiceError::Status {
                service: HOSTING,
                operation: "update env var",
                status: 404,
                body: format!("env var {env_id} not found"),
            });
        };
        if failing.contains(&stored.key) {
            return Err(injected(HOSTING, "update env var"));
        }
        stored.value = value.to_string();
        stored.targets = targets.to_vec();
        Ok(())
    }

    async fn trigger_deployment(
        &self,
        trigger: &DeploymentTrigger,
    ) -> ServiceResult<RemoteDeployment> {
        self.calls
            .push(format!("trigger_deployment {}", trigger.project_id))
            .await;
        if self.fail_deployments.load(Ordering::SeqCst) {
            return Err(injected(HOSTING, "trigger deployment"));
        }
        let id = self.next_id("dpl");
        self.state.lock().await.deployments.push(trigger.clone());
        Ok(RemoteDeployment {
            url: Some(format!("{}-{id}.memory.app", trigger.name)),
            id,
        })
    }
}

/// In-memory voice-agent service.
#[derive(Debug)]
pub struct InMemoryVoiceAgents {
    agents: Mutex<Vec<(RemoteAgent, Option<NewAgent>)>>,
    calls: CallLog,
    sequence: AtomicU64,
    fail_listing: AtomicBool,
    fail_creates: AtomicBool,
}

impl Default for InMemoryVoiceAgents {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryVoiceAgents {
    pub fn new() -> Self {
        Self {
            agents: Mutex::new(Vec::new()),
            calls: CallLog::default(),
            sequence: AtomicU64::new(0),
            fail_listing: AtomicBool::new(false),
            fail_creates: AtomicBool::new(false),
        }
    }

    fn next_agent_id(&self) -> String {
        format!("agent_{}", self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub async fn add_agent(&self, name: &str) -> RemoteAgent {
        let agent = RemoteAgent {
            agent_id: self.next_agent_id(),
            name: name.to_string(),
        };
        self.agents.lock().await.push((agent.clone(), None));
        agent
    }

    pub fn fail_listing(&self, enabled: bool) {
        self.fail_listing.store(enabled, Ordering::SeqCst);
    }

    pub fn fail_creates(&self, enabled: bool) {
        self.fail_creates.store(enabled, Ordering::SeqCst);
    }

    /// Configurations submitted through `create_agent`, in order.
    pub async fn created(&self) -> Vec<NewAgent> {
        self.agents
            .lock()
            .await
            .iter()
            .filter_map(|(_, config)| config.clone())
            .collect()
    }

    pub async fn agent_count(&self) -> usize {
        self.agents.lock().await.len()
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.snapshot().await
    }
}

#[async_trait]
impl VoiceAgents for InMemoryVoiceAgents {
    fn service_name(&self) -> &'static str {
        VOICE_AGENTS
    }

    async fn list_agents(&self) -> ServiceResult<Vec<RemoteAgent>> {
        self.calls.push("list_agents".to_string()).await;
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(injected(VOICE_AGENTS, "list agents"));
        }
        Ok(self
            .agents
            .lock()
            .await
            .iter()
            .map(|(agent, _)| agent.clone())
            .collect())
    }

    async fn create_agent(&self, agent: &NewAgent) -> ServiceResult<RemoteAgent> {
        self.calls.push(format!("create_agent {}", agent.name)).await;
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(injected(VOICE_AGENTS, "create agent"));
        }
        let created = RemoteAgent {
            agent_id: self.next_agent_id(),
            name: agent.name.clone(),
        };
        self.agents
            .lock()
            .await
            .push((created.clone(), Some(agent.clone())));
        Ok(created)
    }

    async fn session_url(&self, agent_id: &str) -> ServiceResult<String> {
        self.calls.push(format!("session_url {agent_id}")).await;
        let known = self
            .agents
            .lock()
            .await
            .iter()
            .any(|(agent, _)| agent.agent_id == agent_id);
        if !known {
            return Err(ServiceError::Status {
                service: VOICE_AGENTS,
                operation: "get session url",
                status: 404,
                body: format!("agent {agent_id} not found"),
            });
        }
        Ok(format!("wss://memory.voice/convai?agent_id={agent_id}"))
    }
}
