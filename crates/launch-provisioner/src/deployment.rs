use std::sync::Arc;

use launch_core::{
    EnvTarget, EnvironmentVariableSet, Readiness, RepositoryRef, ResourceKind, ResourceOrigin,
    ResourceRecord, TenantName,
};
use launch_services::{BuildProfile, DeploymentTrigger, Hosting, NewProject, ServiceResult};

use crate::env_sync::{EnvSynchronizer, SyncReport};
use crate::existence::{lookup, Lookup};

/// Deterministic public URL for a tenant.
pub fn public_url(tenant: &TenantName, public_domain: &str) -> String {
    format!(
        "https://{}.{}",
        tenant.as_str(),
        public_domain.trim().trim_matches('.')
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Outcome of [`DeploymentProvisioner::ensure_deployment`].
pub struct DeploymentOutcome {
    pub project_id: String,
    pub public_url: String,
    pub deployment_id: Option<String>,
    pub sync: SyncReport,
    pub record: ResourceRecord,
    pub warnings: Vec<String>,
}

/// Creates or reuses the hosting project, syncs its variables and triggers a
/// deployment.
pub struct DeploymentProvisioner {
    hosting: Arc<dyn Hosting>,
    env: EnvSynchronizer,
    public_domain: String,
    build: BuildProfile,
    git_ref: String,
}

impl DeploymentProvisioner {
    pub fn new(
        hosting: Arc<dyn Hosting>,
        public_domain: impl Into<String>,
        build: BuildProfile,
        git_ref: impl Into<String>,
    ) -> Self {
        Self {
            env: EnvSynchronizer::new(hosting.clone()),
            hosting,
            public_domain: public_domain.into(),
            build,
            git_ref: git_ref.into(),
        }
    }

    pub fn public_url(&self, tenant: &TenantName) -> String {
        public_url(tenant, &self.public_domain)
    }

    /// Only first-time project creation is fatal. Variable failures and a
    /// failed deployment trigger degrade the outcome.
    #[tracing::instrument(
        name = "launch.provision.deployment",
        skip_all,
        fields(tenant = %tenant, repository = %repository)
    )]
    pub async fn ensure_deployment(
        &self,
        tenant: &TenantName,
        repository: &RepositoryRef,
        variables: &EnvironmentVariableSet,
    ) -> ServiceResult<DeploymentOutcome> {
        let existing = lookup(
            self.hosting.service_name(),
            tenant.as_str(),
            self.hosting.find_project(tenant.as_str()),
        )
        .await;

        let (project, origin) = match existing {
            Lookup::Found(project) => {
                tracing::info!(project_id = %project.id, "reusing existing project");
                (project, ResourceOrigin::Existing)
            }
            Lookup::NotFound => {
                let project = self
                    .hosting
                    .create_project(&NewProject {
                        name: tenant.to_string(),
                        repository: repository.clone(),
                        build: self.build.clone(),
                    })
                    .await?;
                tracing::info!(project_id = %project.id, "created project");
                (project, ResourceOrigin::Created)
            }
        };

        let mut warnings = Vec::new();
        let sync = self.env.sync(&project.id, variables).await;
        if sync.has_failures() {
            warnings.push(format!(
                "failed to sync environment variables: {}",
                sync.failed.join(", ")
            ));
        }

        let trigger = DeploymentTrigger {
            name: tenant.to_string(),
            project_id: project.id.clone(),
            repository: repository.clone(),
            git_ref: self.git_ref.clone(),
            target: EnvTarget::Production,
        };
        let deployment_id = match self.hosting.trigger_deployment(&trigger).await {
            Ok(deployment) => {
                tracing::info!(deployment_id = %deployment.id, "deployment triggered");
                Some(deployment.id)
            }
            Err(error) => {
                tracing::warn!(project_id = %project.id, error = %error, "deployment trigger failed");
                warnings.push(format!("deployment trigger failed: {error}"));
                None
            }
        };

        let public_url = self.public_url(tenant);
        let readiness = if warnings.is_empty() {
            Readiness::Pending
        } else {
            Readiness::Degraded
        };
        Ok(DeploymentOutcome {
            record: ResourceRecord {
                kind: ResourceKind::Project,
                external_id: project.id.clone(),
                canonical_name: tenant.clone(),
                url: Some(public_url.clone()),
                origin,
                readiness,
            },
            project_id: project.id,
            public_url,
            deployment_id,
            sync,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{public_url, DeploymentProvisioner};
    use launch_core::{
        EnvTarget, EnvironmentVariableSet, Readiness, RepositoryRef, ResourceOrigin, TenantName,
    };
    use launch_services::{BuildProfile, InMemoryHosting};

    fn provisioner(hosting: Arc<InMemoryHosting>) -> DeploymentProvisioner {
        DeploymentProvisioner::new(hosting, "vercel.app", BuildProfile::default(), "main")
    }

    fn variables() -> EnvironmentVariableSet {
        EnvironmentVariableSet::new()
            .with("NEXT_PUBLIC_APP_URL", "https://acme-co.vercel.app")
            .with("ELEVENLABS_SETUP_AGENT_ID", "agent_1")
    }

    #[test]
    fn unit_public_url_is_derived_from_canonical_name() {
        let tenant = TenantName::new("Acme Co!!").expect("tenant");
        assert_eq!(public_url(&tenant, "vercel.app"), "https://acme-co.vercel.app");
        assert_eq!(public_url(&tenant, ".example.dev."), "https://acme-co.example.dev");
    }

    #[tokio::test]
    async fn functional_first_run_creates_second_run_reuses() {
        let hosting = Arc::new(InMemoryHosting::new());
        let provisioner = provisioner(hosting.clone());
        let tenant = TenantName::new("acme-co").expect("tenant");
        let repository = RepositoryRef::new("acme-org", "acme-co");

        let first = provisioner
            .ensure_deployment(&tenant, &repository, &variables())
            .await
            .expect("first");
        let second = provisioner
            .ensure_deployment(&tenant, &repository, &variables())
            .await
            .expect("second");

        assert_eq!(first.public_url, "https://acme-co.vercel.app");
        assert_eq!(first.record.origin, ResourceOrigin::Created);
        assert_eq!(second.record.origin, ResourceOrigin::Existing);
        assert_eq!(first.public_url, second.public_url);
        assert_eq!(first.project_id, second.project_id);
        assert_eq!(hosting.project_count().await, 1);
        assert_eq!(hosting.env_vars(&first.project_id).await.len(), 2);

        let deployments = hosting.deployments().await;
        assert_eq!(deployments.len(), 2);
        assert_eq!(deployments[0].git_ref, "main");
        assert_eq!(deployments[0].target, EnvTarget::Production);
        assert_eq!(deployments[0].repository.full_name(), "acme-org/acme-co");
    }

    #[tokio::test]
    async fn unit_project_creation_failure_is_fatal() {
        let hosting = Arc::new(InMemoryHosting::new());
        hosting.fail_project_creates(true);
        let tenant = TenantName::new("acme-co").expect("tenant");

        let result = provisioner(hosting.clone())
            .ensure_deployment(
                &tenant,
                &RepositoryRef::new("acme-org", "acme-co"),
                &variables(),
            )
            .await;

        assert!(result.is_err());
        assert!(hosting.deployments().await.is_empty());
    }

    #[tokio::test]
    async fn regression_trigger_failure_degrades_without_failing() {
        let hosting = Arc::new(InMemoryHosting::new());
        hosting.fail_deployments(true);
        let tenant = TenantName::new("acme-co").expect("tenant");

        let outcome = provisioner(hosting)
            .ensure_deployment(
                &tenant,
                &RepositoryRef::new("acme-org", "acme-co"),
                &variables(),
            )
            .await
            .expect("deployment step survives trigger failure");

        assert_eq!(outcome.record.readiness, Readiness::Degraded);
        assert!(outcome.deployment_id.is_none());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].starts_with("deployment trigger failed"));
    }

    #[tokio::test]
    async fn regression_lookup_failure_then_conflict_surfaces_on_create() {
        let hosting = Arc::new(InMemoryHosting::new());
        hosting.add_project("acme-co").await;
        hosting.fail_lookups(true);
        let tenant = TenantName::new("acme-co").expect("tenant");

        let error = provisioner(hosting)
            .ensure_deployment(
                &tenant,
                &RepositoryRef::new("acme-org", "acme-co"),
                &variables(),
            )
            .await
            .expect_err("conflict surfaces on create");

        assert_eq!(error.status(), Some(409));
    }
}
