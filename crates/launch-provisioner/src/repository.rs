use std::sync::Arc;
use std::time::Duration;

use launch_core::{
    Readiness, RepositoryRef, ResourceKind, ResourceOrigin, ResourceRecord, SecretBundle,
    TenantMetadata, TenantName,
};
use launch_services::{FileWrite, NewRepository, RemoteRepository, ServiceResult, SourceControl};

use crate::existence::{lookup, Lookup};

const CONFIG_COMMIT_MESSAGE: &str = "Update README with platform configuration";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Outcome of [`RepositoryProvisioner::ensure_repository`].
pub struct RepositoryOutcome {
    pub reference: RepositoryRef,
    pub record: ResourceRecord,
    /// Non-fatal problems, e.g. a failed configuration-file write.
    pub warnings: Vec<String>,
}

/// Creates or reuses the tenant's source repository and seeds its public
/// configuration file.
pub struct RepositoryProvisioner {
    source: Arc<dyn SourceControl>,
    template_repo: String,
    settle_delay: Duration,
    config_file_path: String,
}

impl RepositoryProvisioner {
    pub fn new(
        source: Arc<dyn SourceControl>,
        template_repo: impl Into<String>,
        settle_delay: Duration,
        config_file_path: impl Into<String>,
    ) -> Self {
        Self {
            source,
            template_repo: template_repo.into(),
            settle_delay,
            config_file_path: config_file_path.into(),
        }
    }

    /// Reference the repository has, or will have, under the configured owner.
    pub fn derived_reference(&self, tenant: &TenantName) -> RepositoryRef {
        RepositoryRef::new(self.source.owner(), tenant.as_str())
    }

    #[tracing::instrument(
        name = "launch.provision.repository",
        skip_all,
        fields(tenant = %tenant, service = self.source.service_name())
    )]
    pub async fn ensure_repository(
        &self,
        tenant: &TenantName,
        metadata: &TenantMetadata,
        secrets: &SecretBundle,
    ) -> ServiceResult<RepositoryOutcome> {
        let existing = lookup(
            self.source.service_name(),
            tenant.as_str(),
            self.source.find_repository(tenant.as_str()),
        )
        .await;

        let (remote, origin) = match existing {
            Lookup::Found(remote) => {
                tracing::info!(repository = %remote.reference, "reusing existing repository");
                (remote, ResourceOrigin::Existing)
            }
            Lookup::NotFound => {
                let remote = self.create(tenant, metadata).await?;
                if !self.settle_delay.is_zero() {
                    tokio::time::sleep(self.settle_delay).await;
                }
                (remote, ResourceOrigin::Created)
            }
        };

        let mut warnings = Vec::new();
        let content = render_config_file(metadata, secrets);
        if let Err(error) = self.write_config_file(&remote.reference, &content).await {
            tracing::warn!(
                repository = %remote.reference,
                path = %self.config_file_path,
                error = %error,
                "configuration file write failed"
            );
            warnings.push(format!(
                "could not write {}: {error}",
                self.config_file_path
            ));
        }

        let readiness = if warnings.is_empty() {
            Readiness::Ready
        } else {
            Readiness::Degraded
        };
        Ok(RepositoryOutcome {
            record: ResourceRecord {
                kind: ResourceKind::Repository,
                external_id: remote.id.clone(),
                canonical_name: tenant.clone(),
                url: Some(remote.html_url.clone()),
                origin,
                readiness,
            },
            reference: remote.reference,
            warnings,
        })
    }

    async fn create(
        &self,
        tenant: &TenantName,
        metadata: &TenantMetadata,
    ) -> ServiceResult<RemoteRepository> {
        let request = NewRepository {
            name: tenant.to_string(),
            description: format!("AI Interview Platform for {}", metadata.display_name()),
            private: false,
        };
        match self
            .source
            .create_from_template(&self.template_repo, &request)
            .await
        {
            Ok(remote) => {
                tracing::info!(template = %self.template_repo, "created repository from template");
                Ok(remote)
            }
            Err(error) if error.is_not_found() => {
                tracing::warn!(
                    template = %self.template_repo,
                    error = %error,
                    "template unavailable; creating empty repository"
                );
                self.source.create_empty(&request).await
            }
            Err(error) => Err(error),
        }
    }

    /// Read-modify-write: the current revision, if any, guards the update.
    async fn write_config_file(&self, reference: &RepositoryRef, content: &str) -> ServiceResult<()> {
        let current = self
            .source
            .get_file(reference, &self.config_file_path)
            .await?;
        if current.as_ref().map(|file| file.content.as_str()) == Some(content) {
            return Ok(());
        }
        let write = FileWrite {
            path: self.config_file_path.clone(),
            content: content.to_string(),
            message: CONFIG_COMMIT_MESSAGE.to_string(),
            revision: current.map(|file| file.revision),
        };
        self.source.put_file(reference, &write).await?;
        Ok(())
    }
}

/// Public configuration file committed to every tenant repository. Carries
/// only values that ship to the browser anyway.
pub fn render_config_file(metadata: &TenantMetadata, secrets: &SecretBundle) -> String {
    let platform = metadata.platform_name.trim();
    let company = metadata
        .company_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let datastore_url = non_blank(&secrets.datastore_url);
    let anon_key = non_blank(&secrets.datastore_anon_key);

    let mut out = format!("# {platform}\n\nAI Interview Platform for {}\n", metadata.display_name());
    if let Some(description) = metadata
        .description
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
    {
        out.push_str(&format!("\n{description}\n"));
    }
    out.push_str("\n## Configuration\n\n");
    out.push_str(&format!(
        "- **Supabase URL**: {}\n",
        datastore_url.unwrap_or("Configure in Vercel")
    ));
    out.push_str(&format!("- **Platform**: {platform}\n"));
    out.push_str(&format!("- **Company**: {}\n", company.unwrap_or("N/A")));
    out.push_str(
        "\n## Getting Started\n\n\
         1. Clone this repository\n\
         2. Install dependencies: `npm install`\n\
         3. Set up environment variables\n\
         4. Run development server: `npm run dev`\n",
    );
    out.push_str("\n## Environment Variables\n\n```\n");
    out.push_str(&format!(
        "NEXT_PUBLIC_SUPABASE_URL={}\n",
        datastore_url.unwrap_or("your-supabase-url")
    ));
    out.push_str(&format!(
        "NEXT_PUBLIC_SUPABASE_ANON_KEY={}\n",
        anon_key.unwrap_or("your-anon-key")
    ));
    out.push_str(&format!("NEXT_PUBLIC_PLATFORM_NAME={platform}\n"));
    out.push_str("```\n");
    out
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
