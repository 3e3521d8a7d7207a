use std::collections::HashMap;
use std::sync::Arc;

use launch_core::{EnvTarget, EnvVarKind, EnvironmentVariableSet};
use launch_services::{Hosting, NewEnvVar};
use serde::{Deserialize, Serialize};

use crate::existence::lookup;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Per-key result of one synchronisation pass.
pub struct SyncReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    /// Keys skipped because their value was empty.
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl SyncReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Reconciles a target variable map against a hosting project's live set.
pub struct EnvSynchronizer {
    hosting: Arc<dyn Hosting>,
}

impl EnvSynchronizer {
    pub fn new(hosting: Arc<dyn Hosting>) -> Self {
        Self { hosting }
    }

    /// Best-effort: every key is attempted regardless of earlier failures.
    /// Values are never logged.
    #[tracing::instrument(name = "launch.provision.env_sync", skip_all, fields(project_id = %project_id))]
    pub async fn sync(&self, project_id: &str, target: &EnvironmentVariableSet) -> SyncReport {
        let live = lookup(self.hosting.service_name(), project_id, async {
            self.hosting.list_env_vars(project_id).await.map(Some)
        })
        .await
        .into_option()
        .unwrap_or_default();
        let existing: HashMap<&str, &str> = live
            .iter()
            .map(|env| (env.key.as_str(), env.id.as_str()))
            .collect();

        let mut report = SyncReport::default();
        for (key, value) in target.iter() {
            if value.is_empty() {
                report.skipped.push(key.to_string());
                continue;
            }
            let (result, bucket) = match existing.get(key) {
                Some(env_id) => (
                    self.hosting
                        .update_env_var(project_id, env_id, value, &EnvTarget::ALL)
                        .await,
                    &mut report.updated,
                ),
                None => (
                    self.hosting
                        .create_env_var(
                            project_id,
                            &NewEnvVar {
                                key: key.to_string(),
                                value: value.to_string(),
                                kind: EnvVarKind::classify(key),
                                targets: EnvTarget::ALL.to_vec(),
                            },
                        )
                        .await,
                    &mut report.created,
                ),
            };
            match result {
                Ok(()) => bucket.push(key.to_string()),
                Err(error) => {
                    tracing::warn!(key, error = %error, "environment variable sync failed");
                    report.failed.push(key.to_string());
                }
            }
        }
        tracing::debug!(
            created = report.created.len(),
            updated = report.updated.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "environment variable sync finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::EnvSynchronizer;
    use launch_core::{EnvTarget, EnvVarKind, EnvironmentVariableSet};
    use launch_services::InMemoryHosting;

    #[tokio::test]
    async fn functional_empty_values_are_never_written() {
        let hosting = Arc::new(InMemoryHosting::new());
        let project = hosting.add_project("acme-co").await;
        let target = EnvironmentVariableSet::new().with("A", "1").with("B", "");

        let report = EnvSynchronizer::new(hosting.clone())
            .sync(&project.id, &target)
            .await;

        assert_eq!(report.created, vec!["A".to_string()]);
        assert_eq!(report.skipped, vec!["B".to_string()]);
        let stored = hosting.env_vars(&project.id).await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].key, "A");
    }

    #[tokio::test]
    async fn functional_existing_keys_update_in_place_with_full_targets() {
        let hosting = Arc::new(InMemoryHosting::new());
        let project = hosting.add_project("acme-co").await;
        hosting
            .add_env_var(&project.id, "NEXT_PUBLIC_APP_URL", "https://old.example")
            .await;
        let target = EnvironmentVariableSet::new()
            .with("NEXT_PUBLIC_APP_URL", "https://acme-co.vercel.app")
            .with("SUPABASE_SERVICE_ROLE_KEY", "service-secret");

        let report = EnvSynchronizer::new(hosting.clone())
            .sync(&project.id, &target)
            .await;

        assert_eq!(report.updated, vec!["NEXT_PUBLIC_APP_URL".to_string()]);
        assert_eq!(report.created, vec!["SUPABASE_SERVICE_ROLE_KEY".to_string()]);
        let stored = hosting.env_vars(&project.id).await;
        assert_eq!(stored.len(), 2);
        let app_url = stored
            .iter()
            .find(|env| env.key == "NEXT_PUBLIC_APP_URL")
            .expect("app url");
        assert_eq!(app_url.value, "https://acme-co.vercel.app");
        assert_eq!(app_url.targets, EnvTarget::ALL.to_vec());
        let service_key = stored
            .iter()
            .find(|env| env.key == "SUPABASE_SERVICE_ROLE_KEY")
            .expect("service key");
        assert_eq!(service_key.kind, EnvVarKind::Secret);
    }

    #[tokio::test]
    async fn regression_single_key_failure_is_isolated() {
        let hosting = Arc::new(InMemoryHosting::new());
        let project = hosting.add_project("acme-co").await;
        hosting.fail_env_key("ELEVENLABS_API_KEY").await;
        let target = EnvironmentVariableSet::new()
            .with("ELEVENLABS_API_KEY", "xi")
            .with("NEXT_PUBLIC_COMPANY_NAME", "Acme");

        let report = EnvSynchronizer::new(hosting.clone())
            .sync(&project.id, &target)
            .await;

        assert!(report.has_failures());
        assert_eq!(report.failed, vec!["ELEVENLABS_API_KEY".to_string()]);
        assert_eq!(report.created, vec!["NEXT_PUBLIC_COMPANY_NAME".to_string()]);
        assert_eq!(
            hosting
                .env_value(&project.id, "NEXT_PUBLIC_COMPANY_NAME")
                .await
                .as_deref(),
            Some("Acme")
        );
    }

    #[tokio::test]
    async fn unit_live_set_is_listed_once_per_sync() {
        let hosting = Arc::new(InMemoryHosting::new());
        let project = hosting.add_project("acme-co").await;
        let target = EnvironmentVariableSet::new()
            .with("A", "1")
            .with("B", "2")
            .with("C", "3");

        EnvSynchronizer::new(hosting.clone())
            .sync(&project.id, &target)
            .await;

        let listings = hosting
            .calls()
            .await
            .into_iter()
            .filter(|call| call.starts_with("list_env_vars"))
            .count();
        assert_eq!(listings, 1);
    }

    #[tokio::test]
    async fn regression_listing_failure_is_treated_as_empty() {
        let hosting = Arc::new(InMemoryHosting::new());
        let project = hosting.add_project("acme-co").await;
        hosting.fail_env_listing(true);

        let report = EnvSynchronizer::new(hosting.clone())
            .sync(&project.id, &EnvironmentVariableSet::new().with("A", "1"))
            .await;

        assert_eq!(report.created, vec!["A".to_string()]);
    }

    #[tokio::test]
    async fn regression_resync_is_idempotent() {
        let hosting = Arc::new(InMemoryHosting::new());
        let project = hosting.add_project("acme-co").await;
        let target = EnvironmentVariableSet::new().with("A", "1").with("B", "2");
        let sync = EnvSynchronizer::new(hosting.clone());

        sync.sync(&project.id, &target).await;
        let second = sync.sync(&project.id, &target).await;

        assert!(second.created.is_empty());
        assert_eq!(second.updated.len(), 2);
        assert_eq!(hosting.env_vars(&project.id).await.len(), 2);
    }
}
