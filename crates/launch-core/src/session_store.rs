use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::ProvisioningReport;

#[async_trait]
/// Request-scoped storage for provisioning results, keyed by request id.
///
/// Injected into the orchestrator; there is no process-wide session map.
pub trait SessionStore: Send + Sync {
    async fn put(&self, report: ProvisioningReport);

    async fn get(&self, request_id: &str) -> Option<ProvisioningReport>;
}

#[derive(Debug, Clone, Default)]
/// Public struct `InMemorySessionStore` used across launch components.
pub struct InMemorySessionStore {
    reports: Arc<RwLock<HashMap<String, ProvisioningReport>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, report: ProvisioningReport) {
        self.reports
            .write()
            .await
            .insert(report.request_id.clone(), report);
    }

    async fn get(&self, request_id: &str) -> Option<ProvisioningReport> {
        self.reports.read().await.get(request_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemorySessionStore, SessionStore};
    use crate::ProvisioningReport;

    #[tokio::test]
    async fn functional_in_memory_store_keys_reports_by_request_id() {
        let store = InMemorySessionStore::new();
        store.put(ProvisioningReport::begin("req-a", "acme")).await;
        store.put(ProvisioningReport::begin("req-b", "globex")).await;

        assert_eq!(
            store.get("req-a").await.map(|report| report.tenant),
            Some("acme".to_string())
        );
        assert_eq!(
            store.get("req-b").await.map(|report| report.tenant),
            Some("globex".to_string())
        );
        assert!(store.get("req-c").await.is_none());
    }

    #[tokio::test]
    async fn unit_clones_share_the_same_backing_map() {
        let store = InMemorySessionStore::new();
        let shared = store.clone();
        shared.put(ProvisioningReport::begin("req-c", "initech")).await;
        assert!(store.get("req-c").await.is_some());
    }
}
