use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::TenantName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Enumerates the kinds of remote resources a tenant owns.
pub enum ResourceKind {
    Repository,
    Project,
    Agent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Whether a resource was found or created by this run.
pub enum ResourceOrigin {
    Existing,
    Created,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Enumerates supported `Readiness` values.
pub enum Readiness {
    Ready,
    /// Created but follow-up work (deploy, settle) has not been confirmed.
    Pending,
    /// Usable, with one or more non-critical follow-ups failed.
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A remote resource as seen by the provisioner that produced it.
pub struct ResourceRecord {
    pub kind: ResourceKind,
    pub external_id: String,
    pub canonical_name: TenantName,
    pub url: Option<String>,
    pub origin: ResourceOrigin,
    pub readiness: Readiness,
}

impl ResourceRecord {
    pub fn already_exists(&self) -> bool {
        self.origin == ResourceOrigin::Existing
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// `owner/name` reference to a source-control repository.
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Hosting environments a variable is scoped to.
pub enum EnvTarget {
    Production,
    Preview,
    Development,
}

impl EnvTarget {
    /// Every variable written by this system is scoped to the full set.
    pub const ALL: [EnvTarget; 3] = [
        EnvTarget::Production,
        EnvTarget::Preview,
        EnvTarget::Development,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Preview => "preview",
            Self::Development => "development",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Storage class of a hosting environment variable.
pub enum EnvVarKind {
    #[serde(rename = "encrypted")]
    Secret,
    Plain,
}

const SECRET_KEY_MARKERS: [&str; 2] = ["KEY", "SECRET"];

impl EnvVarKind {
    /// Keys containing `KEY` or `SECRET` are stored as secrets.
    pub fn classify(key: &str) -> Self {
        if SECRET_KEY_MARKERS.iter().any(|marker| key.contains(marker)) {
            Self::Secret
        } else {
            Self::Plain
        }
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Secret => "encrypted",
            Self::Plain => "plain",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Target variable map reconciled against a hosting project.
///
/// Entries keep insertion-independent (sorted) order so reconciliation is
/// deterministic across runs.
pub struct EnvironmentVariableSet {
    entries: BTreeMap<String, String>,
}

impl EnvironmentVariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for EnvironmentVariableSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (key, value) in iter {
            set.insert(key, value);
        }
        set
    }
}
