//! Canonical tenant naming.
//!
//! The canonical name is the idempotency key shared by every provisioner, so
//! all call sites go through [`TenantName`] and never normalize on their own.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

pub const MAX_TENANT_NAME_CHARS: usize = 100;

/// Normalizes a human-entered platform or company name.
///
/// Lowercases ASCII and collapses every run of characters outside
/// `[a-z0-9-]` into a single `-`. Dashes already present are kept as they are.
/// Leading and trailing dashes are trimmed, then the name is truncated to
/// [`MAX_TENANT_NAME_CHARS`] and trimmed again. The result always matches
/// `^[a-z0-9-]{0,100}$` and never starts or ends with a dash.
pub fn canonical_name(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    let mut in_separator_run = false;
    for ch in raw.chars() {
        let lowered = ch.to_ascii_lowercase();
        if lowered.is_ascii_lowercase() || lowered.is_ascii_digit() || lowered == '-' {
            in_separator_run = false;
            normalized.push(lowered);
        } else if !in_separator_run {
            in_separator_run = true;
            normalized.push('-');
        }
    }

    let mut canonical = normalized.trim_matches('-').to_string();
    if canonical.len() > MAX_TENANT_NAME_CHARS {
        canonical.truncate(MAX_TENANT_NAME_CHARS);
        while canonical.ends_with('-') {
            canonical.pop();
        }
    }
    canonical
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
/// Validated canonical tenant name.
pub struct TenantName(String);

impl TenantName {
    pub fn new(raw: &str) -> Result<Self, ConfigError> {
        let canonical = canonical_name(raw);
        if canonical.is_empty() {
            return Err(ConfigError::EmptyTenantName {
                raw: raw.to_string(),
            });
        }
        Ok(Self(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl AsRef<str> for TenantName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TenantName {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<TenantName> for String {
    fn from(value: TenantName) -> Self {
        value.0
    }
}
