use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Enumerates pre-flight configuration failures.
///
/// These are raised before any remote call is made and always abort the run.
pub enum ConfigError {
    #[error("tenant name '{raw}' has no identifier-safe characters")]
    EmptyTenantName { raw: String },
    #[error("platform name must not be empty")]
    MissingPlatformName,
    #[error("missing required credential(s): {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),
    #[error("invalid setting '{name}': {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}
