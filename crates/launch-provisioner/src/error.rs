use launch_core::{ConfigError, ProvisioningStep};
use launch_services::ServiceError;
use thiserror::Error;

#[derive(Debug, Error)]
/// Enumerates failures raised while configuring or running provisioning.
pub enum ProvisionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build {service} client: {source}")]
    Client {
        service: &'static str,
        #[source]
        source: ServiceError,
    },
    #[error("{} step failed: {source}", step.as_str())]
    Step {
        step: ProvisioningStep,
        #[source]
        source: ServiceError,
    },
}

impl ProvisionError {
    pub(crate) fn step(step: ProvisioningStep, source: ServiceError) -> Self {
        Self::Step { step, source }
    }
}
