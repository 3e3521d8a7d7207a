//! Core types for tenant launch provisioning.
//!
//! Canonical tenant naming, the resource/variable data model, the voice
//! catalogue, request and report types, and the injected session store.

mod error;
mod model;
mod report;
mod request;
mod session_store;
mod tenant_name;
mod voice_catalog;

pub use error::ConfigError;
pub use model::{
    EnvTarget, EnvVarKind, EnvironmentVariableSet, Readiness, RepositoryRef, ResourceKind,
    ResourceOrigin, ResourceRecord,
};
pub use report::{ProvisioningReport, ProvisioningStep, StepOutcome, StepReport};
pub use request::{ProvisioningRequest, ProvisioningRequestBuilder, SecretBundle, TenantMetadata};
pub use session_store::{InMemorySessionStore, SessionStore};
pub use tenant_name::{canonical_name, TenantName, MAX_TENANT_NAME_CHARS};
pub use voice_catalog::{CatalogVoice, InterviewTone, VoiceGender, VoiceSelection};
