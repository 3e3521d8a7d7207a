use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ResourceRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Orchestrated provisioning steps, in execution order.
pub enum ProvisioningStep {
    Agent,
    Repository,
    Deployment,
}

impl ProvisioningStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Repository => "repository",
            Self::Deployment => "deployment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
/// Typed result of one step.
pub enum StepOutcome {
    Succeeded,
    Degraded { warnings: Vec<String> },
    Failed { error: String },
}

impl StepOutcome {
    /// `Succeeded` when `warnings` is empty, `Degraded` otherwise.
    pub fn from_warnings(warnings: Vec<String>) -> Self {
        if warnings.is_empty() {
            Self::Succeeded
        } else {
            Self::Degraded { warnings }
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Public struct `StepReport` used across launch components.
pub struct StepReport {
    pub step: ProvisioningStep,
    pub outcome: StepOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Structured orchestrator result. Always returned, even on failure.
pub struct ProvisioningReport {
    pub request_id: String,
    pub tenant: String,
    pub success: bool,
    pub repository_url: Option<String>,
    pub deployment_url: Option<String>,
    pub agent_id: Option<String>,
    pub repository_already_exists: bool,
    pub deployment_already_exists: bool,
    pub agent_already_exists: bool,
    pub steps: Vec<StepReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ProvisioningReport {
    pub fn begin(request_id: impl Into<String>, tenant: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            tenant: tenant.into(),
            success: false,
            repository_url: None,
            deployment_url: None,
            agent_id: None,
            repository_already_exists: false,
            deployment_already_exists: false,
            agent_already_exists: false,
            steps: Vec::new(),
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Appends a step; the first failed step's message becomes `error`.
    pub fn record(
        &mut self,
        step: ProvisioningStep,
        outcome: StepOutcome,
        resource: Option<ResourceRecord>,
    ) {
        if let StepOutcome::Failed { error } = &outcome {
            if self.error.is_none() {
                self.error = Some(format!("{} step failed: {error}", step.as_str()));
            }
        }
        self.steps.push(StepReport {
            step,
            outcome,
            resource,
        });
    }

    pub fn step(&self, step: ProvisioningStep) -> Option<&StepReport> {
        self.steps.iter().find(|report| report.step == step)
    }

    pub fn finish(mut self) -> Self {
        self.success = self.error.is_none() && !self.steps.iter().any(|s| s.outcome.is_failed());
        self.finished_at = Some(Utc::now());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{ProvisioningReport, ProvisioningStep, StepOutcome};

    #[test]
    fn unit_step_outcome_from_warnings_distinguishes_degraded() {
        assert_eq!(StepOutcome::from_warnings(Vec::new()), StepOutcome::Succeeded);
        assert_eq!(
            StepOutcome::from_warnings(vec!["readme".to_string()]),
            StepOutcome::Degraded {
                warnings: vec!["readme".to_string()]
            }
        );
    }

    #[test]
    fn functional_report_success_tracks_failed_steps_only() {
        let mut report = ProvisioningReport::begin("req-1", "acme-co");
        report.record(ProvisioningStep::Agent, StepOutcome::Succeeded, None);
        report.record(
            ProvisioningStep::Repository,
            StepOutcome::Degraded {
                warnings: vec!["config file write failed".to_string()],
            },
            None,
        );
        let report = report.finish();
        assert!(report.success);
        assert!(report.error.is_none());
        assert!(report.finished_at.is_some());
    }

    #[test]
    fn functional_report_keeps_first_failure_message() {
        let mut report = ProvisioningReport::begin("req-2", "acme-co");
        report.record(
            ProvisioningStep::Repository,
            StepOutcome::Failed {
                error: "first".to_string(),
            },
            None,
        );
        report.record(
            ProvisioningStep::Deployment,
            StepOutcome::Failed {
                error: "second".to_string(),
            },
            None,
        );
        let report = report.finish();
        assert!(!report.success);
        assert_eq!(report.error.as_deref(), Some("repository step failed: first"));
        assert!(report.step(ProvisioningStep::Agent).is_none());
    }

    #[test]
    fn unit_report_serializes_step_status_tag() {
        let mut report = ProvisioningReport::begin("req-3", "acme-co");
        report.record(ProvisioningStep::Agent, StepOutcome::Succeeded, None);
        let json = serde_json::to_value(report.finish()).expect("serialize report");
        assert_eq!(json["steps"][0]["step"], "agent");
        assert_eq!(json["steps"][0]["outcome"]["status"], "succeeded");
        assert!(json.get("error").is_none());
    }
}
