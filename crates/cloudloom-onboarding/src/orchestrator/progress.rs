//! Progress reporting abstractions for the orchestrator
//!
//! Lets the same onboarding sequence report to logs, a channel feeding an
//! API response, or a mock in tests.

use super::types::{OnboardingPhase, StepReport};
use tracing::{debug, info, warn};

/// Trait for reporting onboarding progress
#[cfg_attr(test, mockall::automock)]
pub trait ProgressReporter: Send + Sync {
    /// Report that a phase was reached
    fn report_phase(&self, phase: OnboardingPhase);

    /// Report the resolved target account
    fn report_account(&self, account_id: &str);

    /// Report what a reconciliation did
    fn report_step(&self, report: &StepReport);

    /// Report a failed optional step that was skipped
    fn report_warning(&self, phase: OnboardingPhase, message: &str);
}

/// Progress reporter that logs through `tracing`
pub struct LogReporter;

impl LogReporter {
    /// Create a new log reporter
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for LogReporter {
    fn report_phase(&self, phase: OnboardingPhase) {
        info!(phase = %phase, "Onboarding phase");
    }

    fn report_account(&self, account_id: &str) {
        info!(account_id = %account_id, "Target account resolved");
    }

    fn report_step(&self, report: &StepReport) {
        if report.kind.is_policy() {
            debug!(
                kind = %report.kind,
                name = %report.name,
                outcome = %report.outcome,
                "Policy applied"
            );
            return;
        }
        info!(
            kind = %report.kind,
            name = %report.name,
            outcome = %report.outcome,
            region = ?report.region,
            "Resource reconciled"
        );
    }

    fn report_warning(&self, phase: OnboardingPhase, message: &str) {
        warn!(phase = %phase, "Optional step skipped: {message}");
    }
}
