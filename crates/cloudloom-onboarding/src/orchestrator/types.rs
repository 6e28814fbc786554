//! Phase and report types for the onboarding state machine

use crate::reconcile::Outcome;
use cloudloom_common::ResourceKind;
use serde::Serialize;

/// Phases of an onboarding run, in order
///
/// Optional phases are only entered when enabled in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum OnboardingPhase {
    Init,
    RoleAssumed,
    Identified,
    BucketReady,
    LogGroupReady,
    TrailRoleReady,
    TrailReady,
    ComplianceRecording,
    QueueReady,
    EventRoleReady,
    RulesReady,
    PolicyApplied,
    WiringVerified,
    ConsumerStarted,
    Done,
}

impl OnboardingPhase {
    /// Whether a failure in this phase is logged and skipped
    pub fn is_optional(self) -> bool {
        matches!(
            self,
            OnboardingPhase::ComplianceRecording | OnboardingPhase::WiringVerified
        )
    }
}

/// What one reconciliation did to one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub phase: OnboardingPhase,
    pub kind: ResourceKind,
    pub name: String,
    pub outcome: Outcome,
    /// Set for per-region resources
    pub region: Option<String>,
}

impl StepReport {
    pub fn new(
        phase: OnboardingPhase,
        kind: ResourceKind,
        name: impl Into<String>,
        outcome: Outcome,
    ) -> Self {
        Self {
            phase,
            kind,
            name: name.into(),
            outcome,
            region: None,
        }
    }

    pub fn in_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(OnboardingPhase::TrailRoleReady.to_string(), "trail-role-ready");
        assert_eq!(OnboardingPhase::RulesReady.as_ref(), "rules-ready");
    }

    #[test]
    fn test_optional_phases() {
        assert!(OnboardingPhase::ComplianceRecording.is_optional());
        assert!(OnboardingPhase::WiringVerified.is_optional());
        assert!(!OnboardingPhase::PolicyApplied.is_optional());
        assert!(!OnboardingPhase::BucketReady.is_optional());
    }
}
