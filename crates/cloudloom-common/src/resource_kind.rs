//! Managed resource kinds and how existing instances are treated
//!
//! Every kind is reconciled the same way (describe, then create or reuse),
//! but what "reuse" means differs per kind. Containers that rarely change are
//! adopted as they are; configuration and policy documents are cheap to
//! regenerate and must track the current account state, so they are always
//! rewritten.

use serde::Serialize;

/// What to do when a resource with the deterministic name already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ReusePolicy {
    /// Keep the existing resource untouched
    ReuseAsIs,
    /// Overwrite with the freshly computed desired state
    Overwrite,
}

/// Types of AWS resources managed by CloudLoom onboarding
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Object bucket receiving trail logs
    Bucket,
    /// Policy on the log bucket
    BucketPolicy,
    /// Log group receiving trail events
    LogGroup,
    /// Account-level log resource policy for the trail service
    LogGroupPolicy,
    /// IAM role (trail delivery, event routing, compliance recording)
    IamRole,
    /// Inline IAM policy on a role
    RolePolicy,
    /// Audit trail
    Trail,
    /// Central finding queue
    Queue,
    /// Per-region event rule and its queue target
    EventRule,
    /// Access policy on the central queue
    QueuePolicy,
    /// Compliance configuration recorder
    ConfigRecorder,
    /// Compliance delivery channel
    DeliveryChannel,
    /// Managed compliance rule
    ConfigRule,
}

impl ResourceKind {
    /// Reuse policy applied when the resource already exists
    pub fn reuse_policy(self) -> ReusePolicy {
        match self {
            ResourceKind::Bucket
            | ResourceKind::LogGroup
            | ResourceKind::Queue
            | ResourceKind::IamRole
            | ResourceKind::ConfigRecorder
            | ResourceKind::DeliveryChannel
            | ResourceKind::ConfigRule => ReusePolicy::ReuseAsIs,
            ResourceKind::BucketPolicy
            | ResourceKind::LogGroupPolicy
            | ResourceKind::RolePolicy
            | ResourceKind::Trail
            | ResourceKind::EventRule
            | ResourceKind::QueuePolicy => ReusePolicy::Overwrite,
        }
    }

    /// Whether this kind is a policy document rather than a container
    pub fn is_policy(self) -> bool {
        matches!(
            self,
            ResourceKind::BucketPolicy
                | ResourceKind::LogGroupPolicy
                | ResourceKind::RolePolicy
                | ResourceKind::QueuePolicy
        )
    }
}
