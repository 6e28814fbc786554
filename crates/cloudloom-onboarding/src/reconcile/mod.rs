//! Describe-then-create-or-reuse reconciliation
//!
//! Each managed resource kind has one reconciler implementing [`Reconcile`].
//! The generic [`reconcile`] driver gives every kind the same protocol:
//!
//! 1. Describe the resource by its deterministic name
//! 2. If absent, create it with the desired configuration
//! 3. If present, apply the kind's [`ReusePolicy`] through [`Reconcile::reuse`]
//!
//! A create that loses a race ("already exists") is not an error: the driver
//! describes again and falls through to step 3.
//!
//! [`ReusePolicy`]: cloudloom_common::ReusePolicy

pub mod bucket;
pub mod log_group;
pub mod queue;
pub mod queue_policy;
pub mod recorder;
pub mod role;
pub mod rule;
pub mod trail;

use crate::aws::is_conflict;
use anyhow::{Context, Result};
use cloudloom_common::{ResourceKind, ReusePolicy};
use serde::Serialize;
use std::future::Future;
use tracing::{debug, info};

pub use bucket::{BucketReconciler, ensure_bucket};
pub use log_group::{LogGroupReady, LogGroupReconciler, ensure_log_group};
pub use queue::{QueueReady, QueueReconciler, ensure_queue};
pub use queue_policy::apply_queue_policy;
pub use recorder::{
    BASELINE_RULES, BaselineRule, ComplianceRecording, ConfigRuleReconciler, ManagedRecording,
    RecorderReconciler, ensure_baseline_rules, ensure_compliance_recording,
};
pub use role::{RoleReady, RoleReconciler, RoleSpec, ensure_role};
pub use rule::{RuleReconciler, route_region, rule_targets_queue};
pub use trail::{TrailReady, TrailReconciler, ensure_trail};

/// What reconciliation did to a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    /// The resource did not exist and was created
    Created,
    /// The resource existed and was adopted unchanged
    Reused,
    /// The resource existed and was overwritten with the desired state
    Updated,
}

impl Outcome {
    pub fn is_created(self) -> bool {
        matches!(self, Outcome::Created)
    }
}

/// Result of reconciling one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled<T> {
    pub value: T,
    pub outcome: Outcome,
}

/// One managed resource kind
pub trait Reconcile: Send + Sync {
    /// Kind of the resource, which selects its reuse policy
    const KIND: ResourceKind;

    /// What describe returns for an existing resource
    type Existing: Send;

    /// What reconciliation yields (usually an identifier such as an ARN)
    type Output: Send;

    /// Deterministic name of the resource
    fn name(&self) -> &str;

    /// Look up the resource by name, `None` if absent
    fn describe(&self) -> impl Future<Output = Result<Option<Self::Existing>>> + Send;

    /// Create the resource with its desired configuration
    fn create(&self) -> impl Future<Output = Result<Self::Output>> + Send;

    /// Adopt an existing resource or overwrite it, per the kind's reuse policy
    fn reuse(&self, existing: Self::Existing)
    -> impl Future<Output = Result<Self::Output>> + Send;
}

/// Drive one reconciler through describe, create and reuse
pub async fn reconcile<R: Reconcile>(reconciler: &R) -> Result<Reconciled<R::Output>> {
    let kind = R::KIND;
    let name = reconciler.name();

    if let Some(existing) = reconciler
        .describe()
        .await
        .with_context(|| format!("Failed to describe {kind} {name}"))?
    {
        return reuse(reconciler, existing).await;
    }

    match reconciler.create().await {
        Ok(value) => {
            info!(kind = %kind, name = %name, "Resource created");
            Ok(Reconciled {
                value,
                outcome: Outcome::Created,
            })
        }
        Err(e) if is_conflict(&e) => {
            debug!(kind = %kind, name = %name, "Create raced with another writer, reusing");
            let existing = reconciler
                .describe()
                .await
                .with_context(|| format!("Failed to describe {kind} {name} after conflict"))?
                .ok_or(e)
                .with_context(|| format!("{kind} {name} reported as existing but not found"))?;
            reuse(reconciler, existing).await
        }
        Err(e) => Err(e),
    }
}

async fn reuse<R: Reconcile>(
    reconciler: &R,
    existing: R::Existing,
) -> Result<Reconciled<R::Output>> {
    let kind = R::KIND;
    let outcome = match kind.reuse_policy() {
        ReusePolicy::ReuseAsIs => Outcome::Reused,
        ReusePolicy::Overwrite => Outcome::Updated,
    };

    let value = reconciler.reuse(existing).await?;
    debug!(kind = %kind, name = %reconciler.name(), outcome = %outcome, "Existing resource reconciled");

    Ok(Reconciled { value, outcome })
}
