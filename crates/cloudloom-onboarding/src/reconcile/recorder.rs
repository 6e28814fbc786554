//! Optional compliance recording into the trail bucket

use super::role::{RoleSpec, ensure_role};
use super::{Outcome, Reconcile, reconcile};
use crate::aws::operations::{IamOperations, RecorderOperations};
use crate::aws::types::{ManagedRule, RecorderDescription};
use crate::wait::Propagation;
use anyhow::{Context, Result};
use cloudloom_common::names::CONFIG_ROLE_NAME;
use cloudloom_common::policy::{CONFIG_PRINCIPAL, CONFIG_ROLE_POLICY_ARN};
use cloudloom_common::{ResourceKind, ResourceNameSet};
use tracing::{info, warn};

/// Managed checks enabled alongside a new recorder
pub const BASELINE_RULES: &[ManagedRule] = &[
    ManagedRule {
        name: "root-user-access-key-check",
        source_identifier: "IAM_ROOT_ACCESS_KEY_CHECK",
        description: "Checks whether the root access key is available",
    },
    ManagedRule {
        name: "s3-bucket-public-access-prohibited",
        source_identifier: "S3_BUCKET_LEVEL_PUBLIC_ACCESS_PROHIBITED",
        description: "Checks if S3 buckets prohibit public access",
    },
    ManagedRule {
        name: "encrypted-volumes",
        source_identifier: "ENCRYPTED_VOLUMES",
        description: "Checks whether EBS volumes are encrypted",
    },
];

/// Reconciles the recorder; an existing recorder is kept as it is.
///
/// Yields whether the recorder is already recording.
pub struct RecorderReconciler<'a, R> {
    recorder: &'a R,
    name: &'a str,
    role_arn: &'a str,
}

impl<'a, R: RecorderOperations> RecorderReconciler<'a, R> {
    pub fn new(recorder: &'a R, name: &'a str, role_arn: &'a str) -> Self {
        Self {
            recorder,
            name,
            role_arn,
        }
    }
}

impl<R: RecorderOperations> Reconcile for RecorderReconciler<'_, R> {
    const KIND: ResourceKind = ResourceKind::ConfigRecorder;
    type Existing = RecorderDescription;
    type Output = bool;

    fn name(&self) -> &str {
        self.name
    }

    async fn describe(&self) -> Result<Option<RecorderDescription>> {
        let recorders = self.recorder.list_recorders().await?;
        Ok(recorders.into_iter().find(|r| r.name == self.name))
    }

    async fn create(&self) -> Result<bool> {
        self.recorder.put_recorder(self.name, self.role_arn).await?;
        Ok(false)
    }

    async fn reuse(&self, existing: RecorderDescription) -> Result<bool> {
        Ok(existing.recording)
    }
}

/// Creates a managed rule only when no rule of that name exists
pub struct ConfigRuleReconciler<'a, R> {
    recorder: &'a R,
    rule: &'a ManagedRule,
}

impl<'a, R: RecorderOperations> ConfigRuleReconciler<'a, R> {
    pub fn new(recorder: &'a R, rule: &'a ManagedRule) -> Self {
        Self { recorder, rule }
    }
}

impl<R: RecorderOperations> Reconcile for ConfigRuleReconciler<'_, R> {
    const KIND: ResourceKind = ResourceKind::ConfigRule;
    type Existing = ();
    type Output = ();

    fn name(&self) -> &str {
        self.rule.name
    }

    async fn describe(&self) -> Result<Option<()>> {
        Ok(self
            .recorder
            .config_rule_exists(self.rule.name)
            .await?
            .then_some(()))
    }

    async fn create(&self) -> Result<()> {
        self.recorder.put_managed_rule(self.rule).await
    }

    async fn reuse(&self, _existing: ()) -> Result<()> {
        Ok(())
    }
}

/// Result of reconciling one baseline rule; failures carry the error text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineRule {
    pub name: &'static str,
    pub result: Result<Outcome, String>,
}

/// Recording set up and owned by onboarding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedRecording {
    pub role_arn: String,
    pub role_outcome: Outcome,
    pub recorder: Outcome,
    pub channel: Outcome,
    pub started: bool,
    pub rules: Vec<BaselineRule>,
}

/// What compliance recording setup did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComplianceRecording {
    /// The region already has a recorder under another name; nothing was touched
    External { recorder: String },
    Managed(ManagedRecording),
}

/// Ensure the compliance recorder records everything into the trail bucket
///
/// The bucket policy must already grant the recorder delivery under the
/// names' key prefix.
pub async fn ensure_compliance_recording<I, R>(
    iam: &I,
    recorder: &R,
    names: &ResourceNameSet,
    pause: &Propagation,
) -> Result<ComplianceRecording>
where
    I: IamOperations,
    R: RecorderOperations,
{
    let existing = recorder
        .list_recorders()
        .await
        .context("Failed to check for existing configuration recorders")?;
    if let Some(other) = existing.iter().find(|r| r.name != names.config_recorder) {
        info!(
            recorder = %other.name,
            recording = other.recording,
            "Compliance recording already enabled outside onboarding"
        );
        return Ok(ComplianceRecording::External {
            recorder: other.name.clone(),
        });
    }

    let spec = RoleSpec::new(
        CONFIG_ROLE_NAME,
        CONFIG_PRINCIPAL,
        "Role for CloudLoom compliance recording",
    )
    .with_managed_policy(CONFIG_ROLE_POLICY_ARN);
    let role = ensure_role(iam, &spec, pause).await?;

    let recorded = reconcile(&RecorderReconciler::new(
        recorder,
        &names.config_recorder,
        &role.arn,
    ))
    .await?;

    let channel = if recorder
        .delivery_channel_exists(&names.delivery_channel)
        .await
        .context("Failed to look up delivery channel")?
    {
        Outcome::Reused
    } else {
        recorder
            .put_delivery_channel(
                &names.delivery_channel,
                &names.bucket,
                &names.config_key_prefix(),
            )
            .await
            .context("Failed to create delivery channel")?;
        Outcome::Created
    };

    let started = !recorded.value;
    if started {
        recorder
            .start_recorder(&names.config_recorder)
            .await
            .context("Failed to start configuration recorder")?;
        info!(recorder = %names.config_recorder, "Configuration recorder started");
    }

    let rules = ensure_baseline_rules(recorder).await;

    Ok(ComplianceRecording::Managed(ManagedRecording {
        role_arn: role.arn,
        role_outcome: role.outcome,
        recorder: recorded.outcome,
        channel,
        started,
        rules,
    }))
}

/// Create each missing baseline rule; a failing rule does not stop the others
pub async fn ensure_baseline_rules<R: RecorderOperations>(recorder: &R) -> Vec<BaselineRule> {
    let mut results = Vec::with_capacity(BASELINE_RULES.len());
    for rule in BASELINE_RULES {
        let result = match reconcile(&ConfigRuleReconciler::new(recorder, rule)).await {
            Ok(reconciled) => Ok(reconciled.outcome),
            Err(e) => {
                warn!(rule = %rule.name, error = ?e, "Failed to create config rule");
                Err(format!("{e:#}"))
            }
        };
        results.push(BaselineRule {
            name: rule.name,
            result,
        });
    }
    results
}
