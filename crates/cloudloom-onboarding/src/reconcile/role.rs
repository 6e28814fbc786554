//! Service roles with their trust and permission policies

use super::{Outcome, Reconcile, reconcile};
use crate::aws::operations::IamOperations;
use crate::wait::{Propagation, WaitConfig, wait_for_resource};
use anyhow::{Context, Result};
use cloudloom_common::ResourceKind;
use cloudloom_common::policy::{service_trust_policy, to_document};
use tracing::debug;

/// Desired state of one service role
#[derive(Debug, Clone)]
pub struct RoleSpec {
    pub name: String,
    /// Service principal allowed to assume the role
    pub service: &'static str,
    pub description: String,
    /// Managed policy attached once
    pub managed_policy: Option<&'static str>,
    /// Inline policy `(name, document)` rewritten on every run
    pub inline_policy: Option<(String, String)>,
}

impl RoleSpec {
    pub fn new(
        name: impl Into<String>,
        service: &'static str,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            service,
            description: description.into(),
            managed_policy: None,
            inline_policy: None,
        }
    }

    pub fn with_managed_policy(mut self, policy_arn: &'static str) -> Self {
        self.managed_policy = Some(policy_arn);
        self
    }

    pub fn with_inline_policy(mut self, name: impl Into<String>, document: String) -> Self {
        self.inline_policy = Some((name.into(), document));
        self
    }
}

/// Reconciles the role container; existing roles are adopted by ARN
pub struct RoleReconciler<'a, I> {
    iam: &'a I,
    spec: &'a RoleSpec,
}

impl<'a, I: IamOperations> RoleReconciler<'a, I> {
    pub fn new(iam: &'a I, spec: &'a RoleSpec) -> Self {
        Self { iam, spec }
    }
}

impl<I: IamOperations> Reconcile for RoleReconciler<'_, I> {
    const KIND: ResourceKind = ResourceKind::IamRole;
    type Existing = String;
    type Output = String;

    fn name(&self) -> &str {
        &self.spec.name
    }

    async fn describe(&self) -> Result<Option<String>> {
        self.iam.get_role_arn(&self.spec.name).await
    }

    async fn create(&self) -> Result<String> {
        let trust = to_document(&service_trust_policy(self.spec.service));
        self.iam
            .create_role(&self.spec.name, &trust, &self.spec.description)
            .await
    }

    async fn reuse(&self, arn: String) -> Result<String> {
        Ok(arn)
    }
}

/// A role ready to be handed to a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleReady {
    pub arn: String,
    pub outcome: Outcome,
    /// Whether the managed policy was attached by this run
    pub attached: bool,
}

/// Ensure a role exists with its policies in place.
///
/// A freshly created role is polled until it is visible, and the run pauses
/// for propagation only after a first-time creation or attachment.
pub async fn ensure_role<I: IamOperations>(
    iam: &I,
    spec: &RoleSpec,
    pause: &Propagation,
) -> Result<RoleReady> {
    let reconciled = reconcile(&RoleReconciler::new(iam, spec)).await?;
    let role = spec.name.as_str();

    if reconciled.outcome.is_created() {
        wait_for_resource(
            WaitConfig::default(),
            Some(pause.cancel_token()),
            || async move { Ok::<_, anyhow::Error>(iam.get_role_arn(role).await?.is_some()) },
            role,
        )
        .await?;
    }

    let mut attached = false;
    if let Some(policy_arn) = spec.managed_policy {
        let current = iam
            .attached_policy_arns(role)
            .await
            .with_context(|| format!("Failed to list policies attached to {role}"))?;
        if current.iter().any(|arn| arn == policy_arn) {
            debug!(role = %role, policy = %policy_arn, "Managed policy already attached");
        } else {
            iam.attach_managed_policy(role, policy_arn)
                .await
                .with_context(|| format!("Failed to attach {policy_arn} to {role}"))?;
            attached = true;
        }
    }

    if let Some((policy_name, document)) = &spec.inline_policy {
        iam.put_inline_policy(role, policy_name, document)
            .await
            .with_context(|| format!("Failed to put inline policy {policy_name} on {role}"))?;
    }

    if reconciled.outcome.is_created() || attached {
        pause.wait(role).await?;
    }

    Ok(RoleReady {
        arn: reconciled.value,
        outcome: reconciled.outcome,
        attached,
    })
}
