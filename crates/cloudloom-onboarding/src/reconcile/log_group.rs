//! Trail log group and the account-level log resource policy

use super::{Outcome, Reconcile, reconcile};
use crate::aws::is_conflict;
use crate::aws::operations::LogOperations;
use crate::aws::types::LogGroupDescription;
use anyhow::{Context, Result};
use cloudloom_common::ResourceKind;
use cloudloom_common::names::{LOG_GROUP_POLICY_NAME, log_group_arn, normalize_log_group_arn};
use cloudloom_common::policy::{log_group_resource_policy, to_document};
use tracing::debug;

/// Reconciles the log group; existing groups are reused as-is
pub struct LogGroupReconciler<'a, L> {
    logs: &'a L,
    name: &'a str,
    region: &'a str,
    account_id: &'a str,
}

impl<'a, L: LogOperations> LogGroupReconciler<'a, L> {
    pub fn new(logs: &'a L, name: &'a str, region: &'a str, account_id: &'a str) -> Self {
        Self {
            logs,
            name,
            region,
            account_id,
        }
    }

    fn constructed_arn(&self) -> String {
        log_group_arn(self.region, self.account_id, self.name)
    }
}

impl<L: LogOperations> Reconcile for LogGroupReconciler<'_, L> {
    const KIND: ResourceKind = ResourceKind::LogGroup;
    type Existing = LogGroupDescription;
    type Output = String;

    fn name(&self) -> &str {
        self.name
    }

    async fn describe(&self) -> Result<Option<LogGroupDescription>> {
        self.logs.describe_log_group(self.name).await
    }

    async fn create(&self) -> Result<String> {
        self.logs.create_log_group(self.name).await?;
        Ok(self.constructed_arn())
    }

    async fn reuse(&self, existing: LogGroupDescription) -> Result<String> {
        Ok(existing
            .arn
            .as_deref()
            .map(|arn| normalize_log_group_arn(arn).to_string())
            .unwrap_or_else(|| self.constructed_arn()))
    }
}

/// The log group ARN in both forms it is used in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogGroupReady {
    /// Normalised ARN, without the trailing `:*`
    pub arn: String,
    pub outcome: Outcome,
    /// Updated when the resource policy was written, Reused when already present
    pub policy: Outcome,
}

impl LogGroupReady {
    /// The `:*` form the trail service and resource policies expect
    pub fn delivery_arn(&self) -> String {
        format!("{}:*", self.arn)
    }
}

/// Ensure the log group exists and the trail service may write to it
pub async fn ensure_log_group<L: LogOperations>(
    logs: &L,
    name: &str,
    region: &str,
    account_id: &str,
) -> Result<LogGroupReady> {
    let reconciled = reconcile(&LogGroupReconciler::new(logs, name, region, account_id)).await?;
    let mut ready = LogGroupReady {
        arn: reconciled.value,
        outcome: reconciled.outcome,
        policy: Outcome::Updated,
    };

    let policy = to_document(&log_group_resource_policy(
        &ready.delivery_arn(),
        region,
        account_id,
    ));
    match logs.put_resource_policy(LOG_GROUP_POLICY_NAME, &policy).await {
        Ok(()) => {}
        Err(e) if is_conflict(&e) => {
            debug!(policy_name = LOG_GROUP_POLICY_NAME, "Log resource policy already present");
            ready.policy = Outcome::Reused;
        }
        Err(e) => return Err(e).context("Failed to apply log resource policy"),
    }

    Ok(ready)
}
