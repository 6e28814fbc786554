//! Per-region event rules routing API activity to the queue

use super::{Reconcile, Reconciled, reconcile};
use crate::aws::operations::EventOperations;
use crate::aws::types::RuleDescription;
use anyhow::{Context, Result};
use cloudloom_common::ResourceKind;
use cloudloom_common::names::RULE_TARGET_ID;
use cloudloom_common::policy::{event_pattern, to_document};

const RULE_DESCRIPTION: &str = "CloudLoom Auto Apply Fix rule for AWS API events";

/// Reconciles one regional rule; the pattern is rewritten on every run
pub struct RuleReconciler<'a, E> {
    events: &'a E,
    name: &'a str,
    pattern: String,
}

impl<'a, E: EventOperations> RuleReconciler<'a, E> {
    pub fn new(events: &'a E, name: &'a str) -> Self {
        Self {
            events,
            name,
            pattern: to_document(&event_pattern()),
        }
    }

    async fn put(&self) -> Result<String> {
        self.events
            .put_rule(self.name, &self.pattern, RULE_DESCRIPTION)
            .await
    }
}

impl<E: EventOperations> Reconcile for RuleReconciler<'_, E> {
    const KIND: ResourceKind = ResourceKind::EventRule;
    type Existing = RuleDescription;
    type Output = String;

    fn name(&self) -> &str {
        self.name
    }

    async fn describe(&self) -> Result<Option<RuleDescription>> {
        self.events.describe_rule(self.name).await
    }

    async fn create(&self) -> Result<String> {
        self.put().await
    }

    async fn reuse(&self, _existing: RuleDescription) -> Result<String> {
        self.put().await
    }
}

/// Ensure the rule exists in the events client's region and targets the queue.
///
/// Returns the rule ARN.
pub async fn route_region<E: EventOperations>(
    events: &E,
    rule_name: &str,
    queue_arn: &str,
    events_role_arn: &str,
) -> Result<Reconciled<String>> {
    let reconciled = reconcile(&RuleReconciler::new(events, rule_name)).await?;

    events
        .put_target(rule_name, RULE_TARGET_ID, queue_arn, events_role_arn)
        .await
        .with_context(|| format!("Failed to target queue from rule {rule_name}"))?;

    Ok(reconciled)
}

/// Whether the rule exists and one of its targets is the queue
pub async fn rule_targets_queue<E: EventOperations>(
    events: &E,
    rule_name: &str,
    queue_arn: &str,
) -> Result<bool> {
    if events.describe_rule(rule_name).await?.is_none() {
        return Ok(false);
    }
    let targets = events.list_target_arns(rule_name).await?;
    Ok(targets.iter().any(|arn| arn == queue_arn))
}
