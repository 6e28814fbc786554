//! EventBridge operations for the per-region routing rules

use super::context::AwsContext;
use super::error::{ClassifySdkError, ignore_not_found};
use super::operations::EventOperations;
use super::types::RuleDescription;
use anyhow::{Context, Result};
use aws_sdk_eventbridge::Client;
use aws_sdk_eventbridge::types::{RuleState, Target};
use tracing::{debug, info};

/// EventBridge client bound to one region
pub struct EventBridgeClient {
    client: Client,
}

impl EventBridgeClient {
    /// Create an EventBridge client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.eventbridge_client(),
        }
    }

    /// Find a rule by name on the default bus
    pub async fn describe_rule(&self, name: &str) -> Result<Option<RuleDescription>> {
        let response = ignore_not_found(
            self.client
                .describe_rule()
                .name(name)
                .send()
                .await
                .classified(),
        )
        .with_context(|| format!("Failed to describe rule {name}"))?;

        let Some(response) = response else {
            return Ok(None);
        };

        let arn = response
            .arn()
            .map(str::to_string)
            .context("No ARN returned from DescribeRule")?;

        Ok(Some(RuleDescription {
            name: name.to_string(),
            arn,
            enabled: response.state() == Some(&RuleState::Enabled),
            event_pattern: response.event_pattern().map(str::to_string),
        }))
    }

    /// Create or overwrite an enabled rule, returning its ARN
    pub async fn put_rule(
        &self,
        name: &str,
        event_pattern: &str,
        description: &str,
    ) -> Result<String> {
        info!(rule = %name, "Putting EventBridge rule");

        let response = self
            .client
            .put_rule()
            .name(name)
            .event_pattern(event_pattern)
            .state(RuleState::Enabled)
            .description(description)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to put rule {name}"))?;

        response
            .rule_arn()
            .map(str::to_string)
            .context("No rule ARN returned from PutRule")
    }

    /// Create or overwrite a rule target
    pub async fn put_target(
        &self,
        rule: &str,
        target_id: &str,
        target_arn: &str,
        role_arn: &str,
    ) -> Result<()> {
        let target = Target::builder()
            .id(target_id)
            .arn(target_arn)
            .role_arn(role_arn)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build EventBridge target: {}", e))?;

        let response = self
            .client
            .put_targets()
            .rule(rule)
            .targets(target)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to put target on rule {rule}"))?;

        if let Some(failed) = response.failed_entries().first() {
            anyhow::bail!(
                "EventBridge rejected target {} on rule {}: {} ({})",
                target_id,
                rule,
                failed.error_message().unwrap_or("no message"),
                failed.error_code().unwrap_or("no code"),
            );
        }

        debug!(rule = %rule, target_id = %target_id, "Rule target applied");
        Ok(())
    }

    /// ARNs of every target on the rule
    pub async fn list_target_arns(&self, rule: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .list_targets_by_rule()
            .rule(rule)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to list targets of rule {rule}"))?;

        Ok(response
            .targets()
            .iter()
            .map(|t| t.arn().to_string())
            .collect())
    }
}

impl EventOperations for EventBridgeClient {
    async fn describe_rule(&self, name: &str) -> Result<Option<RuleDescription>> {
        EventBridgeClient::describe_rule(self, name).await
    }

    async fn put_rule(&self, name: &str, event_pattern: &str, description: &str) -> Result<String> {
        EventBridgeClient::put_rule(self, name, event_pattern, description).await
    }

    async fn put_target(
        &self,
        rule: &str,
        target_id: &str,
        target_arn: &str,
        role_arn: &str,
    ) -> Result<()> {
        EventBridgeClient::put_target(self, rule, target_id, target_arn, role_arn).await
    }

    async fn list_target_arns(&self, rule: &str) -> Result<Vec<String>> {
        EventBridgeClient::list_target_arns(self, rule).await
    }
}
