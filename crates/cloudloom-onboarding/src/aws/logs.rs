//! CloudWatch Logs operations for the trail log group

use super::context::AwsContext;
use super::error::ClassifySdkError;
use super::operations::LogOperations;
use super::types::LogGroupDescription;
use anyhow::{Context, Result};
use aws_sdk_cloudwatchlogs::Client;
use tracing::{debug, info};

/// CloudWatch Logs client
pub struct LogsClient {
    client: Client,
}

impl LogsClient {
    /// Create a logs client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.logs_client(),
        }
    }

    /// Find a log group by exact name.
    ///
    /// The service only supports prefix lookups, so every page is scanned
    /// for an exact match.
    pub async fn describe_log_group(&self, name: &str) -> Result<Option<LogGroupDescription>> {
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_log_groups()
                .log_group_name_prefix(name)
                .set_next_token(next_token.take())
                .send()
                .await
                .classified()
                .with_context(|| format!("Failed to describe log group {name}"))?;

            if let Some(group) = response
                .log_groups()
                .iter()
                .find(|g| g.log_group_name() == Some(name))
            {
                return Ok(Some(LogGroupDescription {
                    name: name.to_string(),
                    arn: group.arn().map(str::to_string),
                }));
            }

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => return Ok(None),
            }
        }
    }

    /// Create a log group
    pub async fn create_log_group(&self, name: &str) -> Result<()> {
        info!(log_group = %name, "Creating log group");

        self.client
            .create_log_group()
            .log_group_name(name)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to create log group {name}"))?;

        Ok(())
    }

    /// Create or replace an account-level resource policy
    pub async fn put_resource_policy(&self, policy_name: &str, policy: &str) -> Result<()> {
        self.client
            .put_resource_policy()
            .policy_name(policy_name)
            .policy_document(policy)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to put log resource policy {policy_name}"))?;

        debug!(policy_name = %policy_name, "Log resource policy applied");
        Ok(())
    }
}

impl LogOperations for LogsClient {
    async fn describe_log_group(&self, name: &str) -> Result<Option<LogGroupDescription>> {
        LogsClient::describe_log_group(self, name).await
    }

    async fn create_log_group(&self, name: &str) -> Result<()> {
        LogsClient::create_log_group(self, name).await
    }

    async fn put_resource_policy(&self, policy_name: &str, policy: &str) -> Result<()> {
        LogsClient::put_resource_policy(self, policy_name, policy).await
    }
}
