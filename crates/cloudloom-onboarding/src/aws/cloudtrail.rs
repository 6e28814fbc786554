//! CloudTrail operations for the audit trail

use super::context::AwsContext;
use super::error::{ClassifySdkError, ignore_not_found};
use super::flag;
use super::operations::TrailOperations;
use super::types::{TrailDescription, TrailDesiredState};
use anyhow::{Context, Result};
use aws_sdk_cloudtrail::Client;
use tracing::{debug, info};

/// CloudTrail client
pub struct CloudTrailClient {
    client: Client,
}

impl CloudTrailClient {
    /// Create a CloudTrail client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.cloudtrail_client(),
        }
    }

    /// Find a trail by name
    pub async fn describe_trail(&self, name: &str) -> Result<Option<TrailDescription>> {
        let response = ignore_not_found(
            self.client
                .describe_trails()
                .trail_name_list(name)
                .send()
                .await
                .classified(),
        )
        .with_context(|| format!("Failed to describe trail {name}"))?;

        let Some(response) = response else {
            return Ok(None);
        };

        Ok(response
            .trail_list()
            .iter()
            .find(|t| t.name() == Some(name))
            .map(|t| TrailDescription {
                name: name.to_string(),
                arn: t.trail_arn().map(str::to_string),
                bucket: t.s3_bucket_name().map(str::to_string),
                log_group_arn: t.cloud_watch_logs_log_group_arn().map(str::to_string),
                role_arn: t.cloud_watch_logs_role_arn().map(str::to_string),
                multi_region: flag(t.is_multi_region_trail()),
                include_global_events: flag(t.include_global_service_events()),
            }))
    }

    /// Create a trail, returning its ARN
    pub async fn create_trail(&self, desired: &TrailDesiredState) -> Result<String> {
        info!(trail = %desired.name, bucket = %desired.bucket, "Creating CloudTrail trail");

        let response = self
            .client
            .create_trail()
            .name(&desired.name)
            .s3_bucket_name(&desired.bucket)
            .cloud_watch_logs_log_group_arn(&desired.log_group_arn)
            .cloud_watch_logs_role_arn(&desired.role_arn)
            .is_multi_region_trail(desired.multi_region)
            .include_global_service_events(desired.include_global_events)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to create trail {}", desired.name))?;

        response
            .trail_arn()
            .map(str::to_string)
            .context("No trail ARN returned from CreateTrail")
    }

    /// Overwrite an existing trail's configuration, returning its ARN
    pub async fn update_trail(&self, desired: &TrailDesiredState) -> Result<String> {
        info!(trail = %desired.name, "Updating CloudTrail trail");

        let response = self
            .client
            .update_trail()
            .name(&desired.name)
            .s3_bucket_name(&desired.bucket)
            .cloud_watch_logs_log_group_arn(&desired.log_group_arn)
            .cloud_watch_logs_role_arn(&desired.role_arn)
            .is_multi_region_trail(desired.multi_region)
            .include_global_service_events(desired.include_global_events)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to update trail {}", desired.name))?;

        response
            .trail_arn()
            .map(str::to_string)
            .context("No trail ARN returned from UpdateTrail")
    }

    /// Whether the trail is currently delivering events
    pub async fn is_logging(&self, name: &str) -> Result<bool> {
        let response = self
            .client
            .get_trail_status()
            .name(name)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to get status of trail {name}"))?;

        Ok(flag(response.is_logging()))
    }

    /// Start event delivery
    pub async fn start_logging(&self, name: &str) -> Result<()> {
        self.client
            .start_logging()
            .name(name)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to start logging on trail {name}"))?;

        debug!(trail = %name, "Trail logging started");
        Ok(())
    }
}

impl TrailOperations for CloudTrailClient {
    async fn describe_trail(&self, name: &str) -> Result<Option<TrailDescription>> {
        CloudTrailClient::describe_trail(self, name).await
    }

    async fn create_trail(&self, desired: &TrailDesiredState) -> Result<String> {
        CloudTrailClient::create_trail(self, desired).await
    }

    async fn update_trail(&self, desired: &TrailDesiredState) -> Result<String> {
        CloudTrailClient::update_trail(self, desired).await
    }

    async fn is_logging(&self, name: &str) -> Result<bool> {
        CloudTrailClient::is_logging(self, name).await
    }

    async fn start_logging(&self, name: &str) -> Result<()> {
        CloudTrailClient::start_logging(self, name).await
    }
}
