//! AWS Config operations for optional compliance recording

use super::context::AwsContext;
use super::error::{ClassifySdkError, ignore_not_found};
use super::flag;
use super::operations::RecorderOperations;
use super::types::{ManagedRule, RecorderDescription};
use anyhow::{Context, Result};
use aws_sdk_config::Client;
use aws_sdk_config::types::{
    ConfigRule, ConfigurationRecorder, DeliveryChannel, Owner, RecordingGroup, Source,
};
use tracing::{debug, info};

/// AWS Config client
pub struct ConfigServiceClient {
    client: Client,
}

impl ConfigServiceClient {
    /// Create a Config client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.config_client(),
        }
    }

    /// List every recorder in the region with its recording status
    pub async fn list_recorders(&self) -> Result<Vec<RecorderDescription>> {
        let recorders = self
            .client
            .describe_configuration_recorders()
            .send()
            .await
            .classified()
            .context("Failed to describe configuration recorders")?;

        if recorders.configuration_recorders().is_empty() {
            return Ok(Vec::new());
        }

        let status = self
            .client
            .describe_configuration_recorder_status()
            .send()
            .await
            .classified()
            .context("Failed to get configuration recorder status")?;

        Ok(recorders
            .configuration_recorders()
            .iter()
            .filter_map(|recorder| {
                let name = recorder.name()?;
                let recording = status
                    .configuration_recorders_status()
                    .iter()
                    .any(|s| s.name() == Some(name) && flag(s.recording()));
                Some(RecorderDescription {
                    name: name.to_string(),
                    role_arn: recorder.role_arn().map(str::to_string),
                    recording,
                })
            })
            .collect())
    }

    /// Create or overwrite a recorder for all supported resource types
    pub async fn put_recorder(&self, name: &str, role_arn: &str) -> Result<()> {
        info!(recorder = %name, "Putting configuration recorder");

        let recorder = ConfigurationRecorder::builder()
            .name(name)
            .role_arn(role_arn)
            .recording_group(
                RecordingGroup::builder()
                    .all_supported(true)
                    .include_global_resource_types(true)
                    .build(),
            )
            .build();

        self.client
            .put_configuration_recorder()
            .configuration_recorder(recorder)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to put configuration recorder {name}"))?;

        Ok(())
    }

    /// Whether the delivery channel exists
    pub async fn delivery_channel_exists(&self, name: &str) -> Result<bool> {
        let response = ignore_not_found(
            self.client
                .describe_delivery_channels()
                .delivery_channel_names(name)
                .send()
                .await
                .classified(),
        )
        .with_context(|| format!("Failed to describe delivery channel {name}"))?;

        Ok(response.is_some_and(|r| !r.delivery_channels().is_empty()))
    }

    /// Create or overwrite a delivery channel into the bucket
    pub async fn put_delivery_channel(
        &self,
        name: &str,
        bucket: &str,
        key_prefix: &str,
    ) -> Result<()> {
        info!(channel = %name, bucket = %bucket, "Putting delivery channel");

        let channel = DeliveryChannel::builder()
            .name(name)
            .s3_bucket_name(bucket)
            .s3_key_prefix(key_prefix)
            .build();

        self.client
            .put_delivery_channel()
            .delivery_channel(channel)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to put delivery channel {name}"))?;

        Ok(())
    }

    /// Start the recorder
    pub async fn start_recorder(&self, name: &str) -> Result<()> {
        self.client
            .start_configuration_recorder()
            .configuration_recorder_name(name)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to start configuration recorder {name}"))?;

        debug!(recorder = %name, "Configuration recorder started");
        Ok(())
    }

    /// Whether a compliance rule with this name exists
    pub async fn config_rule_exists(&self, name: &str) -> Result<bool> {
        let response = ignore_not_found(
            self.client
                .describe_config_rules()
                .config_rule_names(name)
                .send()
                .await
                .classified(),
        )
        .with_context(|| format!("Failed to describe config rule {name}"))?;

        Ok(response.is_some_and(|r| !r.config_rules().is_empty()))
    }

    /// Create a rule evaluated by an AWS managed check
    pub async fn put_managed_rule(&self, rule: &ManagedRule) -> Result<()> {
        let source = Source::builder()
            .owner(Owner::Aws)
            .source_identifier(rule.source_identifier)
            .build()
            .with_context(|| format!("Invalid source for config rule {}", rule.name))?;

        let config_rule = ConfigRule::builder()
            .config_rule_name(rule.name)
            .description(rule.description)
            .source(source)
            .build();

        self.client
            .put_config_rule()
            .config_rule(config_rule)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to put config rule {}", rule.name))?;

        info!(rule = %rule.name, "Config rule created");
        Ok(())
    }
}

impl RecorderOperations for ConfigServiceClient {
    async fn list_recorders(&self) -> Result<Vec<RecorderDescription>> {
        ConfigServiceClient::list_recorders(self).await
    }

    async fn put_recorder(&self, name: &str, role_arn: &str) -> Result<()> {
        ConfigServiceClient::put_recorder(self, name, role_arn).await
    }

    async fn delivery_channel_exists(&self, name: &str) -> Result<bool> {
        ConfigServiceClient::delivery_channel_exists(self, name).await
    }

    async fn put_delivery_channel(&self, name: &str, bucket: &str, key_prefix: &str) -> Result<()> {
        ConfigServiceClient::put_delivery_channel(self, name, bucket, key_prefix).await
    }

    async fn start_recorder(&self, name: &str) -> Result<()> {
        ConfigServiceClient::start_recorder(self, name).await
    }

    async fn config_rule_exists(&self, name: &str) -> Result<bool> {
        ConfigServiceClient::config_rule_exists(self, name).await
    }

    async fn put_managed_rule(&self, rule: &ManagedRule) -> Result<()> {
        ConfigServiceClient::put_managed_rule(self, rule).await
    }
}
