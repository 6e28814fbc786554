//! Control-plane operation traits
//!
//! One small trait per AWS service, keyed by deterministic resource names.
//! The AWS client wrappers implement them for real accounts and the
//! in-memory fake implements them for orchestration tests.
//!
//! Describe operations return `Ok(None)` for absent resources. Create
//! operations return an error classified as [`AwsError::AlreadyExists`]
//! when they lose a race with another writer.
//!
//! [`AwsError::AlreadyExists`]: super::error::AwsError::AlreadyExists

use super::types::{
    FindingMessage, LogGroupDescription, ManagedRule, QueueAttributes, RecorderDescription,
    RuleDescription, TrailDescription, TrailDesiredState,
};
use anyhow::Result;
use std::future::Future;

/// Object storage operations for the trail log bucket
pub trait StorageOperations: Send + Sync {
    /// Check whether the bucket exists and is reachable
    fn bucket_exists(&self, bucket: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Create a bucket in the given region
    fn create_bucket(&self, bucket: &str, region: &str) -> impl Future<Output = Result<()>> + Send;

    /// Replace the bucket policy
    fn put_bucket_policy(
        &self,
        bucket: &str,
        policy: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Log aggregation operations
pub trait LogOperations: Send + Sync {
    /// Find a log group by exact name
    fn describe_log_group(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<LogGroupDescription>>> + Send;

    /// Create a log group
    fn create_log_group(&self, name: &str) -> impl Future<Output = Result<()>> + Send;

    /// Create or replace an account-level resource policy
    fn put_resource_policy(
        &self,
        policy_name: &str,
        policy: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Identity and policy operations
pub trait IamOperations: Send + Sync {
    /// ARN of the role, if it exists
    fn get_role_arn(&self, role: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Create a role with a trust policy, returning its ARN
    fn create_role(
        &self,
        role: &str,
        trust_policy: &str,
        description: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// ARNs of the managed policies attached to the role
    fn attached_policy_arns(&self, role: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Attach a managed policy to the role
    fn attach_managed_policy(
        &self,
        role: &str,
        policy_arn: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Create or replace an inline policy on the role
    fn put_inline_policy(
        &self,
        role: &str,
        policy_name: &str,
        policy: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Audit trail operations
pub trait TrailOperations: Send + Sync {
    /// Find a trail by name
    fn describe_trail(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<TrailDescription>>> + Send;

    /// Create a trail, returning its ARN
    fn create_trail(&self, desired: &TrailDesiredState)
    -> impl Future<Output = Result<String>> + Send;

    /// Overwrite an existing trail's configuration, returning its ARN
    fn update_trail(&self, desired: &TrailDesiredState)
    -> impl Future<Output = Result<String>> + Send;

    /// Whether the trail is currently delivering events
    fn is_logging(&self, name: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Start event delivery
    fn start_logging(&self, name: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Queue operations for provisioning and consuming findings
pub trait QueueOperations: Send + Sync {
    /// URL of the queue, if it exists
    fn queue_url(&self, name: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Create a queue, returning its URL
    fn create_queue(&self, name: &str) -> impl Future<Output = Result<String>> + Send;

    /// ARN and creation time of the queue
    fn queue_attributes(
        &self,
        queue_url: &str,
    ) -> impl Future<Output = Result<QueueAttributes>> + Send;

    /// Replace the queue access policy
    fn set_queue_policy(
        &self,
        queue_url: &str,
        policy: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Long-poll for up to `max_messages` messages
    fn receive_messages(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_secs: i32,
    ) -> impl Future<Output = Result<Vec<FindingMessage>>> + Send;

    /// Delete a received message by its receipt handle
    fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Send a message, returning its id
    fn send_message(
        &self,
        queue_url: &str,
        body: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Event routing operations
pub trait EventOperations: Send + Sync {
    /// Find a rule by name on the default bus
    fn describe_rule(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<RuleDescription>>> + Send;

    /// Create or overwrite an enabled rule, returning its ARN
    fn put_rule(
        &self,
        name: &str,
        event_pattern: &str,
        description: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Create or overwrite a rule target
    fn put_target(
        &self,
        rule: &str,
        target_id: &str,
        target_arn: &str,
        role_arn: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// ARNs of every target on the rule
    fn list_target_arns(&self, rule: &str) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// Compliance recording operations
pub trait RecorderOperations: Send + Sync {
    /// Every configuration recorder in the region with its recording status
    ///
    /// The service allows one recorder per region, so a recorder under any
    /// other name means compliance recording is managed elsewhere.
    fn list_recorders(&self) -> impl Future<Output = Result<Vec<RecorderDescription>>> + Send;

    /// Create or overwrite a recorder for all supported resource types
    fn put_recorder(&self, name: &str, role_arn: &str) -> impl Future<Output = Result<()>> + Send;

    /// Whether the delivery channel exists
    fn delivery_channel_exists(&self, name: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Create or overwrite a delivery channel into the bucket
    fn put_delivery_channel(
        &self,
        name: &str,
        bucket: &str,
        key_prefix: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Start the recorder
    fn start_recorder(&self, name: &str) -> impl Future<Output = Result<()>> + Send;

    /// Whether a compliance rule with this name exists
    fn config_rule_exists(&self, name: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Create a rule evaluated by an AWS managed check
    fn put_managed_rule(&self, rule: &ManagedRule) -> impl Future<Output = Result<()>> + Send;
}
