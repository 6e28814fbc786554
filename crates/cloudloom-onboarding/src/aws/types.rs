//! Types exchanged with the control-plane operation traits

use chrono::{DateTime, Utc};

/// Desired configuration of the audit trail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailDesiredState {
    pub name: String,
    pub bucket: String,
    /// Log group ARN in the `:*` form the trail service expects
    pub log_group_arn: String,
    pub role_arn: String,
    pub multi_region: bool,
    pub include_global_events: bool,
}

impl TrailDesiredState {
    /// Trail delivering to the given bucket and log group from every region
    pub fn new(
        name: impl Into<String>,
        bucket: impl Into<String>,
        log_group_arn: impl Into<String>,
        role_arn: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            bucket: bucket.into(),
            log_group_arn: log_group_arn.into(),
            role_arn: role_arn.into(),
            multi_region: true,
            include_global_events: true,
        }
    }
}

/// A trail as the trail service reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailDescription {
    pub name: String,
    pub arn: Option<String>,
    pub bucket: Option<String>,
    pub log_group_arn: Option<String>,
    pub role_arn: Option<String>,
    pub multi_region: bool,
    pub include_global_events: bool,
}

impl TrailDescription {
    /// Whether the remote trail already matches the desired state
    pub fn matches(&self, desired: &TrailDesiredState) -> bool {
        self.bucket.as_deref() == Some(desired.bucket.as_str())
            && self.log_group_arn.as_deref() == Some(desired.log_group_arn.as_str())
            && self.role_arn.as_deref() == Some(desired.role_arn.as_str())
            && self.multi_region == desired.multi_region
            && self.include_global_events == desired.include_global_events
    }
}

/// A log group found by exact name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogGroupDescription {
    pub name: String,
    /// ARN as reported, possibly with a trailing `:*`
    pub arn: Option<String>,
}

/// Attributes of a queue the reconciler needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueAttributes {
    pub arn: String,
    pub created_at: DateTime<Utc>,
}

/// An event rule as the event service reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDescription {
    pub name: String,
    pub arn: String,
    pub enabled: bool,
    pub event_pattern: Option<String>,
}

/// A compliance configuration recorder and whether it is recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderDescription {
    pub name: String,
    pub role_arn: Option<String>,
    pub recording: bool,
}

/// A compliance rule backed by an AWS managed check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagedRule {
    pub name: &'static str,
    /// Identifier of the managed check, e.g. `ENCRYPTED_VOLUMES`
    pub source_identifier: &'static str,
    pub description: &'static str,
}

/// One message received from the finding queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindingMessage {
    pub message_id: String,
    pub receipt_handle: String,
    pub body: String,
}
