//! AWS client modules for onboarding
//!
//! This module provides wrappers around AWS SDK clients for:
//! - STS: Trust exchange and account id lookup
//! - S3: Trail log bucket and its policy
//! - CloudWatch Logs: Trail log group and resource policy
//! - IAM: Service roles and their policies
//! - CloudTrail: The audit trail
//! - SQS: The central finding queue
//! - EventBridge: Per-region rules routing API activity to the queue
//! - Config: Optional compliance recording
//!
//! Each wrapper implements the matching trait in [`operations`], and
//! [`provider`] bundles them into a region-bound control plane.

pub mod account;
pub mod cloudtrail;
pub mod config_service;
pub mod context;
pub mod error;
pub mod eventbridge;
pub mod iam;
pub mod logs;
pub mod operations;
pub mod provider;
pub mod s3;
pub mod sqs;
pub mod sts;
pub mod types;

// Core clients
pub use account::{AccountId, get_current_account_id};
pub use context::AwsContext;
pub use provider::{AwsControlPlane, AwsProvider, CloudProvider, ControlPlane};
pub use sts::SessionCredentials;

// Error handling
pub use error::{AwsError, ClassifySdkError, classify_aws_error, find_aws_error, is_conflict};

/// Read a boolean the SDK may model as optional
pub(crate) fn flag(value: impl Into<Option<bool>>) -> bool {
    value.into().unwrap_or(false)
}
