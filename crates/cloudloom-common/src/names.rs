//! Deterministic resource names
//!
//! Every name is a pure function of the target account id. Running
//! onboarding twice for the same account therefore looks up the same
//! resources, which is what makes reconciliation idempotent.
//!
//! ## Naming Schema
//!
//! | Resource | Pattern |
//! |----------|---------|
//! | Bucket | `cloudloom-logs-{account}` |
//! | Log group | `/aws/cloudtrail/cloudloom-agent-{account}` |
//! | Trail | `CloudLoom-Agent-Trail-{account}` |
//! | Trail role | `CloudLoom-CloudTrail-Role-{account}` |
//! | Queue | `cloudloom-autoapplyfix-{account}` |
//! | Event rule | `CloudLoom-AutoApplyFix-Rule-{account}` |
//! | Event role | `CloudLoom-Events-Role-{account}` |

use serde::Serialize;
use thiserror::Error;

/// Account-wide log resource policy granting the trail service write access
pub const LOG_GROUP_POLICY_NAME: &str = "CloudLoom-CloudTrail-Access-Policy";

/// Role assumed by the compliance recorder (one per account, not suffixed)
pub const CONFIG_ROLE_NAME: &str = "CloudLoom-Config-ServiceRole";

/// Target id of the queue on every event rule
pub const RULE_TARGET_ID: &str = "CloudLoom-SQS-Target";

/// Errors raised while deriving names
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    /// Account ids are exactly 12 ASCII digits
    #[error("invalid account id '{0}': expected 12 digits")]
    InvalidAccountId(String),

    /// Bucket names must be 3 to 63 characters
    #[error("bucket name length must be between 3 and 63 characters, got {0}")]
    BucketNameLength(usize),
}

/// Names of every resource onboarding manages for one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceNameSet {
    pub account_id: String,
    pub bucket: String,
    pub log_group: String,
    pub trail: String,
    pub trail_role: String,
    pub queue: String,
    pub rule: String,
    pub events_role: String,
    pub events_role_policy: String,
    pub config_recorder: String,
    pub delivery_channel: String,
}

impl ResourceNameSet {
    /// Derive the name set for an account
    pub fn for_account(account_id: &str) -> Result<Self, NameError> {
        validate_account_id(account_id)?;

        let names = Self {
            account_id: account_id.to_string(),
            bucket: format!("cloudloom-logs-{account_id}"),
            log_group: format!("/aws/cloudtrail/cloudloom-agent-{account_id}"),
            trail: format!("CloudLoom-Agent-Trail-{account_id}"),
            trail_role: format!("CloudLoom-CloudTrail-Role-{account_id}"),
            queue: format!("cloudloom-autoapplyfix-{account_id}"),
            rule: format!("CloudLoom-AutoApplyFix-Rule-{account_id}"),
            events_role: format!("CloudLoom-Events-Role-{account_id}"),
            events_role_policy: format!("CloudLoom-EventBridge-SQSPolicy-{account_id}"),
            config_recorder: format!("CloudLoom-Config-Recorder-{account_id}"),
            delivery_channel: format!("CloudLoom-Config-Channel-{account_id}"),
        };

        validate_bucket_name(&names.bucket)?;
        Ok(names)
    }

    /// Key prefix the compliance delivery channel writes under
    pub fn config_key_prefix(&self) -> String {
        format!("config/AWSLogs/{}/Config", self.account_id)
    }
}

/// Check an account id is 12 ASCII digits
pub fn validate_account_id(account_id: &str) -> Result<(), NameError> {
    if account_id.len() == 12 && account_id.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(NameError::InvalidAccountId(account_id.to_string()))
    }
}

/// Check a bucket name fits the 3..=63 length window
pub fn validate_bucket_name(bucket: &str) -> Result<(), NameError> {
    if (3..=63).contains(&bucket.len()) {
        Ok(())
    } else {
        Err(NameError::BucketNameLength(bucket.len()))
    }
}

/// ARN of a log group, without the trailing `:*`
pub fn log_group_arn(region: &str, account_id: &str, log_group: &str) -> String {
    format!("arn:aws:logs:{region}:{account_id}:log-group:{log_group}")
}

/// Strip the `:*` suffix that describe calls append to log group ARNs
pub fn normalize_log_group_arn(arn: &str) -> &str {
    arn.strip_suffix(":*").unwrap_or(arn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_names() {
        let names = ResourceNameSet::for_account("111122223333").unwrap();
        assert_eq!(names.bucket, "cloudloom-logs-111122223333");
        assert_eq!(names.trail, "CloudLoom-Agent-Trail-111122223333");
        assert_eq!(names.queue, "cloudloom-autoapplyfix-111122223333");
        assert_eq!(names.rule, "CloudLoom-AutoApplyFix-Rule-111122223333");
        assert_eq!(
            names.log_group,
            "/aws/cloudtrail/cloudloom-agent-111122223333"
        );
    }

    #[test]
    fn test_names_are_deterministic() {
        let first = ResourceNameSet::for_account("444455556666").unwrap();
        let second = ResourceNameSet::for_account("444455556666").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_distinct_accounts_never_share_names() {
        let a = ResourceNameSet::for_account("111122223333").unwrap();
        let b = ResourceNameSet::for_account("444455556666").unwrap();
        assert_ne!(a.bucket, b.bucket);
        assert_ne!(a.queue, b.queue);
        assert_ne!(a.trail_role, b.trail_role);
    }

    #[test]
    fn test_invalid_account_ids() {
        for bad in ["", "12345", "11112222333a", "1111222233334"] {
            assert_eq!(
                ResourceNameSet::for_account(bad),
                Err(NameError::InvalidAccountId(bad.to_string()))
            );
        }
    }

    #[test]
    fn test_bucket_length_window() {
        assert!(validate_bucket_name("abc").is_ok());
        assert_eq!(
            validate_bucket_name("ab"),
            Err(NameError::BucketNameLength(2))
        );
        assert!(validate_bucket_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_log_group_arn_normalization() {
        let arn = log_group_arn("ap-south-1", "111122223333", "/aws/x");
        assert_eq!(arn, "arn:aws:logs:ap-south-1:111122223333:log-group:/aws/x");
        assert_eq!(normalize_log_group_arn(&format!("{arn}:*")), arn);
        assert_eq!(normalize_log_group_arn(&arn), arn);
    }

    #[test]
    fn test_config_key_prefix() {
        let names = ResourceNameSet::for_account("111122223333").unwrap();
        assert_eq!(
            names.config_key_prefix(),
            "config/AWSLogs/111122223333/Config"
        );
    }
}
