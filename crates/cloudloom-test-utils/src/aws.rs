//! AWS test utilities
//!
//! Provides region detection, trust role discovery and unique run ID
//! generation for AWS integration tests.

use chrono::Utc;

/// Environment variable naming the cross-account role used by live tests
pub const TEST_ROLE_ARN_VAR: &str = "CLOUDLOOM_TEST_ROLE_ARN";

/// Environment variable holding the external id for [`TEST_ROLE_ARN_VAR`]
pub const TEST_EXTERNAL_ID_VAR: &str = "CLOUDLOOM_TEST_EXTERNAL_ID";

/// Get the AWS region for tests.
///
/// Checks environment variables in order:
/// 1. AWS_REGION
/// 2. AWS_DEFAULT_REGION
/// 3. Falls back to ap-south-1
///
/// # Example
///
/// ```
/// use cloudloom_test_utils::aws::get_test_region;
///
/// let region = get_test_region();
/// assert!(!region.is_empty());
/// ```
pub fn get_test_region() -> String {
    std::env::var("AWS_REGION")
        .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        .unwrap_or_else(|_| "ap-south-1".to_string())
}

/// Role and external id a live test onboards through
#[derive(Debug, Clone)]
pub struct TestTrust {
    pub role_arn: String,
    pub external_id: String,
}

/// Read the live-test trust pair from the environment.
///
/// Returns `None` when either variable is unset or empty, so callers can
/// skip instead of failing on machines without a test account.
pub fn test_trust() -> Option<TestTrust> {
    let role_arn = std::env::var(TEST_ROLE_ARN_VAR).ok().filter(|v| !v.is_empty())?;
    let external_id = std::env::var(TEST_EXTERNAL_ID_VAR)
        .ok()
        .filter(|v| !v.is_empty())?;
    Some(TestTrust {
        role_arn,
        external_id,
    })
}

/// Generate a unique run ID for test resources.
///
/// Format: `test-{timestamp_ms}-{counter}`.
///
/// # Example
///
/// ```
/// use cloudloom_test_utils::aws::test_run_id;
///
/// let run_id = test_run_id();
/// assert!(run_id.starts_with("test-"));
/// ```
pub fn test_run_id() -> String {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let ts = Utc::now().timestamp_millis();
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("test-{}-{}", ts, counter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_format() {
        let run_id = test_run_id();
        // Format: test-{timestamp_ms}-{counter}
        let parts: Vec<&str> = run_id.strip_prefix("test-").unwrap().split('-').collect();
        assert_eq!(parts.len(), 2);
        parts[0].parse::<i64>().expect("Should be valid timestamp");
        parts[1].parse::<u32>().expect("Should be valid counter");
    }

    #[test]
    fn test_run_id_unique() {
        let id1 = test_run_id();
        let id2 = test_run_id();
        assert_ne!(id1, id2);
    }
}
