//! The finished description of the central finding queue

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Central queue plus the rules routing events into it
///
/// Built once per onboarding run and shared read-only with the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueInfo {
    pub account_id: String,
    pub queue_url: String,
    pub queue_arn: String,
    /// One rule ARN per monitored region, in region order
    pub rule_arns: Vec<String>,
    /// Remote creation time of the queue
    pub created_at: DateTime<Utc>,
}

impl QueueInfo {
    /// Number of regions routing into the queue
    pub fn region_count(&self) -> usize {
        self.rule_arns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_serializes_with_rfc3339_timestamp() {
        let info = QueueInfo {
            account_id: "111122223333".to_string(),
            queue_url: "https://sqs.ap-south-1.amazonaws.com/111122223333/q".to_string(),
            queue_arn: "arn:aws:sqs:ap-south-1:111122223333:q".to_string(),
            rule_arns: vec!["arn:aws:events:ap-south-1:111122223333:rule/r".to_string()],
            created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        };

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["created_at"], "2023-11-14T22:13:20Z");
        assert_eq!(json["rule_arns"].as_array().unwrap().len(), 1);
        assert_eq!(info.region_count(), 1);
    }
}
