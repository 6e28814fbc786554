//! IAM and resource policy documents
//!
//! All documents are rebuilt from scratch on every run. Callers serialize
//! them with [`to_document`] before handing them to a control plane.

use serde_json::{Value, json};

/// Policy language version used by every document
pub const POLICY_VERSION: &str = "2012-10-17";

/// Managed policy attached to the trail delivery role
pub const LOGS_FULL_ACCESS_POLICY_ARN: &str = "arn:aws:iam::aws:policy/CloudWatchLogsFullAccess";

/// Managed policy attached to the compliance recorder role
pub const CONFIG_ROLE_POLICY_ARN: &str = "arn:aws:iam::aws:policy/service-role/AWS_ConfigRole";

/// Service principals that assume onboarding roles
pub const CLOUDTRAIL_PRINCIPAL: &str = "cloudtrail.amazonaws.com";
pub const EVENTS_PRINCIPAL: &str = "events.amazonaws.com";
pub const CONFIG_PRINCIPAL: &str = "config.amazonaws.com";

/// Event sources whose API activity is forwarded to the queue
pub const MONITORED_EVENT_SOURCES: &[&str] = &[
    "aws.s3",
    "aws.ec2",
    "aws.iam",
    "aws.rds",
    "aws.cloudformation",
];

/// Detail type of events emitted by the audit trail
pub const API_CALL_DETAIL_TYPE: &str = "AWS API Call via CloudTrail";

/// Serialize a policy document to the compact form the AWS APIs accept
pub fn to_document(policy: &Value) -> String {
    policy.to_string()
}

/// Trust policy letting a service principal assume a role
pub fn service_trust_policy(service: &str) -> Value {
    json!({
        "Version": POLICY_VERSION,
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Service": service },
            "Action": "sts:AssumeRole"
        }]
    })
}

/// Bucket policy allowing the trail service to check the ACL and write logs
///
/// With `config_key_prefix` set, the compliance recorder is also allowed to
/// check the bucket and deliver snapshots under that prefix.
pub fn bucket_policy(bucket: &str, account_id: &str, config_key_prefix: Option<&str>) -> Value {
    let bucket_arn = format!("arn:aws:s3:::{bucket}");
    let mut statements = vec![
        json!({
            "Sid": "AWSCloudTrailAclCheck20150319",
            "Effect": "Allow",
            "Principal": { "Service": CLOUDTRAIL_PRINCIPAL },
            "Action": "s3:GetBucketAcl",
            "Resource": bucket_arn
        }),
        json!({
            "Sid": "AWSCloudTrailWrite20150319",
            "Effect": "Allow",
            "Principal": { "Service": CLOUDTRAIL_PRINCIPAL },
            "Action": "s3:PutObject",
            "Resource": format!("{bucket_arn}/AWSLogs/{account_id}/*"),
            "Condition": {
                "StringEquals": { "s3:x-amz-acl": "bucket-owner-full-control" }
            }
        }),
    ];

    if let Some(prefix) = config_key_prefix {
        let source_account = json!({ "AWS:SourceAccount": account_id });
        statements.extend([
            json!({
                "Sid": "AWSConfigBucketPermissionsCheck",
                "Effect": "Allow",
                "Principal": { "Service": CONFIG_PRINCIPAL },
                "Action": "s3:GetBucketAcl",
                "Resource": bucket_arn,
                "Condition": { "StringEquals": source_account }
            }),
            json!({
                "Sid": "AWSConfigBucketExistenceCheck",
                "Effect": "Allow",
                "Principal": { "Service": CONFIG_PRINCIPAL },
                "Action": "s3:ListBucket",
                "Resource": bucket_arn,
                "Condition": { "StringEquals": source_account }
            }),
            json!({
                "Sid": "AWSConfigBucketDelivery",
                "Effect": "Allow",
                "Principal": { "Service": CONFIG_PRINCIPAL },
                "Action": "s3:PutObject",
                "Resource": format!("{bucket_arn}/{prefix}/*"),
                "Condition": {
                    "StringEquals": {
                        "s3:x-amz-acl": "bucket-owner-full-control",
                        "AWS:SourceAccount": account_id
                    }
                }
            }),
        ]);
    }

    json!({
        "Version": POLICY_VERSION,
        "Statement": statements
    })
}

/// Account-level log resource policy for trail delivery
///
/// `log_group_arn` is the `:*` form the logs service expects.
pub fn log_group_resource_policy(log_group_arn: &str, region: &str, account_id: &str) -> Value {
    json!({
        "Version": POLICY_VERSION,
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Service": CLOUDTRAIL_PRINCIPAL },
            "Action": "logs:PutLogEvents",
            "Resource": log_group_arn,
            "Condition": {
                "StringEquals": {
                    "aws:SourceArn": format!("arn:aws:cloudtrail:{region}:{account_id}:trail/*")
                }
            }
        }]
    })
}

/// Inline policy letting the event-routing role send to exactly one queue
pub fn events_send_policy(queue_arn: &str) -> Value {
    json!({
        "Version": POLICY_VERSION,
        "Statement": [{
            "Effect": "Allow",
            "Action": "sqs:SendMessage",
            "Resource": queue_arn
        }]
    })
}

/// Queue access policy with one statement per distinct rule ARN
///
/// Statement order follows the first occurrence of each ARN, so the same
/// input always yields the same document.
pub fn queue_access_policy<S: AsRef<str>>(queue_arn: &str, rule_arns: &[S]) -> Value {
    let mut seen: Vec<&str> = Vec::with_capacity(rule_arns.len());
    for arn in rule_arns {
        let arn = arn.as_ref();
        if !seen.contains(&arn) {
            seen.push(arn);
        }
    }

    let statements: Vec<Value> = seen
        .iter()
        .enumerate()
        .map(|(i, rule_arn)| {
            json!({
                "Sid": format!("AllowEventBridgeToSendMessageRule{i}"),
                "Effect": "Allow",
                "Principal": { "Service": EVENTS_PRINCIPAL },
                "Action": "sqs:SendMessage",
                "Resource": queue_arn,
                "Condition": {
                    "ArnEquals": { "aws:SourceArn": rule_arn }
                }
            })
        })
        .collect();

    json!({
        "Version": POLICY_VERSION,
        "Statement": statements
    })
}

/// Event pattern matching API calls from the monitored services
pub fn event_pattern() -> Value {
    json!({
        "source": MONITORED_EVENT_SOURCES,
        "detail-type": [API_CALL_DETAIL_TYPE]
    })
}

/// Source ARNs granted by a queue access policy, in statement order
pub fn granted_source_arns(policy: &Value) -> Vec<String> {
    policy["Statement"]
        .as_array()
        .map(|statements| {
            statements
                .iter()
                .filter_map(|s| s["Condition"]["ArnEquals"]["aws:SourceArn"].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUEUE_ARN: &str = "arn:aws:sqs:ap-south-1:111122223333:cloudloom-autoapplyfix-111122223333";

    #[test]
    fn test_queue_policy_one_statement_per_rule() {
        let rules = [
            "arn:aws:events:ap-south-1:111122223333:rule/r",
            "arn:aws:events:us-east-1:111122223333:rule/r",
        ];
        let policy = queue_access_policy(QUEUE_ARN, &rules);
        let statements = policy["Statement"].as_array().unwrap();

        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0]["Sid"], "AllowEventBridgeToSendMessageRule0");
        assert_eq!(statements[1]["Sid"], "AllowEventBridgeToSendMessageRule1");
        assert_eq!(statements[1]["Resource"], QUEUE_ARN);
        assert_eq!(statements[1]["Principal"]["Service"], EVENTS_PRINCIPAL);
        assert_eq!(granted_source_arns(&policy), rules);
    }

    #[test]
    fn test_queue_policy_dedups_rule_arns() {
        let rule = "arn:aws:events:ap-south-1:111122223333:rule/r";
        let policy = queue_access_policy(QUEUE_ARN, &[rule, rule, rule]);
        assert_eq!(granted_source_arns(&policy), vec![rule.to_string()]);
    }

    #[test]
    fn test_queue_policy_empty_rule_set() {
        let policy = queue_access_policy::<&str>(QUEUE_ARN, &[]);
        assert!(policy["Statement"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_bucket_policy_scopes_writes_to_account_prefix() {
        let policy = bucket_policy("cloudloom-logs-111122223333", "111122223333", None);
        let write = &policy["Statement"][1];
        assert_eq!(
            write["Resource"],
            "arn:aws:s3:::cloudloom-logs-111122223333/AWSLogs/111122223333/*"
        );
        assert_eq!(
            write["Condition"]["StringEquals"]["s3:x-amz-acl"],
            "bucket-owner-full-control"
        );
        assert_eq!(policy["Statement"][0]["Action"], "s3:GetBucketAcl");
    }

    #[test]
    fn test_bucket_policy_trail_only_without_recording() {
        let policy = bucket_policy("cloudloom-logs-111122223333", "111122223333", None);
        let statements = policy["Statement"].as_array().unwrap();
        assert_eq!(statements.len(), 2);
        assert!(
            statements
                .iter()
                .all(|s| s["Principal"]["Service"] == CLOUDTRAIL_PRINCIPAL)
        );
    }

    #[test]
    fn test_bucket_policy_grants_recorder_delivery_under_prefix() {
        let policy = bucket_policy(
            "cloudloom-logs-111122223333",
            "111122223333",
            Some("config/AWSLogs/111122223333/Config"),
        );
        let config: Vec<&Value> = policy["Statement"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|s| s["Principal"]["Service"] == CONFIG_PRINCIPAL)
            .collect();

        let actions: Vec<&str> = config.iter().filter_map(|s| s["Action"].as_str()).collect();
        assert_eq!(actions, ["s3:GetBucketAcl", "s3:ListBucket", "s3:PutObject"]);
        assert_eq!(
            config[2]["Resource"],
            "arn:aws:s3:::cloudloom-logs-111122223333/config/AWSLogs/111122223333/Config/*"
        );
        assert_eq!(
            config[2]["Condition"]["StringEquals"]["AWS:SourceAccount"],
            "111122223333"
        );
    }

    #[test]
    fn test_log_group_policy_conditions_on_trail_arn() {
        let policy = log_group_resource_policy("arn:x:*", "ap-south-1", "111122223333");
        assert_eq!(
            policy["Statement"][0]["Condition"]["StringEquals"]["aws:SourceArn"],
            "arn:aws:cloudtrail:ap-south-1:111122223333:trail/*"
        );
    }

    #[test]
    fn test_event_pattern_shape() {
        let pattern = event_pattern();
        assert_eq!(pattern["source"].as_array().unwrap().len(), 5);
        assert_eq!(pattern["detail-type"][0], API_CALL_DETAIL_TYPE);
    }

    #[test]
    fn test_trust_policy_principal() {
        let trust = service_trust_policy(EVENTS_PRINCIPAL);
        assert_eq!(
            trust["Statement"][0]["Principal"]["Service"],
            "events.amazonaws.com"
        );
        assert!(to_document(&trust).contains("\"Action\":\"sts:AssumeRole\""));
    }
}
