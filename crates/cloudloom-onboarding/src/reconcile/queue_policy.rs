//! Access policy on the central queue

use crate::aws::operations::QueueOperations;
use anyhow::{Context, Result};
use cloudloom_common::policy::{granted_source_arns, queue_access_policy, to_document};
use tracing::info;

/// Overwrite the queue policy so that exactly the given rules may send.
///
/// Returns the number of statements written, one per distinct rule ARN.
pub async fn apply_queue_policy<Q: QueueOperations>(
    queues: &Q,
    queue_url: &str,
    queue_arn: &str,
    rule_arns: &[String],
) -> Result<usize> {
    let policy = queue_access_policy(queue_arn, rule_arns);
    let statements = granted_source_arns(&policy).len();

    queues
        .set_queue_policy(queue_url, &to_document(&policy))
        .await
        .context("Failed to set queue access policy")?;

    info!(queue = %queue_arn, statements, "Queue access policy applied");
    Ok(statements)
}
