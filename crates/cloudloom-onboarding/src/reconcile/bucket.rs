//! Trail log bucket and its policy

use super::{Outcome, Reconcile, reconcile};
use crate::aws::operations::StorageOperations;
use anyhow::{Context, Result};
use cloudloom_common::ResourceKind;
use cloudloom_common::policy::{bucket_policy, to_document};

/// Reconciles the bucket itself; existing buckets are reused as-is
pub struct BucketReconciler<'a, S> {
    storage: &'a S,
    bucket: &'a str,
    region: &'a str,
}

impl<'a, S: StorageOperations> BucketReconciler<'a, S> {
    pub fn new(storage: &'a S, bucket: &'a str, region: &'a str) -> Self {
        Self {
            storage,
            bucket,
            region,
        }
    }
}

impl<S: StorageOperations> Reconcile for BucketReconciler<'_, S> {
    const KIND: ResourceKind = ResourceKind::Bucket;
    type Existing = ();
    type Output = ();

    fn name(&self) -> &str {
        self.bucket
    }

    async fn describe(&self) -> Result<Option<()>> {
        Ok(self.storage.bucket_exists(self.bucket).await?.then_some(()))
    }

    async fn create(&self) -> Result<()> {
        self.storage.create_bucket(self.bucket, self.region).await
    }

    async fn reuse(&self, _existing: ()) -> Result<()> {
        Ok(())
    }
}

/// Ensure the bucket exists and carries the delivery policy
///
/// Pass the compliance key prefix when recording is enabled so the recorder
/// may deliver into the same bucket.
pub async fn ensure_bucket<S: StorageOperations>(
    storage: &S,
    bucket: &str,
    region: &str,
    account_id: &str,
    config_key_prefix: Option<&str>,
) -> Result<Outcome> {
    let reconciled = reconcile(&BucketReconciler::new(storage, bucket, region)).await?;

    let policy = to_document(&bucket_policy(bucket, account_id, config_key_prefix));
    storage
        .put_bucket_policy(bucket, &policy)
        .await
        .context("Failed to apply bucket delivery policy")?;

    Ok(reconciled.outcome)
}
