//! S3 operations for the trail log bucket

use super::context::AwsContext;
use super::error::{ClassifySdkError, classify_sdk_error};
use super::operations::StorageOperations;
use anyhow::{Context, Result};
use aws_sdk_s3::Client;
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use tracing::{debug, info};

/// Region in which buckets must be created without a location constraint
const DEFAULT_BUCKET_REGION: &str = "us-east-1";

/// S3 client for the trail log bucket
pub struct S3Client {
    client: Client,
}

impl S3Client {
    /// Create an S3 client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.s3_client(),
        }
    }

    /// Check whether a bucket exists and is reachable
    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(HeadBucketError::is_not_found) => Ok(false),
            Err(e) => {
                let err = classify_sdk_error(&e);
                if err.is_not_found() {
                    Ok(false)
                } else {
                    Err(anyhow::Error::new(err)
                        .context(format!("Failed to check bucket {bucket}")))
                }
            }
        }
    }

    /// Create a bucket in the given region
    pub async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()> {
        info!(bucket = %bucket, region = %region, "Creating S3 bucket");

        let mut request = self.client.create_bucket().bucket(bucket);

        // us-east-1 rejects an explicit location constraint
        if region != DEFAULT_BUCKET_REGION {
            let constraint = BucketLocationConstraint::from(region);
            let bucket_config = CreateBucketConfiguration::builder()
                .location_constraint(constraint)
                .build();
            request = request.create_bucket_configuration(bucket_config);
        }

        request
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to create bucket {bucket}"))?;

        debug!(bucket = %bucket, "S3 bucket created");
        Ok(())
    }

    /// Replace the bucket policy
    pub async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<()> {
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to set policy on bucket {bucket}"))?;

        debug!(bucket = %bucket, "Bucket policy applied");
        Ok(())
    }
}

impl StorageOperations for S3Client {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        S3Client::bucket_exists(self, bucket).await
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()> {
        S3Client::create_bucket(self, bucket, region).await
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<()> {
        S3Client::put_bucket_policy(self, bucket, policy).await
    }
}
