//! Region-bound control planes and the provider that creates them
//!
//! The orchestrator is generic over [`CloudProvider`], so the same
//! sequencing runs against real AWS accounts and the in-memory fake.

use super::account::{AccountId, get_current_account_id};
use super::cloudtrail::CloudTrailClient;
use super::config_service::ConfigServiceClient;
use super::context::AwsContext;
use super::eventbridge::EventBridgeClient;
use super::iam::IamClient;
use super::logs::LogsClient;
use super::operations::{
    EventOperations, IamOperations, LogOperations, QueueOperations, RecorderOperations,
    StorageOperations, TrailOperations,
};
use super::s3::S3Client;
use super::sqs::SqsClient;
use super::sts::{SessionCredentials, StsClient};
use crate::config::TrustConfig;
use crate::error::OnboardingError;
use anyhow::Result;
use std::future::Future;

/// Every control plane onboarding touches, bound to one region and one
/// set of target-account credentials.
pub trait ControlPlane: Send + Sync + Sized + 'static {
    type Storage: StorageOperations;
    type Logs: LogOperations;
    type Iam: IamOperations;
    type Trails: TrailOperations;
    type Queues: QueueOperations + Clone + 'static;
    type Events: EventOperations;
    type Recorder: RecorderOperations;

    /// Region the plane's clients are bound to
    fn region(&self) -> &str;

    /// Account behind the plane's credentials
    fn caller_account(&self) -> impl Future<Output = Result<AccountId>> + Send;

    fn storage(&self) -> &Self::Storage;
    fn logs(&self) -> &Self::Logs;
    fn iam(&self) -> &Self::Iam;
    fn trails(&self) -> &Self::Trails;
    fn queues(&self) -> &Self::Queues;
    fn events(&self) -> &Self::Events;
    fn recorder(&self) -> &Self::Recorder;

    /// The same credentials rebound to another region
    fn in_region(&self, region: &str) -> Self;
}

/// Source of target-account control planes
pub trait CloudProvider: Send + Sync {
    type Plane: ControlPlane;

    /// Exchange the ambient identity for scoped credentials in the target account
    fn assume_role(
        &self,
        trust: &TrustConfig,
        region: &str,
    ) -> impl Future<Output = Result<SessionCredentials, OnboardingError>> + Send;

    /// Bind a control plane to assumed credentials in their region
    fn connect(&self, credentials: &SessionCredentials) -> Self::Plane;
}

/// Provider backed by the AWS SDK and the process's ambient identity
#[derive(Debug, Clone)]
pub struct AwsProvider {
    ambient: AwsContext,
}

impl AwsProvider {
    /// Load the ambient identity from the environment
    pub async fn from_env(region: &str) -> Self {
        Self {
            ambient: AwsContext::new(region).await,
        }
    }

    /// Wrap an already loaded ambient context
    pub fn from_context(ambient: AwsContext) -> Self {
        Self { ambient }
    }
}

impl CloudProvider for AwsProvider {
    type Plane = AwsControlPlane;

    async fn assume_role(
        &self,
        trust: &TrustConfig,
        region: &str,
    ) -> Result<SessionCredentials, OnboardingError> {
        StsClient::from_context(&self.ambient)
            .assume_role(trust, region)
            .await
    }

    fn connect(&self, credentials: &SessionCredentials) -> AwsControlPlane {
        let ctx = self
            .ambient
            .with_credentials(credentials.to_sdk_credentials(), &credentials.region);
        AwsControlPlane::from_context(ctx)
    }
}

/// AWS SDK clients for one region of the target account
pub struct AwsControlPlane {
    ctx: AwsContext,
    s3: S3Client,
    logs: LogsClient,
    iam: IamClient,
    trails: CloudTrailClient,
    queues: SqsClient,
    events: EventBridgeClient,
    recorder: ConfigServiceClient,
}

impl AwsControlPlane {
    /// Create every service client from one context
    pub fn from_context(ctx: AwsContext) -> Self {
        Self {
            s3: S3Client::from_context(&ctx),
            logs: LogsClient::from_context(&ctx),
            iam: IamClient::from_context(&ctx),
            trails: CloudTrailClient::from_context(&ctx),
            queues: SqsClient::from_context(&ctx),
            events: EventBridgeClient::from_context(&ctx),
            recorder: ConfigServiceClient::from_context(&ctx),
            ctx,
        }
    }

    /// The context the clients were built from
    pub fn context(&self) -> &AwsContext {
        &self.ctx
    }
}

impl ControlPlane for AwsControlPlane {
    type Storage = S3Client;
    type Logs = LogsClient;
    type Iam = IamClient;
    type Trails = CloudTrailClient;
    type Queues = SqsClient;
    type Events = EventBridgeClient;
    type Recorder = ConfigServiceClient;

    fn region(&self) -> &str {
        self.ctx.region()
    }

    async fn caller_account(&self) -> Result<AccountId> {
        get_current_account_id(self.ctx.sdk_config()).await
    }

    fn storage(&self) -> &S3Client {
        &self.s3
    }

    fn logs(&self) -> &LogsClient {
        &self.logs
    }

    fn iam(&self) -> &IamClient {
        &self.iam
    }

    fn trails(&self) -> &CloudTrailClient {
        &self.trails
    }

    fn queues(&self) -> &SqsClient {
        &self.queues
    }

    fn events(&self) -> &EventBridgeClient {
        &self.events
    }

    fn recorder(&self) -> &ConfigServiceClient {
        &self.recorder
    }

    fn in_region(&self, region: &str) -> Self {
        Self::from_context(self.ctx.with_region(region))
    }
}
