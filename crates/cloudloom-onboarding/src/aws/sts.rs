//! Trust exchange through STS AssumeRole

use super::context::AwsContext;
use super::error::{AwsError, ClassifySdkError};
use crate::config::TrustConfig;
use crate::error::OnboardingError;
use crate::orchestrator::OnboardingPhase;
use aws_credential_types::Credentials;
use chrono::{DateTime, Utc};
use std::time::SystemTime;
use tracing::{debug, info};

/// Provider name recorded on credentials built from an assumed role
const ASSUMED_PROVIDER_NAME: &str = "cloudloom-assumed-role";

/// Error codes with which STS refuses the role and external id pair
const TRUST_REJECTION_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "InvalidClientTokenId",
    "ExpiredToken",
    "ExpiredTokenException",
    "RegionDisabledException",
    "UnrecognizedClientException",
    "SignatureDoesNotMatch",
];

/// Short-lived credentials scoped to the target account
///
/// Never persisted. Secrets are redacted from `Debug` output.
#[derive(Clone)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    /// Region the credentials are bound to for client configuration
    pub region: String,
    pub expiry: Option<DateTime<Utc>>,
}

impl SessionCredentials {
    /// Build SDK credentials for an [`AwsContext`]
    pub fn to_sdk_credentials(&self) -> Credentials {
        Credentials::new(
            &self.access_key_id,
            &self.secret_access_key,
            Some(self.session_token.clone()),
            self.expiry.map(SystemTime::from),
            ASSUMED_PROVIDER_NAME,
        )
    }
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .field("region", &self.region)
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// STS client performing the cross-account trust exchange
pub struct StsClient {
    client: aws_sdk_sts::Client,
}

impl StsClient {
    /// Create an STS client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.sts_client(),
        }
    }

    /// Exchange the ambient identity for credentials in the target account
    pub async fn assume_role(
        &self,
        trust: &TrustConfig,
        region: &str,
    ) -> Result<SessionCredentials, OnboardingError> {
        debug!(role_arn = %trust.role_arn, session = %trust.session_name, "Assuming role");

        let response = self
            .client
            .assume_role()
            .role_arn(&trust.role_arn)
            .role_session_name(&trust.session_name)
            .external_id(&trust.external_id)
            .duration_seconds(trust.session_duration_secs)
            .send()
            .await
            .classified()
            .map_err(|e| trust_failure(&trust.role_arn, e))?;

        let session = session_credentials(response.credentials(), &trust.role_arn, region)?;

        info!(
            role_arn = %trust.role_arn,
            expiry = ?session.expiry,
            "Assumed cross-account role"
        );

        Ok(session)
    }
}

/// Map a failed AssumeRole call to an onboarding error
///
/// Only refusals of the trust relationship are authentication failures.
/// Transport errors, throttling and service faults fail the role step.
pub fn trust_failure(role_arn: &str, error: AwsError) -> OnboardingError {
    if error.code().is_some_and(|c| TRUST_REJECTION_CODES.contains(&c)) {
        OnboardingError::Authentication {
            role_arn: role_arn.to_string(),
            source: error.into(),
        }
    } else {
        OnboardingError::Reconciliation {
            step: OnboardingPhase::RoleAssumed,
            region: None,
            source: anyhow::Error::new(error)
                .context(format!("Failed to assume role {role_arn}")),
        }
    }
}

/// Turn the credentials of an AssumeRole response into session credentials
///
/// A response without credentials, or with an empty key, is rejected.
pub fn session_credentials(
    credentials: Option<&aws_sdk_sts::types::Credentials>,
    role_arn: &str,
    region: &str,
) -> Result<SessionCredentials, OnboardingError> {
    let credentials = credentials
        .filter(|c| !c.access_key_id().is_empty() && !c.secret_access_key().is_empty())
        .ok_or_else(|| OnboardingError::CredentialsMissing {
            role_arn: role_arn.to_string(),
        })?;

    let expiration = credentials.expiration();
    Ok(SessionCredentials {
        access_key_id: credentials.access_key_id().to_string(),
        secret_access_key: credentials.secret_access_key().to_string(),
        session_token: credentials.session_token().to_string(),
        region: region.to_string(),
        expiry: DateTime::from_timestamp(expiration.secs(), expiration.subsec_nanos()),
    })
}
