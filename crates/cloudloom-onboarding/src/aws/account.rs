//! AWS account identity

use anyhow::{Context, Result};
use cloudloom_common::names::{NameError, validate_account_id};
use tracing::info;

/// Strongly-typed AWS account ID (12-digit string)
///
/// This newtype prevents accidentally mixing account IDs with other strings
/// and ensures account validation happens at specific points in the code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::Deref)]
pub struct AccountId(String);

impl AccountId {
    /// Validate and wrap an account id
    pub fn parse(s: impl Into<String>) -> Result<Self, NameError> {
        let s = s.into();
        validate_account_id(&s)?;
        Ok(AccountId(s))
    }
}

/// Fetch the AWS account ID behind the config's credentials via STS GetCallerIdentity
///
/// This operation requires no special permissions - it always succeeds if
/// credentials are valid. With assumed credentials it resolves the target
/// account rather than the platform's own.
pub async fn get_current_account_id(config: &aws_config::SdkConfig) -> Result<AccountId> {
    let sts = aws_sdk_sts::Client::new(config);
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .context("Failed to get AWS caller identity - check credentials")?;

    let account = identity
        .account()
        .context("No account ID returned from STS GetCallerIdentity")?;

    let account_id = AccountId::parse(account).context("STS returned a malformed account ID")?;
    info!(account_id = %account_id, "AWS account validated");

    Ok(account_id)
}
