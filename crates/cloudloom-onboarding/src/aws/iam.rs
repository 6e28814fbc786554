//! IAM role and policy management for onboarding service roles

use super::context::AwsContext;
use super::error::{ClassifySdkError, ignore_not_found};
use super::operations::IamOperations;
use anyhow::{Context, Result};
use aws_sdk_iam::Client;
use tracing::{debug, info};

/// IAM client for managing service roles
pub struct IamClient {
    client: Client,
}

impl IamClient {
    /// Create an IAM client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.iam_client(),
        }
    }

    /// ARN of the role, if it exists
    pub async fn get_role_arn(&self, role: &str) -> Result<Option<String>> {
        let response = ignore_not_found(
            self.client
                .get_role()
                .role_name(role)
                .send()
                .await
                .classified(),
        )
        .with_context(|| format!("Failed to get role {role}"))?;

        Ok(response.and_then(|r| r.role().map(|role| role.arn().to_string())))
    }

    /// Create a role with a trust policy, returning its ARN
    pub async fn create_role(
        &self,
        role: &str,
        trust_policy: &str,
        description: &str,
    ) -> Result<String> {
        info!(role_name = %role, "Creating IAM role");

        let response = self
            .client
            .create_role()
            .role_name(role)
            .assume_role_policy_document(trust_policy)
            .description(description)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to create role {role}"))?;

        let arn = response
            .role()
            .map(|r| r.arn().to_string())
            .context("No role returned from CreateRole")?;

        debug!(role_name = %role, arn = %arn, "IAM role created");
        Ok(arn)
    }

    /// ARNs of the managed policies attached to the role
    pub async fn attached_policy_arns(&self, role: &str) -> Result<Vec<String>> {
        let mut arns = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let response = self
                .client
                .list_attached_role_policies()
                .role_name(role)
                .set_marker(marker.take())
                .send()
                .await
                .classified()
                .with_context(|| format!("Failed to list policies attached to {role}"))?;

            arns.extend(
                response
                    .attached_policies()
                    .iter()
                    .filter_map(|p| p.policy_arn().map(str::to_string)),
            );

            match response.marker() {
                Some(next) if super::flag(response.is_truncated()) => marker = Some(next.to_string()),
                _ => return Ok(arns),
            }
        }
    }

    /// Attach a managed policy to the role
    pub async fn attach_managed_policy(&self, role: &str, policy_arn: &str) -> Result<()> {
        info!(role_name = %role, policy_arn = %policy_arn, "Attaching managed policy");

        self.client
            .attach_role_policy()
            .role_name(role)
            .policy_arn(policy_arn)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to attach {policy_arn} to {role}"))?;

        Ok(())
    }

    /// Create or replace an inline policy on the role
    pub async fn put_inline_policy(
        &self,
        role: &str,
        policy_name: &str,
        policy: &str,
    ) -> Result<()> {
        self.client
            .put_role_policy()
            .role_name(role)
            .policy_name(policy_name)
            .policy_document(policy)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to put inline policy {policy_name} on {role}"))?;

        debug!(role_name = %role, policy_name = %policy_name, "Inline policy applied");
        Ok(())
    }
}

impl IamOperations for IamClient {
    async fn get_role_arn(&self, role: &str) -> Result<Option<String>> {
        IamClient::get_role_arn(self, role).await
    }

    async fn create_role(&self, role: &str, trust_policy: &str, description: &str) -> Result<String> {
        IamClient::create_role(self, role, trust_policy, description).await
    }

    async fn attached_policy_arns(&self, role: &str) -> Result<Vec<String>> {
        IamClient::attached_policy_arns(self, role).await
    }

    async fn attach_managed_policy(&self, role: &str, policy_arn: &str) -> Result<()> {
        IamClient::attach_managed_policy(self, role, policy_arn).await
    }

    async fn put_inline_policy(&self, role: &str, policy_name: &str, policy: &str) -> Result<()> {
        IamClient::put_inline_policy(self, role, policy_name, policy).await
    }
}
