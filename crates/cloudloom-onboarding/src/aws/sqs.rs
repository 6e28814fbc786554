//! SQS operations for the central finding queue

use super::context::AwsContext;
use super::error::{ClassifySdkError, ignore_not_found};
use super::operations::QueueOperations;
use super::types::{FindingMessage, QueueAttributes};
use anyhow::{Context, Result};
use aws_sdk_sqs::Client;
use aws_sdk_sqs::types::QueueAttributeName;
use chrono::DateTime;
use tracing::{debug, info, warn};

/// SQS client
///
/// Cheap to clone; the background consumer holds its own copy.
#[derive(Clone)]
pub struct SqsClient {
    client: Client,
}

impl SqsClient {
    /// Create an SQS client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.sqs_client(),
        }
    }

    /// URL of the queue, if it exists
    pub async fn queue_url(&self, name: &str) -> Result<Option<String>> {
        let response = ignore_not_found(
            self.client
                .get_queue_url()
                .queue_name(name)
                .send()
                .await
                .classified(),
        )
        .with_context(|| format!("Failed to look up queue {name}"))?;

        Ok(response.and_then(|r| r.queue_url().map(str::to_string)))
    }

    /// Create a queue, returning its URL
    pub async fn create_queue(&self, name: &str) -> Result<String> {
        info!(queue = %name, "Creating SQS queue");

        let response = self
            .client
            .create_queue()
            .queue_name(name)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to create queue {name}"))?;

        response
            .queue_url()
            .map(str::to_string)
            .context("No queue URL returned from CreateQueue")
    }

    /// ARN and creation time of the queue
    pub async fn queue_attributes(&self, queue_url: &str) -> Result<QueueAttributes> {
        let response = self
            .client
            .get_queue_attributes()
            .queue_url(queue_url)
            .attribute_names(QueueAttributeName::QueueArn)
            .attribute_names(QueueAttributeName::CreatedTimestamp)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to read attributes of {queue_url}"))?;

        let attributes = response
            .attributes()
            .context("No attributes returned from GetQueueAttributes")?;

        let arn = attributes
            .get(&QueueAttributeName::QueueArn)
            .cloned()
            .context("Queue ARN missing from attributes")?;

        let created_secs: i64 = attributes
            .get(&QueueAttributeName::CreatedTimestamp)
            .context("Queue creation timestamp missing from attributes")?
            .parse()
            .context("Queue creation timestamp is not a number")?;

        let created_at = DateTime::from_timestamp(created_secs, 0)
            .context("Queue creation timestamp out of range")?;

        Ok(QueueAttributes { arn, created_at })
    }

    /// Replace the queue access policy
    pub async fn set_queue_policy(&self, queue_url: &str, policy: &str) -> Result<()> {
        self.client
            .set_queue_attributes()
            .queue_url(queue_url)
            .attributes(QueueAttributeName::Policy, policy)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to set access policy on {queue_url}"))?;

        debug!(queue_url = %queue_url, "Queue access policy applied");
        Ok(())
    }

    /// Long-poll for messages
    pub async fn receive_messages(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_secs: i32,
    ) -> Result<Vec<FindingMessage>> {
        let response = self
            .client
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_secs)
            .send()
            .await
            .classified()
            .context("Failed to receive messages")?;

        let mut messages = Vec::with_capacity(response.messages().len());
        for message in response.messages() {
            let Some(receipt_handle) = message.receipt_handle() else {
                warn!(message_id = ?message.message_id(), "Message without receipt handle, skipping");
                continue;
            };
            messages.push(FindingMessage {
                message_id: message.message_id().unwrap_or_default().to_string(),
                receipt_handle: receipt_handle.to_string(),
                body: message.body().unwrap_or_default().to_string(),
            });
        }

        Ok(messages)
    }

    /// Delete a received message
    pub async fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .classified()
            .context("Failed to delete message")?;

        Ok(())
    }

    /// Send a message, returning its id
    pub async fn send_message(&self, queue_url: &str, body: &str) -> Result<String> {
        let response = self
            .client
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .send()
            .await
            .classified()
            .with_context(|| format!("Failed to send message to {queue_url}"))?;

        Ok(response.message_id().unwrap_or_default().to_string())
    }
}

impl QueueOperations for SqsClient {
    async fn queue_url(&self, name: &str) -> Result<Option<String>> {
        SqsClient::queue_url(self, name).await
    }

    async fn create_queue(&self, name: &str) -> Result<String> {
        SqsClient::create_queue(self, name).await
    }

    async fn queue_attributes(&self, queue_url: &str) -> Result<QueueAttributes> {
        SqsClient::queue_attributes(self, queue_url).await
    }

    async fn set_queue_policy(&self, queue_url: &str, policy: &str) -> Result<()> {
        SqsClient::set_queue_policy(self, queue_url, policy).await
    }

    async fn receive_messages(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_secs: i32,
    ) -> Result<Vec<FindingMessage>> {
        SqsClient::receive_messages(self, queue_url, max_messages, wait_secs).await
    }

    async fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> Result<()> {
        SqsClient::delete_message(self, queue_url, receipt_handle).await
    }

    async fn send_message(&self, queue_url: &str, body: &str) -> Result<String> {
        SqsClient::send_message(self, queue_url, body).await
    }
}
