//! Background consumer for the central finding queue
//!
//! The consumer runs as a supervised tokio task and outlives the onboarding
//! call that started it. It long-polls the queue, hands each message to a
//! [`FindingHandler`] and deletes the message only after the handler
//! succeeds, so delivery is at-least-once.
//!
//! Cancellation is cooperative: the token is checked before every poll and
//! interrupts both the long-poll and the error backoff, so the task exits
//! within one poll interval and makes no queue calls afterwards.

use crate::aws::operations::QueueOperations;
use crate::aws::types::FindingMessage;
use crate::config::ConsumerConfig;
use crate::error::ConsumerError;
use anyhow::Result;
use cloudloom_common::QueueInfo;
use cloudloom_common::defaults::DRAIN_POLL_WAIT_SECS;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Receives one finding per invocation
///
/// Returning an error leaves the message on the queue for redelivery once
/// its visibility timeout expires.
pub trait FindingHandler: Send + Sync + 'static {
    fn handle(&self, message: &FindingMessage) -> impl Future<Output = Result<()>> + Send;
}

/// Default handler that logs each finding
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingFindingHandler;

impl FindingHandler for LoggingFindingHandler {
    async fn handle(&self, message: &FindingMessage) -> Result<()> {
        info!(
            message_id = %message.message_id,
            bytes = message.body.len(),
            "Finding received"
        );
        debug!(body = %message.body, "Finding body");
        Ok(())
    }
}

/// Running totals published after every iteration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConsumerStats {
    pub polls: u64,
    pub received: u64,
    pub handled: u64,
    pub handler_failures: u64,
    pub deleted: u64,
    pub receive_errors: u64,
    pub delete_errors: u64,
}

/// Exit report of a stopped consumer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsumerReport {
    pub queue_url: String,
    pub stats: ConsumerStats,
}

/// Control over a running consumer task
pub struct ConsumerHandle {
    cancel: CancellationToken,
    stats: watch::Receiver<ConsumerStats>,
    task: JoinHandle<ConsumerReport>,
}

impl ConsumerHandle {
    /// Ask the consumer to stop after its current poll
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Latest published totals
    pub fn stats(&self) -> ConsumerStats {
        *self.stats.borrow()
    }

    /// Receiver notified whenever the totals change
    pub fn subscribe(&self) -> watch::Receiver<ConsumerStats> {
        self.stats.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the task to exit and collect its report
    pub async fn join(self) -> Result<ConsumerReport, ConsumerError> {
        Ok(self.task.await?)
    }

    /// Cancel and wait for the task to exit
    pub async fn shutdown(self) -> Result<ConsumerReport, ConsumerError> {
        self.cancel();
        self.join().await
    }
}

/// Long-polling consumer bound to one finished queue
pub struct EventConsumer<Q, H> {
    queues: Q,
    info: Arc<QueueInfo>,
    handler: H,
    config: ConsumerConfig,
    cancel: CancellationToken,
    stats: ConsumerStats,
    publisher: watch::Sender<ConsumerStats>,
}

impl<Q, H> EventConsumer<Q, H>
where
    Q: QueueOperations + Clone + 'static,
    H: FindingHandler,
{
    /// Start the consumer on the current tokio runtime
    pub fn spawn(
        queues: Q,
        info: Arc<QueueInfo>,
        handler: H,
        config: ConsumerConfig,
        cancel: CancellationToken,
    ) -> ConsumerHandle {
        let (publisher, stats) = watch::channel(ConsumerStats::default());
        let consumer = Self {
            queues,
            info,
            handler,
            config,
            cancel: cancel.clone(),
            stats: ConsumerStats::default(),
            publisher,
        };

        ConsumerHandle {
            cancel,
            stats,
            task: tokio::spawn(consumer.run()),
        }
    }

    async fn run(mut self) -> ConsumerReport {
        info!(
            queue = %self.info.queue_url,
            regions = self.info.region_count(),
            "Finding consumer started"
        );

        if self.config.drain_on_start && !self.cancel.is_cancelled() {
            debug!("Draining messages queued before start");
            self.poll(DRAIN_POLL_WAIT_SECS).await;
        }

        while !self.cancel.is_cancelled() {
            self.poll(self.config.poll_wait_secs).await;
        }

        info!(
            polls = self.stats.polls,
            handled = self.stats.handled,
            deleted = self.stats.deleted,
            "Finding consumer stopped"
        );

        ConsumerReport {
            queue_url: self.info.queue_url.clone(),
            stats: self.stats,
        }
    }

    async fn poll(&mut self, wait_secs: i32) {
        self.stats.polls += 1;

        let received = tokio::select! {
            result = self.queues.receive_messages(
                &self.info.queue_url,
                self.config.max_messages,
                wait_secs,
            ) => Some(result),
            _ = self.cancel.cancelled() => None,
        };

        match received {
            None => {}
            Some(Ok(messages)) => {
                self.stats.received += messages.len() as u64;
                for message in &messages {
                    if self.cancel.is_cancelled() {
                        break;
                    }
                    self.dispatch(message).await;
                }
            }
            Some(Err(e)) => {
                self.stats.receive_errors += 1;
                warn!(
                    error = ?e,
                    backoff_secs = self.config.error_backoff_secs,
                    "Failed to receive findings, backing off"
                );
                self.publisher.send_replace(self.stats);

                tokio::select! {
                    _ = tokio::time::sleep(self.config.error_backoff()) => {}
                    _ = self.cancel.cancelled() => {}
                }
            }
        }

        self.publisher.send_replace(self.stats);
    }

    async fn dispatch(&mut self, message: &FindingMessage) {
        if let Err(e) = self.handler.handle(message).await {
            self.stats.handler_failures += 1;
            warn!(
                message_id = %message.message_id,
                error = ?e,
                "Finding handler failed, leaving message for redelivery"
            );
            return;
        }
        self.stats.handled += 1;

        match self
            .queues
            .delete_message(&self.info.queue_url, &message.receipt_handle)
            .await
        {
            Ok(()) => self.stats.deleted += 1,
            Err(e) => {
                self.stats.delete_errors += 1;
                warn!(
                    message_id = %message.message_id,
                    error = ?e,
                    "Failed to delete handled finding, it will be redelivered"
                );
            }
        }
    }
}
