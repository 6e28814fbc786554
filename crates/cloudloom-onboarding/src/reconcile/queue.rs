//! The central finding queue

use super::{Outcome, Reconcile, reconcile};
use crate::aws::operations::QueueOperations;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cloudloom_common::ResourceKind;

/// Reconciles the queue by name; an existing queue is adopted by URL
pub struct QueueReconciler<'a, Q> {
    queues: &'a Q,
    name: &'a str,
}

impl<'a, Q: QueueOperations> QueueReconciler<'a, Q> {
    pub fn new(queues: &'a Q, name: &'a str) -> Self {
        Self { queues, name }
    }
}

impl<Q: QueueOperations> Reconcile for QueueReconciler<'_, Q> {
    const KIND: ResourceKind = ResourceKind::Queue;
    type Existing = String;
    type Output = String;

    fn name(&self) -> &str {
        self.name
    }

    async fn describe(&self) -> Result<Option<String>> {
        self.queues.queue_url(self.name).await
    }

    async fn create(&self) -> Result<String> {
        self.queues.create_queue(self.name).await
    }

    async fn reuse(&self, url: String) -> Result<String> {
        Ok(url)
    }
}

/// Queue identity once it exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueReady {
    pub url: String,
    pub arn: String,
    pub created_at: DateTime<Utc>,
    pub outcome: Outcome,
}

/// Ensure the queue exists and read back its ARN and creation time
pub async fn ensure_queue<Q: QueueOperations>(queues: &Q, name: &str) -> Result<QueueReady> {
    let reconciled = reconcile(&QueueReconciler::new(queues, name)).await?;
    let attributes = queues
        .queue_attributes(&reconciled.value)
        .await
        .with_context(|| format!("Failed to read attributes of queue {name}"))?;

    Ok(QueueReady {
        url: reconciled.value,
        arn: attributes.arn,
        created_at: attributes.created_at,
        outcome: reconciled.outcome,
    })
}
