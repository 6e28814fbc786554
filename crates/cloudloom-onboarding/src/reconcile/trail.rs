//! The multi-region audit trail

use super::{Outcome, Reconcile, reconcile};
use crate::aws::operations::TrailOperations;
use crate::aws::types::{TrailDescription, TrailDesiredState};
use anyhow::{Context, Result};
use cloudloom_common::ResourceKind;
use tracing::{debug, info};

/// Reconciles the trail; an existing trail is overwritten with the desired
/// delivery settings
pub struct TrailReconciler<'a, T> {
    trails: &'a T,
    desired: &'a TrailDesiredState,
}

impl<'a, T: TrailOperations> TrailReconciler<'a, T> {
    pub fn new(trails: &'a T, desired: &'a TrailDesiredState) -> Self {
        Self { trails, desired }
    }
}

impl<T: TrailOperations> Reconcile for TrailReconciler<'_, T> {
    const KIND: ResourceKind = ResourceKind::Trail;
    type Existing = TrailDescription;
    type Output = String;

    fn name(&self) -> &str {
        &self.desired.name
    }

    async fn describe(&self) -> Result<Option<TrailDescription>> {
        self.trails.describe_trail(&self.desired.name).await
    }

    async fn create(&self) -> Result<String> {
        self.trails.create_trail(self.desired).await
    }

    async fn reuse(&self, existing: TrailDescription) -> Result<String> {
        debug!(
            trail = %existing.name,
            drifted = !existing.matches(self.desired),
            "Overwriting trail configuration"
        );
        self.trails.update_trail(self.desired).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailReady {
    pub arn: String,
    pub outcome: Outcome,
    /// Whether this run turned logging on
    pub started_logging: bool,
}

/// Ensure the trail exists with the desired settings and is logging
pub async fn ensure_trail<T: TrailOperations>(
    trails: &T,
    desired: &TrailDesiredState,
) -> Result<TrailReady> {
    let reconciled = reconcile(&TrailReconciler::new(trails, desired)).await?;

    let logging = trails
        .is_logging(&desired.name)
        .await
        .with_context(|| format!("Failed to read logging status of {}", desired.name))?;
    if !logging {
        trails
            .start_logging(&desired.name)
            .await
            .with_context(|| format!("Failed to start logging on {}", desired.name))?;
        info!(trail = %desired.name, "Trail logging started");
    }

    Ok(TrailReady {
        arn: reconciled.value,
        outcome: reconciled.outcome,
        started_logging: !logging,
    })
}
