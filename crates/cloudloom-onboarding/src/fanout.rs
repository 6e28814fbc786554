//! Event rule fan-out across the monitored regions
//!
//! Regions are visited one at a time in configuration order. The first
//! failing region stops the fan-out and is named in the returned error;
//! later regions are not attempted.

use crate::aws::ControlPlane;
use crate::error::{OnboardingError, StepContext};
use crate::orchestrator::OnboardingPhase;
use crate::reconcile::{Outcome, route_region};
use tracing::{debug, info};

/// The rule reconciled in one region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRoute {
    pub region: String,
    pub rule_arn: String,
    pub outcome: Outcome,
}

/// Reconcile the event rule in every region, targeting the central queue
pub async fn fan_out_rules<P: ControlPlane>(
    plane: &P,
    regions: &[String],
    rule_name: &str,
    queue_arn: &str,
    events_role_arn: &str,
) -> Result<Vec<RegionRoute>, OnboardingError> {
    let mut routes = Vec::with_capacity(regions.len());

    for region in regions {
        debug!(region = %region, rule = %rule_name, "Routing region to queue");
        let regional = plane.in_region(region);

        let reconciled = route_region(regional.events(), rule_name, queue_arn, events_role_arn)
            .await
            .at_region_step(OnboardingPhase::RulesReady, region)?;

        routes.push(RegionRoute {
            region: region.clone(),
            rule_arn: reconciled.value,
            outcome: reconciled.outcome,
        });
    }

    info!(regions = routes.len(), "Event rules routed to queue");
    Ok(routes)
}

/// Rule ARNs in region order
pub fn rule_arns(routes: &[RegionRoute]) -> Vec<String> {
    routes.iter().map(|r| r.rule_arn.clone()).collect()
}
