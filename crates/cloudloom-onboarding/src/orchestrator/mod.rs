//! Onboarding orchestration
//!
//! [`Onboarding`] sequences every reconciliation step in dependency order
//! against a target account:
//!
//! `Init -> RoleAssumed -> Identified -> BucketReady -> LogGroupReady ->
//! TrailRoleReady -> TrailReady -> [ComplianceRecording] -> QueueReady ->
//! EventRoleReady -> RulesReady -> PolicyApplied -> [WiringVerified] ->
//! ConsumerStarted -> Done`
//!
//! Required steps abort the run with an error naming the step. Optional
//! steps (bracketed) are reported as warnings and skipped. Nothing is rolled
//! back; re-running converges because every name is deterministic.

pub mod progress;
pub mod types;

// Re-export core types
pub use progress::{LogReporter, ProgressReporter};
pub use types::{OnboardingPhase, StepReport};

use crate::aws::operations::QueueOperations;
use crate::aws::types::TrailDesiredState;
use crate::aws::{CloudProvider, ControlPlane};
use crate::config::OnboardingConfig;
use crate::consumer::{ConsumerHandle, EventConsumer, FindingHandler};
use crate::error::{OnboardingError, StepContext};
use crate::fanout::{fan_out_rules, rule_arns};
use crate::reconcile::{
    ComplianceRecording, Outcome, RoleSpec, apply_queue_policy, ensure_bucket,
    ensure_compliance_recording, ensure_log_group, ensure_queue, ensure_role, ensure_trail,
    rule_targets_queue,
};
use crate::wait::Propagation;
use anyhow::Context;
use chrono::Utc;
use cloudloom_common::names::{CONFIG_ROLE_NAME, LOG_GROUP_POLICY_NAME};
use cloudloom_common::policy::{
    API_CALL_DETAIL_TYPE, CLOUDTRAIL_PRINCIPAL, EVENTS_PRINCIPAL, LOGS_FULL_ACCESS_POLICY_ARN,
    events_send_policy, to_document,
};
use cloudloom_common::{QueueInfo, ResourceKind, ResourceNameSet};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Event source of synthetic test messages
pub const TEST_EVENT_SOURCE: &str = "cloudloom.test";

/// Everything a finished provisioning pass produced
#[derive(Debug, Clone)]
pub struct OnboardingSummary {
    pub queue_info: Arc<QueueInfo>,
    pub names: ResourceNameSet,
    pub steps: Vec<StepReport>,
    pub warnings: Vec<String>,
    pub propagation_waits: u32,
}

impl OnboardingSummary {
    /// Number of resources this run created
    pub fn created(&self) -> usize {
        self.steps.iter().filter(|s| s.outcome.is_created()).count()
    }
}

/// A provisioned account and the home-region plane that provisioned it
pub struct Provisioned<P> {
    pub plane: P,
    pub summary: OnboardingSummary,
}

/// A provisioned account with its consumer running
pub struct OnboardingOutcome {
    pub summary: OnboardingSummary,
    pub consumer: ConsumerHandle,
}

/// Collects step reports and warnings while forwarding them to a reporter
struct Journal<'r, R> {
    reporter: &'r R,
    steps: Vec<StepReport>,
    warnings: Vec<String>,
}

impl<'r, R: ProgressReporter> Journal<'r, R> {
    fn new(reporter: &'r R) -> Self {
        Self {
            reporter,
            steps: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn step(&mut self, report: StepReport) {
        self.reporter.report_step(&report);
        self.steps.push(report);
    }

    fn warn(&mut self, phase: OnboardingPhase, message: String) {
        self.reporter.report_warning(phase, &message);
        self.warnings.push(format!("{phase}: {message}"));
    }

    /// Failures of optional phases become warnings; required phases abort
    fn settle<T>(
        &mut self,
        phase: OnboardingPhase,
        result: anyhow::Result<T>,
    ) -> Result<Option<T>, OnboardingError> {
        match result {
            Err(e) if phase.is_optional() => {
                self.warn(phase, format!("{e:#}"));
                Ok(None)
            }
            result => result.at_step(phase).map(Some),
        }
    }

    fn compliance(&mut self, names: &ResourceNameSet, recording: ComplianceRecording) {
        let phase = OnboardingPhase::ComplianceRecording;
        let ComplianceRecording::Managed(managed) = recording else {
            return;
        };
        self.step(StepReport::new(
            phase,
            ResourceKind::IamRole,
            CONFIG_ROLE_NAME,
            managed.role_outcome,
        ));
        self.step(StepReport::new(
            phase,
            ResourceKind::ConfigRecorder,
            &names.config_recorder,
            managed.recorder,
        ));
        self.step(StepReport::new(
            phase,
            ResourceKind::DeliveryChannel,
            &names.delivery_channel,
            managed.channel,
        ));
        for rule in managed.rules {
            match rule.result {
                Ok(outcome) => {
                    self.step(StepReport::new(phase, ResourceKind::ConfigRule, rule.name, outcome))
                }
                Err(message) => self.warn(phase, format!("rule {}: {message}", rule.name)),
            }
        }
    }
}

/// One onboarding run against one target account
pub struct Onboarding<'a, P> {
    provider: &'a P,
    config: &'a OnboardingConfig,
    cancel: CancellationToken,
}

impl<'a, P: CloudProvider> Onboarding<'a, P> {
    pub fn new(provider: &'a P, config: &'a OnboardingConfig, cancel: CancellationToken) -> Self {
        Self {
            provider,
            config,
            cancel,
        }
    }

    /// Assume the trust role and bind a home-region plane to the target account
    async fn connect<R: ProgressReporter>(
        &self,
        reporter: &R,
    ) -> Result<(P::Plane, ResourceNameSet), OnboardingError> {
        reporter.report_phase(OnboardingPhase::Init);
        self.config.validate()?;

        let credentials = self
            .provider
            .assume_role(&self.config.trust, self.config.home_region())
            .await?;
        reporter.report_phase(OnboardingPhase::RoleAssumed);

        let plane = self.provider.connect(&credentials);
        let account_id = plane
            .caller_account()
            .await
            .at_step(OnboardingPhase::Identified)?;
        let names = ResourceNameSet::for_account(&account_id)?;
        reporter.report_account(&account_id);
        reporter.report_phase(OnboardingPhase::Identified);

        Ok((plane, names))
    }

    /// Reconcile every resource and build the queue description
    #[instrument(skip_all, fields(role_arn = %self.config.trust.role_arn, home = %self.config.home_region()))]
    pub async fn provision<R: ProgressReporter>(
        &self,
        reporter: &R,
    ) -> Result<Provisioned<P::Plane>, OnboardingError> {
        let (plane, names) = self.connect(reporter).await?;
        let home = self.config.home_region();
        let account_id = names.account_id.as_str();
        let pause = Propagation::new(
            self.config.provisioning.propagation_delay(),
            self.cancel.clone(),
        );
        let mut journal = Journal::new(reporter);

        // Trail delivery chain
        let record_compliance = self.config.provisioning.compliance_recording;
        let config_prefix = names.config_key_prefix();
        let outcome = ensure_bucket(
            plane.storage(),
            &names.bucket,
            home,
            account_id,
            record_compliance.then_some(config_prefix.as_str()),
        )
        .await
        .at_step(OnboardingPhase::BucketReady)?;
        journal.step(StepReport::new(
            OnboardingPhase::BucketReady,
            ResourceKind::Bucket,
            &names.bucket,
            outcome,
        ));
        journal.step(StepReport::new(
            OnboardingPhase::BucketReady,
            ResourceKind::BucketPolicy,
            &names.bucket,
            Outcome::Updated,
        ));
        reporter.report_phase(OnboardingPhase::BucketReady);

        let log_group = ensure_log_group(plane.logs(), &names.log_group, home, account_id)
            .await
            .at_step(OnboardingPhase::LogGroupReady)?;
        journal.step(StepReport::new(
            OnboardingPhase::LogGroupReady,
            ResourceKind::LogGroup,
            &names.log_group,
            log_group.outcome,
        ));
        journal.step(StepReport::new(
            OnboardingPhase::LogGroupReady,
            ResourceKind::LogGroupPolicy,
            LOG_GROUP_POLICY_NAME,
            log_group.policy,
        ));
        reporter.report_phase(OnboardingPhase::LogGroupReady);

        let trail_role = RoleSpec::new(
            &names.trail_role,
            CLOUDTRAIL_PRINCIPAL,
            "Role for CloudLoom trail delivery to CloudWatch Logs",
        )
        .with_managed_policy(LOGS_FULL_ACCESS_POLICY_ARN);
        let trail_role = ensure_role(plane.iam(), &trail_role, &pause)
            .await
            .at_step(OnboardingPhase::TrailRoleReady)?;
        journal.step(StepReport::new(
            OnboardingPhase::TrailRoleReady,
            ResourceKind::IamRole,
            &names.trail_role,
            trail_role.outcome,
        ));
        reporter.report_phase(OnboardingPhase::TrailRoleReady);

        let desired = TrailDesiredState::new(
            &names.trail,
            &names.bucket,
            log_group.delivery_arn(),
            &trail_role.arn,
        );
        let trail = ensure_trail(plane.trails(), &desired)
            .await
            .at_step(OnboardingPhase::TrailReady)?;
        journal.step(StepReport::new(
            OnboardingPhase::TrailReady,
            ResourceKind::Trail,
            &names.trail,
            trail.outcome,
        ));
        reporter.report_phase(OnboardingPhase::TrailReady);

        if record_compliance {
            let phase = OnboardingPhase::ComplianceRecording;
            let result =
                ensure_compliance_recording(plane.iam(), plane.recorder(), &names, &pause).await;
            if let Some(recording) = journal.settle(phase, result)? {
                journal.compliance(&names, recording);
                reporter.report_phase(phase);
            }
        }

        // Finding pipeline
        let queue = ensure_queue(plane.queues(), &names.queue)
            .await
            .at_step(OnboardingPhase::QueueReady)?;
        journal.step(StepReport::new(
            OnboardingPhase::QueueReady,
            ResourceKind::Queue,
            &names.queue,
            queue.outcome,
        ));
        reporter.report_phase(OnboardingPhase::QueueReady);

        let events_role = RoleSpec::new(
            &names.events_role,
            EVENTS_PRINCIPAL,
            "Role for CloudLoom event rules to send to the finding queue",
        )
        .with_inline_policy(
            &names.events_role_policy,
            to_document(&events_send_policy(&queue.arn)),
        );
        let events_role = ensure_role(plane.iam(), &events_role, &pause)
            .await
            .at_step(OnboardingPhase::EventRoleReady)?;
        journal.step(StepReport::new(
            OnboardingPhase::EventRoleReady,
            ResourceKind::IamRole,
            &names.events_role,
            events_role.outcome,
        ));
        journal.step(StepReport::new(
            OnboardingPhase::EventRoleReady,
            ResourceKind::RolePolicy,
            &names.events_role_policy,
            Outcome::Updated,
        ));
        reporter.report_phase(OnboardingPhase::EventRoleReady);

        let routes = fan_out_rules(
            &plane,
            self.config.monitored_regions(),
            &names.rule,
            &queue.arn,
            &events_role.arn,
        )
        .await?;
        for route in &routes {
            journal.step(
                StepReport::new(
                    OnboardingPhase::RulesReady,
                    ResourceKind::EventRule,
                    &names.rule,
                    route.outcome,
                )
                .in_region(&route.region),
            );
        }
        reporter.report_phase(OnboardingPhase::RulesReady);

        let rule_arns = rule_arns(&routes);
        apply_queue_policy(plane.queues(), &queue.url, &queue.arn, &rule_arns)
            .await
            .at_step(OnboardingPhase::PolicyApplied)?;
        journal.step(StepReport::new(
            OnboardingPhase::PolicyApplied,
            ResourceKind::QueuePolicy,
            &names.queue,
            Outcome::Updated,
        ));
        reporter.report_phase(OnboardingPhase::PolicyApplied);

        if self.config.provisioning.verify_wiring {
            let phase = OnboardingPhase::WiringVerified;
            let wired = rule_targets_queue(plane.events(), &names.rule, &queue.arn)
                .await
                .and_then(|targets| {
                    anyhow::ensure!(
                        targets,
                        "rule {} in {} does not target queue {}",
                        names.rule,
                        plane.region(),
                        queue.arn
                    );
                    Ok(())
                });
            if journal.settle(phase, wired)?.is_some() {
                reporter.report_phase(phase);
            }
        }

        let queue_info = Arc::new(QueueInfo {
            account_id: names.account_id.clone(),
            queue_url: queue.url,
            queue_arn: queue.arn,
            rule_arns,
            created_at: queue.created_at,
        });
        info!(
            account_id = %queue_info.account_id,
            queue = %queue_info.queue_url,
            regions = queue_info.region_count(),
            "Account provisioned"
        );

        let summary = OnboardingSummary {
            queue_info,
            names,
            steps: journal.steps,
            warnings: journal.warnings,
            propagation_waits: pause.waits(),
        };
        Ok(Provisioned { plane, summary })
    }

    /// Provision the account and start consuming its findings
    pub async fn onboard<R, H>(
        &self,
        reporter: &R,
        handler: H,
    ) -> Result<OnboardingOutcome, OnboardingError>
    where
        R: ProgressReporter,
        H: FindingHandler,
    {
        let Provisioned { plane, summary } = self.provision(reporter).await?;

        let consumer = EventConsumer::spawn(
            plane.queues().clone(),
            summary.queue_info.clone(),
            handler,
            self.config.consumer.clone(),
            self.cancel.child_token(),
        );
        reporter.report_phase(OnboardingPhase::ConsumerStarted);
        reporter.report_phase(OnboardingPhase::Done);

        Ok(OnboardingOutcome { summary, consumer })
    }

    /// Send a synthetic API-call event to an already provisioned queue
    ///
    /// Returns the id of the sent message.
    pub async fn send_test_message<R: ProgressReporter>(
        &self,
        reporter: &R,
    ) -> Result<String, OnboardingError> {
        let (plane, names) = self.connect(reporter).await?;

        let queue_url = plane
            .queues()
            .queue_url(&names.queue)
            .await
            .and_then(|url| {
                url.with_context(|| format!("Queue {} not found, onboard the account first", names.queue))
            })
            .at_step(OnboardingPhase::QueueReady)?;

        let body = test_event(&names.account_id, plane.region()).to_string();
        let message_id = plane
            .queues()
            .send_message(&queue_url, &body)
            .await
            .at_step(OnboardingPhase::QueueReady)?;

        info!(queue = %queue_url, message_id = %message_id, "Test message sent");
        Ok(message_id)
    }
}

/// A CloudTrail-shaped API call event from the test source
fn test_event(account_id: &str, region: &str) -> serde_json::Value {
    json!({
        "version": "0",
        "source": TEST_EVENT_SOURCE,
        "detail-type": API_CALL_DETAIL_TYPE,
        "account": account_id,
        "region": region,
        "time": Utc::now().to_rfc3339(),
        "detail": {
            "eventSource": "s3.amazonaws.com",
            "eventName": "PutBucketPublicAccessBlock",
            "awsRegion": region,
            "requestParameters": {
                "bucketName": format!("cloudloom-test-{account_id}")
            }
        }
    })
}
