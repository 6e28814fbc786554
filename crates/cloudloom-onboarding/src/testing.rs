//! In-memory control planes for orchestration tests
//!
//! [`FakeCloud`] holds the remote state of one target account and hands out
//! region-bound [`FakePlane`]s. Every operation is recorded, creates are
//! counted, and individual failures can be injected.

use crate::aws::operations::{
    EventOperations, IamOperations, LogOperations, QueueOperations, RecorderOperations,
    StorageOperations, TrailOperations,
};
use crate::aws::types::{
    FindingMessage, LogGroupDescription, ManagedRule, QueueAttributes, RecorderDescription,
    RuleDescription, TrailDescription, TrailDesiredState,
};
use crate::aws::{AccountId, AwsError, CloudProvider, ControlPlane, SessionCredentials};
use crate::config::TrustConfig;
use crate::error::OnboardingError;
use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub const TEST_ACCOUNT: &str = "111122223333";

/// Visibility timeout of fake queues unless overridden
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(30);

/// One recorded control-plane call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub region: String,
    pub op: &'static str,
    pub target: String,
}

struct RoleRecord {
    arn: String,
    attached: Vec<String>,
    inline: BTreeMap<String, String>,
}

struct TrailRecord {
    desired: TrailDesiredState,
    arn: String,
    logging: bool,
}

struct QueueRecord {
    url: String,
    arn: String,
    created_at: DateTime<Utc>,
    policy: Option<String>,
    visible: VecDeque<FindingMessage>,
    in_flight: Vec<InFlight>,
    deleted: usize,
}

/// A received message hidden until its visibility timeout expires
struct InFlight {
    message: FindingMessage,
    visible_at: Instant,
}

impl QueueRecord {
    /// Return messages whose visibility timeout expired to the front of the queue
    fn release_expired(&mut self, now: Instant) {
        let (expired, hidden): (Vec<_>, Vec<_>) = self
            .in_flight
            .drain(..)
            .partition(|m| m.visible_at <= now);
        self.in_flight = hidden;
        for m in expired.into_iter().rev() {
            self.visible.push_front(m.message);
        }
    }
}

struct RuleRecord {
    arn: String,
    pattern: String,
    targets: BTreeMap<String, String>,
}

struct RecorderRecord {
    role_arn: String,
    recording: bool,
}

#[derive(Default)]
struct State {
    account_id: String,
    calls: Vec<Call>,
    creates: Vec<String>,
    buckets: BTreeMap<String, String>,
    bucket_policies: BTreeMap<String, String>,
    log_groups: BTreeMap<String, String>,
    log_policies: BTreeMap<String, String>,
    roles: BTreeMap<String, RoleRecord>,
    trails: BTreeMap<String, TrailRecord>,
    trail_updates: u32,
    hidden_trail_describes: u32,
    queues: BTreeMap<String, QueueRecord>,
    rules: BTreeMap<(String, String), RuleRecord>,
    recorders: BTreeMap<String, RecorderRecord>,
    channels: BTreeSet<String>,
    config_rules: BTreeSet<String>,
    next_message: u64,
    next_receipt: u64,
    visibility_timeout: Duration,
    reject_assume: bool,
    empty_credentials: bool,
    failing_rule_region: Option<String>,
    fail_recorder: bool,
    failing_config_rule: Option<String>,
    failing_receives: u32,
}

impl State {
    fn record(&mut self, region: &str, op: &'static str, target: &str) {
        self.calls.push(Call {
            region: region.to_string(),
            op,
            target: target.to_string(),
        });
    }

    fn queue_by_url(&mut self, url: &str) -> Result<&mut QueueRecord> {
        self.queues
            .values_mut()
            .find(|q| q.url == url)
            .ok_or_else(|| not_found(url))
    }
}

fn conflict(what: &str) -> anyhow::Error {
    AwsError::AlreadyExists {
        message: format!("{what} already exists"),
    }
    .into()
}

fn not_found(what: &str) -> anyhow::Error {
    AwsError::NotFound {
        message: format!("{what} does not exist"),
    }
    .into()
}

fn denied(what: &str) -> anyhow::Error {
    AwsError::Sdk {
        code: Some("AccessDeniedException".to_string()),
        message: format!("not authorized to modify {what}"),
    }
    .into()
}

/// Fixed creation time of every fake queue
pub fn queue_created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Remote state of one fake account
#[derive(Clone)]
pub struct FakeCloud {
    state: Arc<Mutex<State>>,
}

impl FakeCloud {
    pub fn new(account_id: &str) -> Self {
        let state = State {
            account_id: account_id.to_string(),
            visibility_timeout: DEFAULT_VISIBILITY_TIMEOUT,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    /// A plane bound to a region without going through the trust exchange
    pub fn plane(&self, region: &str) -> FakePlane {
        FakePlane {
            cloud: self.clone(),
            region: region.to_string(),
        }
    }

    pub fn reject_assume_role(&self) {
        self.with(|s| s.reject_assume = true);
    }

    pub fn return_empty_credentials(&self) {
        self.with(|s| s.empty_credentials = true);
    }

    pub fn fail_rules_in(&self, region: &str) {
        self.with(|s| s.failing_rule_region = Some(region.to_string()));
    }

    pub fn fail_recorder(&self) {
        self.with(|s| s.fail_recorder = true);
    }

    pub fn fail_receives(&self, count: u32) {
        self.with(|s| s.failing_receives = count);
    }

    pub fn fail_config_rule(&self, name: &str) {
        self.with(|s| s.failing_config_rule = Some(name.to_string()));
    }

    pub fn set_visibility_timeout(&self, timeout: Duration) {
        self.with(|s| s.visibility_timeout = timeout);
    }

    /// Seed a recorder that onboarding did not create
    pub fn seed_recorder(&self, name: &str, recording: bool) {
        self.with(|s| {
            let role_arn = format!("arn:aws:iam::{}:role/existing-config-role", s.account_id);
            s.recorders.insert(
                name.to_string(),
                RecorderRecord {
                    role_arn,
                    recording,
                },
            );
        });
    }

    /// Seed a trail that the first describe does not see, so creating it
    /// conflicts
    pub fn seed_hidden_trail(&self, desired: TrailDesiredState, region: &str) {
        self.with(|s| {
            let arn = format!(
                "arn:aws:cloudtrail:{region}:{}:trail/{}",
                s.account_id, desired.name
            );
            s.trails.insert(
                desired.name.clone(),
                TrailRecord {
                    desired,
                    arn,
                    logging: true,
                },
            );
            s.hidden_trail_describes = 1;
        });
    }

    pub fn push_message(&self, queue_url: &str, body: &str) {
        self.with(|s| {
            s.next_message += 1;
            let n = s.next_message;
            if let Ok(queue) = s.queue_by_url(queue_url) {
                queue.visible.push_back(FindingMessage {
                    message_id: format!("msg-{n}"),
                    receipt_handle: String::new(),
                    body: body.to_string(),
                });
            }
        });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with(|s| s.calls.clone())
    }

    /// Calls other than the trust exchange
    pub fn resource_calls(&self) -> usize {
        self.with(|s| s.calls.iter().filter(|c| c.op != "assume_role").count())
    }

    pub fn creates(&self) -> Vec<String> {
        self.with(|s| s.creates.clone())
    }

    pub fn trail_updates(&self) -> u32 {
        self.with(|s| s.trail_updates)
    }

    pub fn receive_calls(&self) -> usize {
        self.with(|s| {
            s.calls
                .iter()
                .filter(|c| c.op == "receive_messages")
                .count()
        })
    }

    pub fn queue_policy(&self, queue_name: &str) -> Option<String> {
        self.with(|s| s.queues.get(queue_name).and_then(|q| q.policy.clone()))
    }

    pub fn queue_messages(&self, queue_name: &str) -> Vec<String> {
        self.with(|s| {
            s.queues
                .get(queue_name)
                .map(|q| q.visible.iter().map(|m| m.body.clone()).collect())
                .unwrap_or_default()
        })
    }

    pub fn in_flight_messages(&self, queue_url: &str) -> usize {
        self.with(|s| s.queue_by_url(queue_url).map(|q| q.in_flight.len()).unwrap_or(0))
    }

    pub fn deleted_messages(&self, queue_url: &str) -> usize {
        self.with(|s| s.queue_by_url(queue_url).map(|q| q.deleted).unwrap_or(0))
    }

    /// Regions holding the rule, in sorted order
    pub fn rule_regions(&self, rule: &str) -> Vec<String> {
        self.with(|s| {
            s.rules
                .keys()
                .filter(|(_, name)| name == rule)
                .map(|(region, _)| region.clone())
                .collect()
        })
    }

    pub fn rule_targets(&self, region: &str, rule: &str) -> Vec<String> {
        self.with(|s| {
            s.rules
                .get(&(region.to_string(), rule.to_string()))
                .map(|r| r.targets.values().cloned().collect())
                .unwrap_or_default()
        })
    }

    pub fn inline_policy(&self, role: &str, policy_name: &str) -> Option<String> {
        self.with(|s| {
            s.roles
                .get(role)
                .and_then(|r| r.inline.get(policy_name).cloned())
        })
    }

    pub fn attached_policies(&self, role: &str) -> Vec<String> {
        self.with(|s| s.roles.get(role).map(|r| r.attached.clone()).unwrap_or_default())
    }

    pub fn bucket_policy(&self, bucket: &str) -> Option<String> {
        self.with(|s| s.bucket_policies.get(bucket).cloned())
    }

    pub fn log_policy(&self, name: &str) -> Option<String> {
        self.with(|s| s.log_policies.get(name).cloned())
    }

    pub fn trail_logging(&self, name: &str) -> bool {
        self.with(|s| s.trails.get(name).is_some_and(|t| t.logging))
    }

    pub fn recorder_state(&self, name: &str) -> Option<(String, bool)> {
        self.with(|s| {
            s.recorders
                .get(name)
                .map(|r| (r.role_arn.clone(), r.recording))
        })
    }

    pub fn has_delivery_channel(&self, name: &str) -> bool {
        self.with(|s| s.channels.contains(name))
    }

    /// Names of the compliance rules, in sorted order
    pub fn config_rules(&self) -> Vec<String> {
        self.with(|s| s.config_rules.iter().cloned().collect())
    }
}

impl CloudProvider for FakeCloud {
    type Plane = FakePlane;

    async fn assume_role(
        &self,
        trust: &TrustConfig,
        region: &str,
    ) -> Result<SessionCredentials, OnboardingError> {
        let (reject, empty) = self.with(|s| {
            s.record(region, "assume_role", &trust.role_arn);
            (s.reject_assume, s.empty_credentials)
        });

        if reject {
            return Err(OnboardingError::Authentication {
                role_arn: trust.role_arn.clone(),
                source: AwsError::Sdk {
                    code: Some("AccessDenied".to_string()),
                    message: "external id does not match".to_string(),
                }
                .into(),
            });
        }
        if empty {
            return Err(OnboardingError::CredentialsMissing {
                role_arn: trust.role_arn.clone(),
            });
        }

        Ok(SessionCredentials {
            access_key_id: "ASIAFAKEACCESSKEY".to_string(),
            secret_access_key: "fake-secret".to_string(),
            session_token: "fake-token".to_string(),
            region: region.to_string(),
            expiry: None,
        })
    }

    fn connect(&self, credentials: &SessionCredentials) -> FakePlane {
        self.plane(&credentials.region)
    }
}

/// One region of a [`FakeCloud`]
#[derive(Clone)]
pub struct FakePlane {
    cloud: FakeCloud,
    region: String,
}

impl FakePlane {
    fn with<T>(&self, op: &'static str, target: &str, f: impl FnOnce(&mut State) -> T) -> T {
        self.cloud.with(|s| {
            s.record(&self.region, op, target);
            f(s)
        })
    }
}

impl ControlPlane for FakePlane {
    type Storage = FakePlane;
    type Logs = FakePlane;
    type Iam = FakePlane;
    type Trails = FakePlane;
    type Queues = FakePlane;
    type Events = FakePlane;
    type Recorder = FakePlane;

    fn region(&self) -> &str {
        &self.region
    }

    async fn caller_account(&self) -> Result<AccountId> {
        let account = self.with("get_caller_identity", "", |s| s.account_id.clone());
        Ok(AccountId::parse(account)?)
    }

    fn storage(&self) -> &FakePlane {
        self
    }

    fn logs(&self) -> &FakePlane {
        self
    }

    fn iam(&self) -> &FakePlane {
        self
    }

    fn trails(&self) -> &FakePlane {
        self
    }

    fn queues(&self) -> &FakePlane {
        self
    }

    fn events(&self) -> &FakePlane {
        self
    }

    fn recorder(&self) -> &FakePlane {
        self
    }

    fn in_region(&self, region: &str) -> Self {
        self.cloud.plane(region)
    }
}

impl StorageOperations for FakePlane {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        Ok(self.with("head_bucket", bucket, |s| s.buckets.contains_key(bucket)))
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()> {
        self.with("create_bucket", bucket, |s| {
            if s.buckets.contains_key(bucket) {
                return Err(conflict(bucket));
            }
            s.buckets.insert(bucket.to_string(), region.to_string());
            s.creates.push(format!("bucket {bucket}"));
            Ok(())
        })
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<()> {
        self.with("put_bucket_policy", bucket, |s| {
            if !s.buckets.contains_key(bucket) {
                return Err(not_found(bucket));
            }
            s.bucket_policies
                .insert(bucket.to_string(), policy.to_string());
            Ok(())
        })
    }
}

impl LogOperations for FakePlane {
    async fn describe_log_group(&self, name: &str) -> Result<Option<LogGroupDescription>> {
        Ok(self.with("describe_log_groups", name, |s| {
            s.log_groups.get(name).map(|region| LogGroupDescription {
                name: name.to_string(),
                arn: Some(format!(
                    "arn:aws:logs:{region}:{}:log-group:{name}:*",
                    s.account_id
                )),
            })
        }))
    }

    async fn create_log_group(&self, name: &str) -> Result<()> {
        let region = self.region.clone();
        self.with("create_log_group", name, |s| {
            if s.log_groups.contains_key(name) {
                return Err(conflict(name));
            }
            s.log_groups.insert(name.to_string(), region);
            s.creates.push(format!("log-group {name}"));
            Ok(())
        })
    }

    async fn put_resource_policy(&self, policy_name: &str, policy: &str) -> Result<()> {
        self.with("put_resource_policy", policy_name, |s| {
            s.log_policies
                .insert(policy_name.to_string(), policy.to_string());
            Ok(())
        })
    }
}

impl IamOperations for FakePlane {
    async fn get_role_arn(&self, role: &str) -> Result<Option<String>> {
        Ok(self.with("get_role", role, |s| s.roles.get(role).map(|r| r.arn.clone())))
    }

    async fn create_role(&self, role: &str, _trust_policy: &str, _description: &str) -> Result<String> {
        self.with("create_role", role, |s| {
            if s.roles.contains_key(role) {
                return Err(conflict(role));
            }
            let arn = format!("arn:aws:iam::{}:role/{role}", s.account_id);
            s.roles.insert(
                role.to_string(),
                RoleRecord {
                    arn: arn.clone(),
                    attached: Vec::new(),
                    inline: BTreeMap::new(),
                },
            );
            s.creates.push(format!("role {role}"));
            Ok(arn)
        })
    }

    async fn attached_policy_arns(&self, role: &str) -> Result<Vec<String>> {
        self.with("list_attached_role_policies", role, |s| {
            s.roles
                .get(role)
                .map(|r| r.attached.clone())
                .ok_or_else(|| not_found(role))
        })
    }

    async fn attach_managed_policy(&self, role: &str, policy_arn: &str) -> Result<()> {
        self.with("attach_role_policy", role, |s| {
            let record = s.roles.get_mut(role).ok_or_else(|| not_found(role))?;
            if !record.attached.iter().any(|a| a == policy_arn) {
                record.attached.push(policy_arn.to_string());
            }
            Ok(())
        })
    }

    async fn put_inline_policy(&self, role: &str, policy_name: &str, policy: &str) -> Result<()> {
        self.with("put_role_policy", role, |s| {
            let record = s.roles.get_mut(role).ok_or_else(|| not_found(role))?;
            record
                .inline
                .insert(policy_name.to_string(), policy.to_string());
            Ok(())
        })
    }
}

impl TrailOperations for FakePlane {
    async fn describe_trail(&self, name: &str) -> Result<Option<TrailDescription>> {
        Ok(self.with("describe_trails", name, |s| {
            if s.hidden_trail_describes > 0 {
                s.hidden_trail_describes -= 1;
                return None;
            }
            s.trails.get(name).map(|t| TrailDescription {
                name: name.to_string(),
                arn: Some(t.arn.clone()),
                bucket: Some(t.desired.bucket.clone()),
                log_group_arn: Some(t.desired.log_group_arn.clone()),
                role_arn: Some(t.desired.role_arn.clone()),
                multi_region: t.desired.multi_region,
                include_global_events: t.desired.include_global_events,
            })
        }))
    }

    async fn create_trail(&self, desired: &TrailDesiredState) -> Result<String> {
        let region = self.region.clone();
        self.with("create_trail", &desired.name, |s| {
            if s.trails.contains_key(&desired.name) {
                return Err(conflict(&desired.name));
            }
            let arn = format!(
                "arn:aws:cloudtrail:{region}:{}:trail/{}",
                s.account_id, desired.name
            );
            s.trails.insert(
                desired.name.clone(),
                TrailRecord {
                    desired: desired.clone(),
                    arn: arn.clone(),
                    logging: false,
                },
            );
            s.creates.push(format!("trail {}", desired.name));
            Ok(arn)
        })
    }

    async fn update_trail(&self, desired: &TrailDesiredState) -> Result<String> {
        self.with("update_trail", &desired.name, |s| {
            let record = s
                .trails
                .get_mut(&desired.name)
                .ok_or_else(|| not_found(&desired.name))?;
            record.desired = desired.clone();
            let arn = record.arn.clone();
            s.trail_updates += 1;
            Ok(arn)
        })
    }

    async fn is_logging(&self, name: &str) -> Result<bool> {
        self.with("get_trail_status", name, |s| {
            s.trails
                .get(name)
                .map(|t| t.logging)
                .ok_or_else(|| not_found(name))
        })
    }

    async fn start_logging(&self, name: &str) -> Result<()> {
        self.with("start_logging", name, |s| {
            let record = s.trails.get_mut(name).ok_or_else(|| not_found(name))?;
            record.logging = true;
            Ok(())
        })
    }
}

impl QueueOperations for FakePlane {
    async fn queue_url(&self, name: &str) -> Result<Option<String>> {
        Ok(self.with("get_queue_url", name, |s| {
            s.queues.get(name).map(|q| q.url.clone())
        }))
    }

    async fn create_queue(&self, name: &str) -> Result<String> {
        let region = self.region.clone();
        self.with("create_queue", name, |s| {
            if s.queues.contains_key(name) {
                return Err(conflict(name));
            }
            let url = format!("https://sqs.{region}.amazonaws.com/{}/{name}", s.account_id);
            s.queues.insert(
                name.to_string(),
                QueueRecord {
                    url: url.clone(),
                    arn: format!("arn:aws:sqs:{region}:{}:{name}", s.account_id),
                    created_at: queue_created_at(),
                    policy: None,
                    visible: VecDeque::new(),
                    in_flight: Vec::new(),
                    deleted: 0,
                },
            );
            s.creates.push(format!("queue {name}"));
            Ok(url)
        })
    }

    async fn queue_attributes(&self, queue_url: &str) -> Result<QueueAttributes> {
        self.with("get_queue_attributes", queue_url, |s| {
            let queue = s.queue_by_url(queue_url)?;
            Ok(QueueAttributes {
                arn: queue.arn.clone(),
                created_at: queue.created_at,
            })
        })
    }

    async fn set_queue_policy(&self, queue_url: &str, policy: &str) -> Result<()> {
        self.with("set_queue_attributes", queue_url, |s| {
            s.queue_by_url(queue_url)?.policy = Some(policy.to_string());
            Ok(())
        })
    }

    async fn receive_messages(
        &self,
        queue_url: &str,
        max_messages: i32,
        wait_secs: i32,
    ) -> Result<Vec<FindingMessage>> {
        let now = Instant::now();
        let batch = self.with("receive_messages", queue_url, |s| {
            if s.failing_receives > 0 {
                s.failing_receives -= 1;
                return Err(anyhow::anyhow!("connection reset by peer"));
            }
            let visible_at = now + s.visibility_timeout;
            let first_receipt = s.next_receipt;

            let queue = s.queue_by_url(queue_url)?;
            queue.release_expired(now);
            let take = queue.visible.len().min(max_messages.max(0) as usize);
            let mut batch: Vec<FindingMessage> = queue.visible.drain(..take).collect();
            // Every receive hands out fresh receipt handles
            for (i, message) in batch.iter_mut().enumerate() {
                message.receipt_handle = format!("receipt-{}", first_receipt + i as u64 + 1);
            }
            queue.in_flight.extend(batch.iter().map(|message| InFlight {
                message: message.clone(),
                visible_at,
            }));

            s.next_receipt += batch.len() as u64;
            Ok(batch)
        })?;

        if batch.is_empty() && wait_secs > 0 {
            tokio::time::sleep(Duration::from_secs(wait_secs as u64)).await;
        }
        Ok(batch)
    }

    async fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> Result<()> {
        self.with("delete_message", queue_url, |s| {
            let queue = s.queue_by_url(queue_url)?;
            let index = queue
                .in_flight
                .iter()
                .position(|m| m.message.receipt_handle == receipt_handle)
                .ok_or_else(|| not_found(receipt_handle))?;
            queue.in_flight.remove(index);
            queue.deleted += 1;
            Ok(())
        })
    }

    async fn send_message(&self, queue_url: &str, body: &str) -> Result<String> {
        self.with("send_message", queue_url, |s| {
            s.next_message += 1;
            let n = s.next_message;
            let queue = s.queue_by_url(queue_url)?;
            let message_id = format!("msg-{n}");
            queue.visible.push_back(FindingMessage {
                message_id: message_id.clone(),
                receipt_handle: String::new(),
                body: body.to_string(),
            });
            Ok(message_id)
        })
    }
}

impl EventOperations for FakePlane {
    async fn describe_rule(&self, name: &str) -> Result<Option<RuleDescription>> {
        let key = (self.region.clone(), name.to_string());
        Ok(self.with("describe_rule", name, |s| {
            s.rules.get(&key).map(|r| RuleDescription {
                name: name.to_string(),
                arn: r.arn.clone(),
                enabled: true,
                event_pattern: Some(r.pattern.clone()),
            })
        }))
    }

    async fn put_rule(&self, name: &str, event_pattern: &str, _description: &str) -> Result<String> {
        let region = self.region.clone();
        self.with("put_rule", name, |s| {
            if s.failing_rule_region.as_deref() == Some(region.as_str()) {
                return Err(denied(name));
            }
            let key = (region.clone(), name.to_string());
            if !s.rules.contains_key(&key) {
                s.creates.push(format!("rule {region} {name}"));
            }
            let arn = format!("arn:aws:events:{region}:{}:rule/{name}", s.account_id);
            let record = s.rules.entry(key).or_insert_with(|| RuleRecord {
                arn: arn.clone(),
                pattern: String::new(),
                targets: BTreeMap::new(),
            });
            record.pattern = event_pattern.to_string();
            Ok(arn)
        })
    }

    async fn put_target(
        &self,
        rule: &str,
        target_id: &str,
        target_arn: &str,
        _role_arn: &str,
    ) -> Result<()> {
        let key = (self.region.clone(), rule.to_string());
        self.with("put_targets", rule, |s| {
            let record = s.rules.get_mut(&key).ok_or_else(|| not_found(rule))?;
            record
                .targets
                .insert(target_id.to_string(), target_arn.to_string());
            Ok(())
        })
    }

    async fn list_target_arns(&self, rule: &str) -> Result<Vec<String>> {
        let key = (self.region.clone(), rule.to_string());
        self.with("list_targets_by_rule", rule, |s| {
            s.rules
                .get(&key)
                .map(|r| r.targets.values().cloned().collect())
                .ok_or_else(|| not_found(rule))
        })
    }
}

impl RecorderOperations for FakePlane {
    async fn list_recorders(&self) -> Result<Vec<RecorderDescription>> {
        Ok(self.with("describe_configuration_recorders", "", |s| {
            s.recorders
                .iter()
                .map(|(name, r)| RecorderDescription {
                    name: name.clone(),
                    role_arn: Some(r.role_arn.clone()),
                    recording: r.recording,
                })
                .collect()
        }))
    }

    async fn put_recorder(&self, name: &str, role_arn: &str) -> Result<()> {
        self.with("put_configuration_recorder", name, |s| {
            if s.fail_recorder {
                return Err(denied(name));
            }
            if !s.recorders.contains_key(name) {
                s.creates.push(format!("recorder {name}"));
            }
            s.recorders.insert(
                name.to_string(),
                RecorderRecord {
                    role_arn: role_arn.to_string(),
                    recording: false,
                },
            );
            Ok(())
        })
    }

    async fn delivery_channel_exists(&self, name: &str) -> Result<bool> {
        Ok(self.with("describe_delivery_channels", name, |s| s.channels.contains(name)))
    }

    async fn put_delivery_channel(&self, name: &str, bucket: &str, _key_prefix: &str) -> Result<()> {
        self.with("put_delivery_channel", name, |s| {
            if !s.buckets.contains_key(bucket) {
                return Err(not_found(bucket));
            }
            if s.channels.insert(name.to_string()) {
                s.creates.push(format!("delivery-channel {name}"));
            }
            Ok(())
        })
    }

    async fn start_recorder(&self, name: &str) -> Result<()> {
        self.with("start_configuration_recorder", name, |s| {
            let record = s.recorders.get_mut(name).ok_or_else(|| not_found(name))?;
            record.recording = true;
            Ok(())
        })
    }

    async fn config_rule_exists(&self, name: &str) -> Result<bool> {
        Ok(self.with("describe_config_rules", name, |s| s.config_rules.contains(name)))
    }

    async fn put_managed_rule(&self, rule: &ManagedRule) -> Result<()> {
        self.with("put_config_rule", rule.name, |s| {
            if s.failing_config_rule.as_deref() == Some(rule.name) {
                return Err(denied(rule.name));
            }
            if s.config_rules.insert(rule.name.to_string()) {
                s.creates.push(format!("config-rule {}", rule.name));
            }
            Ok(())
        })
    }
}
