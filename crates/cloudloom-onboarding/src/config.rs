//! Configuration types for onboarding
//!
//! Everything a run needs lives in an explicit [`OnboardingConfig`] value,
//! so distinct accounts can be onboarded concurrently without shared state.

use crate::error::ConfigError;
use cloudloom_common::defaults::{
    MAX_MESSAGES_LIMIT, MAX_POLL_WAIT_SECS, default_error_backoff_secs, default_home_region,
    default_max_messages, default_monitored_regions, default_poll_wait_secs,
    default_propagation_delay_secs, default_session_duration_secs, default_session_name,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Minimum and maximum session lifetimes the trust service accepts
const MIN_SESSION_DURATION_SECS: i32 = 900;
const MAX_SESSION_DURATION_SECS: i32 = 43_200;

/// Cross-account trust parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Role in the target account that trusts the platform
    pub role_arn: String,
    /// Shared secret of the trust relationship
    pub external_id: String,
    /// Session name recorded in the target account's audit log
    #[serde(default = "default_session_name")]
    pub session_name: String,
    /// Credential lifetime in seconds
    #[serde(default = "default_session_duration_secs")]
    pub session_duration_secs: i32,
}

impl TrustConfig {
    /// Trust parameters with default session settings
    pub fn new(role_arn: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            role_arn: role_arn.into(),
            external_id: external_id.into(),
            session_name: default_session_name(),
            session_duration_secs: default_session_duration_secs(),
        }
    }
}

/// Where resources live and which regions are monitored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Region hosting the bucket, log group, trail and queue
    #[serde(default = "default_home_region")]
    pub home: String,
    /// Regions whose API activity is routed to the queue, in fan-out order
    #[serde(default = "default_monitored_regions")]
    pub monitored: Vec<String>,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            home: default_home_region(),
            monitored: default_monitored_regions(),
        }
    }
}

/// Background consumer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Long-poll wait per receive call
    #[serde(default = "default_poll_wait_secs")]
    pub poll_wait_secs: i32,
    /// Batch size per receive call
    #[serde(default = "default_max_messages")]
    pub max_messages: i32,
    /// Pause after a failed receive
    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,
    /// Receive once before the loop to pick up messages queued while offline
    #[serde(default = "default_true")]
    pub drain_on_start: bool,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            poll_wait_secs: default_poll_wait_secs(),
            max_messages: default_max_messages(),
            error_backoff_secs: default_error_backoff_secs(),
            drain_on_start: true,
        }
    }
}

impl ConsumerConfig {
    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }
}

/// Provisioning behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    /// Pause after a first-time trust or permission change
    #[serde(default = "default_propagation_delay_secs")]
    pub propagation_delay_secs: u64,
    /// Also set up compliance recording (optional, failures only warn)
    #[serde(default)]
    pub compliance_recording: bool,
    /// Check the home-region rule targets the queue (optional, failures only warn)
    #[serde(default = "default_true")]
    pub verify_wiring: bool,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            propagation_delay_secs: default_propagation_delay_secs(),
            compliance_recording: false,
            verify_wiring: true,
        }
    }
}

impl ProvisioningConfig {
    pub fn propagation_delay(&self) -> Duration {
        Duration::from_secs(self.propagation_delay_secs)
    }
}

fn default_true() -> bool {
    true
}

/// Configuration for one onboarding run
///
/// Composed of focused sub-configs. Loadable from JSON, where every field
/// except the trust pair has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingConfig {
    pub trust: TrustConfig,
    #[serde(default)]
    pub regions: RegionConfig,
    #[serde(default)]
    pub consumer: ConsumerConfig,
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
}

impl OnboardingConfig {
    /// Configuration with defaults for everything but the trust pair
    pub fn new(trust: TrustConfig) -> Self {
        Self {
            trust,
            regions: RegionConfig::default(),
            consumer: ConsumerConfig::default(),
            provisioning: ProvisioningConfig::default(),
        }
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::io(path.display().to_string(), e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Reject configurations that would fail midway through a run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trust.role_arn.trim().is_empty() {
            return Err(ConfigError::EmptyRoleArn);
        }
        if self.trust.external_id.trim().is_empty() {
            return Err(ConfigError::EmptyExternalId);
        }
        if self.trust.session_name.trim().is_empty() {
            return Err(ConfigError::EmptySessionName);
        }
        if !(MIN_SESSION_DURATION_SECS..=MAX_SESSION_DURATION_SECS)
            .contains(&self.trust.session_duration_secs)
        {
            return Err(ConfigError::InvalidSessionDuration(
                self.trust.session_duration_secs,
            ));
        }

        if self.regions.home.trim().is_empty() {
            return Err(ConfigError::EmptyHomeRegion);
        }
        if self.regions.monitored.is_empty() {
            return Err(ConfigError::NoMonitoredRegions);
        }
        let mut seen = HashSet::new();
        for region in &self.regions.monitored {
            if region.trim().is_empty() {
                return Err(ConfigError::EmptyRegion);
            }
            if !seen.insert(region.as_str()) {
                return Err(ConfigError::DuplicateRegion(region.clone()));
            }
        }

        if !(1..=MAX_MESSAGES_LIMIT).contains(&self.consumer.max_messages) {
            return Err(ConfigError::InvalidMaxMessages(self.consumer.max_messages));
        }
        // A zero wait or backoff turns the consumer loop into a busy loop
        if !(1..=MAX_POLL_WAIT_SECS).contains(&self.consumer.poll_wait_secs) {
            return Err(ConfigError::InvalidPollWait(self.consumer.poll_wait_secs));
        }
        if self.consumer.error_backoff_secs == 0 {
            return Err(ConfigError::ZeroErrorBackoff);
        }

        Ok(())
    }

    pub fn home_region(&self) -> &str {
        &self.regions.home
    }

    pub fn monitored_regions(&self) -> &[String] {
        &self.regions.monitored
    }
}
