//! Onboarding, configuration and consumer errors
//!
//! Typed errors for the public boundaries of the crate. AWS client wrappers
//! use `anyhow` internally; those errors are wrapped with the failing step
//! before they reach a caller.

use crate::orchestrator::OnboardingPhase;
use cloudloom_common::NameError;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// trust.role_arn is empty
    #[error("role_arn cannot be empty")]
    EmptyRoleArn,

    /// trust.external_id is empty
    #[error("external_id cannot be empty")]
    EmptyExternalId,

    /// trust.session_name is empty
    #[error("session_name cannot be empty")]
    EmptySessionName,

    /// Session duration outside what the trust service accepts
    #[error("session_duration_secs must be between 900 and 43200, got {0}")]
    InvalidSessionDuration(i32),

    /// regions.home is empty
    #[error("home region cannot be empty")]
    EmptyHomeRegion,

    /// regions.monitored is empty
    #[error("at least one monitored region is required")]
    NoMonitoredRegions,

    /// A monitored region is listed more than once
    #[error("monitored region '{0}' is listed more than once")]
    DuplicateRegion(String),

    /// A monitored region is empty
    #[error("monitored regions cannot contain an empty entry")]
    EmptyRegion,

    /// consumer.max_messages is out of range
    #[error("max_messages must be between 1 and 10, got {0}")]
    InvalidMaxMessages(i32),

    /// consumer.poll_wait_secs is out of range
    #[error("poll_wait_secs must be between 1 and 20, got {0}")]
    InvalidPollWait(i32),

    /// consumer.error_backoff_secs is zero
    #[error("error_backoff_secs must be at least 1")]
    ZeroErrorBackoff,

    /// Failed to parse JSON configuration
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Failed to read configuration file
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors that abort an onboarding run
#[derive(Debug, Error)]
pub enum OnboardingError {
    /// The trust service rejected the role ARN and external id pair
    #[error("trust exchange rejected for role '{role_arn}'")]
    Authentication {
        role_arn: String,
        #[source]
        source: anyhow::Error,
    },

    /// The trust exchange succeeded but returned no usable credentials
    #[error("trust exchange for role '{role_arn}' returned no credentials")]
    CredentialsMissing { role_arn: String },

    /// A required step failed against a control plane
    #[error("step '{step}' failed{}", .region.as_deref().map(|r| format!(" in region {r}")).unwrap_or_default())]
    Reconciliation {
        step: OnboardingPhase,
        region: Option<String>,
        #[source]
        source: anyhow::Error,
    },

    /// The configuration was rejected before any remote call
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The account id could not be turned into resource names
    #[error(transparent)]
    Names(#[from] NameError),
}

impl OnboardingError {
    /// Step that failed, for reconciliation errors
    pub fn step(&self) -> Option<OnboardingPhase> {
        match self {
            OnboardingError::Reconciliation { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Region the failure happened in, for fan-out errors
    pub fn region(&self) -> Option<&str> {
        match self {
            OnboardingError::Reconciliation { region, .. } => region.as_deref(),
            _ => None,
        }
    }
}

/// Attach the failing step to a control-plane error
pub trait StepContext<T> {
    fn at_step(self, step: OnboardingPhase) -> Result<T, OnboardingError>;

    fn at_region_step(self, step: OnboardingPhase, region: &str) -> Result<T, OnboardingError>;
}

impl<T> StepContext<T> for anyhow::Result<T> {
    fn at_step(self, step: OnboardingPhase) -> Result<T, OnboardingError> {
        self.map_err(|source| OnboardingError::Reconciliation {
            step,
            region: None,
            source,
        })
    }

    fn at_region_step(self, step: OnboardingPhase, region: &str) -> Result<T, OnboardingError> {
        self.map_err(|source| OnboardingError::Reconciliation {
            step,
            region: Some(region.to_string()),
            source,
        })
    }
}

/// Errors surfaced when joining the background consumer
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// The consumer task panicked or was aborted
    #[error("consumer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
