//! Default configuration values shared across onboarding components
//!
//! These constants keep the CLI, the configuration file loader and the
//! tests agreeing on the same defaults.

/// Session name passed to the trust exchange
pub const DEFAULT_SESSION_NAME: &str = "CloudLoomSession";

/// Lifetime of assumed credentials in seconds (1 hour)
pub const DEFAULT_SESSION_DURATION_SECS: i32 = 3600;

/// Region hosting the log bucket, the trail and the central queue
pub const DEFAULT_HOME_REGION: &str = "ap-south-1";

/// Regions in which an event rule forwards API activity to the central queue
pub const DEFAULT_MONITORED_REGIONS: &[&str] = &["ap-south-1", "us-east-1"];

/// Delay after a first-time trust or permission change (IAM is eventually consistent)
pub const DEFAULT_PROPAGATION_DELAY_SECS: u64 = 10;

/// Long-poll wait per receive call in seconds
pub const DEFAULT_POLL_WAIT_SECS: i32 = 5;

/// Upper bound the queue service accepts for a long-poll wait
pub const MAX_POLL_WAIT_SECS: i32 = 20;

/// Maximum messages returned by one receive call
pub const DEFAULT_MAX_MESSAGES: i32 = 10;

/// Upper bound the queue service accepts for a batch
pub const MAX_MESSAGES_LIMIT: i32 = 10;

/// Sleep after a failed receive before retrying
pub const DEFAULT_ERROR_BACKOFF_SECS: u64 = 5;

/// Wait used for the one-off drain poll before the main loop
pub const DRAIN_POLL_WAIT_SECS: i32 = 1;

// Serde default functions for struct field defaults

/// Returns the default session name
pub fn default_session_name() -> String {
    DEFAULT_SESSION_NAME.to_string()
}

/// Returns the default session duration
pub fn default_session_duration_secs() -> i32 {
    DEFAULT_SESSION_DURATION_SECS
}

/// Returns the default home region
pub fn default_home_region() -> String {
    DEFAULT_HOME_REGION.to_string()
}

/// Returns the default monitored regions
pub fn default_monitored_regions() -> Vec<String> {
    DEFAULT_MONITORED_REGIONS
        .iter()
        .map(|r| r.to_string())
        .collect()
}

/// Returns the default propagation delay
pub fn default_propagation_delay_secs() -> u64 {
    DEFAULT_PROPAGATION_DELAY_SECS
}

/// Returns the default poll wait
pub fn default_poll_wait_secs() -> i32 {
    DEFAULT_POLL_WAIT_SECS
}

/// Returns the default batch size
pub fn default_max_messages() -> i32 {
    DEFAULT_MAX_MESSAGES
}

/// Returns the default error backoff
pub fn default_error_backoff_secs() -> u64 {
    DEFAULT_ERROR_BACKOFF_SECS
}
