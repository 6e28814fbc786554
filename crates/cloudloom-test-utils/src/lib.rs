//! Shared test utilities for CloudLoom
//!
//! Helpers used by the ignored live-AWS integration tests.
//!
//! ## Modules
//!
//! - [`aws`]: Region detection, trust role lookup and unique test ids

pub mod aws;

// Re-export commonly used items
pub use aws::{TestTrust, get_test_region, test_run_id, test_trust};
