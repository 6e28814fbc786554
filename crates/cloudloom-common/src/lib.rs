//! cloudloom-common - Shared types and utilities
//!
//! This crate holds the pieces of onboarding that do not talk to AWS,
//! without any AWS SDK dependencies to keep it lightweight.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values
//! - [`names`]: Deterministic resource names derived from an account id
//! - [`policy`]: IAM and resource policy documents
//! - [`queue_info`]: The finished queue description handed to the consumer
//! - [`resource_kind`]: Managed resource kinds and their reuse policy

pub mod defaults;
pub mod names;
pub mod policy;
pub mod queue_info;
pub mod resource_kind;

// Re-export commonly used types
pub use names::{NameError, ResourceNameSet};
pub use queue_info::QueueInfo;
pub use resource_kind::{ResourceKind, ReusePolicy};
