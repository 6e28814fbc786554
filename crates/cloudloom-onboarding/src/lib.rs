//! cloudloom-onboarding - Cross-account AWS onboarding
//!
//! This crate provisions the infrastructure that routes a customer account's
//! API activity into a central finding queue, then consumes that queue in
//! the background.
//!
//! ## Modules
//!
//! - [`aws`]: SDK client wrappers and the control-plane traits they implement
//! - [`config`]: Explicit per-run configuration
//! - [`reconcile`]: Describe-then-create-or-reuse reconcilers per resource kind
//! - [`fanout`]: Sequential per-region event rule reconciliation
//! - [`orchestrator`]: The onboarding state machine
//! - [`consumer`]: The supervised queue consumer

pub mod aws;
pub mod config;
pub mod consumer;
pub mod error;
pub mod fanout;
pub mod orchestrator;
pub mod reconcile;
pub mod wait;

#[cfg(test)]
pub(crate) mod testing;
