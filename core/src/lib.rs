//! Referral program reconciliation.
//!
//! Joins the raw referral tables into one canonical record per referral
//! event, decides whether each referral-to-reward chain is consistent, and
//! collapses the events into one summary row per referral.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod join;
pub mod loader;
pub mod pipeline;
pub mod projector;
pub mod record;
pub mod report;
pub mod summary;
pub mod table;
pub mod timestamp;
pub mod types;
