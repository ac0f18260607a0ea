//! Shared primitive types used across every pipeline stage.

/// One cell of a source or joined table. Empty text is always `None`.
pub type Cell = Option<String>;

/// Identifier of a single pipeline run, used to tag log lines.
pub type RunId = String;

/// Column-name prefixes applied to auxiliary tables before merging.
pub const REFERRAL_LOG_PREFIX: &str = "urlog_";
pub const TRANSACTION_PREFIX: &str = "tx_";
pub const LEAD_PREFIX: &str = "lead_";
pub const USER_PREFIX: &str = "usr_";
