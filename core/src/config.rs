use crate::error::{ReconError, ReconResult};
use crate::loader::SourceTable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ── Source file discovery ──────────────────────────────────────────

/// File-name aliases per source table. The first alias found on disk wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SourceFilesConfig {
    pub lead_log: Vec<String>,
    pub paid_transactions: Vec<String>,
    pub referral_rewards: Vec<String>,
    pub user_logs: Vec<String>,
    pub user_referral_logs: Vec<String>,
    pub user_referral_statuses: Vec<String>,
    pub user_referrals: Vec<String>,
}

impl Default for SourceFilesConfig {
    fn default() -> Self {
        Self {
            lead_log: names(&["lead_log.csv", "lead_logs.csv"]),
            paid_transactions: names(&["paid_transactions.csv", "paid_transaction.csv"]),
            referral_rewards: names(&["referral_rewards.csv"]),
            user_logs: names(&["user_logs.csv"]),
            user_referral_logs: names(&["user_referral_logs.csv"]),
            user_referral_statuses: names(&["user_referral_statuses.csv"]),
            user_referrals: names(&["user_referrals.csv"]),
        }
    }
}

impl SourceFilesConfig {
    pub fn aliases(&self, table: SourceTable) -> &[String] {
        match table {
            SourceTable::LeadLog              => &self.lead_log,
            SourceTable::PaidTransactions     => &self.paid_transactions,
            SourceTable::ReferralRewards      => &self.referral_rewards,
            SourceTable::UserLogs             => &self.user_logs,
            SourceTable::UserReferralLogs     => &self.user_referral_logs,
            SourceTable::UserReferralStatuses => &self.user_referral_statuses,
            SourceTable::UserReferrals        => &self.user_referrals,
        }
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ── Pipeline ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub sources: SourceFilesConfig,
    pub report_file: String,
    pub summary_file: String,
    /// Warn when the summary row count differs. Never fatal.
    pub expected_summary_rows: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("DE Dataset - Intern"),
            output_dir: PathBuf::from("output"),
            sources: SourceFilesConfig::default(),
            report_file: "final_referral_report.csv".into(),
            summary_file: "final_referral_report_46.csv".into(),
            expected_summary_rows: None,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file. Missing keys fall back to defaults.
    pub fn load(path: &str) -> ReconResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ReconError::io(path, e))?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_file)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(&self.summary_file)
    }
}
