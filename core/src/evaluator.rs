//! Validity evaluator: decides whether one referral event's
//! referral-to-reward chain is internally consistent.
//!
//! Evaluation order:
//!   1. Parse the loosely typed inputs into `RuleInputs`.
//!   2. Check every invalidity override.
//!   3. Check the two positive conditions.
//!   4. Valid iff no override fired AND (success OR non-conversion).
//!
//! Overrides dominate. A row that satisfies the success condition but
//! trips any override is invalid.

use crate::record::CanonicalRecord;
use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

pub const STATUS_SUCCEEDED: &str = "Berhasil";
pub const STATUS_WAITING: &str = "Menunggu";
pub const STATUS_FAILED: &str = "Tidak Berhasil";
pub const TX_STATUS_PAID: &str = "PAID";
pub const TX_TYPE_NEW: &str = "NEW";

/// Strongly typed view of the fields the rule reads.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleInputs {
    pub reward_value: Option<f64>,
    pub referral_status: String,
    pub transaction_status: String,
    pub transaction_type: String,
    pub has_transaction: bool,
    pub transaction_at: Option<NaiveDateTime>,
    pub referral_at: Option<NaiveDateTime>,
    pub membership_not_expired: bool,
    pub referrer_not_deleted: bool,
    pub reward_granted: bool,
}

impl RuleInputs {
    pub fn from_record(record: &CanonicalRecord) -> Self {
        Self {
            reward_value: parse_reward(record.reward_value.as_deref()),
            referral_status: trimmed(record.referral_status.as_deref()),
            transaction_status: trimmed(record.transaction_status.as_deref()).to_uppercase(),
            transaction_type: trimmed(record.transaction_type.as_deref()).to_uppercase(),
            has_transaction: record.transaction_id.is_some(),
            transaction_at: record.transaction_at,
            referral_at: record.referral_at,
            membership_not_expired: record.referrer_membership_not_expired,
            referrer_not_deleted: record.referrer_not_deleted,
            reward_granted: record.is_reward_granted,
        }
    }

    fn has_reward(&self) -> bool {
        self.reward_value.is_some_and(|v| v > 0.0)
    }

    /// Null or exactly zero.
    fn no_reward(&self) -> bool {
        self.reward_value.map_or(true, |v| v == 0.0)
    }

    fn is_paid(&self) -> bool {
        self.transaction_status == TX_STATUS_PAID
    }

    fn succeeded(&self) -> bool {
        self.referral_status == STATUS_SUCCEEDED
    }
}

/// Numeric reward. Missing, empty, non-numeric and NaN are all null.
/// Infinities stay numbers: `inf` is a reward, `-inf` is not.
pub fn parse_reward(value: Option<&str>) -> Option<f64> {
    value?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| !v.is_nan())
}

fn trimmed(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

/// An invalidity override. Any one of these makes the row invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Override {
    /// Reward paid but the referral did not succeed.
    RewardWithoutSuccess,
    /// Reward paid with no transaction behind it.
    RewardWithoutTransaction,
    /// Paid transaction but no reward.
    PaidWithoutReward,
    /// Referral succeeded but no reward.
    SuccessWithoutReward,
    /// Transaction happened before the referral.
    TransactionBeforeReferral,
}

impl Override {
    pub const ALL: [Override; 5] = [
        Override::RewardWithoutSuccess,
        Override::RewardWithoutTransaction,
        Override::PaidWithoutReward,
        Override::SuccessWithoutReward,
        Override::TransactionBeforeReferral,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::RewardWithoutSuccess      => "reward_without_success",
            Self::RewardWithoutTransaction  => "reward_without_transaction",
            Self::PaidWithoutReward         => "paid_without_reward",
            Self::SuccessWithoutReward      => "success_without_reward",
            Self::TransactionBeforeReferral => "transaction_before_referral",
        }
    }

    pub fn fires(&self, inputs: &RuleInputs) -> bool {
        match self {
            Self::RewardWithoutSuccess => inputs.has_reward() && !inputs.succeeded(),
            Self::RewardWithoutTransaction => inputs.has_reward() && !inputs.has_transaction,
            Self::PaidWithoutReward => {
                inputs.no_reward() && inputs.has_transaction && inputs.is_paid()
            }
            Self::SuccessWithoutReward => inputs.succeeded() && inputs.no_reward(),
            Self::TransactionBeforeReferral => match (inputs.transaction_at, inputs.referral_at) {
                (Some(tx_at), Some(ref_at)) => tx_at < ref_at,
                _ => false,
            },
        }
    }
}

/// Condition A: a rewarded, paid, new-customer conversion in the same
/// month as the referral, by a live referrer, with the reward granted.
pub fn is_valid_success(inputs: &RuleInputs) -> bool {
    if !(inputs.has_reward()
        && inputs.succeeded()
        && inputs.has_transaction
        && inputs.is_paid()
        && inputs.transaction_type == TX_TYPE_NEW)
    {
        return false;
    }

    let (tx_at, ref_at) = match (inputs.transaction_at, inputs.referral_at) {
        (Some(tx_at), Some(ref_at)) => (tx_at, ref_at),
        _ => return false,
    };
    let same_month = tx_at.year() == ref_at.year() && tx_at.month() == ref_at.month();

    same_month
        && tx_at >= ref_at
        && inputs.membership_not_expired
        && inputs.referrer_not_deleted
        && inputs.reward_granted
}

/// Condition B: a referral still waiting or failed, with no reward.
pub fn is_valid_non_conversion(inputs: &RuleInputs) -> bool {
    let pending_or_failed =
        inputs.referral_status == STATUS_WAITING || inputs.referral_status == STATUS_FAILED;
    pending_or_failed && inputs.no_reward()
}

/// Full outcome of the rule for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub overrides: Vec<Override>,
    pub valid_success: bool,
    pub valid_non_conversion: bool,
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        self.overrides.is_empty() && (self.valid_success || self.valid_non_conversion)
    }
}

pub fn assess(record: &CanonicalRecord) -> Verdict {
    let inputs = RuleInputs::from_record(record);
    Verdict {
        overrides: Override::ALL
            .iter()
            .copied()
            .filter(|o| o.fires(&inputs))
            .collect(),
        valid_success: is_valid_success(&inputs),
        valid_non_conversion: is_valid_non_conversion(&inputs),
    }
}

/// The business-validity flag for one record.
pub fn evaluate(record: &CanonicalRecord) -> bool {
    assess(record).is_valid()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_parsing_is_lenient() {
        assert_eq!(parse_reward(Some(" 50 ")), Some(50.0));
        assert_eq!(parse_reward(Some("12.5")), Some(12.5));
        assert_eq!(parse_reward(Some("abc")), None);
        assert_eq!(parse_reward(Some("NaN")), None);
        assert_eq!(parse_reward(Some("inf")), Some(f64::INFINITY));
        assert_eq!(parse_reward(Some("1e309")), Some(f64::INFINITY));
        assert_eq!(parse_reward(Some("")), None);
        assert_eq!(parse_reward(None), None);
    }

    #[test]
    fn transaction_fields_are_case_folded() {
        let record = CanonicalRecord {
            transaction_status: Some(" paid ".into()),
            transaction_type: Some("new".into()),
            ..Default::default()
        };
        let inputs = RuleInputs::from_record(&record);
        assert_eq!(inputs.transaction_status, "PAID");
        assert_eq!(inputs.transaction_type, "NEW");
    }

    #[test]
    fn referral_status_is_trimmed_but_not_folded() {
        let record = CanonicalRecord {
            referral_status: Some("  berhasil ".into()),
            ..Default::default()
        };
        let inputs = RuleInputs::from_record(&record);
        assert_eq!(inputs.referral_status, "berhasil");
        assert!(!inputs.succeeded());
    }

    #[test]
    fn empty_record_is_invalid_without_overrides() {
        let verdict = assess(&CanonicalRecord::default());
        assert!(verdict.overrides.is_empty());
        assert!(!verdict.is_valid());
    }
}
