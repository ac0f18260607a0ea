//! Field projector: turns the wide joined table into canonical records.
//!
//! Each canonical column names its candidate source columns, prefixed
//! name first, bare name as fallback. The first candidate present in the
//! joined table supplies the whole column. A column with no candidate
//! present is absent from the output; derived columns are always present.

use crate::{
    record::{CanonicalRecord, CanonicalTable, Field, SlotMut},
    table::Table,
    timestamp,
};

/// Source columns per source-backed field, in preference order.
const FIELD_SOURCES: &[(Field, &[&str])] = &[
    (Field::ReferralDetailsId,   &["id"]),
    (Field::ReferralId,          &["referral_id"]),
    (Field::ReferralSource,      &["referral_source"]),
    (Field::ReferralAt,          &["referral_at"]),
    (Field::ReferrerId,          &["referrer_id"]),
    (Field::ReferrerName,        &["usr_name", "referrer_name"]),
    (Field::ReferrerPhoneNumber, &["usr_phone_number", "referrer_phone"]),
    (Field::ReferrerHomeclub,    &["usr_homeclub", "referrer_homeclub"]),
    (Field::RefereeId,           &["referee_id"]),
    (Field::RefereeName,         &["referee_name"]),
    (Field::RefereePhone,        &["referee_phone"]),
    (Field::ReferralStatus,      &["referral_status"]),
    (Field::NumRewardDays,       &["num_reward_days"]),
    (Field::TransactionId,       &["transaction_id"]),
    (Field::TransactionStatus,   &["tx_transaction_status", "transaction_status"]),
    (Field::TransactionAt,       &["tx_transaction_at", "transaction_at"]),
    (Field::TransactionLocation, &["tx_transaction_location", "transaction_location"]),
    (Field::TransactionType,     &["tx_transaction_type", "transaction_type"]),
    (Field::UpdatedAt,           &["updated_at"]),
    (Field::RewardGrantedAt,     &["urlog_reward_granted_at", "reward_granted_at"]),
    (Field::RewardValue,         &["reward_value"]),
];

const LEAD_CATEGORY: &[&str] = &["lead_source_category"];
const MEMBERSHIP_EXPIRY: &[&str] = &["usr_membership_expired_date"];
const REFERRER_DELETED: &[&str] = &["usr_is_deleted"];
const REWARD_GRANTED: &[&str] = &["urlog_is_reward_granted", "is_reward_granted"];

/// Text tokens read as true. Anything else, including null, is false.
const TRUE_TOKENS: &[&str] = &["1", "true", "yes"];

/// Referral sources with a fixed category.
pub const SOURCE_SIGN_UP: &str = "User Sign Up";
pub const SOURCE_DRAFT_TRANSACTION: &str = "Draft Transaction";
pub const SOURCE_LEAD: &str = "Lead";

/// First candidate column present in `table`.
fn resolve(table: &Table, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|c| table.column_index(c))
}

/// Loose boolean: case-insensitive exact match against the true tokens.
/// Padding is not stripped, so `" yes"` is false.
pub fn truthy(value: Option<&str>) -> bool {
    value
        .map(str::to_lowercase)
        .is_some_and(|v| TRUE_TOKENS.contains(&v.as_str()))
}

/// Category for a referral source. `lead_category` is only consulted for
/// lead referrals.
pub fn source_category(source: Option<&str>, lead_category: Option<&str>) -> Option<String> {
    match source? {
        SOURCE_SIGN_UP => Some("Online".to_string()),
        SOURCE_DRAFT_TRANSACTION => Some("Offline".to_string()),
        SOURCE_LEAD => lead_category.map(str::to_string),
        _ => None,
    }
}

/// Project every joined row into a canonical record. Validity is left
/// false; the evaluator fills it in.
pub fn project(joined: &Table) -> CanonicalTable {
    let sources: Vec<(Field, usize)> = FIELD_SOURCES
        .iter()
        .filter_map(|(field, candidates)| resolve(joined, candidates).map(|idx| (*field, idx)))
        .collect();

    let fields: Vec<Field> = Field::ALL
        .iter()
        .copied()
        .filter(|f| f.is_derived() || sources.iter().any(|(s, _)| s == f))
        .collect();

    let lead_category = resolve(joined, LEAD_CATEGORY);
    let expiry = resolve(joined, MEMBERSHIP_EXPIRY);
    let deleted = resolve(joined, REFERRER_DELETED);
    let granted = resolve(joined, REWARD_GRANTED);

    log::debug!(
        "projecting {} rows: {} of {} columns present",
        joined.len(),
        fields.len(),
        Field::ALL.len()
    );

    let records = joined
        .rows()
        .iter()
        .map(|row| {
            let cell = |idx: usize| row[idx].as_deref();
            let mut record = CanonicalRecord::default();

            for (field, idx) in &sources {
                match record.slot_mut(*field) {
                    SlotMut::Text(slot) => *slot = row[*idx].clone(),
                    SlotMut::Timestamp(slot) => *slot = timestamp::normalize(cell(*idx)),
                    SlotMut::Flag(_) => {}
                }
            }

            record.referral_source_category = source_category(
                record.referral_source.as_deref(),
                lead_category.and_then(cell),
            );

            if let Some(idx) = expiry {
                let expires_at = timestamp::normalize(cell(idx));
                record.referrer_membership_not_expired = match (expires_at, record.referral_at) {
                    (Some(expires_at), Some(referral_at)) => expires_at > referral_at,
                    _ => false,
                };
            }
            if let Some(idx) = deleted {
                record.referrer_not_deleted = !truthy(cell(idx));
            }
            if let Some(idx) = granted {
                record.is_reward_granted = truthy(cell(idx));
            }

            record
        })
        .collect();

    CanonicalTable { fields, records }
}
