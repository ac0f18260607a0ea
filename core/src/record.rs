//! The canonical record (one typed row per referral event) and the
//! output schema both reports share.

use crate::timestamp;
use chrono::NaiveDateTime;
use serde::Serialize;

/// Every canonical column, declared in report order.
/// NEVER reorder: the event report's column order is this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ReferralDetailsId,
    ReferralId,
    ReferralSource,
    ReferralSourceCategory,
    ReferralAt,
    ReferrerId,
    ReferrerName,
    ReferrerPhoneNumber,
    ReferrerHomeclub,
    RefereeId,
    RefereeName,
    RefereePhone,
    ReferralStatus,
    NumRewardDays,
    TransactionId,
    TransactionStatus,
    TransactionAt,
    TransactionLocation,
    TransactionType,
    UpdatedAt,
    RewardGrantedAt,
    RewardValue,
    ReferrerMembershipNotExpired,
    ReferrerNotDeleted,
    IsRewardGranted,
    IsBusinessLogicValid,
}

/// How the aggregator collapses one field across a referral's events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Latest non-null timestamp.
    Latest,
    /// True if any event is true.
    Any,
    /// First non-null value in ingestion order.
    FirstNonNull,
}

impl Field {
    pub const ALL: [Field; 26] = [
        Field::ReferralDetailsId,
        Field::ReferralId,
        Field::ReferralSource,
        Field::ReferralSourceCategory,
        Field::ReferralAt,
        Field::ReferrerId,
        Field::ReferrerName,
        Field::ReferrerPhoneNumber,
        Field::ReferrerHomeclub,
        Field::RefereeId,
        Field::RefereeName,
        Field::RefereePhone,
        Field::ReferralStatus,
        Field::NumRewardDays,
        Field::TransactionId,
        Field::TransactionStatus,
        Field::TransactionAt,
        Field::TransactionLocation,
        Field::TransactionType,
        Field::UpdatedAt,
        Field::RewardGrantedAt,
        Field::RewardValue,
        Field::ReferrerMembershipNotExpired,
        Field::ReferrerNotDeleted,
        Field::IsRewardGranted,
        Field::IsBusinessLogicValid,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ReferralDetailsId            => "referral_details_id",
            Self::ReferralId                   => "referral_id",
            Self::ReferralSource               => "referral_source",
            Self::ReferralSourceCategory       => "referral_source_category",
            Self::ReferralAt                   => "referral_at",
            Self::ReferrerId                   => "referrer_id",
            Self::ReferrerName                 => "referrer_name",
            Self::ReferrerPhoneNumber          => "referrer_phone_number",
            Self::ReferrerHomeclub             => "referrer_homeclub",
            Self::RefereeId                    => "referee_id",
            Self::RefereeName                  => "referee_name",
            Self::RefereePhone                 => "referee_phone",
            Self::ReferralStatus               => "referral_status",
            Self::NumRewardDays                => "num_reward_days",
            Self::TransactionId                => "transaction_id",
            Self::TransactionStatus            => "transaction_status",
            Self::TransactionAt                => "transaction_at",
            Self::TransactionLocation          => "transaction_location",
            Self::TransactionType              => "transaction_type",
            Self::UpdatedAt                    => "updated_at",
            Self::RewardGrantedAt              => "reward_granted_at",
            Self::RewardValue                  => "reward_value",
            Self::ReferrerMembershipNotExpired => "referrer_membership_not_expired",
            Self::ReferrerNotDeleted           => "referrer_not_deleted",
            Self::IsRewardGranted              => "is_reward_granted",
            Self::IsBusinessLogicValid         => "is_business_logic_valid",
        }
    }

    pub fn reducer(&self) -> Reducer {
        match self {
            Self::ReferralAt | Self::TransactionAt | Self::UpdatedAt | Self::RewardGrantedAt => {
                Reducer::Latest
            }
            Self::IsBusinessLogicValid => Reducer::Any,
            _ => Reducer::FirstNonNull,
        }
    }

    /// Derived columns exist regardless of which sources were present.
    pub fn is_derived(&self) -> bool {
        matches!(
            self,
            Self::ReferralSourceCategory
                | Self::ReferrerMembershipNotExpired
                | Self::ReferrerNotDeleted
                | Self::IsRewardGranted
                | Self::IsBusinessLogicValid
        )
    }
}

/// Borrowed view of one field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'a> {
    Text(Option<&'a str>),
    Timestamp(Option<NaiveDateTime>),
    Flag(bool),
}

impl Slot<'_> {
    pub fn is_null(&self) -> bool {
        match self {
            Slot::Text(v) => v.is_none(),
            Slot::Timestamp(v) => v.is_none(),
            Slot::Flag(_) => false,
        }
    }

    /// Render for CSV output. Null renders as None (an empty cell).
    pub fn render(&self) -> Option<String> {
        match self {
            Slot::Text(v) => v.map(str::to_string),
            Slot::Timestamp(v) => v.as_ref().map(timestamp::format),
            Slot::Flag(true) => Some("True".to_string()),
            Slot::Flag(false) => Some("False".to_string()),
        }
    }
}

/// Mutable view of one field, used by the aggregator's reducers.
#[derive(Debug)]
pub enum SlotMut<'a> {
    Text(&'a mut Option<String>),
    Timestamp(&'a mut Option<NaiveDateTime>),
    Flag(&'a mut bool),
}

/// One denormalized referral event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRecord {
    pub referral_details_id: Option<String>,
    pub referral_id: Option<String>,
    pub referral_source: Option<String>,
    pub referral_source_category: Option<String>,
    pub referral_at: Option<NaiveDateTime>,
    pub referrer_id: Option<String>,
    pub referrer_name: Option<String>,
    pub referrer_phone_number: Option<String>,
    pub referrer_homeclub: Option<String>,
    pub referee_id: Option<String>,
    pub referee_name: Option<String>,
    pub referee_phone: Option<String>,
    pub referral_status: Option<String>,
    pub num_reward_days: Option<String>,
    pub transaction_id: Option<String>,
    pub transaction_status: Option<String>,
    pub transaction_at: Option<NaiveDateTime>,
    pub transaction_location: Option<String>,
    pub transaction_type: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
    pub reward_granted_at: Option<NaiveDateTime>,
    pub reward_value: Option<String>,
    pub referrer_membership_not_expired: bool,
    pub referrer_not_deleted: bool,
    pub is_reward_granted: bool,
    pub is_business_logic_valid: bool,
}

impl Default for CanonicalRecord {
    /// All nullable fields null; flags at their missing-source defaults
    /// (membership and deletion pass, reward-granted fails).
    fn default() -> Self {
        Self {
            referral_details_id: None,
            referral_id: None,
            referral_source: None,
            referral_source_category: None,
            referral_at: None,
            referrer_id: None,
            referrer_name: None,
            referrer_phone_number: None,
            referrer_homeclub: None,
            referee_id: None,
            referee_name: None,
            referee_phone: None,
            referral_status: None,
            num_reward_days: None,
            transaction_id: None,
            transaction_status: None,
            transaction_at: None,
            transaction_location: None,
            transaction_type: None,
            updated_at: None,
            reward_granted_at: None,
            reward_value: None,
            referrer_membership_not_expired: true,
            referrer_not_deleted: true,
            is_reward_granted: false,
            is_business_logic_valid: false,
        }
    }
}

impl CanonicalRecord {
    pub fn slot(&self, field: Field) -> Slot<'_> {
        match field {
            Field::ReferralDetailsId            => Slot::Text(self.referral_details_id.as_deref()),
            Field::ReferralId                   => Slot::Text(self.referral_id.as_deref()),
            Field::ReferralSource               => Slot::Text(self.referral_source.as_deref()),
            Field::ReferralSourceCategory       => Slot::Text(self.referral_source_category.as_deref()),
            Field::ReferralAt                   => Slot::Timestamp(self.referral_at),
            Field::ReferrerId                   => Slot::Text(self.referrer_id.as_deref()),
            Field::ReferrerName                 => Slot::Text(self.referrer_name.as_deref()),
            Field::ReferrerPhoneNumber          => Slot::Text(self.referrer_phone_number.as_deref()),
            Field::ReferrerHomeclub             => Slot::Text(self.referrer_homeclub.as_deref()),
            Field::RefereeId                    => Slot::Text(self.referee_id.as_deref()),
            Field::RefereeName                  => Slot::Text(self.referee_name.as_deref()),
            Field::RefereePhone                 => Slot::Text(self.referee_phone.as_deref()),
            Field::ReferralStatus               => Slot::Text(self.referral_status.as_deref()),
            Field::NumRewardDays                => Slot::Text(self.num_reward_days.as_deref()),
            Field::TransactionId                => Slot::Text(self.transaction_id.as_deref()),
            Field::TransactionStatus            => Slot::Text(self.transaction_status.as_deref()),
            Field::TransactionAt                => Slot::Timestamp(self.transaction_at),
            Field::TransactionLocation          => Slot::Text(self.transaction_location.as_deref()),
            Field::TransactionType              => Slot::Text(self.transaction_type.as_deref()),
            Field::UpdatedAt                    => Slot::Timestamp(self.updated_at),
            Field::RewardGrantedAt              => Slot::Timestamp(self.reward_granted_at),
            Field::RewardValue                  => Slot::Text(self.reward_value.as_deref()),
            Field::ReferrerMembershipNotExpired => Slot::Flag(self.referrer_membership_not_expired),
            Field::ReferrerNotDeleted           => Slot::Flag(self.referrer_not_deleted),
            Field::IsRewardGranted              => Slot::Flag(self.is_reward_granted),
            Field::IsBusinessLogicValid         => Slot::Flag(self.is_business_logic_valid),
        }
    }

    pub fn slot_mut(&mut self, field: Field) -> SlotMut<'_> {
        match field {
            Field::ReferralDetailsId            => SlotMut::Text(&mut self.referral_details_id),
            Field::ReferralId                   => SlotMut::Text(&mut self.referral_id),
            Field::ReferralSource               => SlotMut::Text(&mut self.referral_source),
            Field::ReferralSourceCategory       => SlotMut::Text(&mut self.referral_source_category),
            Field::ReferralAt                   => SlotMut::Timestamp(&mut self.referral_at),
            Field::ReferrerId                   => SlotMut::Text(&mut self.referrer_id),
            Field::ReferrerName                 => SlotMut::Text(&mut self.referrer_name),
            Field::ReferrerPhoneNumber          => SlotMut::Text(&mut self.referrer_phone_number),
            Field::ReferrerHomeclub             => SlotMut::Text(&mut self.referrer_homeclub),
            Field::RefereeId                    => SlotMut::Text(&mut self.referee_id),
            Field::RefereeName                  => SlotMut::Text(&mut self.referee_name),
            Field::RefereePhone                 => SlotMut::Text(&mut self.referee_phone),
            Field::ReferralStatus               => SlotMut::Text(&mut self.referral_status),
            Field::NumRewardDays                => SlotMut::Text(&mut self.num_reward_days),
            Field::TransactionId                => SlotMut::Text(&mut self.transaction_id),
            Field::TransactionStatus            => SlotMut::Text(&mut self.transaction_status),
            Field::TransactionAt                => SlotMut::Timestamp(&mut self.transaction_at),
            Field::TransactionLocation          => SlotMut::Text(&mut self.transaction_location),
            Field::TransactionType              => SlotMut::Text(&mut self.transaction_type),
            Field::UpdatedAt                    => SlotMut::Timestamp(&mut self.updated_at),
            Field::RewardGrantedAt              => SlotMut::Timestamp(&mut self.reward_granted_at),
            Field::RewardValue                  => SlotMut::Text(&mut self.reward_value),
            Field::ReferrerMembershipNotExpired => SlotMut::Flag(&mut self.referrer_membership_not_expired),
            Field::ReferrerNotDeleted           => SlotMut::Flag(&mut self.referrer_not_deleted),
            Field::IsRewardGranted              => SlotMut::Flag(&mut self.is_reward_granted),
            Field::IsBusinessLogicValid         => SlotMut::Flag(&mut self.is_business_logic_valid),
        }
    }
}

/// A set of canonical records plus the columns that are actually present.
/// Used for both the event report and the per-referral summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalTable {
    pub fields: Vec<Field>,
    pub records: Vec<CanonicalRecord>,
}

impl CanonicalTable {
    pub fn has_field(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn header(&self) -> Vec<&'static str> {
        self.fields.iter().map(Field::name).collect()
    }

    /// Rendered cells, one vec per record, in `fields` order.
    pub fn rendered_rows(&self) -> Vec<Vec<Option<String>>> {
        self.records
            .iter()
            .map(|r| self.fields.iter().map(|f| r.slot(*f).render()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_are_unique_and_ordered() {
        let names: Vec<_> = Field::ALL.iter().map(Field::name).collect();
        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(names.len(), deduped.len());
        assert_eq!(names.first(), Some(&"referral_details_id"));
        assert_eq!(names.last(), Some(&"is_business_logic_valid"));
    }

    #[test]
    fn only_timestamps_reduce_to_latest() {
        let latest: Vec<_> = Field::ALL
            .iter()
            .filter(|f| f.reducer() == Reducer::Latest)
            .map(Field::name)
            .collect();
        assert_eq!(
            latest,
            vec!["referral_at", "transaction_at", "updated_at", "reward_granted_at"]
        );
    }

    #[test]
    fn default_flags_keep_their_polarity() {
        let record = CanonicalRecord::default();
        assert!(record.referrer_membership_not_expired);
        assert!(record.referrer_not_deleted);
        assert!(!record.is_reward_granted);
    }

    #[test]
    fn flags_render_capitalized() {
        assert_eq!(Slot::Flag(true).render().as_deref(), Some("True"));
        assert_eq!(Slot::Text(None).render(), None);
    }
}
