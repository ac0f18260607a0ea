//! Aggregator: one summary row per referral id.
//!
//! Each field collapses with its declared reducer (see `Field::reducer`).
//! The fold walks a group's rows in ingestion order, so the first
//! non-null value is always the earliest row's.

use crate::record::{CanonicalRecord, CanonicalTable, Field, Reducer, Slot, SlotMut};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// Collapse event rows into summary rows.
///
/// Returns None when the table has no `referral_id` column. Rows whose
/// `referral_id` is null belong to no group and are left out. Groups come
/// out in ascending `referral_id` order.
pub fn aggregate(events: &CanonicalTable) -> Option<CanonicalTable> {
    if !events.has_field(Field::ReferralId) {
        return None;
    }

    let mut groups: BTreeMap<&str, CanonicalRecord> = BTreeMap::new();
    let mut keyless = 0usize;

    for record in &events.records {
        let Some(key) = record.referral_id.as_deref() else {
            keyless += 1;
            continue;
        };
        match groups.get_mut(key) {
            Some(acc) => merge(acc, record, &events.fields),
            None => {
                groups.insert(key, record.clone());
            }
        }
    }

    if keyless > 0 {
        log::warn!("{keyless} event rows have no referral_id and are left out of the summary");
    }

    let mut fields = vec![Field::ReferralId];
    fields.extend(events.fields.iter().copied().filter(|f| *f != Field::ReferralId));

    Some(CanonicalTable {
        fields,
        records: groups.into_values().collect(),
    })
}

/// Fold `next` into `acc` field by field.
pub fn merge(acc: &mut CanonicalRecord, next: &CanonicalRecord, fields: &[Field]) {
    for &field in fields {
        let reducer = field.reducer();
        match (acc.slot_mut(field), reducer) {
            (SlotMut::Timestamp(slot), Reducer::Latest) => {
                let incoming = timestamp_of(next, field);
                *slot = match (*slot, incoming) {
                    (Some(a), Some(b)) => Some(a.max(b)),
                    (a, b) => a.or(b),
                };
            }
            (SlotMut::Flag(slot), Reducer::Any) => {
                *slot = *slot || flag_of(next, field);
            }
            (SlotMut::Text(slot), Reducer::FirstNonNull) => {
                if slot.is_none() {
                    *slot = text_of(next, field);
                }
            }
            (SlotMut::Timestamp(slot), Reducer::FirstNonNull) => {
                if slot.is_none() {
                    *slot = timestamp_of(next, field);
                }
            }
            // Flags are never null, so first-non-null is the first row's value.
            _ => {}
        }
    }
}

fn text_of(record: &CanonicalRecord, field: Field) -> Option<String> {
    match record.slot(field) {
        Slot::Text(v) => v.map(str::to_string),
        _ => None,
    }
}

fn timestamp_of(record: &CanonicalRecord, field: Field) -> Option<NaiveDateTime> {
    match record.slot(field) {
        Slot::Timestamp(v) => v,
        _ => None,
    }
}

fn flag_of(record: &CanonicalRecord, field: Field) -> bool {
    matches!(record.slot(field), Slot::Flag(true))
}
