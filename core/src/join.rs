//! Record joiner: six left joins onto the base referral table.
//!
//! The plan is static: each join declares its source table, keys, gate
//! and column policy up front. At run time a join either passes its
//! capability check and is applied, or is skipped with a reason.
//!
//! RULES:
//!   - Every join is a left join. No base row is ever dropped.
//!   - Matches fan out in right-table order; left order is preserved.
//!   - Null keys never match.
//!   - On a bare-name collision the left-hand column wins.

use crate::{
    loader::{SourceTable, SourceTables},
    table::Table,
    types::{Cell, LEAD_PREFIX, REFERRAL_LOG_PREFIX, TRANSACTION_PREFIX, USER_PREFIX},
};
use serde::Serialize;
use std::collections::HashMap;

/// Which right-hand columns a join brings in, and under what names.
#[derive(Debug, Clone, Copy)]
pub enum ColumnPolicy {
    /// Every column, renamed with a prefix. The key is matched under its
    /// original name.
    Prefixed(&'static str),
    /// Every non-key column under its own name.
    Bare,
    /// Only the listed `(source, target)` columns.
    Renamed(&'static [(&'static str, &'static str)]),
}

#[derive(Debug, Clone, Copy)]
pub struct JoinSpec {
    pub name: &'static str,
    pub source: SourceTable,
    /// Candidate left key columns; the first one present is used.
    pub left_keys: &'static [&'static str],
    pub right_key: &'static str,
    /// Left column that must exist for the join to run at all.
    pub gate: Option<&'static str>,
    pub columns: ColumnPolicy,
}

/// The join plan, in execution order. NEVER reorder: later projections
/// rely on earlier joins' column names.
pub const JOIN_PLAN: [JoinSpec; 6] = [
    JoinSpec {
        name: "referral_status",
        source: SourceTable::UserReferralStatuses,
        left_keys: &["user_referral_status_id"],
        right_key: "id",
        gate: None,
        columns: ColumnPolicy::Renamed(&[("description", "referral_status")]),
    },
    JoinSpec {
        name: "referral_reward",
        source: SourceTable::ReferralRewards,
        left_keys: &["referral_reward_id"],
        right_key: "id",
        gate: None,
        columns: ColumnPolicy::Bare,
    },
    JoinSpec {
        name: "referral_log",
        source: SourceTable::UserReferralLogs,
        left_keys: &["referral_id", "id"],
        right_key: "user_referral_id",
        gate: None,
        columns: ColumnPolicy::Prefixed(REFERRAL_LOG_PREFIX),
    },
    JoinSpec {
        name: "paid_transaction",
        source: SourceTable::PaidTransactions,
        left_keys: &["transaction_id"],
        right_key: "transaction_id",
        gate: None,
        columns: ColumnPolicy::Prefixed(TRANSACTION_PREFIX),
    },
    JoinSpec {
        name: "lead",
        source: SourceTable::LeadLog,
        left_keys: &["referee_id"],
        right_key: "lead_id",
        gate: Some("referral_source"),
        columns: ColumnPolicy::Prefixed(LEAD_PREFIX),
    },
    JoinSpec {
        name: "referrer_profile",
        source: SourceTable::UserLogs,
        left_keys: &["referrer_id"],
        right_key: "user_id",
        gate: None,
        columns: ColumnPolicy::Prefixed(USER_PREFIX),
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "column", rename_all = "snake_case")]
pub enum SkipReason {
    EmptySource,
    GateMissing(String),
    LeftKeyMissing(String),
    RightKeyMissing(String),
    NoColumns,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySource          => write!(f, "source table is empty"),
            Self::GateMissing(c)       => write!(f, "base table has no '{c}' column"),
            Self::LeftKeyMissing(c)    => write!(f, "left key '{c}' missing"),
            Self::RightKeyMissing(c)   => write!(f, "right key '{c}' missing"),
            Self::NoColumns            => write!(f, "no columns to bring in"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinOutcome {
    pub name: &'static str,
    pub rows_before: usize,
    pub rows_after: usize,
    pub skipped: Option<SkipReason>,
}

impl JoinOutcome {
    pub fn applied(&self) -> bool {
        self.skipped.is_none()
    }
}

/// Right-hand columns selected for one join: source index and output name.
struct Selection {
    key_index: usize,
    columns: Vec<(usize, String)>,
}

/// Apply the whole plan to the base table.
pub fn join_all(sources: &SourceTables) -> (Table, Vec<JoinOutcome>) {
    let mut joined = sources.referrals();
    let mut outcomes = Vec::with_capacity(JOIN_PLAN.len());

    for spec in &JOIN_PLAN {
        let right = sources.get(spec.source);
        let (next, outcome) = apply(&joined, right, spec);
        match &outcome.skipped {
            None => log::info!(
                "join {}: {} -> {} rows",
                spec.name,
                outcome.rows_before,
                outcome.rows_after
            ),
            Some(reason) => log::info!("join {} skipped: {reason}", spec.name),
        }
        outcomes.push(outcome);
        if let Some(next) = next {
            joined = next;
        }
    }

    (joined, outcomes)
}

/// Apply one join. Returns None for the table when the join was skipped.
pub fn apply(left: &Table, right: Option<&Table>, spec: &JoinSpec) -> (Option<Table>, JoinOutcome) {
    let mut outcome = JoinOutcome {
        name: spec.name,
        rows_before: left.len(),
        rows_after: left.len(),
        skipped: None,
    };

    match check(left, right, spec) {
        Err(reason) => {
            outcome.skipped = Some(reason);
            (None, outcome)
        }
        Ok((right, left_key, selection)) => {
            let joined = left_join(left, left_key, right, &selection);
            outcome.rows_after = joined.len();
            (Some(joined), outcome)
        }
    }
}

/// Capability check: the join runs only if every input it needs exists.
fn check<'r>(
    left: &Table,
    right: Option<&'r Table>,
    spec: &JoinSpec,
) -> Result<(&'r Table, usize, Selection), SkipReason> {
    let right = match right {
        Some(t) if !t.is_empty() => t,
        _ => return Err(SkipReason::EmptySource),
    };

    if let Some(gate) = spec.gate {
        if !left.has_column(gate) {
            return Err(SkipReason::GateMissing(gate.to_string()));
        }
    }

    let left_key = spec
        .left_keys
        .iter()
        .find_map(|k| left.column_index(k))
        .ok_or_else(|| SkipReason::LeftKeyMissing(spec.left_keys.join(" | ")))?;

    let key_index = right
        .column_index(spec.right_key)
        .ok_or_else(|| SkipReason::RightKeyMissing(spec.right_key.to_string()))?;

    let columns = select_columns(left, right, key_index, spec.columns);
    if columns.is_empty() {
        return Err(SkipReason::NoColumns);
    }

    Ok((right, left_key, Selection { key_index, columns }))
}

fn select_columns(
    left: &Table,
    right: &Table,
    key_index: usize,
    policy: ColumnPolicy,
) -> Vec<(usize, String)> {
    let candidates: Vec<(usize, String)> = match policy {
        ColumnPolicy::Prefixed(prefix) => right
            .columns()
            .iter()
            .enumerate()
            .map(|(i, c)| (i, format!("{prefix}{c}")))
            .collect(),
        ColumnPolicy::Bare => right
            .columns()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != key_index)
            .map(|(i, c)| (i, c.clone()))
            .collect(),
        ColumnPolicy::Renamed(pairs) => pairs
            .iter()
            .filter_map(|(src, dst)| right.column_index(src).map(|i| (i, dst.to_string())))
            .collect(),
    };

    // Left wins on collision, and so does the first right-hand duplicate.
    let mut taken: Vec<String> = left.columns().to_vec();
    let mut selected = Vec::with_capacity(candidates.len());
    for (idx, name) in candidates {
        if taken.contains(&name) {
            log::debug!("column '{name}' already present; keeping the left-hand one");
            continue;
        }
        taken.push(name.clone());
        selected.push((idx, name));
    }
    selected
}

fn left_join(left: &Table, left_key: usize, right: &Table, selection: &Selection) -> Table {
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (row_idx, row) in right.rows().iter().enumerate() {
        if let Some(key) = row[selection.key_index].as_deref() {
            index.entry(key).or_default().push(row_idx);
        }
    }

    let mut columns = left.columns().to_vec();
    columns.extend(selection.columns.iter().map(|(_, name)| name.clone()));
    let mut out = Table::new(columns);

    let unmatched: Vec<Cell> = vec![None; selection.columns.len()];
    for row in left.rows() {
        let matches = row[left_key]
            .as_deref()
            .and_then(|k| index.get(k))
            .filter(|m| !m.is_empty());

        match matches {
            Some(matches) => {
                for &m in matches {
                    let right_row = &right.rows()[m];
                    let mut merged = row.clone();
                    merged.extend(selection.columns.iter().map(|(i, _)| right_row[*i].clone()));
                    out.push_row(merged);
                }
            }
            None => {
                let mut merged = row.clone();
                merged.extend(unmatched.iter().cloned());
                out.push_row(merged);
            }
        }
    }

    out
}
