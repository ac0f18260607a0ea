//! Run summary: what one pipeline run did, for the CLI to print.

use crate::{evaluator::Override, join::JoinOutcome, types::RunId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunSummary {
    pub run_id: RunId,
    pub base_rows: usize,
    pub joined_rows: usize,
    pub event_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    /// How many rows each override fired on. A row can count under several.
    pub override_counts: BTreeMap<Override, usize>,
    /// None when aggregation was skipped.
    pub summary_rows: Option<usize>,
    pub joins: Vec<JoinOutcome>,
    pub report_path: Option<PathBuf>,
    pub summary_path: Option<PathBuf>,
}

impl RunSummary {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            base_rows: 0,
            joined_rows: 0,
            event_rows: 0,
            valid_rows: 0,
            invalid_rows: 0,
            override_counts: BTreeMap::new(),
            summary_rows: None,
            joins: Vec::new(),
            report_path: None,
            summary_path: None,
        }
    }

    pub fn joins_applied(&self) -> usize {
        self.joins.iter().filter(|j| j.applied()).count()
    }
}
