//! The pipeline driver.
//!
//! STAGE ORDER (fixed, documented, never reordered):
//!   1. Loader      seven source CSVs, missing ones empty
//!   2. Joiner      six left joins onto the base referral table
//!   3. Projector   wide joined table to canonical records
//!   4. Evaluator   business-validity flag per record
//!   5. Aggregator  one summary row per referral id
//!   6. Writer      event report, then summary report
//!
//! RULES:
//!   - Every stage is deterministic given identical inputs.
//!   - Data-shape problems degrade; only I/O failures abort the run.

use crate::{
    aggregator,
    config::PipelineConfig,
    error::{ReconError, ReconResult},
    evaluator,
    join,
    loader::{self, SourceTables},
    projector,
    record::CanonicalTable,
    report,
    summary::RunSummary,
    types::RunId,
};

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub events: CanonicalTable,
    /// None when `referral_id` did not survive projection.
    pub summary: Option<CanonicalTable>,
    pub run: RunSummary,
}

pub struct ReportPipeline {
    pub run_id: RunId,
    config: PipelineConfig,
}

impl ReportPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_run_id(uuid::Uuid::new_v4().to_string(), config)
    }

    pub fn with_run_id(run_id: RunId, config: PipelineConfig) -> Self {
        Self { run_id, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stages 2–5 over tables already in memory. Never fails.
    pub fn process(&self, sources: &SourceTables) -> PipelineOutput {
        let mut run = RunSummary::new(self.run_id.clone());
        run.base_rows = sources.referrals().len();

        let (joined, outcomes) = join::join_all(sources);
        run.joined_rows = joined.len();
        run.joins = outcomes;

        let mut events = projector::project(&joined);
        evaluate_all(&mut events, &mut run);
        run.event_rows = events.len();

        let summary = aggregator::aggregate(&events);
        run.summary_rows = summary.as_ref().map(CanonicalTable::len);

        if let (Some(expected), Some(actual)) = (self.config.expected_summary_rows, run.summary_rows) {
            if expected != actual {
                log::warn!(
                    "run {}: expected {expected} summary rows, produced {actual}",
                    self.run_id
                );
            }
        }

        log::info!(
            "run {}: {} base rows, {} events ({} valid), {} joins applied",
            self.run_id,
            run.base_rows,
            run.event_rows,
            run.valid_rows,
            run.joins_applied()
        );

        PipelineOutput {
            events,
            summary,
            run,
        }
    }

    /// The full run: load from `input_dir`, process, write to `output_dir`.
    pub fn run(&self) -> ReconResult<PipelineOutput> {
        let sources = loader::load_dir(&self.config.input_dir, &self.config.sources)?;
        let mut output = self.process(&sources);

        let out_dir = &self.config.output_dir;
        std::fs::create_dir_all(out_dir).map_err(|source| ReconError::OutputDir {
            path: out_dir.clone(),
            source,
        })?;

        let report_path = self.config.report_path();
        report::write_csv(&output.events, &report_path)?;
        output.run.report_path = Some(report_path);

        match &output.summary {
            Some(summary) => {
                let summary_path = self.config.summary_path();
                report::write_csv(summary, &summary_path)?;
                output.run.summary_path = Some(summary_path);
            }
            None => log::info!("run {}: referral_id not present; skipping aggregation", self.run_id),
        }

        Ok(output)
    }
}

/// Stage 4: set the validity flag on every record and tally the verdicts.
pub fn evaluate_all(events: &mut CanonicalTable, run: &mut RunSummary) {
    for record in &mut events.records {
        let verdict = evaluator::assess(record);
        for o in &verdict.overrides {
            *run.override_counts.entry(*o).or_insert(0) += 1;
        }
        record.is_business_logic_valid = verdict.is_valid();
        if record.is_business_logic_valid {
            run.valid_rows += 1;
        } else {
            run.invalid_rows += 1;
        }
    }

    for (o, count) in &run.override_counts {
        log::debug!("override {}: {count} rows", o.name());
    }
}
