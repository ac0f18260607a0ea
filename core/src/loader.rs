//! Table loader: discovers the seven source CSVs and reads them as text.
//!
//! A missing file is an empty table, never an error. Header names are
//! trimmed; empty cells are null. Only genuine I/O failures propagate.

use crate::{
    config::SourceFilesConfig,
    error::{ReconError, ReconResult},
    table::{non_empty, Table},
};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceTable {
    LeadLog,
    PaidTransactions,
    ReferralRewards,
    UserLogs,
    UserReferralLogs,
    UserReferralStatuses,
    UserReferrals,
}

impl SourceTable {
    pub const ALL: [SourceTable; 7] = [
        SourceTable::LeadLog,
        SourceTable::PaidTransactions,
        SourceTable::ReferralRewards,
        SourceTable::UserLogs,
        SourceTable::UserReferralLogs,
        SourceTable::UserReferralStatuses,
        SourceTable::UserReferrals,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::LeadLog              => "lead_log",
            Self::PaidTransactions     => "paid_transactions",
            Self::ReferralRewards      => "referral_rewards",
            Self::UserLogs             => "user_logs",
            Self::UserReferralLogs     => "user_referral_logs",
            Self::UserReferralStatuses => "user_referral_statuses",
            Self::UserReferrals        => "user_referrals",
        }
    }
}

/// The seven source tables. Absent tables read as empty.
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    tables: HashMap<SourceTable, Table>,
}

impl SourceTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: SourceTable, table: Table) -> Self {
        self.insert(source, table);
        self
    }

    pub fn insert(&mut self, source: SourceTable, table: Table) {
        self.tables.insert(source, table);
    }

    pub fn get(&self, source: SourceTable) -> Option<&Table> {
        self.tables.get(&source)
    }

    /// The base table, or an empty one.
    pub fn referrals(&self) -> Table {
        self.get(SourceTable::UserReferrals)
            .cloned()
            .unwrap_or_else(Table::empty)
    }
}

/// First alias that exists in `dir`.
pub fn discover(dir: &Path, aliases: &[String]) -> Option<PathBuf> {
    aliases
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Load every source table found in `dir`.
pub fn load_dir(dir: &Path, files: &SourceFilesConfig) -> ReconResult<SourceTables> {
    let mut tables = SourceTables::new();

    if !dir.is_dir() {
        log::warn!(
            "input directory {} not found; every source table is empty",
            dir.display()
        );
        return Ok(tables);
    }

    for source in SourceTable::ALL {
        match discover(dir, files.aliases(source)) {
            Some(path) => {
                let table = read_table(&path)?;
                log::info!(
                    "loaded {} from {}: {} rows, {} columns",
                    source.name(),
                    path.display(),
                    table.len(),
                    table.columns().len()
                );
                tables.insert(source, table);
            }
            None => {
                log::info!("{} not found; treating as empty", source.name());
            }
        }
    }

    Ok(tables)
}

/// Read one CSV file with a header row. Every cell is text.
pub fn read_table(path: &Path) -> ReconResult<Table> {
    let file = std::fs::File::open(path).map_err(|e| ReconError::io(path, e))?;
    read_table_from(file, &path.display().to_string())
}

/// Read CSV from any reader. `origin` is only used in log lines.
pub fn read_table_from<R: std::io::Read>(reader: R, origin: &str) -> ReconResult<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let mut table = Table::new(columns);

    for (line, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                log::warn!("{origin}: skipping record {}: {e}", line + 1);
                continue;
            }
        };
        table.push_row(record.iter().map(non_empty).collect());
    }

    Ok(table)
}
