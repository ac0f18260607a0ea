//! Report writer: renders a canonical table to CSV.

use crate::{
    error::{ReconError, ReconResult},
    record::CanonicalTable,
};
use csv::Writer;
use std::path::Path;

/// Write `table` to any writer: header row, then one line per record.
pub fn write_to<W: std::io::Write>(table: &CanonicalTable, out: W) -> ReconResult<()> {
    let mut wtr = Writer::from_writer(out);
    wtr.write_record(table.header())?;
    for row in table.rendered_rows() {
        wtr.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write `table` to a CSV file at `path`, replacing any existing file.
pub fn write_csv(table: &CanonicalTable, path: &Path) -> ReconResult<()> {
    let file = std::fs::File::create(path).map_err(|e| ReconError::io(path, e))?;
    write_to(table, file)?;
    log::info!("wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Render to an in-memory CSV string.
pub fn to_csv_string(table: &CanonicalTable) -> ReconResult<String> {
    let mut buf = Vec::new();
    write_to(table, &mut buf)?;
    String::from_utf8(buf).map_err(|e| ReconError::Other(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CanonicalRecord, Field};

    #[test]
    fn nulls_render_as_empty_cells() {
        let table = CanonicalTable {
            fields: vec![Field::ReferralId, Field::TransactionAt, Field::IsBusinessLogicValid],
            records: vec![CanonicalRecord {
                referral_id: Some("R1".into()),
                ..Default::default()
            }],
        };
        let csv = to_csv_string(&table).unwrap();
        assert_eq!(
            csv,
            "referral_id,transaction_at,is_business_logic_valid\nR1,,False\n"
        );
    }
}
