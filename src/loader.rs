use crate::error::{AnalysisError, Result};
use crate::types::{RawRow, Record};
use crate::util::parse_decimal;
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

pub const REQUIRED_COLUMNS: [&str; 7] =
    ["Project Name", "Year", "Cost", "Investment", "Fraud", "CSAT", "ProcessingTime"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub skipped_rows: usize,
    pub distinct_projects: usize,
}

pub fn load_records(path: impl AsRef<Path>, delimiter: u8) -> Result<(Vec<Record>, LoadReport)> {
    let path = path.as_ref();
    info!(path = %path.display(), "loading records");
    let file = File::open(path)?;
    records_from_reader(file, delimiter)
}

/// Parse records from any reader.
///
/// Fields are decoded lossily, so exports in a legacy code page still load
/// (with replacement characters in the affected names).
pub fn records_from_reader<R: Read>(reader: R, delimiter: u8) -> Result<(Vec<Record>, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: StringRecord = rdr
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim().to_string())
        .collect();
    check_columns(&headers)?;

    let mut total_rows = 0usize;
    let mut skipped_rows = 0usize;
    let mut records: Vec<Record> = Vec::new();

    for result in rdr.byte_records() {
        let bytes = result?;
        total_rows += 1;
        let fields: StringRecord = bytes.iter().map(|f| String::from_utf8_lossy(f).into_owned()).collect();
        let row: RawRow = match fields.deserialize(Some(&headers)) {
            Ok(r) => r,
            Err(e) => {
                debug!(row = total_rows, error = %e, "unreadable row skipped");
                skipped_rows += 1;
                continue;
            }
        };

        let project_name = row.project_name.as_deref().unwrap_or("").trim().to_string();
        if project_name.is_empty() {
            debug!(row = total_rows, "row without project name skipped");
            skipped_rows += 1;
            continue;
        }
        let Some(year) = parse_decimal(row.year.as_deref()) else {
            debug!(row = total_rows, project = %project_name, "row without usable year skipped");
            skipped_rows += 1;
            continue;
        };

        records.push(Record {
            project_name,
            year,
            cost: row.cost,
            investment: row.investment,
            fraud: row.fraud,
            csat: row.csat,
            processing_time: row.processing_time,
        });
    }

    if skipped_rows > 0 {
        warn!(skipped_rows, "some rows could not be used");
    }
    let distinct_projects = records
        .iter()
        .map(|r| r.project_name.as_str())
        .collect::<HashSet<_>>()
        .len();
    let report = LoadReport { total_rows, loaded_rows: records.len(), skipped_rows, distinct_projects };
    info!(total_rows, loaded = report.loaded_rows, distinct_projects, "records loaded");
    Ok((records, report))
}

fn check_columns(headers: &StringRecord) -> Result<()> {
    let present: HashSet<&str> = headers.iter().collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !present.contains(**c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AnalysisError::MissingColumns { missing })
    }
}
