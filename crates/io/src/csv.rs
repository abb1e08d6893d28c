// CSV batch input and result export

use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;

use cmi_recon::{BatchOutcome, FieldValue, InputRecord, ReconError};

/// Columns appended to every successful row of the result file.
pub const RESULT_COLUMNS: [&str; 4] = [
    "prediction",
    "target_probability",
    "non_target_probability",
    "confidence",
];

/// Uploaded batch file: header row plus data rows, all cells as text.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One record per row. Empty cells are left out so they count as missing.
    /// Categorical cells keep their text.
    pub fn records(&self) -> Vec<InputRecord> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .zip(row)
                    .filter_map(|(h, cell)| FieldValue::parse_cell(h, cell).map(|v| (h.clone(), v)))
                    .collect()
            })
            .collect()
    }
}

pub fn read_table(path: &Path) -> Result<CsvTable, ReconError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = detect_delimiter(&content);
    parse_table(&content, delimiter)
}

/// Parse a headed CSV. Rejected before any prediction runs: no header, blank or
/// duplicate column names, rows of the wrong width, no data rows.
pub fn parse_table(content: &str, delimiter: u8) -> Result<CsvTable, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::InputFormat(e.to_string()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(ReconError::InputFormat("file has no header row".into()));
    }
    let mut seen = HashSet::new();
    for (i, h) in headers.iter().enumerate() {
        if h.is_empty() {
            return Err(ReconError::InputFormat(format!("column {} has no name", i + 1)));
        }
        if !seen.insert(h.as_str()) {
            return Err(ReconError::InputFormat(format!("duplicate column '{h}'")));
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReconError::InputFormat(e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    if rows.is_empty() {
        return Err(ReconError::InputFormat("the uploaded file is empty".into()));
    }

    log::debug!("parsed {} rows x {} columns", rows.len(), headers.len());
    Ok(CsvTable { headers, rows })
}

/// Candidates in reverse preference; on equal width the later one wins.
const DELIMITERS: [u8; 4] = [b'|', b'\t', b';', b','];

/// Delimiter that splits the header into the most columns while the first data
/// row has the same width. Comma when nothing splits the header.
fn detect_delimiter(content: &str) -> u8 {
    let head = content.lines().take(2).collect::<Vec<_>>().join("\n");
    DELIMITERS
        .iter()
        .copied()
        .filter_map(|delim| {
            let widths: Vec<usize> = csv::ReaderBuilder::new()
                .delimiter(delim)
                .has_headers(false)
                .flexible(true)
                .from_reader(head.as_bytes())
                .records()
                .filter_map(Result::ok)
                .map(|r| r.len())
                .collect();
            match widths.as_slice() {
                [header, rest @ ..] if *header > 1 && rest.iter().all(|w| w == header) => {
                    Some((delim, *header))
                }
                _ => None,
            }
        })
        .max_by_key(|&(_, width)| width)
        .map_or(b',', |(delim, _)| delim)
}

/// Read file and convert to UTF-8 if needed (Excel exports are often Windows-1252).
pub fn read_file_as_utf8(path: &Path) -> Result<String, ReconError> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| ReconError::InputFormat(format!("cannot open {}: {e}", path.display())))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| ReconError::InputFormat(format!("cannot read {}: {e}", path.display())))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            log::debug!("{} is not UTF-8, decoded as Windows-1252", path.display());
            Ok(decoded.into_owned())
        }
    }
}

/// Original columns plus [`RESULT_COLUMNS`], successful rows only, input order.
pub fn write_results<W: Write>(
    writer: W,
    table: &CsvTable,
    outcome: &BatchOutcome,
) -> Result<(), ReconError> {
    let io_err = |e: csv::Error| ReconError::Io(e.to_string());
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);

    let header: Vec<&str> = table
        .headers
        .iter()
        .map(String::as_str)
        .chain(RESULT_COLUMNS)
        .collect();
    writer.write_record(&header).map_err(io_err)?;

    for row in &outcome.rows {
        let cells = table.rows.get(row.index).ok_or_else(|| {
            ReconError::Io(format!("result row {} has no matching input row", row.index))
        })?;
        let p = &row.prediction;
        let mut record: Vec<String> = cells.clone();
        record.push(p.label.index().to_string());
        record.push(p.target_probability().to_string());
        record.push(p.non_target_probability().to_string());
        record.push(p.confidence().to_string());
        writer.write_record(&record).map_err(io_err)?;
    }

    writer.flush().map_err(|e| ReconError::Io(e.to_string()))
}

pub fn export_results(path: &Path, table: &CsvTable, outcome: &BatchOutcome) -> Result<(), ReconError> {
    let file = std::fs::File::create(path)
        .map_err(|e| ReconError::Io(format!("cannot create {}: {e}", path.display())))?;
    write_results(std::io::BufWriter::new(file), table, outcome)
}

/// `prediction_results_YYYYMMDD_HHMMSS.csv`
pub fn default_output_name<Tz: chrono::TimeZone>(at: &chrono::DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("prediction_results_{}.csv", at.format("%Y%m%d_%H%M%S"))
}
