use std::fs::File;
use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use crate::dates;
use crate::error::{Result, ViewerError};
use crate::models::RawTable;

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];
const DELIMITED_EXTENSIONS: &[&str] = &["csv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Spreadsheet,
    DelimitedText,
}

/// Classifies a file by its extension alone; nothing is opened.
pub fn file_kind(path: &Path) -> Result<FileKind> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
        Ok(FileKind::Spreadsheet)
    } else if DELIMITED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(FileKind::DelimitedText)
    } else {
        Err(ViewerError::UnsupportedFormat { extension })
    }
}

/// Loads `path` into a [`RawTable`]. Spreadsheets are read from `sheet`;
/// delimited text uses its first row as the header.
pub fn load_table(path: &Path, sheet: &str) -> Result<RawTable> {
    let table = match file_kind(path)? {
        FileKind::Spreadsheet => read_workbook(path, sheet)?,
        FileKind::DelimitedText => read_csv(File::open(path)?, path)?,
    };
    debug!(
        path = %path.display(),
        columns = table.headers.len(),
        rows = table.rows.len(),
        "loaded raw table"
    );
    Ok(table)
}

pub fn read_csv<R: Read>(reader: R, source: &Path) -> Result<RawTable> {
    let parse_error = |err: csv::Error| ViewerError::Parse {
        path: source.to_path_buf(),
        message: err.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(parse_error)?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(finish_table(headers, rows))
}

fn read_workbook(path: &Path, sheet: &str) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path).map_err(|err| ViewerError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(ViewerError::MissingSheet {
            sheet: sheet.to_string(),
            path: path.to_path_buf(),
        });
    }

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|err| ViewerError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header) => header
            .iter()
            .map(|cell| cell_to_string(cell).trim().to_string())
            .collect(),
        None => Vec::new(),
    };
    let rows = rows
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Ok(finish_table(headers, rows))
}

fn finish_table(headers: Vec<String>, rows: Vec<Vec<String>>) -> RawTable {
    let width = headers.len();
    let rows = rows
        .into_iter()
        .filter(|row: &Vec<String>| row.iter().any(|cell| !cell.trim().is_empty()))
        .map(|mut row| {
            if row.len() < width {
                row.resize(width, String::new());
            }
            row
        })
        .collect();
    RawTable { headers, rows }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR({:?})", e),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            match dates::from_excel_serial(serial) {
                Some(date) if dt.is_datetime() => date.to_string(),
                _ => format_number(serial),
            }
        }
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Whole floats print without a fractional part so numeric ids read as
/// "101", not "101.0".
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
