//! Spreadsheet reader. Turns an uploaded workbook or CSV into a grid of strings.
//!
//! Workbooks (xlsx, xlsm, xlsb, xls, ods) go through calamine and only the first
//! sheet is read. CSV goes through the `csv` crate. Cells are rendered the way
//! the row rules in `domain::bulk` expect: integral numbers without a trailing
//! `.0`, date cells as `YYYY-MM-DD HH:MM:SS`.

use crate::domain::DomainError;
use calamine::{Data, Reader};
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Workbook,
    Csv,
}

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

fn detect(file_name: Option<&str>, bytes: &[u8]) -> Format {
    let ext = file_name
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("csv") | Some("txt") => Format::Csv,
        Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("ods") => {
            Format::Workbook
        }
        _ if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) => Format::Workbook,
        _ => Format::Csv,
    }
}

/// Read the upload into rows of cell strings. The first row is the header row.
///
/// # Errors
/// `DomainError::Validation("Invalid file uploaded")` for an empty upload,
/// `DomainError::Import` when the bytes cannot be parsed.
pub fn read_grid(file_name: Option<&str>, bytes: Vec<u8>) -> Result<Vec<Vec<String>>, DomainError> {
    if bytes.is_empty() {
        return Err(DomainError::validation("Invalid file uploaded"));
    }
    match detect(file_name, &bytes) {
        Format::Workbook => read_workbook(bytes),
        Format::Csv => read_csv(&bytes),
    }
}

fn read_workbook(bytes: Vec<u8>) -> Result<Vec<Vec<String>>, DomainError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| DomainError::Import(format!("unreadable workbook: {e}")))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| DomainError::Import(format!("unreadable sheet: {e}")))?,
        None => return Ok(Vec::new()),
    };
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn read_csv(bytes: &[u8]) -> Result<Vec<Vec<String>>, DomainError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DomainError::Import(format!("unreadable CSV: {e}")))?;
        grid.push(record.iter().map(String::from).collect());
    }
    Ok(grid)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|naive| naive.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detect_by_extension_then_magic() {
        assert_eq!(detect(Some("Tasks.XLSX"), b"anything"), Format::Workbook);
        assert_eq!(detect(Some("tasks.csv"), ZIP_MAGIC), Format::Csv);
        assert_eq!(detect(Some("upload"), b"PK\x03\x04rest"), Format::Workbook);
        assert_eq!(detect(None, b"a,b\n1,2"), Format::Csv);
    }

    #[test]
    fn test_empty_upload_is_invalid_file() {
        let err = read_grid(Some("t.csv"), Vec::new()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref m) if m == "Invalid file uploaded"));
    }

    #[test]
    fn test_csv_with_bom_and_ragged_rows() {
        let data = "\u{feff}MODULE NAME,SUB MODULE,OWNER\nBilling,Invoice run,Jane Doe\nBilling,\"Refund, partial\"\n";
        let grid = read_grid(Some("tasks.csv"), data.as_bytes().to_vec()).unwrap();
        assert_eq!(
            grid,
            vec![
                vec!["MODULE NAME".to_string(), "SUB MODULE".into(), "OWNER".into()],
                vec!["Billing".to_string(), "Invoice run".into(), "Jane Doe".into()],
                vec!["Billing".to_string(), "Refund, partial".into()],
            ]
        );
    }

    #[test]
    fn test_garbage_workbook_is_import_error() {
        let err = read_grid(Some("tasks.xlsx"), b"PK\x03\x04not really a zip".to_vec()).unwrap_err();
        assert!(matches!(err, DomainError::Import(_)));
    }

    #[test]
    fn test_cell_rendering() {
        assert_eq!(cell_to_string(&Data::Float(42.0)), "42");
        assert_eq!(cell_to_string(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(
            cell_to_string(&Data::DateTimeIso("2024-01-15".into())),
            "2024-01-15"
        );
    }
}
