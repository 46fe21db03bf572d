//! Record readers for JSONL and CSV input.

use anyhow::{anyhow, Context, Result};
use bundle_core::{RawRecord, RawValue};
use serde_json::Value;
use std::io::{BufRead, Read};

/// Read one JSON object per line.
///
/// Blank lines are skipped. Errors carry the 1-based line number.
pub fn jsonl_records<R: BufRead>(reader: R) -> impl Iterator<Item = Result<RawRecord>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let line_number = idx + 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(
                        anyhow!(e).context(format!("Error reading line {line_number}"))
                    ))
                }
            };
            if line.trim().is_empty() {
                return None;
            }
            Some(parse_json_record(&line, line_number))
        })
}

fn parse_json_record(line: &str, line_number: usize) -> Result<RawRecord> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| anyhow!("Error parsing JSON at line {line_number}: {e}"))?;

    match RawValue::from(value) {
        RawValue::Record(record) => Ok(record),
        _ => Err(anyhow!(
            "Expected a JSON object at line {line_number}, found another value"
        )),
    }
}

/// Read CSV rows keyed by the header row.
///
/// Every cell is text. Empty cells are left out of the record so the
/// column's default applies.
pub fn csv_records<R: Read>(
    reader: R,
    delimiter: u8,
) -> Result<impl Iterator<Item = Result<RawRecord>>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .context("Failed to read CSV header row")?
        .clone();

    Ok(csv_reader
        .into_records()
        .enumerate()
        .map(move |(idx, row)| {
            // +2: 1-based and the header row
            let row = row.with_context(|| format!("Error reading CSV row {}", idx + 2))?;
            Ok(headers
                .iter()
                .zip(row.iter())
                .filter(|(_, cell)| !cell.is_empty())
                .map(|(header, cell)| (header.to_string(), RawValue::from(cell)))
                .collect())
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_jsonl_records() {
        let input = "{\"name\": \"Alice\", \"age\": 30}\n\n{\"name\": \"Bob\"}\n";
        let records: Vec<RawRecord> = jsonl_records(Cursor::new(input))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["age"], RawValue::Integer(30));
        assert_eq!(records[1]["name"], RawValue::Text("Bob".into()));
    }

    #[test]
    fn test_jsonl_reports_line_numbers() {
        let input = "{\"a\": 1}\n[1, 2]\n{broken\n";
        let errors: Vec<String> = jsonl_records(Cursor::new(input))
            .filter_map(|r| r.err())
            .map(|e| e.to_string())
            .collect();

        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("line 2"), "{}", errors[0]);
        assert!(errors[1].contains("line 3"), "{}", errors[1]);
    }

    #[test]
    fn test_csv_records_skip_empty_cells() {
        let input = "name,nick,age\nAlice,,30\nBob,bobby,\n";
        let records: Vec<RawRecord> = csv_records(Cursor::new(input), b',')
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert!(!records[0].contains_key("nick"));
        assert_eq!(records[0]["age"], RawValue::Text("30".into()));
        assert_eq!(records[1]["nick"], RawValue::Text("bobby".into()));
        assert!(!records[1].contains_key("age"));
    }

    #[test]
    fn test_csv_custom_delimiter() {
        let input = "a;b\n1;2\n";
        let records: Vec<RawRecord> = csv_records(Cursor::new(input), b';')
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records[0]["b"], RawValue::Text("2".into()));
    }
}
