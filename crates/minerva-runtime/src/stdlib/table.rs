//! Text-file and CSV access
//!
//! Thin wrappers over `std::fs` that translate I/O failures into
//! `RuntimeError::Io` (downgraded to reports at the command boundary) plus
//! a small quote-aware CSV reader/writer. Numeric conversion failures do
//! not abort a load: bad cells become zero and are reported as warnings by
//! the caller.

use crate::value::RuntimeError;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

fn io_error(path: &Path, err: std::io::Error) -> RuntimeError {
    RuntimeError::Io(format!("{}: {err}", path.display()))
}

pub fn read_to_string(path: &Path) -> Result<String, RuntimeError> {
    std::fs::read_to_string(path).map_err(|e| io_error(path, e))
}

/// File contents split into lines, trailing newline dropped.
pub fn read_lines(path: &Path) -> Result<Vec<String>, RuntimeError> {
    Ok(read_to_string(path)?.lines().map(str::to_string).collect())
}

/// Writes (or appends) text, creating the file if needed.
pub fn write_text(path: &Path, text: &str, append: bool) -> Result<(), RuntimeError> {
    let mut file = if append {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| io_error(path, e))?
    } else {
        File::create(path).map_err(|e| io_error(path, e))?
    };
    writeln!(file, "{text}").map_err(|e| io_error(path, e))
}

/// A parsed CSV file: header names (possibly synthetic) and raw cell rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Splits one CSV line on the delimiter, honoring double-quoted fields.
/// A doubled quote inside a quoted field is an escaped quote.
pub fn parse_csv_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == delimiter {
            fields.push(std::mem::take(&mut field));
        } else {
            field.push(c);
        }
    }
    fields.push(field);
    fields
}

/// Reads a CSV file. With `header` false the first row is data and headers
/// are synthesized as `col0..colN`. Blank lines are skipped.
pub fn read_csv(path: &Path, delimiter: char, header: bool) -> Result<CsvData, RuntimeError> {
    let text = read_to_string(path)?;
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let headers = match lines.next() {
        None => {
            return Ok(CsvData {
                headers: Vec::new(),
                rows: Vec::new(),
            })
        }
        Some(first) => {
            let first_row = parse_csv_line(first, delimiter);
            if header {
                first_row
            } else {
                let names = (0..first_row.len()).map(|i| format!("col{i}")).collect();
                return Ok(CsvData {
                    headers: names,
                    rows: std::iter::once(first_row)
                        .chain(lines.map(|l| parse_csv_line(l, delimiter)))
                        .collect(),
                });
            }
        }
    };

    Ok(CsvData {
        headers,
        rows: lines.map(|l| parse_csv_line(l, delimiter)).collect(),
    })
}

fn quote_field(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Writes rows as CSV, quoting fields that need it. `headers` is optional.
pub fn write_csv(
    path: &Path,
    headers: Option<&[String]>,
    rows: &[Vec<String>],
    delimiter: char,
) -> Result<(), RuntimeError> {
    let mut text = String::new();
    if let Some(headers) = headers {
        let cells: Vec<String> = headers.iter().map(|h| quote_field(h, delimiter)).collect();
        text.push_str(&cells.join(&delimiter.to_string()));
        text.push('\n');
    }
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| quote_field(c, delimiter)).collect();
        text.push_str(&cells.join(&delimiter.to_string()));
        text.push('\n');
    }
    std::fs::write(path, text).map_err(|e| io_error(path, e))
}

/// Converts raw cells to numbers. Unparseable cells become `0.0`; their
/// `row:col` positions come back so the caller can warn about each one.
pub fn convert_cells(rows: &[Vec<String>]) -> (Vec<Vec<f64>>, Vec<String>) {
    let mut converted = Vec::with_capacity(rows.len());
    let mut failed = Vec::new();
    for (r, row) in rows.iter().enumerate() {
        let mut numeric = Vec::with_capacity(row.len());
        for (c, cell) in row.iter().enumerate() {
            match cell.trim().parse::<f64>() {
                Ok(v) => numeric.push(v),
                Err(_) => {
                    failed.push(format!("{r}:{c}"));
                    numeric.push(0.0);
                }
            }
        }
        converted.push(numeric);
    }
    (converted, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn parse_handles_quotes_and_escapes() {
        assert_eq!(parse_csv_line("a,b,c", ','), ["a", "b", "c"]);
        assert_eq!(
            parse_csv_line("\"x, y\",plain", ','),
            ["x, y", "plain"]
        );
        assert_eq!(parse_csv_line("\"he said \"\"hi\"\"\"", ','), ["he said \"hi\""]);
        assert_eq!(parse_csv_line("a;b", ';'), ["a", "b"]);
        assert_eq!(parse_csv_line("", ','), [""]);
    }

    #[test]
    fn csv_round_trip_preserves_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let headers = vec!["name".to_string(), "score".to_string()];
        let rows = vec![
            vec!["ada, b".to_string(), "1.5".to_string()],
            vec!["grace".to_string(), "2".to_string()],
        ];
        write_csv(&path, Some(&headers), &rows, ',').unwrap();

        let data = read_csv(&path, ',', true).unwrap();
        assert_eq!(data.headers, headers);
        assert_eq!(data.rows, rows);
    }

    #[test]
    fn headerless_csv_gets_synthetic_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        std::fs::write(&path, "1,2\n3,4\n").unwrap();

        let data = read_csv(&path, ',', false).unwrap();
        assert_eq!(data.headers, ["col0", "col1"]);
        assert_eq!(data.rows.len(), 2);
        assert_eq!(data.rows[0], ["1", "2"]);
    }

    #[test]
    fn conversion_substitutes_zero_and_reports_positions() {
        let rows = vec![
            vec!["1.5".to_string(), "oops".to_string()],
            vec![" 2 ".to_string(), "3".to_string()],
        ];
        let (numeric, failed) = convert_cells(&rows);
        assert_eq!(numeric, vec![vec![1.5, 0.0], vec![2.0, 3.0]]);
        assert_eq!(failed, ["0:1"]);
    }

    #[test]
    fn write_text_appends_when_asked() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        write_text(&path, "first", false).unwrap();
        write_text(&path, "second", true).unwrap();
        assert_eq!(read_lines(&path).unwrap(), ["first", "second"]);

        write_text(&path, "only", false).unwrap();
        assert_eq!(read_lines(&path).unwrap(), ["only"]);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = read_to_string(Path::new("/definitely/not/here.txt"));
        assert!(matches!(result, Err(RuntimeError::Io(_))));
    }
}
