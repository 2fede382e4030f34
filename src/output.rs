//! Rendering query results as text tables, CSV or JSON

use crate::db::{CellValue, QueryResult};
use crate::utils::{format_duration, format_number, truncate};
use std::io::{self, Write};
use unicode_width::UnicodeWidthStr;

/// Cells longer than this are cut in table output.
const MAX_CELL_CHARS: usize = 60;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

/// Write every result in `format`.
///
/// Tables are separated by a blank line, CSV blocks likewise; JSON is one
/// array of row arrays, one entry per statement.
pub fn write_results<W: Write>(out: &mut W, results: &[QueryResult], format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Table => {
            for (i, result) in results.iter().enumerate() {
                if i > 0 {
                    writeln!(out)?;
                }
                write!(out, "{}", render_table(result))?;
            }
        }
        OutputFormat::Csv => {
            for (i, result) in results.iter().enumerate() {
                if i > 0 {
                    writeln!(out)?;
                }
                write_csv(&mut *out, result)?;
            }
        }
        OutputFormat::Json => {
            let values: Vec<serde_json::Value> = results.iter().map(to_json).collect();
            serde_json::to_writer_pretty(&mut *out, &values)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Aligned text table with a summary line.
pub fn render_table(result: &QueryResult) -> String {
    let elapsed = format_duration(result.execution_time);

    if result.columns.is_empty() {
        return format!("OK ({})\n", elapsed);
    }

    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| truncate(&cell.to_string(), MAX_CELL_CHARS)).collect())
        .collect();

    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.name.width()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.width());
            }
        }
    }

    let mut out = String::new();

    let header: Vec<&str> = result.columns.iter().map(|c| c.name.as_str()).collect();
    push_line(&mut out, &header, &widths);

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');

    for row in &cells {
        let row: Vec<&str> = row.iter().map(String::as_str).collect();
        push_line(&mut out, &row, &widths);
    }

    let noun = if result.row_count == 1 { "row" } else { "rows" };
    out.push_str(&format!("({} {}, {})\n", format_number(result.row_count), noun, elapsed));
    out
}

fn push_line(out: &mut String, cells: &[&str], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.width());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}

/// Header record followed by one record per row.
pub fn write_csv<W: Write>(out: W, result: &QueryResult) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    let headers: Vec<&str> = result.columns.iter().map(|c| c.name.as_str()).collect();
    if !headers.is_empty() {
        wtr.write_record(&headers)?;
    }
    for row in &result.rows {
        let record: Vec<String> = row.iter().map(csv_field).collect();
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn csv_field(cell: &CellValue) -> String {
    match cell {
        CellValue::Null => String::new(),
        other => other.to_string(),
    }
}

/// Rows as JSON objects keyed by column name.
pub fn to_json(result: &QueryResult) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = result
        .rows
        .iter()
        .map(|row| {
            let mut obj = serde_json::Map::new();
            for (col, cell) in result.columns.iter().zip(row) {
                let value = serde_json::to_value(cell).unwrap_or(serde_json::Value::Null);
                obj.insert(col.name.clone(), value);
            }
            serde_json::Value::Object(obj)
        })
        .collect();
    serde_json::Value::Array(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ColumnInfo;
    use std::time::Duration;

    fn sample() -> QueryResult {
        QueryResult::new(
            "select id, name from t",
            vec![
                ColumnInfo {
                    name: "id".into(),
                    type_name: "INT".into(),
                },
                ColumnInfo {
                    name: "name".into(),
                    type_name: "NVARCHAR".into(),
                },
            ],
            vec![
                vec![CellValue::Int(1), CellValue::String("alpha".into())],
                vec![CellValue::Int(20), CellValue::Null],
            ],
            Duration::from_millis(5),
        )
    }

    #[test]
    fn table_aligns_columns() {
        let table = render_table(&sample());
        let expected = "\
id | name
---+------
1  | alpha
20 | NULL
(2 rows, 5ms)
";
        assert_eq!(table, expected);
    }

    #[test]
    fn table_for_statement_without_result_set() {
        let result = QueryResult::new("delete from t", Vec::new(), Vec::new(), Duration::from_millis(2));
        assert_eq!(render_table(&result), "OK (2ms)\n");
    }

    #[test]
    fn empty_select_still_prints_header() {
        let mut result = sample();
        result.rows.clear();
        result.row_count = 0;

        assert_eq!(render_table(&result), "id | name\n---+-----\n(0 rows, 5ms)\n");

        let mut buf = Vec::new();
        write_csv(&mut buf, &result).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "id,name\n");
    }

    #[test]
    fn csv_has_header_and_empty_nulls() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &sample()).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "id,name\n1,alpha\n20,\n");
    }

    #[test]
    fn json_objects_keyed_by_column() {
        let value = to_json(&sample());
        assert_eq!(
            value,
            serde_json::json!([
                {"id": 1, "name": "alpha"},
                {"id": 20, "name": null}
            ])
        );
    }

    #[test]
    fn json_output_has_one_entry_per_statement() {
        let mut buf = Vec::new();
        write_results(&mut buf, &[sample(), sample()], OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
    }
}
