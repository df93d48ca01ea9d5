//! Output formatting helpers for human-readable and JSON output.

use opttree::store::{Shaped, Value};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Print a table with aligned columns in human-readable format.
///
/// `headers` and each row in `rows` must have the same length.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    // Calculate column widths (max of header and all row values)
    let col_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:<width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_line.join("  ").trim_end());

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .take(col_count)
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect();
        println!("{}", line.join("  ").trim_end());
    }
}

fn shaped_json<T: Clone + Into<serde_json::Value>>(shaped: &Shaped<T>) -> serde_json::Value {
    match shaped {
        Shaped::Scalar(v) => v.clone().into(),
        Shaped::Vector(v) => v.clone().into(),
        Shaped::Matrix(m) => m
            .to_rows()
            .into_iter()
            .map(serde_json::Value::from)
            .collect(),
    }
}

/// Plain JSON for a value: a number or string, an array, or an array of rows.
pub fn value_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Integer(shaped) => shaped_json(shaped),
        Value::Double(shaped) => shaped_json(shaped),
        Value::String(shaped) => shaped_json(shaped),
    }
}

/// Elements of a value as display strings, row by row.
pub fn value_rows(value: &Value) -> Vec<String> {
    fn rows<T: ToString>(shaped: &Shaped<T>) -> Vec<String> {
        let join = |items: &[T]| {
            items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        };
        match shaped {
            Shaped::Scalar(v) => vec![v.to_string()],
            Shaped::Vector(v) => vec![join(v)],
            Shaped::Matrix(m) => m.iter_rows().map(join).collect(),
        }
    }

    match value {
        Value::Integer(shaped) => rows(shaped),
        Value::Double(shaped) => rows(shaped),
        Value::String(shaped) => rows(shaped),
    }
}
