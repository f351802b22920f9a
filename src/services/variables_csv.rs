//! CSV persistence for the variable table.
//!
//! The header row names the placeholders. Values may carry embedded
//! newlines either as real (quoted) newlines or as the escape `\n`; both
//! read back as a newline. `\\` reads back as one backslash, and any other
//! backslash is kept as written. Writing escapes backslashes and newlines so
//! each record stays on one line and reads back unchanged.

use crate::domain::{AppError, VariableTable};

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\n', "\\n")
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some('\\') => {
                chars.next();
                out.push('\\');
            }
            _ => out.push('\\'),
        }
    }
    out
}

/// Parse a variables CSV.
///
/// Reading stops at the first record whose fields are all blank.
pub fn read_table(content: &str) -> Result<VariableTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut table = VariableTable::new(headers);

    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            tracing::warn!(line = index + 2, "Empty row detected; ignoring the rest of the file");
            break;
        }
        table.push_record(record.iter().map(|field| unescape(field)));
    }

    Ok(table)
}

/// Serialize a table to CSV text.
pub fn write_table(table: &VariableTable) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        let record = table
            .headers
            .iter()
            .map(|header| escape(row.get(header).unwrap_or_default()));
        writer.write_record(record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Configuration(format!("Failed to flush CSV: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::ParseError { what: "CSV output".into(), details: e.to_string() })
}
