//! CSV decoder: raw export text in, normalized unit records out.
//!
//! Parsing is permissive at the cell level. A bad number reads as zero and a
//! missing optional column reads as its sentinel; only an empty file or a
//! missing quantity column fails the whole file.

use crate::columns::{normalize_header, strip_quotes, ColumnMap, ColumnRole};
use crate::config::ColumnOverrides;
use crate::error::AuditError;
use crate::model::{
    MicroGeneration, UnitRecord, MISSING_ROUTE, MISSING_TEXT, NOT_INFORMED, READ_SUCCESSFULLY,
};

/// Decode one export file into unit records, in file order.
pub fn decode_units(text: &str, overrides: &ColumnOverrides) -> Result<Vec<UnitRecord>, AuditError> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());

    let header_line = lines.next().ok_or(AuditError::EmptyOrMalformedFile)?;
    let header_line = header_line.trim_start_matches('\u{feff}');
    let body: Vec<&str> = lines.collect();
    if body.is_empty() {
        return Err(AuditError::EmptyOrMalformedFile);
    }

    let delimiter = detect_delimiter(header_line);
    let headers: Vec<String> = split_fields(header_line, delimiter, None)
        .iter()
        .map(|h| normalize_header(h))
        .collect();

    let columns = ColumnMap::infer(&headers, overrides);
    if columns.index(ColumnRole::Quantity).is_none() {
        return Err(AuditError::MissingRequiredColumn {
            role: ColumnRole::Quantity.to_string(),
        });
    }

    log::debug!(
        "decoding {} rows (delimiter {:?}, {} headers)",
        body.len(),
        delimiter as char,
        headers.len()
    );
    for role in ColumnRole::ALL {
        match columns.index(role) {
            Some(i) => log::debug!("column {role} -> #{i} ({})", headers[i]),
            None => log::debug!("column {role} not found, using defaults"),
        }
    }

    let quantity_index = columns.index(ColumnRole::Quantity);
    let mut degraded = 0usize;
    let records: Vec<UnitRecord> = body
        .iter()
        .map(|line| {
            let values = split_fields(line, delimiter, quantity_index);
            decode_row(&values, &columns, &mut degraded)
        })
        .collect();

    if degraded > 0 {
        log::warn!("{degraded} numeric cell(s) could not be parsed and were read as 0");
    }

    Ok(records)
}

/// Semicolon if the header line contains one, else comma.
pub fn detect_delimiter(header_line: &str) -> u8 {
    if header_line.contains(';') {
        b';'
    } else {
        b','
    }
}

/// Split one line on the delimiter, then trim and de-quote every field.
///
/// Quoted fields may contain the delimiter. A line with an unbalanced `"`, or
/// one whose quoting hides the cell at `needed`, is split plainly instead so
/// a stray quote cannot swallow the rest of the row.
fn split_fields(line: &str, delimiter: u8, needed: Option<usize>) -> Vec<String> {
    let plain = || -> Vec<String> { line.split(delimiter as char).map(clean_field).collect() };
    if line.matches('"').count() % 2 == 1 {
        return plain();
    }

    let record = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok());

    let Some(record) = record else {
        return plain();
    };
    let fields: Vec<String> = record.iter().map(clean_field).collect();
    if needed.is_some_and(|i| i >= fields.len()) {
        let split = plain();
        if split.len() > fields.len() {
            return split;
        }
    }
    fields
}

fn clean_field(raw: &str) -> String {
    strip_quotes(raw.trim()).to_string()
}

fn decode_row(values: &[String], columns: &ColumnMap, degraded: &mut usize) -> UnitRecord {
    let cell = |role: ColumnRole| -> Option<&str> {
        columns
            .index(role)
            .and_then(|i| values.get(i))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    };
    let mut number = |role: ColumnRole| -> f64 {
        match cell(role) {
            Some(raw) => {
                let (value, clean) = parse_number(raw);
                if !clean {
                    *degraded += 1;
                }
                value
            }
            None => 0.0,
        }
    };

    let current_consumption = number(ColumnRole::CurrentConsumption);
    let prior_consumption = number(ColumnRole::PriorConsumption);
    let injected_generation = number(ColumnRole::InjectedGeneration);

    let label_index = columns
        .index(ColumnRole::RouteLabel)
        .or_else(|| columns.index(ColumnRole::RouteCode))
        .unwrap_or(0);
    let route_label = values
        .get(label_index)
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| MISSING_ROUTE.to_string());

    let text_or = |role: ColumnRole, default: &str| -> String {
        cell(role).unwrap_or(default).to_string()
    };
    // Present column: raw cell, possibly empty. Absent column: the sentinel.
    let raw_or = |role: ColumnRole, default: &str| -> String {
        match columns.index(role) {
            Some(i) => values.get(i).cloned().unwrap_or_default(),
            None => default.to_string(),
        }
    };

    UnitRecord {
        unit_code: text_or(ColumnRole::UnitCode, MISSING_TEXT),
        consumer_name: text_or(ColumnRole::ConsumerName, MISSING_TEXT),
        route_code: text_or(ColumnRole::RouteCode, &route_label),
        route_label,
        current_consumption,
        prior_consumption,
        injected_generation,
        micro_generation_flag: MicroGeneration::from_flag(cell(ColumnRole::MicroGeneration).unwrap_or("")),
        billed_quantity: parse_quantity(cell(ColumnRole::Quantity).unwrap_or("")),
        non_read_reason: text_or(ColumnRole::NonReadReason, READ_SUCCESSFULLY),
        connection_status: raw_or(ColumnRole::ConnectionStatus, NOT_INFORMED),
        address: raw_or(ColumnRole::Address, NOT_INFORMED),
    }
}

// ---------------------------------------------------------------------------
// Cell parsers
// ---------------------------------------------------------------------------

/// Parse a decimal-comma tolerant number, falling back to `default` when the
/// text holds no leading number.
pub fn parse_number_or_default(text: &str, default: f64) -> f64 {
    match leading_number(&text.trim().replacen(',', ".", 1)) {
        Some(value) => value,
        None => default,
    }
}

/// Returns the parsed value (zero when unparseable) and whether the whole cell
/// was a clean number.
fn parse_number(raw: &str) -> (f64, bool) {
    let normalized = raw.trim().replacen(',', ".", 1);
    match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() => (v, true),
        _ => (leading_number(&normalized).unwrap_or(0.0), false),
    }
}

/// Longest prefix of the form `[+-]digits[.digits][e[+-]digits]`, so
/// `"12 kWh"` reads as 12.
fn leading_number(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Digits-only integer parse: every non-digit is dropped, nothing left (or
/// overflow) reads as 0.
pub fn parse_quantity(text: &str) -> i64 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}
