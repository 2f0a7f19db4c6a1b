//! Field extraction, form side and support side.
//!
//! The form side runs one dedicated case-insensitive pattern per field over
//! the raw extracted text. The support side sniffs column headers of
//! delimited files and takes values from the first data row. Neither path
//! validates plausibility of what it captures; absence is `None`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::models::{FieldName, FieldSet, SupportFileReport, SupportOutcome};

static UIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\buin\b[\s:.\-]*([A-Za-z0-9][A-Za-z0-9\-]*)").unwrap()
});

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bentity(?:\s+name)?\b\s*[:\-]?\s*([A-Za-z0-9][A-Za-z0-9 .&]*)").unwrap()
});

static AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:amount|investment)\b[^0-9\r\n]*([0-9][0-9,]*(?:\.[0-9]+)?)").unwrap()
});

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Extract the fixed field set from form text.
pub fn extract_form_fields(text: &str) -> FieldSet {
    FieldSet {
        uin: capture(&UIN_RE, text),
        entity_name: capture(&ENTITY_RE, text),
        amount: capture(&AMOUNT_RE, text),
    }
}

/// Look up a collector-schema field label in previously auto-extracted data,
/// using the same containment rules as the support-side header sniffing.
pub fn auto_value_for<'a>(label: &str, fields: &'a FieldSet) -> Option<&'a str> {
    let lowered = label.to_lowercase();
    if lowered.contains("uin") || lowered.contains("lrn") || lowered.contains("loan registration") {
        fields.uin.as_deref()
    } else if lowered.contains("entity") {
        fields.entity_name.as_deref()
    } else if lowered.contains("amount") || lowered.contains("investment") {
        fields.amount.as_deref()
    } else {
        None
    }
}

fn field_for_header(header: &str) -> Option<FieldName> {
    let lowered = header.to_lowercase();
    if lowered.contains("uin") {
        Some(FieldName::Uin)
    } else if lowered.contains("entity") {
        Some(FieldName::EntityName)
    } else if lowered.contains("amount") || lowered.contains("investment") {
        Some(FieldName::Amount)
    } else {
        None
    }
}

fn is_delimited(path: &Path) -> Option<u8> {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .as_deref()
    {
        Some("csv") => Some(b','),
        Some("tsv") => Some(b'\t'),
        _ => None,
    }
}

fn scan_delimited(path: &Path, delimiter: u8, fields: &mut FieldSet) -> anyhow::Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let Some(row) = reader.records().next().transpose()? else {
        return Ok(0);
    };

    let mut found = 0;
    for (index, header) in headers.iter().enumerate() {
        let Some(field) = field_for_header(header) else {
            continue;
        };
        let Some(value) = row.get(index) else {
            continue;
        };
        if fields.fill_if_absent(field, value) {
            debug!(header, value, "filled {} from column", field.label());
            found += 1;
        }
    }

    Ok(found)
}

/// Scan supporting files for the fixed field set. First match wins per field,
/// across files in the given order. A file that fails to parse is reported and
/// skipped; the batch always continues.
pub fn extract_support_fields(paths: &[PathBuf]) -> (FieldSet, Vec<SupportFileReport>) {
    let mut fields = FieldSet::default();
    let mut reports = Vec::with_capacity(paths.len());

    for path in paths {
        let file = path.display().to_string();
        let outcome = match is_delimited(path) {
            None => SupportOutcome::SkippedNonTabular,
            Some(delimiter) => match scan_delimited(path, delimiter, &mut fields) {
                Ok(fields_found) => SupportOutcome::Parsed { fields_found },
                Err(e) => {
                    warn!(file = %file, error = %e, "skipping unparseable supporting file");
                    SupportOutcome::ParseFailed {
                        reason: e.to_string(),
                    }
                }
            },
        };
        reports.push(SupportFileReport { file, outcome });
    }

    (fields, reports)
}
