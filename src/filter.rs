// src/filter.rs

//! Row filtering and identifier extraction.
//!
//! Selects the rows whose status and service line match the configured
//! targets, preserving snapshot order. Which of the matches are actually
//! new is decided by the dedup store in the pipeline, so this stays a
//! pure function over one snapshot.

use crate::error::{AppError, Result};
use crate::models::{FilterConfig, MatchedRow, Snapshot};

/// Select rows matching the configured status and service line.
///
/// Cell values are compared after trimming surrounding whitespace. The
/// status and service columns must exist in the snapshot; the identifier
/// column may be absent, which leaves every match without a dedup key.
pub fn match_rows(snapshot: &Snapshot, filter: &FilterConfig) -> Result<Vec<MatchedRow>> {
    let status_col = snapshot
        .column_index(&filter.status_column)
        .ok_or_else(|| missing_column(&filter.status_column))?;
    let service_col = snapshot
        .column_index(&filter.service_column)
        .ok_or_else(|| missing_column(&filter.service_column))?;
    let id_col = snapshot.column_index(&filter.id_column);

    let mut matched = Vec::new();
    for (index, row) in snapshot.rows.iter().enumerate() {
        let status = row.get(status_col).unwrap_or_default().trim();
        let service = row.get(service_col).unwrap_or_default().trim();

        if status != filter.status_value || service != filter.service_line {
            continue;
        }

        matched.push(MatchedRow {
            position: index + 1,
            id: id_col.and_then(|col| extract_id(row.get(col))),
        });
    }

    Ok(matched)
}

/// Normalize an identifier cell into a usable dedup key.
///
/// Empty and "none" (any casing) values are unusable: such rows stay
/// eligible for notification on every cycle they appear.
fn extract_id(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn missing_column(name: &str) -> AppError {
    AppError::snapshot(format!("column '{name}' not found in snapshot"))
}
