// src/sheet.rs

//! Snapshot loading from the sheet's CSV export.
//!
//! One fetch yields the full table as it exists at that moment. No retry
//! happens here; a failed fetch aborts the current cycle and the poll loop
//! tries again on the next tick.

use reqwest::Client;

use crate::error::Result;
use crate::models::{Row, Snapshot};

/// Fetch the current snapshot from the CSV export URL.
pub async fn fetch_snapshot(client: &Client, url: &str) -> Result<Snapshot> {
    let bytes = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    parse_snapshot(&bytes)
}

/// Parse CSV bytes into a snapshot.
///
/// A header-only table (zero data rows) is valid.
pub fn parse_snapshot(bytes: &[u8]) -> Result<Snapshot> {
    let mut reader = csv::Reader::from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(Row::new(record.iter().map(str::to_string).collect()));
    }

    Ok(Snapshot::new(headers, rows))
}
