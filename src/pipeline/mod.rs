//! Poll cycle and watch loop.
//!
//! One cycle is load → filter → claim → notify → persist, strictly in that
//! order. The watch loop repeats cycles forever on a fixed period measured
//! from cycle end; a failed cycle is logged and the next tick retries.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use reqwest::Client;

use crate::dedup::DedupStore;
use crate::error::{AppError, Result};
use crate::filter::match_rows;
use crate::models::{Config, Snapshot};
use crate::notify::{Notifier, render_alert};
use crate::sheet::fetch_snapshot;

/// Parallel in-flight sends per matched row. Destinations are independent,
/// so one slow chat does not hold up the rest.
const MAX_PARALLEL_SENDS: usize = 4;

/// Summary of one poll cycle.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// When the cycle ran
    pub timestamp: DateTime<Utc>,
    /// Total data rows in the snapshot
    pub rows_total: usize,
    /// Rows matching the status/service filter
    pub rows_matched: usize,
    /// Rows for which an alert was dispatched this cycle
    pub notified: usize,
    /// Individual chat deliveries that failed
    pub delivery_failures: usize,
}

/// Filter a snapshot, claim new rows, and fan alerts out to every chat.
///
/// Claims are committed before delivery and never rolled back: a row whose
/// sends all fail will not be retried. At-most-once dedup takes priority
/// over at-least-once delivery.
pub async fn process_snapshot(
    snapshot: &Snapshot,
    config: &Config,
    store: &mut dyn DedupStore,
    notifier: &dyn Notifier,
) -> Result<CycleOutcome> {
    let matched = match_rows(snapshot, &config.filter)?;
    let status_col = snapshot
        .column_index(&config.filter.status_column)
        .ok_or_else(|| {
            AppError::snapshot(format!(
                "column '{}' not found in snapshot",
                config.filter.status_column
            ))
        })?;

    let mut outcome = CycleOutcome {
        timestamp: Utc::now(),
        rows_total: snapshot.row_count(),
        rows_matched: matched.len(),
        notified: 0,
        delivery_failures: 0,
    };

    for row in &matched {
        // Keyless rows (empty/"none" identifier) have nothing to claim and
        // alert on every cycle they appear.
        if let Some(id) = &row.id {
            if !store.claim(id).await {
                continue;
            }
        }

        let text = render_alert(row, &config.filter, &config.sheet, status_col);

        let mut sends = stream::iter(config.telegram.chat_ids.iter())
            .map(|chat_id| {
                let text = text.as_str();
                async move { (chat_id, notifier.send(chat_id, text).await) }
            })
            .buffer_unordered(MAX_PARALLEL_SENDS);

        while let Some((chat_id, result)) = sends.next().await {
            if let Err(error) = result {
                outcome.delivery_failures += 1;
                log::warn!("Failed to send to {}: {}", chat_id, error);
            }
        }

        outcome.notified += 1;
    }

    Ok(outcome)
}

/// Run one full cycle: fetch, process, persist.
pub async fn run_cycle(
    config: &Config,
    client: &Client,
    store: &mut dyn DedupStore,
    notifier: &dyn Notifier,
) -> Result<CycleOutcome> {
    let url = config.sheet.export_url();
    log::info!("Checking sheet");

    let snapshot = fetch_snapshot(client, &url).await?;
    log::info!("Total rows in sheet: {}", snapshot.row_count());

    let outcome = process_snapshot(&snapshot, config, store, notifier).await?;
    log::info!(
        "Found {} {} rows for {}",
        outcome.rows_matched,
        config.filter.status_value,
        config.filter.service_line
    );

    // A failed persist must not kill the loop; the next cycle retries the
    // write, at the cost of possibly re-notifying unpersisted claims.
    if let Err(error) = store.flush().await {
        log::error!("Failed to persist notified set: {}", error);
    }

    log::info!(
        "Done checking: {} notified, {} delivery failures",
        outcome.notified,
        outcome.delivery_failures
    );
    Ok(outcome)
}

/// Run cycles forever on the configured period.
///
/// The sleep is measured from the end of the previous cycle, not aligned
/// to the wall clock. Only external termination stops the loop.
pub async fn run_watch(
    config: &Config,
    client: &Client,
    store: &mut dyn DedupStore,
    notifier: &dyn Notifier,
) -> Result<()> {
    let period = Duration::from_secs(config.watcher.poll_secs);

    loop {
        if let Err(error) = run_cycle(config, client, store, notifier).await {
            log::error!("Cycle failed: {}", error);
        }
        tokio::time::sleep(period).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::models::Row;

    struct MemoryStore {
        known: HashSet<String>,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                known: HashSet::new(),
            }
        }

        fn with_known(ids: &[&str]) -> Self {
            Self {
                known: ids.iter().map(|id| id.to_string()).collect(),
            }
        }
    }

    #[async_trait]
    impl DedupStore for MemoryStore {
        async fn is_known(&self, id: &str) -> bool {
            self.known.contains(id)
        }

        async fn claim(&mut self, id: &str) -> bool {
            self.known.insert(id.to_string())
        }

        async fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
        failing_chats: HashSet<String>,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                failing_chats: HashSet::new(),
            }
        }

        fn failing_for(chats: &[&str]) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                failing_chats: chats.iter().map(|c| c.to_string()).collect(),
            }
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
            if self.failing_chats.contains(chat_id) {
                return Err(AppError::delivery(chat_id, "simulated failure"));
            }
            self.sent
                .lock()
                .unwrap()
                .push((chat_id.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.sheet.spreadsheet_id = "doc1".to_string();
        config.filter.service_line = "Fiber".to_string();
        config.telegram.chat_ids = vec!["-1001".to_string()];
        config
    }

    fn snapshot(rows: &[[&str; 3]]) -> Snapshot {
        Snapshot::new(
            vec!["Order Id".into(), "Status".into(), "Service Line".into()],
            rows.iter()
                .map(|cells| Row::new(cells.iter().map(|c| c.to_string()).collect()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn notifies_only_unclaimed_matches() {
        let snapshot = snapshot(&[
            ["A-1", "NRA", "Fiber"],
            ["A-2", "Done", "Fiber"],
            ["A-3", "NRA", "Fiber"],
        ]);
        let mut store = MemoryStore::with_known(&["A-1"]);
        let notifier = RecordingNotifier::new();
        let config = test_config();

        let outcome = process_snapshot(&snapshot, &config, &mut store, &notifier)
            .await
            .unwrap();

        assert_eq!(outcome.rows_total, 3);
        assert_eq!(outcome.rows_matched, 2);
        assert_eq!(outcome.notified, 1);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        // Row 3 of the data is sheet row 4.
        assert!(sent[0].1.contains("Order Id: A-3"));
        assert!(sent[0].1.contains("Row: 4"));
        assert!(sent[0].1.contains("range=B4"));

        assert!(store.is_known("A-1").await);
        assert!(store.is_known("A-3").await);
    }

    #[tokio::test]
    async fn second_cycle_on_same_snapshot_is_silent() {
        let snapshot = snapshot(&[["A-1", "NRA", "Fiber"]]);
        let mut store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let config = test_config();

        let first = process_snapshot(&snapshot, &config, &mut store, &notifier)
            .await
            .unwrap();
        let second = process_snapshot(&snapshot, &config, &mut store, &notifier)
            .await
            .unwrap();

        assert_eq!(first.notified, 1);
        assert_eq!(second.notified, 0);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn keyless_row_notifies_every_cycle() {
        let snapshot = snapshot(&[["none", "NRA", "Fiber"]]);
        let mut store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let config = test_config();

        for _ in 0..2 {
            process_snapshot(&snapshot, &config, &mut store, &notifier)
                .await
                .unwrap();
        }

        assert_eq!(notifier.sent().len(), 2);
        assert!(store.known.is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_is_isolated_and_claim_stands() {
        let snapshot = snapshot(&[["A-1", "NRA", "Fiber"]]);
        let mut store = MemoryStore::new();
        let notifier = RecordingNotifier::failing_for(&["bad"]);
        let mut config = test_config();
        config.telegram.chat_ids = vec!["bad".to_string(), "good".to_string()];

        let outcome = process_snapshot(&snapshot, &config, &mut store, &notifier)
            .await
            .unwrap();

        assert_eq!(outcome.notified, 1);
        assert_eq!(outcome.delivery_failures, 1);

        // The remaining destination still got the alert.
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "good");

        // The claim is not rolled back: the next cycle stays silent even
        // though one destination never received the alert.
        let second = process_snapshot(&snapshot, &config, &mut store, &notifier)
            .await
            .unwrap();
        assert_eq!(second.notified, 0);
    }

    #[tokio::test]
    async fn every_chat_receives_each_alert() {
        let snapshot = snapshot(&[["A-1", "NRA", "Fiber"], ["A-2", "NRA", "Fiber"]]);
        let mut store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let mut config = test_config();
        config.telegram.chat_ids = vec!["-1001".to_string(), "7".to_string()];

        let outcome = process_snapshot(&snapshot, &config, &mut store, &notifier)
            .await
            .unwrap();

        assert_eq!(outcome.notified, 2);
        assert_eq!(notifier.sent().len(), 4);
    }

    #[tokio::test]
    async fn malformed_snapshot_leaves_store_untouched() {
        let snapshot = Snapshot::new(
            vec!["Order Id".into(), "Service Line".into()],
            vec![Row::new(vec!["A-1".into(), "Fiber".into()])],
        );
        let mut store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let config = test_config();

        let result = process_snapshot(&snapshot, &config, &mut store, &notifier).await;

        assert!(result.is_err());
        assert!(store.known.is_empty());
        assert!(notifier.sent().is_empty());
    }
}
