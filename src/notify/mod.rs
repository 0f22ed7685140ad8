//! Alert rendering and delivery.
//!
//! One alert is rendered per matched row and sent to every configured
//! chat destination independently. The transport is behind the
//! `Notifier` trait so the pipeline can be exercised without Telegram.

pub mod telegram;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{FilterConfig, MatchedRow, SheetConfig};

// Re-export for convenience
pub use telegram::TelegramNotifier;

/// Trait for message delivery transports.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a text message to a single chat destination.
    async fn send(&self, chat_id: &str, text: &str) -> Result<()>;
}

/// Render the alert text for one matched row.
///
/// The cell anchor points at the row's status cell so the link opens the
/// sheet scrolled to the flagged value.
pub fn render_alert(
    matched: &MatchedRow,
    filter: &FilterConfig,
    sheet: &SheetConfig,
    status_col_index: usize,
) -> String {
    let link = sheet.cell_link_at(status_col_index, matched.sheet_row());
    format!(
        "\u{26a0} {} Found ({})\n{}: {}\nRow: {}\nOpen Sheet: {}",
        filter.status_value,
        filter.service_line,
        filter.id_column,
        matched.display_id(),
        matched.sheet_row(),
        link
    )
}
