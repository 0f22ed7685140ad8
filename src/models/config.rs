//! Application configuration structures.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::utils::column_letter;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Sheet source settings
    #[serde(default)]
    pub sheet: SheetConfig,

    /// Row matching settings
    #[serde(default)]
    pub filter: FilterConfig,

    /// Telegram delivery settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Poll loop behavior settings
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Dedup store selection
    #[serde(default)]
    pub dedup: DedupConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Missing secrets are backfilled from the environment
    /// (`TELEGRAM_TOKEN`, `SUPABASE_KEY`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(&path).map_err(|e| {
            AppError::config(format!(
                "Failed to read config from {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;
        let mut config: Config = toml::from_str(&content)?;

        if config.telegram.token.is_empty() {
            if let Ok(token) = env::var("TELEGRAM_TOKEN") {
                config.telegram.token = token;
            }
        }
        if let Some(supabase) = config.dedup.supabase.as_mut() {
            if supabase.key.is_empty() {
                if let Ok(key) = env::var("SUPABASE_KEY") {
                    supabase.key = key;
                }
            }
        }

        Ok(config)
    }

    /// Validate configuration values. Any failure here is fatal at startup.
    pub fn validate(&self) -> Result<()> {
        if self.sheet.spreadsheet_id.trim().is_empty() && self.sheet.csv_url.is_none() {
            return Err(AppError::config(
                "sheet.spreadsheet_id (or sheet.csv_url) is required",
            ));
        }
        if self.filter.service_line.trim().is_empty() {
            return Err(AppError::config("filter.service_line is required"));
        }
        if self.filter.status_value.trim().is_empty() {
            return Err(AppError::config("filter.status_value must not be empty"));
        }
        if self.telegram.token.trim().is_empty() {
            return Err(AppError::config(
                "telegram.token is required (or set TELEGRAM_TOKEN)",
            ));
        }
        if self.telegram.chat_ids.is_empty() {
            return Err(AppError::config("telegram.chat_ids must not be empty"));
        }
        if self.watcher.poll_secs == 0 {
            return Err(AppError::config("watcher.poll_secs must be > 0"));
        }
        if self.watcher.timeout_secs == 0 {
            return Err(AppError::config("watcher.timeout_secs must be > 0"));
        }
        match self.dedup.backend {
            DedupBackend::File => {
                if self.dedup.state_file.trim().is_empty() {
                    return Err(AppError::config("dedup.state_file must not be empty"));
                }
            }
            DedupBackend::Supabase => {
                let supabase = self.dedup.supabase.as_ref().ok_or_else(|| {
                    AppError::config("dedup.supabase section is required for backend = \"supabase\"")
                })?;
                if supabase.url.trim().is_empty() {
                    return Err(AppError::config("dedup.supabase.url is required"));
                }
                if supabase.key.trim().is_empty() {
                    return Err(AppError::config(
                        "dedup.supabase.key is required (or set SUPABASE_KEY)",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Google Sheet source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Spreadsheet document ID from the sheet URL
    #[serde(default)]
    pub spreadsheet_id: String,

    /// Worksheet GID within the document
    #[serde(default = "defaults::gid")]
    pub gid: String,

    /// Full CSV export URL override (takes precedence when set)
    #[serde(default)]
    pub csv_url: Option<String>,
}

impl SheetConfig {
    /// CSV export URL for the configured worksheet.
    pub fn export_url(&self) -> String {
        match &self.csv_url {
            Some(url) => url.clone(),
            None => format!(
                "https://docs.google.com/spreadsheets/d/{}/export?format=csv&gid={}",
                self.spreadsheet_id, self.gid
            ),
        }
    }

    /// Deep link to a cell in the sheet editor, e.g. `D17`.
    pub fn cell_link(&self, cell: &str) -> String {
        format!(
            "https://docs.google.com/spreadsheets/d/{}/edit#gid={}&range={}",
            self.spreadsheet_id, self.gid, cell
        )
    }

    /// Deep link to the cell at the given 0-based column and 1-based sheet row.
    pub fn cell_link_at(&self, column_index: usize, sheet_row: usize) -> String {
        self.cell_link(&format!("{}{}", column_letter(column_index), sheet_row))
    }
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            gid: defaults::gid(),
            csv_url: None,
        }
    }
}

/// Row matching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Status value that marks a row as alert-worthy
    #[serde(default = "defaults::status_value")]
    pub status_value: String,

    /// Column holding the row status
    #[serde(default = "defaults::status_column")]
    pub status_column: String,

    /// Column holding the service line
    #[serde(default = "defaults::service_column")]
    pub service_column: String,

    /// Column holding the per-row identifier used for dedup
    #[serde(default = "defaults::id_column")]
    pub id_column: String,

    /// Service line this watcher instance is responsible for
    #[serde(default)]
    pub service_line: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            status_value: defaults::status_value(),
            status_column: defaults::status_column(),
            service_column: defaults::service_column(),
            id_column: defaults::id_column(),
            service_line: String::new(),
        }
    }
}

/// Telegram delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    /// Bot API token (falls back to the TELEGRAM_TOKEN env var)
    #[serde(default)]
    pub token: String,

    /// Destination chat IDs, each notified independently
    #[serde(default)]
    pub chat_ids: Vec<String>,
}

/// Poll loop behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Seconds to wait between cycles, measured from cycle end
    #[serde(default = "defaults::poll_secs")]
    pub poll_secs: u64,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_secs: defaults::poll_secs(),
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
        }
    }
}

/// Which dedup store backs the notified-row set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DedupBackend {
    #[default]
    File,
    Supabase,
}

/// Dedup store selection and backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Backend strategy: local JSON file or shared Supabase table
    #[serde(default)]
    pub backend: DedupBackend,

    /// State file path for the file backend
    #[serde(default = "defaults::state_file")]
    pub state_file: String,

    /// Supabase settings, required for the supabase backend
    #[serde(default)]
    pub supabase: Option<SupabaseConfig>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            backend: DedupBackend::File,
            state_file: defaults::state_file(),
            supabase: None,
        }
    }
}

/// Supabase REST settings for the shared dedup table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: String,

    /// Service key (falls back to the SUPABASE_KEY env var)
    #[serde(default)]
    pub key: String,

    /// Table with a uniqueness constraint on `order_id`
    #[serde(default = "defaults::supabase_table")]
    pub table: String,
}

mod defaults {
    pub fn gid() -> String {
        "0".into()
    }
    pub fn status_value() -> String {
        "NRA".into()
    }
    pub fn status_column() -> String {
        "Status".into()
    }
    pub fn service_column() -> String {
        "Service Line".into()
    }
    pub fn id_column() -> String {
        "Order Id".into()
    }
    pub fn poll_secs() -> u64 {
        60
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; sheetwatch/0.1)".into()
    }
    pub fn state_file() -> String {
        "notified.json".into()
    }
    pub fn supabase_table() -> String {
        "notified_orders".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> Config {
        let mut config = Config::default();
        config.sheet.spreadsheet_id = "1AbCdEf".to_string();
        config.filter.service_line = "Fiber".to_string();
        config.telegram.token = "123:abc".to_string();
        config.telegram.chat_ids = vec!["-1001".to_string()];
        config
    }

    #[test]
    fn validate_minimal_config_ok() {
        assert!(minimal_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_spreadsheet() {
        let mut config = minimal_config();
        config.sheet.spreadsheet_id = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_csv_url_without_spreadsheet_id() {
        let mut config = minimal_config();
        config.sheet.spreadsheet_id = String::new();
        config.sheet.csv_url = Some("https://example.com/export.csv".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_token() {
        let mut config = minimal_config();
        config.telegram.token = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_chat_ids() {
        let mut config = minimal_config();
        config.telegram.chat_ids.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_supabase_backend_without_section() {
        let mut config = minimal_config();
        config.dedup.backend = DedupBackend::Supabase;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_full_toml() {
        let toml_str = r#"
            [sheet]
            spreadsheet_id = "1AbCdEf"
            gid = "42"

            [filter]
            service_line = "Fiber"
            id_column = "Work Order"

            [telegram]
            token = "123:abc"
            chat_ids = ["-1001", "7"]

            [dedup]
            backend = "supabase"

            [dedup.supabase]
            url = "https://xyz.supabase.co"
            key = "secret"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.sheet.gid, "42");
        assert_eq!(config.filter.id_column, "Work Order");
        assert_eq!(config.filter.status_value, "NRA");
        assert_eq!(config.telegram.chat_ids.len(), 2);
        assert_eq!(config.dedup.backend, DedupBackend::Supabase);
        assert_eq!(
            config.dedup.supabase.as_ref().unwrap().table,
            "notified_orders"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn export_url_from_parts() {
        let mut sheet = SheetConfig::default();
        sheet.spreadsheet_id = "doc1".to_string();
        sheet.gid = "5".to_string();
        assert_eq!(
            sheet.export_url(),
            "https://docs.google.com/spreadsheets/d/doc1/export?format=csv&gid=5"
        );
    }

    #[test]
    fn cell_link_anchors_range() {
        let mut sheet = SheetConfig::default();
        sheet.spreadsheet_id = "doc1".to_string();
        assert_eq!(
            sheet.cell_link_at(3, 17),
            "https://docs.google.com/spreadsheets/d/doc1/edit#gid=0&range=D17"
        );
    }
}
