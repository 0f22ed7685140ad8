//! Supabase-backed dedup store.
//!
//! The `claim` primitive is a REST insert into a table whose identifier
//! column carries a uniqueness constraint, so claims stay at-most-once
//! even when several watcher instances share one table. Any insert
//! failure, duplicate or transient, reads as "already known" and
//! suppresses the notification for that row in that cycle.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use url::Url;

use crate::dedup::DedupStore;
use crate::error::Result;
use crate::models::Config;
use crate::utils::http;

/// Shared-table dedup store using the Supabase REST API.
pub struct SupabaseStore {
    client: Client,
    endpoint: Url,
    key: String,
}

impl SupabaseStore {
    /// Build a store from the `[dedup.supabase]` configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let supabase = config.dedup.supabase.as_ref().ok_or_else(|| {
            crate::error::AppError::config("dedup.supabase section is missing")
        })?;

        let base = Url::parse(&supabase.url)?;
        let endpoint = base.join(&format!("rest/v1/{}", supabase.table))?;

        Ok(Self {
            client: http::create_client(&config.watcher)?,
            endpoint,
            key: supabase.key.clone(),
        })
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }
}

#[async_trait]
impl DedupStore for SupabaseStore {
    async fn is_known(&self, id: &str) -> bool {
        let id_filter = format!("eq.{id}");
        let request = self
            .authed(self.client.get(self.endpoint.clone()))
            .query(&[("select", "order_id"), ("order_id", id_filter.as_str())]);

        match request.send().await {
            Ok(response) => match response.json::<Vec<serde_json::Value>>().await {
                Ok(rows) => !rows.is_empty(),
                Err(e) => {
                    log::warn!("Failed to decode dedup lookup for {id}: {e}");
                    false
                }
            },
            Err(e) => {
                log::warn!("Dedup lookup for {id} failed: {e}");
                false
            }
        }
    }

    async fn claim(&mut self, id: &str) -> bool {
        let request = self
            .authed(self.client.post(self.endpoint.clone()))
            .header("Prefer", "return=minimal")
            .json(&json!({ "order_id": id }));

        match request.send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                // 409 is the expected duplicate-key outcome; anything else
                // still suppresses the notification for this cycle.
                if response.status() == StatusCode::CONFLICT {
                    log::debug!("Identifier {id} already claimed");
                } else {
                    log::warn!(
                        "Claim insert for {id} returned {}; treating as already known",
                        response.status()
                    );
                }
                false
            }
            Err(e) => {
                log::warn!("Claim insert for {id} failed: {e}; treating as already known");
                false
            }
        }
    }

    async fn flush(&mut self) -> Result<()> {
        // Each claim is already durable server-side.
        Ok(())
    }
}
