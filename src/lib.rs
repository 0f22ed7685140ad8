// src/lib.rs

//! sheetwatch library
//!
//! Polls a Google Sheet's CSV export on a fixed interval, filters rows by
//! status and service line, and sends one Telegram alert per row that has
//! not been notified before.

pub mod dedup;
pub mod error;
pub mod filter;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod sheet;
pub mod utils;
