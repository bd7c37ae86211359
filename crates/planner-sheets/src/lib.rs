//! # planner-sheets
//!
//! Google Sheets v4 reader implementing [`TabularSource`](planner_core::traits::TabularSource).

pub mod auth;
pub mod client;


pub use auth::{Credentials, ServiceAccountKey};
pub use client::GoogleSheetsClient;
