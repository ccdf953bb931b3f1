//! # Market Telegram Bot
//!
//! A Telegram marketplace: buyers browse and search a shared catalog,
//! approved sellers publish and manage products, and a single administrator
//! approves or rejects seller requests.

pub mod approval;
pub mod bot;
pub mod catalog;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod directory;
pub mod errors;
pub mod localization;
pub mod marketplace;
pub mod memory_store;
pub mod models;
pub mod notifier;
pub mod price;
pub mod product_flow;
pub mod store;

pub use errors::{MarketError, MarketResult};
