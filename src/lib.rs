//! Marketplace reporting gateway
//!
//! Fetches marketplace entities from an upstream REST API, reconciles partial
//! references, and serves aggregate reports (sales, satisfaction, providers,
//! clients, rankings and trends) as JSON.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

pub use modules::marketplace;
pub use modules::reports;
