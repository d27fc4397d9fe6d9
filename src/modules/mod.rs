pub mod cache;
pub mod health;
pub mod marketplace;
pub mod reports;
