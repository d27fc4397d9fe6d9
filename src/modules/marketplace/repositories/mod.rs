mod marketplace_repository;
mod rest_repository;

pub use marketplace_repository::{EntityKind, MarketplaceRepository};
pub use rest_repository::RestMarketplaceRepository;
