pub mod models;
pub mod repositories;

pub use models::{Booking, BookingLineItem, Client, EntityId, Provider, Rating, Reference, Service};
pub use repositories::{EntityKind, MarketplaceRepository, RestMarketplaceRepository};
