pub mod booking;
pub mod catalog;
pub mod client;
pub mod envelope;
pub mod filters;
pub mod payment;
pub mod provider;
pub mod rating;
pub mod reference;
pub mod service;

pub use booking::{Booking, BookingLineItem};
pub use catalog::{Category, Location};
pub use client::{Client, UserInfo};
pub use filters::{BookingFilter, LineItemFilter, Pagination, QueryParams, RatingFilter, ServiceFilter};
pub use payment::Payment;
pub use provider::Provider;
pub use rating::{Comment, Rating};
pub use reference::{EntityId, Identified, Reference};
pub use service::Service;
