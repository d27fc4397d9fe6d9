pub mod credentials;
pub mod error;
pub mod scalars;

pub use credentials::Credentials;
pub use error::{AppError, Result};
