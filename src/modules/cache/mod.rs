pub mod batch_loader;
pub mod ttl_cache;

pub use batch_loader::BatchLoader;
pub use ttl_cache::TtlCache;
