//! Stream record caching

pub mod singleflight;
pub mod stream_cache;

pub use singleflight::{FlightError, SingleFlight};
pub use stream_cache::StreamCache;
