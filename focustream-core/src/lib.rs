pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod invalidation;
pub mod logging;
pub mod models;
pub mod populator;
pub mod resolver;
pub mod selector;
pub mod service;

#[cfg(test)]
pub mod test_helpers;

pub use catalog::Catalog;
pub use config::Config;
pub use error::{Error, Result};
pub use models::StreamRecord;
pub use service::StreamService;
