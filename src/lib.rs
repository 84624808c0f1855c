pub mod config;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod geo;
pub mod model;
pub mod output;

pub use config::FeedConfig;
pub use error::{DecodeError, FeedError};
