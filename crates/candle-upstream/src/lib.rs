//! HTTP clients for the instrument directory and the quote source.

mod config;
mod directory;
mod error;
mod quotes;
mod wire;

pub use config::UpstreamConfig;
pub use directory::HttpInstrumentDirectory;
pub use error::UpstreamError;
pub use quotes::HttpQuoteSource;
