pub mod config;
pub mod errors;

pub use config::RetrievalConfig;
pub use errors::RetrievalError;
