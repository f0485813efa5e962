pub mod address;
pub mod config;
pub mod error;
pub mod types;

pub use address::{Address, parse_address, share_link};
pub use config::{Config, load_config};
pub use error::{Error, GenerationError, Result};
pub use types::*;
