// Owner-scoped persistence of site records and public resolution by address

pub mod backend;
pub mod fs;
pub mod memory;
pub mod resolver;
pub mod service;

use launchkit_core::config::{StoreBackend, StoreConfig};
use std::sync::Arc;

pub use backend::{AccessRules, DocumentStore, NewSite};
pub use fs::FsStore;
pub use memory::MemoryStore;
pub use resolver::Resolver;
pub use service::SiteStore;

/// Build the backend named by the configuration
pub fn open_backend(config: &StoreConfig) -> Arc<dyn DocumentStore> {
    let rules = AccessRules {
        public_reads: config.public_reads,
    };
    match config.backend {
        StoreBackend::Fs => Arc::new(FsStore::new(&config.data_dir, rules)),
        StoreBackend::Memory => Arc::new(MemoryStore::new(rules)),
    }
}
