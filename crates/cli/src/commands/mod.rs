pub mod auth;
pub mod configure;
pub mod export;
pub mod serve;
pub mod sites;
pub mod validate;

use anyhow::{Context, Result};
use launchkit_core::config::{Config, StoreBackend, config_dir, load_config};
use launchkit_generator::{GeminiBackend, Generator};
use launchkit_renderer::RenderOptions;
use launchkit_store::{DocumentStore, open_backend};
use launchkit_validator::ValidationReport;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Loaded configuration plus the directory it lives in
pub struct Workspace {
    pub home: PathBuf,
    pub config: Config,
}

impl Workspace {
    pub fn load() -> Result<Self> {
        let home = config_dir()?;
        let mut config = load_config(&home).context("Failed to load config.toml")?;
        config.apply_env(|var| std::env::var(var).ok());
        Ok(Self { home, config })
    }

    pub fn backend(&self) -> Arc<dyn DocumentStore> {
        if self.config.store.backend == StoreBackend::Memory {
            warn!("memory store backend does not persist between commands");
        }
        open_backend(&self.config.store)
    }

    pub fn generator(&self) -> Result<Generator> {
        let generator = &self.config.generator;
        let api_key = generator.api_key.as_deref().context(
            "No API key configured. Set LAUNCHKIT_API_KEY or run 'launchkit configure'",
        )?;
        let backend = GeminiBackend::new(api_key, &generator.endpoint, &generator.model)?;
        Ok(Generator::new(Arc::new(backend)))
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            tailwind_runtime_url: self.config.renderer.tailwind_runtime_url.clone(),
            base_href: None,
        }
    }

    pub fn base_url(&self) -> String {
        self.config.server.base_url()
    }
}

/// Print a validation report in status-line form
pub fn print_report(report: &ValidationReport) {
    for error in &report.errors {
        println!("   ✗ {}", error);
    }
    for warning in &report.warnings {
        println!("   ⚠ {}", warning);
    }
    for info in &report.info {
        println!("   ℹ {}", info);
    }
}
