use anyhow::{Context, Result};
use launchkit_core::config::{StoreBackend, load_config, parse_config_str};
use std::fs;
use std::io::{self, Write};

use super::Workspace;

fn read_input(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Prompt with the current value shown; Enter keeps it
fn read_with_default(label: &str, current: &str) -> Result<String> {
    let input = read_input(&format!("{} [current: {}]: ", label, current))?;
    Ok(if input.is_empty() {
        current.to_string()
    } else {
        input
    })
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().take(6).collect();
    format!("{}...", visible)
}

/// Interactively write `~/.launchkit/config.toml`
pub async fn run(ws: &Workspace) -> Result<()> {
    println!("🔧 Configuring launchkit...\n");
    println!("📋 You'll need a Gemini API key");
    println!("      Create at: https://aistudio.google.com/app/apikey");
    println!("      (LAUNCHKIT_API_KEY or GEMINI_API_KEY override the saved key)");
    println!();

    // start from the file alone so environment keys are not persisted
    let mut config = load_config(&ws.home).context("Failed to load config.toml")?;

    let key_prompt = match config.generator.api_key.as_deref() {
        Some(key) => format!("API Key [current: {}]: ", mask(key)),
        None => "API Key (Enter to skip): ".to_string(),
    };
    let key = read_input(&key_prompt)?;
    if !key.is_empty() {
        config.generator.api_key = Some(key);
    }

    config.generator.model = read_with_default("Model", &config.generator.model)?;

    let backend = match config.store.backend {
        StoreBackend::Fs => "fs",
        StoreBackend::Memory => "memory",
    };
    let backend = read_with_default("Store backend (fs/memory)", backend)?;
    let data_dir = read_with_default(
        "Data directory",
        &config.store.data_dir.display().to_string(),
    )?;

    let current_base = config.server.base_url();
    let base_url = read_with_default("Public base URL", &current_base)?;
    if base_url != current_base {
        config.server.public_base_url = Some(base_url);
    }

    let mut table = toml::Value::try_from(&config).context("Failed to serialize config")?;
    if let Some(toml::Value::Table(store)) = table.get_mut("store") {
        store.insert("backend".to_string(), toml::Value::String(backend));
        store.insert("data_dir".to_string(), toml::Value::String(data_dir));
    }
    let contents = toml::to_string_pretty(&table).context("Failed to serialize config")?;
    // the saved file must load
    parse_config_str(&contents, &ws.home).context("Invalid configuration")?;

    fs::create_dir_all(&ws.home)?;
    let path = ws.home.join("config.toml");
    fs::write(&path, contents).context("Failed to write config file")?;
    println!("✅ Configuration saved to: {}", path.display());
    Ok(())
}
