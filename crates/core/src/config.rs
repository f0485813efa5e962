use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TAILWIND_RUNTIME: &str = "https://cdn.tailwindcss.com";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// Environment variables consulted for the generative API key, in order
pub const API_KEY_VARS: &[&str] = &["LAUNCHKIT_API_KEY", "GEMINI_API_KEY"];

/// Raw TOML configuration structure
/// This matches the config.toml file structure exactly; every table is optional
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    generator: RawGenerator,
    #[serde(default)]
    store: RawStore,
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    renderer: RawRenderer,
}

#[derive(Debug, Default, Deserialize)]
struct RawGenerator {
    model: Option<String>,
    endpoint: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStore {
    backend: Option<String>,
    data_dir: Option<String>,
    public_reads: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct RawServer {
    host: Option<String>,
    port: Option<u16>,
    public_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRenderer {
    tailwind_runtime_url: Option<String>,
}

/// Complete launchkit configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub generator: GeneratorConfig,
    pub store: StoreConfig,
    pub server: ServerConfig,
    pub renderer: RendererConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub model: String,
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Fs,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub data_dir: PathBuf,
    /// Anyone may read a single record by address; the resolver still
    /// applies the publish gate on top
    pub public_reads: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
}

impl ServerConfig {
    /// Base URL used in share links
    pub fn base_url(&self) -> String {
        self.public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.host, self.port))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererConfig {
    pub tailwind_runtime_url: String,
}

impl Config {
    /// Defaults rooted at `home` (the directory holding `config.toml`)
    pub fn defaults_in(home: &Path) -> Self {
        Self {
            generator: GeneratorConfig {
                model: DEFAULT_MODEL.to_string(),
                endpoint: DEFAULT_ENDPOINT.to_string(),
                api_key: None,
            },
            store: StoreConfig {
                backend: StoreBackend::Fs,
                data_dir: home.join("data"),
                public_reads: true,
            },
            server: ServerConfig {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
                public_base_url: None,
            },
            renderer: RendererConfig {
                tailwind_runtime_url: DEFAULT_TAILWIND_RUNTIME.to_string(),
            },
        }
    }

    /// Fill or override the API key from the environment
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for var in API_KEY_VARS {
            if let Some(key) = lookup(var).filter(|k| !k.trim().is_empty()) {
                self.generator.api_key = Some(key);
                return;
            }
        }
    }
}

/// Directory holding launchkit's config, session and default data
pub fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| Error::ConfigParse("Could not determine home directory".to_string()))?;
    Ok(PathBuf::from(home).join(".launchkit"))
}

/// Load `config.toml` from `home`, falling back to defaults when absent
pub fn load_config(home: &Path) -> Result<Config> {
    let path = home.join("config.toml");
    if !path.exists() {
        return Ok(Config::defaults_in(home));
    }
    let content = fs::read_to_string(&path)?;
    parse_config_str(&content, home)
}

/// Parse config from a string (useful for testing)
pub fn parse_config_str(content: &str, home: &Path) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)?;
    let mut config = Config::defaults_in(home);

    if let Some(model) = raw.generator.model {
        config.generator.model = non_empty(model, "generator.model")?;
    }
    if let Some(endpoint) = raw.generator.endpoint {
        config.generator.endpoint = validate_url(&endpoint, "generator.endpoint")?;
    }
    config.generator.api_key = raw.generator.api_key.filter(|k| !k.trim().is_empty());

    if let Some(backend) = raw.store.backend {
        config.store.backend = match backend.as_str() {
            "fs" => StoreBackend::Fs,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(Error::ConfigParse(format!(
                    "Unknown store.backend '{}', expected \"fs\" or \"memory\"",
                    other
                )));
            }
        };
    }
    if let Some(dir) = raw.store.data_dir {
        config.store.data_dir = validate_data_dir(&dir, home)?;
    }
    if let Some(public_reads) = raw.store.public_reads {
        config.store.public_reads = public_reads;
    }

    if let Some(host) = raw.server.host {
        config.server.host = non_empty(host, "server.host")?;
    }
    if let Some(port) = raw.server.port {
        if port == 0 {
            return Err(Error::ConfigParse("server.port must be non-zero".to_string()));
        }
        config.server.port = port;
    }
    if let Some(url) = raw.server.public_base_url {
        config.server.public_base_url = Some(validate_url(&url, "server.public_base_url")?);
    }

    if let Some(url) = raw.renderer.tailwind_runtime_url {
        config.renderer.tailwind_runtime_url = validate_url(&url, "renderer.tailwind_runtime_url")?;
    }

    Ok(config)
}

fn non_empty(value: String, field_name: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(Error::ConfigParse(format!("Empty value in '{}'", field_name)));
    }
    Ok(value)
}

fn validate_url(value: &str, field_name: &str) -> Result<String> {
    let value = value.trim();
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(Error::ConfigParse(format!(
            "'{}' must be an http(s) URL: '{}'",
            field_name, value
        )));
    }
    Ok(value.trim_end_matches('/').to_string())
}

/// Resolve and validate `store.data_dir`.
///
/// `~/` expands to the parent of the launchkit home, relative paths resolve
/// against the launchkit home. Parent directory references are rejected so a
/// config file cannot point the store outside the tree it names.
fn validate_data_dir(dir: &str, home: &Path) -> Result<PathBuf> {
    if dir.trim().is_empty() {
        return Err(Error::ConfigParse("Empty path in 'store.data_dir' field".to_string()));
    }

    let path = Path::new(dir);
    if path.components().any(|c| c == Component::ParentDir) {
        return Err(Error::ConfigParse(format!(
            "Parent directory references (..) not allowed in 'store.data_dir': '{}'",
            dir
        )));
    }

    if let Some(rest) = dir.strip_prefix("~/") {
        let user_home = home.parent().unwrap_or(home);
        return Ok(user_home.join(rest));
    }
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(home.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> PathBuf {
        PathBuf::from("/home/ada/.launchkit")
    }

    #[test]
    fn test_empty_config_is_defaults() {
        let config = parse_config_str("", &home()).unwrap();
        assert_eq!(config, Config::defaults_in(&home()));
        assert_eq!(config.generator.model, "gemini-2.5-flash");
        assert_eq!(config.store.backend, StoreBackend::Fs);
        assert_eq!(config.store.data_dir, home().join("data"));
        assert!(config.store.public_reads);
        assert_eq!(config.server.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[generator]
model = "gemini-2.5-pro"
endpoint = "https://example.test/v1beta/"
api_key = "k-123"

[store]
backend = "memory"
data_dir = "/var/lib/launchkit"
public_reads = false

[server]
host = "0.0.0.0"
port = 9000
public_base_url = "https://launch.example.com"

[renderer]
tailwind_runtime_url = "https://cdn.example.com/tailwind.js"
        "#;

        let config = parse_config_str(toml, &home()).unwrap();
        assert_eq!(config.generator.model, "gemini-2.5-pro");
        assert_eq!(config.generator.endpoint, "https://example.test/v1beta");
        assert_eq!(config.generator.api_key.as_deref(), Some("k-123"));
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.data_dir, PathBuf::from("/var/lib/launchkit"));
        assert!(!config.store.public_reads);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.base_url(), "https://launch.example.com");
        assert_eq!(
            config.renderer.tailwind_runtime_url,
            "https://cdn.example.com/tailwind.js"
        );
    }

    #[test]
    fn test_data_dir_resolution() {
        let config = parse_config_str("[store]\ndata_dir = \"sites\"", &home()).unwrap();
        assert_eq!(config.store.data_dir, home().join("sites"));

        let config = parse_config_str("[store]\ndata_dir = \"~/launch\"", &home()).unwrap();
        assert_eq!(config.store.data_dir, PathBuf::from("/home/ada/launch"));
    }

    #[test]
    fn test_data_dir_rejects_parent_dir() {
        let result = parse_config_str("[store]\ndata_dir = \"../../etc\"", &home());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Parent directory references")
        );
    }

    #[test]
    fn test_rejects_unknown_backend() {
        let result = parse_config_str("[store]\nbackend = \"s3\"", &home());
        assert!(result.unwrap_err().to_string().contains("store.backend"));
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let result = parse_config_str("[generator]\nendpoint = \"ftp://x\"", &home());
        assert!(result.unwrap_err().to_string().contains("generator.endpoint"));
    }

    #[test]
    fn test_rejects_zero_port_and_empty_model() {
        assert!(parse_config_str("[server]\nport = 0", &home()).is_err());
        assert!(parse_config_str("[generator]\nmodel = \"  \"", &home()).is_err());
    }

    #[test]
    fn test_apply_env_prefers_launchkit_var() {
        let mut config = Config::defaults_in(&home());
        config.apply_env(|var| match var {
            "LAUNCHKIT_API_KEY" => Some("primary".to_string()),
            "GEMINI_API_KEY" => Some("secondary".to_string()),
            _ => None,
        });
        assert_eq!(config.generator.api_key.as_deref(), Some("primary"));

        let mut config = Config::defaults_in(&home());
        config.apply_env(|var| (var == "GEMINI_API_KEY").then(|| "secondary".to_string()));
        assert_eq!(config.generator.api_key.as_deref(), Some("secondary"));
    }

    #[test]
    fn test_apply_env_keeps_file_key_when_unset() {
        let mut config = parse_config_str("[generator]\napi_key = \"file\"", &home()).unwrap();
        config.apply_env(|_| None);
        assert_eq!(config.generator.api_key.as_deref(), Some("file"));
    }
}
