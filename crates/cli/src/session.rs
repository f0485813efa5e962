use anyhow::{Context, Result};
use clap::ValueEnum;
use launchkit_core::OwnerId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const SESSION_FILE: &str = "session.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Standard,
    Elevated,
}

/// The authenticated account on this machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub owner_id: OwnerId,
    #[serde(default)]
    pub role: Role,
}

impl Session {
    pub fn new(owner_id: OwnerId, role: Role) -> Self {
        Self { owner_id, role }
    }

    /// Curated prompt presets are offered to elevated sessions only
    pub fn can_use_presets(&self) -> bool {
        self.role == Role::Elevated
    }
}

fn session_path(home: &Path) -> PathBuf {
    home.join(SESSION_FILE)
}

pub fn load(home: &Path) -> Result<Option<Session>> {
    let path = session_path(home);
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(&path).context("Failed to read session file")?;
    let session = toml::from_str(&contents).context("Failed to parse session file")?;
    Ok(Some(session))
}

pub fn save(home: &Path, session: &Session) -> Result<()> {
    fs::create_dir_all(home)?;
    let contents = toml::to_string_pretty(session).context("Failed to serialize session")?;
    fs::write(session_path(home), contents).context("Failed to write session file")?;
    Ok(())
}

/// Remove the session. Returns whether one existed.
pub fn clear(home: &Path) -> Result<bool> {
    let path = session_path(home);
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(&path).context("Failed to remove session file")?;
    Ok(true)
}

pub fn require(home: &Path) -> Result<Session> {
    load(home)?.context("Not logged in. Run 'launchkit login <owner>' first")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_session_lifecycle() {
        let dir = TempDir::new().unwrap();
        assert!(load(dir.path()).unwrap().is_none());
        assert!(require(dir.path()).is_err());

        let session = Session::new(OwnerId::new("u1").unwrap(), Role::Elevated);
        save(dir.path(), &session).unwrap();
        assert_eq!(load(dir.path()).unwrap(), Some(session));

        assert!(clear(dir.path()).unwrap());
        assert!(!clear(dir.path()).unwrap());
        assert!(load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_role_defaults_to_standard() {
        let session: Session = toml::from_str(r#"owner_id = "u1""#).unwrap();
        assert_eq!(session.role, Role::Standard);
        assert!(!session.can_use_presets());
    }

    #[test]
    fn test_invalid_owner_rejected() {
        let result: std::result::Result<Session, _> = toml::from_str(r#"owner_id = "../etc""#);
        assert!(result.is_err());
    }
}
