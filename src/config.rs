use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

/// User preferences persisted in `prefs.toml`.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub theme_name: Option<String>,
  /// Player executable; `mpv` when unset.
  pub player: Option<String>,
}

fn config_file() -> Option<PathBuf> {
  ProjectDirs::from("", "", "yts").map(|dirs| dirs.config_dir().join("prefs.toml"))
}

impl Config {
  pub fn parse(content: &str) -> Result<Self> {
    toml::from_str(content).context("Invalid prefs.toml")
  }

  /// Load preferences, falling back to defaults when the file is absent or invalid.
  pub fn load() -> Self {
    let Some(path) = config_file() else { return Self::default() };
    let Ok(content) = std::fs::read_to_string(&path) else {
      debug!(path = %path.display(), "config: no prefs file");
      return Self::default();
    };
    match Self::parse(&content) {
      Ok(config) => config,
      Err(e) => {
        warn!(path = %path.display(), err = %format!("{:#}", e), "config: ignoring unreadable prefs");
        Self::default()
      }
    }
  }

  pub fn save(&self) {
    let Some(path) = config_file() else { return };
    if let Err(e) = self.write_to(&path) {
      warn!(path = %path.display(), err = %format!("{:#}", e), "config: failed to save prefs");
    }
  }

  fn write_to(&self, path: &std::path::Path) -> Result<()> {
    if let Some(dir) = path.parent() {
      std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let content = toml::to_string(self).context("Failed to serialize prefs")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_full_prefs() {
    let config = Config::parse("theme_name = \"tide\"\nplayer = \"vlc\"\n").unwrap();
    assert_eq!(config.theme_name.as_deref(), Some("tide"));
    assert_eq!(config.player.as_deref(), Some("vlc"));
  }

  #[test]
  fn parse_empty_prefs_is_default() {
    assert_eq!(Config::parse("").unwrap(), Config::default());
  }

  #[test]
  fn parse_rejects_wrong_types() {
    assert!(Config::parse("player = 3").is_err());
  }

  #[test]
  fn serialized_prefs_parse_back() {
    let config = Config { theme_name: Some("paper".to_string()), player: None };
    let text = toml::to_string(&config).unwrap();
    assert_eq!(Config::parse(&text).unwrap(), config);
  }
}
