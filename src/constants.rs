//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!`, parsed once on first access.

use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Constants {
  // Playback
  pub watch_base_url: String,
  pub default_player: String,
  pub liveness_poll_ms: u64,

  // InnerTube search
  pub search_endpoint: String,
  pub client_name: String,
  pub client_name_id: String,
  pub client_version: String,
  pub client_hl: String,
  pub client_gl: String,
  pub user_agent: String,
  pub request_timeout_ms: u64,

  // Thumbnails
  pub thumbnail_timeout_ms: u64,
  pub thumbnail_concurrency: usize,

  // UI
  pub error_display_secs: u64,
}

impl Constants {
  pub fn liveness_interval(&self) -> Duration {
    Duration::from_millis(self.liveness_poll_ms)
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_millis(self.request_timeout_ms)
  }

  pub fn thumbnail_timeout(&self) -> Duration {
    Duration::from_millis(self.thumbnail_timeout_ms)
  }
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; a malformed file fails the first test run.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

pub fn constants() -> &'static Constants {
  &CONSTANTS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert_eq!(c.watch_base_url, "https://www.youtube.com/watch?v=");
    assert_eq!(c.default_player, "mpv");
    assert_eq!(c.liveness_interval(), Duration::from_secs(1));
    assert!(c.thumbnail_concurrency > 0);
  }
}
