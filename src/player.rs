use anyhow::{Result, anyhow};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::constants::constants;

/// Canonical watch URL for a video id.
pub fn watch_url(identifier: &str) -> String {
  format!("{}{}", constants().watch_base_url, identifier)
}

/// A running external player.
#[derive(Debug)]
pub struct PlaybackSession {
  pub url: String,
  child: Child,
}

/// Starts the external player and tracks the one live session.
#[derive(Debug)]
pub struct Launcher {
  program: String,
  session: Option<PlaybackSession>,
}

impl Launcher {
  pub fn new(program: impl Into<String>) -> Self {
    Self { program: program.into(), session: None }
  }

  pub fn program(&self) -> &str {
    &self.program
  }

  pub fn is_playing(&self) -> bool {
    self.session.is_some()
  }

  #[cfg(test)]
  pub fn session(&self) -> Option<&PlaybackSession> {
    self.session.as_ref()
  }

  /// Spawn `<program> <url>`. The player inherits the terminal.
  /// A session that is still tracked is stopped first.
  pub async fn launch(&mut self, url: String) -> Result<()> {
    if self.is_playing() {
      info!("player: replacing running session");
    }
    self.stop().await;

    let child = Command::new(&self.program)
      .arg(&url)
      .stdin(Stdio::inherit())
      .stdout(Stdio::inherit())
      .stderr(Stdio::inherit())
      .spawn()
      .map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
          anyhow!("{} not found in PATH", self.program)
        } else {
          anyhow!(e).context(format!("Failed to spawn {}", self.program))
        }
      })?;

    info!(program = %self.program, url = %url, pid = ?child.id(), "player: started");
    self.session = Some(PlaybackSession { url, child });
    Ok(())
  }

  /// Non-blocking liveness check. Returns `true` exactly once, on the poll
  /// that observes the tracked player has exited; the session is cleared then.
  pub fn poll_exited(&mut self) -> bool {
    let Some(session) = self.session.as_mut() else { return false };
    match session.child.try_wait() {
      Ok(None) => false,
      Ok(Some(status)) => {
        info!(url = %session.url, %status, "player: exited");
        self.session = None;
        true
      }
      Err(e) => {
        warn!(err = %e, "player: failed to query exit status, dropping session");
        self.session = None;
        true
      }
    }
  }

  /// Kill and reap a tracked player, if any. Failures are logged; the
  /// session is forgotten either way.
  pub async fn stop(&mut self) {
    let Some(mut session) = self.session.take() else { return };
    if let Err(e) = session.child.kill().await {
      warn!(err = %e, "player: kill failed");
    }
    match session.child.wait().await {
      Ok(status) => info!(url = %session.url, %status, "player: stopped"),
      Err(e) => warn!(url = %session.url, err = %e, "player: failed to reap"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  async fn wait_for_exit(launcher: &mut Launcher) -> bool {
    for _ in 0..100 {
      if launcher.poll_exited() {
        return true;
      }
      tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
  }

  #[test]
  fn watch_url_appends_identifier() {
    assert_eq!(watch_url("abc123"), "https://www.youtube.com/watch?v=abc123");
  }

  #[test]
  fn idle_launcher_never_reports_exit() {
    let mut launcher = Launcher::new("mpv");
    assert!(!launcher.is_playing());
    assert!(!launcher.poll_exited());
  }

  #[tokio::test]
  async fn missing_program_is_an_error() {
    let mut launcher = Launcher::new("yts-test-no-such-player");
    let err = launcher.launch(watch_url("x")).await.unwrap_err();
    assert!(err.to_string().contains("not found"));
    assert!(!launcher.is_playing());
  }

  #[tokio::test]
  async fn exit_is_observed_once_and_clears_session() {
    let mut launcher = Launcher::new("true");
    launcher.launch(watch_url("abc")).await.unwrap();
    assert!(launcher.is_playing());
    assert_eq!(launcher.session().unwrap().url, "https://www.youtube.com/watch?v=abc");

    assert!(wait_for_exit(&mut launcher).await);
    assert!(!launcher.is_playing());
    assert!(!launcher.poll_exited());
  }

  #[tokio::test]
  async fn relaunch_replaces_running_session() {
    let mut launcher = Launcher::new("sleep");
    launcher.launch("30".to_string()).await.unwrap();
    launcher.launch("30".to_string()).await.unwrap();
    assert!(launcher.is_playing());
    launcher.stop().await;
    assert!(!launcher.is_playing());
  }

  #[tokio::test]
  async fn stop_without_session_is_noop() {
    let mut launcher = Launcher::new("sleep");
    launcher.stop().await;
    assert!(!launcher.is_playing());
    assert!(!launcher.poll_exited());
  }
}
