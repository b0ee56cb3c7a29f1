use anyhow::Result;
use image::DynamicImage;
use ratatui::{layout::Rect, widgets::ListState};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::constants::constants;
use crate::display::DisplayMode;
use crate::input::LineEditor;
use crate::innertube::{InnerTube, run_search};
use crate::player::{Launcher, watch_url};
use crate::projection::SearchResult;
use crate::theme::{THEMES, Theme, theme_index};
use crate::thumbnail::{Preview, ThumbnailDelivery, fetch_previews};

/// Result of one dispatched search, tagged with the ticket it was issued under.
#[derive(Debug)]
pub struct SearchOutcome {
  pub ticket: u64,
  pub result: Result<Vec<SearchResult>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  Input,
  Results,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPhase {
  Idle,
  /// Input is disabled and the progress view is shown.
  Searching { query: String, since: Instant },
}

#[derive(Debug, Clone)]
pub struct ResultEntry {
  pub result: SearchResult,
  pub preview: Preview,
}

/// Kitty placement and resized-thumbnail cache for the preview pane.
#[derive(Default)]
pub struct GraphicsCache {
  /// Where the preview image goes this frame, if a ready image is selected.
  pub thumb_area: Option<Rect>,
  pub last_sent: Option<(u64, usize, Rect)>,
  pub fitted: Option<(u64, usize, Rect, DynamicImage)>,
}

#[derive(Default)]
struct AsyncTasks {
  search_rx: Option<oneshot::Receiver<SearchOutcome>>,
  thumb_rx: Option<mpsc::Receiver<ThumbnailDelivery>>,
  thumb_handle: Option<JoinHandle<()>>,
}

pub struct App {
  pub editor: LineEditor,
  pub focus: Focus,
  pub phase: SearchPhase,
  pub theme_index: usize,
  /// Results of the current search, in payload order.
  pub entries: Vec<ResultEntry>,
  /// Error lines listed after the results. Never launchable.
  pub notices: Vec<String>,
  pub list_state: ListState,
  pub launcher: Launcher,
  /// False while the player owns the terminal.
  pub visible: bool,
  pub status_message: Option<String>,
  pub should_quit: bool,
  pub display_mode: DisplayMode,
  pub gfx: GraphicsCache,
  api: InnerTube,
  ticket: u64,
  tasks: AsyncTasks,
  launch_request: Option<String>,
  config: Config,
  status_time: Option<Instant>,
}

impl App {
  pub fn new(config: Config, display_mode: DisplayMode, api: InnerTube, player: String) -> Self {
    Self {
      editor: LineEditor::default(),
      focus: Focus::Input,
      phase: SearchPhase::Idle,
      theme_index: theme_index(config.theme_name.as_deref()),
      entries: Vec::new(),
      notices: Vec::new(),
      list_state: ListState::default(),
      launcher: Launcher::new(player),
      visible: true,
      status_message: None,
      should_quit: false,
      display_mode,
      gfx: GraphicsCache::default(),
      api,
      ticket: 0,
      tasks: AsyncTasks::default(),
      launch_request: None,
      config,
      status_time: None,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    // theme_index only ever comes from theme_index() or a modulo of THEMES.len().
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.save();
  }

  pub fn is_searching(&self) -> bool {
    matches!(self.phase, SearchPhase::Searching { .. })
  }

  /// Rows in the result list: results first, then notices.
  pub fn row_count(&self) -> usize {
    self.entries.len() + self.notices.len()
  }

  pub fn current_ticket(&self) -> u64 {
    self.ticket
  }

  /// Show a transient status line that expires on its own.
  pub fn set_status(&mut self, msg: impl Into<String>) {
    self.status_message = Some(msg.into());
    self.status_time = Some(Instant::now());
  }

  pub fn clear_status(&mut self) {
    self.status_message = None;
    self.status_time = None;
  }

  pub fn expire_status(&mut self) {
    if let Some(t) = self.status_time
      && t.elapsed() >= Duration::from_secs(constants().error_display_secs)
    {
      self.clear_status();
    }
  }

  // --- Query dispatch ---

  /// Dispatch the search typed in the input box. Blank input is ignored.
  pub fn trigger_search(&mut self) {
    let query = self.editor.text().trim().to_string();
    if query.is_empty() {
      return;
    }
    let ticket = self.begin_search(&query);

    let api = self.api.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let result = run_search(&api, &query).await;
      let _ = tx.send(SearchOutcome { ticket, result });
    });
    self.tasks.search_rx = Some(rx);
  }

  /// Reset the list and enter the searching phase under a fresh ticket.
  fn begin_search(&mut self, query: &str) -> u64 {
    self.cancel_previews();
    self.tasks.search_rx = None;
    self.ticket += 1;
    self.entries.clear();
    self.notices.clear();
    self.list_state.select(None);
    self.gfx = GraphicsCache::default();
    self.clear_status();
    self.phase = SearchPhase::Searching { query: query.to_string(), since: Instant::now() };
    info!(query = %query, ticket = self.ticket, "search dispatched");
    self.ticket
  }

  pub fn apply_search_outcome(&mut self, outcome: SearchOutcome) {
    if outcome.ticket != self.ticket {
      debug!(ticket = outcome.ticket, current = self.ticket, "search: dropping stale outcome");
      return;
    }
    self.phase = SearchPhase::Idle;

    match outcome.result {
      Ok(results) => {
        info!(ticket = outcome.ticket, count = results.len(), "search completed");
        self.entries = results.into_iter().map(|result| ResultEntry { result, preview: Preview::Loading }).collect();
        if self.entries.is_empty() {
          self.set_status("No results found.");
          self.focus = Focus::Input;
        } else {
          self.list_state.select(Some(0));
          self.focus = Focus::Results;
          self.start_previews();
        }
      }
      Err(e) => {
        error!(ticket = outcome.ticket, err = %format!("{:#}", e), "search failed");
        self.notices.push(format!("Error: {:#}", e));
        self.focus = Focus::Input;
      }
    }
  }

  // --- Thumbnails ---

  fn cancel_previews(&mut self) {
    if let Some(handle) = self.tasks.thumb_handle.take() {
      handle.abort();
    }
    self.tasks.thumb_rx = None;
  }

  fn start_previews(&mut self) {
    self.cancel_previews();
    let jobs: Vec<(usize, String)> =
      self.entries.iter().enumerate().map(|(i, e)| (i, e.result.thumbnail_url.clone())).collect();
    if jobs.is_empty() {
      return;
    }
    let client = self.api.http().clone();
    let ticket = self.ticket;
    let (tx, rx) = mpsc::channel(jobs.len());
    let handle = tokio::spawn(fetch_previews(client, ticket, jobs, tx));
    self.tasks.thumb_rx = Some(rx);
    self.tasks.thumb_handle = Some(handle);
  }

  pub fn apply_thumbnail(&mut self, delivery: ThumbnailDelivery) {
    if delivery.ticket != self.ticket {
      return;
    }
    let Some(entry) = self.entries.get_mut(delivery.index) else { return };
    entry.preview = match delivery.image {
      Some(image) => Preview::Ready(image),
      None => Preview::Unavailable,
    };
  }

  /// Drain finished background work. Runs on every loop iteration.
  pub fn check_pending(&mut self) {
    if let Some(mut rx) = self.tasks.search_rx.take() {
      match rx.try_recv() {
        Ok(outcome) => self.apply_search_outcome(outcome),
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.search_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          error!(ticket = self.ticket, "search task ended without a result");
          self.phase = SearchPhase::Idle;
          self.notices.push("Error: search task ended unexpectedly".to_string());
        }
      }
    }

    let mut deliveries = Vec::new();
    if let Some(rx) = self.tasks.thumb_rx.as_mut() {
      while let Ok(delivery) = rx.try_recv() {
        deliveries.push(delivery);
      }
    }
    for delivery in deliveries {
      self.apply_thumbnail(delivery);
    }
  }

  // --- Playback ---

  pub fn launch_selected(&mut self) {
    if let Some(position) = self.list_state.selected() {
      self.launch(position);
    }
  }

  /// Request playback of the result at `position`. Positions past the results
  /// (notice rows, a list cleared since the selection was made) do nothing.
  /// The run loop hands the terminal over before the player is spawned.
  pub fn launch(&mut self, position: usize) {
    let Some(entry) = self.entries.get(position) else {
      debug!(position, results = self.entries.len(), "launch: no result at position");
      return;
    };
    self.launch_request = Some(watch_url(&entry.result.identifier));
  }

  pub fn take_launch_request(&mut self) -> Option<String> {
    self.launch_request.take()
  }

  /// Spawn the player for a taken launch request. Returns whether it started;
  /// on failure a notice is added and the window stays visible.
  pub async fn start_player(&mut self, url: String) -> bool {
    match self.launcher.launch(url).await {
      Ok(()) => {
        self.visible = false;
        true
      }
      Err(e) => {
        error!(err = %format!("{:#}", e), "launch failed");
        self.notices.push(format!("Error opening {}: {:#}", self.launcher.program(), e));
        false
      }
    }
  }

  /// Liveness tick: restore the UI once the player has exited.
  pub fn check_playback(&mut self) {
    if self.launcher.poll_exited() {
      self.visible = true;
      self.gfx.last_sent = None;
    }
  }

  pub async fn shutdown(&mut self) {
    self.cancel_previews();
    self.launch_request = None;
    self.launcher.stop().await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::innertube::http_client;
  use anyhow::anyhow;
  use serde_json::json;

  fn app_with_player(player: &str) -> App {
    let api = InnerTube::new(http_client().unwrap());
    App::new(Config::default(), DisplayMode::Ascii, api, player.to_string())
  }

  fn record(id: &str) -> SearchResult {
    SearchResult {
      identifier: id.to_string(),
      title: format!("Title {}", id),
      author: "Author".to_string(),
      view_count: 10,
      publish_date: "2021-05-03".to_string(),
      thumbnail_url: "not a url".to_string(),
    }
  }

  #[test]
  fn blank_query_does_not_dispatch() {
    let mut app = app_with_player("true");
    app.editor.set_text("   ");
    app.trigger_search();
    assert_eq!(app.phase, SearchPhase::Idle);
    assert_eq!(app.current_ticket(), 0);
    assert!(app.status_message.is_none());
  }

  #[test]
  fn begin_search_clears_previous_state() {
    let mut app = app_with_player("true");
    app.notices.push("Error: old".to_string());
    app.entries.push(ResultEntry { result: record("old"), preview: Preview::Unavailable });
    app.list_state.select(Some(0));

    let ticket = app.begin_search("lofi");
    assert_eq!(ticket, 1);
    assert!(app.is_searching());
    assert_eq!(app.row_count(), 0);
    assert_eq!(app.list_state.selected(), None);
  }

  #[tokio::test]
  async fn successful_outcome_populates_results() {
    let mut app = app_with_player("true");
    let ticket = app.begin_search("lofi");
    app.apply_search_outcome(SearchOutcome { ticket, result: Ok(vec![record("a"), record("b")]) });

    assert_eq!(app.phase, SearchPhase::Idle);
    assert_eq!(app.entries.len(), 2);
    assert!(app.notices.is_empty());
    assert_eq!(app.focus, Focus::Results);
    assert_eq!(app.list_state.selected(), Some(0));
    assert!(matches!(app.entries[0].preview, Preview::Loading));
  }

  #[test]
  fn missing_payload_path_yields_one_notice() {
    let mut app = app_with_player("true");
    let ticket = app.begin_search("lofi");
    let payload = json!({ "responseContext": {} });
    let result = crate::projection::project(&payload).map_err(anyhow::Error::from);
    app.apply_search_outcome(SearchOutcome { ticket, result });

    assert_eq!(app.phase, SearchPhase::Idle);
    assert!(app.entries.is_empty());
    assert_eq!(app.notices.len(), 1);
    assert!(app.notices[0].starts_with("Error: unexpected search payload shape at `contents`"));
  }

  #[test]
  fn failed_outcome_returns_to_idle() {
    let mut app = app_with_player("true");
    let ticket = app.begin_search("lofi");
    app.apply_search_outcome(SearchOutcome { ticket, result: Err(anyhow!("network down")) });
    assert!(!app.is_searching());
    assert_eq!(app.notices, ["Error: network down"]);
  }

  #[test]
  fn empty_outcome_sets_status() {
    let mut app = app_with_player("true");
    let ticket = app.begin_search("zzzz");
    app.apply_search_outcome(SearchOutcome { ticket, result: Ok(Vec::new()) });
    assert_eq!(app.row_count(), 0);
    assert_eq!(app.status_message.as_deref(), Some("No results found."));
  }

  #[tokio::test]
  async fn stale_outcome_is_ignored() {
    let mut app = app_with_player("true");
    let old = app.begin_search("first");
    let new = app.begin_search("second");
    assert_ne!(old, new);

    app.apply_search_outcome(SearchOutcome { ticket: old, result: Ok(vec![record("stale")]) });
    assert!(app.is_searching());
    assert!(app.entries.is_empty());

    app.apply_search_outcome(SearchOutcome { ticket: new, result: Ok(vec![record("fresh")]) });
    assert_eq!(app.entries[0].result.identifier, "fresh");
  }

  #[tokio::test]
  async fn thumbnails_update_matching_ticket_only() {
    let mut app = app_with_player("true");
    let ticket = app.begin_search("lofi");
    app.apply_search_outcome(SearchOutcome { ticket, result: Ok(vec![record("a"), record("b")]) });

    app.apply_thumbnail(ThumbnailDelivery { ticket: ticket + 1, index: 0, image: None });
    assert!(matches!(app.entries[0].preview, Preview::Loading));

    app.apply_thumbnail(ThumbnailDelivery { ticket, index: 1, image: Some(DynamicImage::new_rgb8(2, 2)) });
    assert!(matches!(app.entries[1].preview, Preview::Ready(_)));

    app.apply_thumbnail(ThumbnailDelivery { ticket, index: 0, image: None });
    assert!(matches!(app.entries[0].preview, Preview::Unavailable));

    app.apply_thumbnail(ThumbnailDelivery { ticket, index: 9, image: None });
  }

  #[tokio::test]
  async fn unreachable_endpoint_ends_in_one_notice() {
    let api = InnerTube::new(http_client().unwrap()).with_endpoint("http://127.0.0.1:1/");
    let mut app = App::new(Config::default(), DisplayMode::Ascii, api, "true".to_string());
    app.editor.set_text("lofi");
    app.trigger_search();
    assert!(app.is_searching());

    for _ in 0..250 {
      app.check_pending();
      if !app.is_searching() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(app.phase, SearchPhase::Idle);
    assert!(app.entries.is_empty());
    assert_eq!(app.notices.len(), 1);
    assert!(app.notices[0].starts_with("Error: "));
  }

  #[test]
  fn dropped_search_task_becomes_notice() {
    let mut app = app_with_player("true");
    app.begin_search("lofi");
    let (tx, rx) = oneshot::channel::<SearchOutcome>();
    app.tasks.search_rx = Some(rx);
    drop(tx);

    app.check_pending();
    assert_eq!(app.phase, SearchPhase::Idle);
    assert_eq!(app.notices, ["Error: search task ended unexpectedly"]);
    assert!(app.tasks.search_rx.is_none());
  }

  #[test]
  fn launch_out_of_range_is_noop() {
    let mut app = app_with_player("yts-test-no-such-player");
    app.launch(0);
    assert!(app.take_launch_request().is_none());

    let ticket = app.begin_search("x");
    app.apply_search_outcome(SearchOutcome { ticket, result: Err(anyhow!("boom")) });
    // The only row is the notice.
    app.launch(0);
    assert!(app.take_launch_request().is_none());
    assert_eq!(app.notices.len(), 1);
  }

  #[tokio::test]
  async fn launch_only_requests_playback() {
    let mut app = app_with_player("true");
    let ticket = app.begin_search("x");
    app.apply_search_outcome(SearchOutcome { ticket, result: Ok(vec![record("abc")]) });

    app.launch_selected();
    assert!(app.visible);
    assert!(!app.launcher.is_playing());
    assert_eq!(app.take_launch_request().as_deref(), Some("https://www.youtube.com/watch?v=abc"));
    assert!(app.take_launch_request().is_none());
  }

  #[tokio::test]
  async fn spawn_failure_adds_notice_and_keeps_window() {
    let mut app = app_with_player("yts-test-no-such-player");
    let ticket = app.begin_search("x");
    app.apply_search_outcome(SearchOutcome { ticket, result: Ok(vec![record("abc")]) });

    app.launch(0);
    let url = app.take_launch_request().unwrap();
    assert!(!app.start_player(url).await);
    assert!(app.visible);
    assert_eq!(app.notices.len(), 1);
    assert!(app.notices[0].starts_with("Error opening yts-test-no-such-player:"));
  }

  #[tokio::test]
  async fn window_hides_while_player_runs_and_returns_after_exit() {
    let mut app = app_with_player("true");
    let ticket = app.begin_search("x");
    app.apply_search_outcome(SearchOutcome { ticket, result: Ok(vec![record("abc")]) });

    app.launch_selected();
    let url = app.take_launch_request().unwrap();
    assert!(app.start_player(url).await);
    assert!(!app.visible);
    assert!(app.launcher.is_playing());

    for _ in 0..100 {
      app.check_playback();
      if app.visible {
        break;
      }
      tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(app.visible);
    assert!(!app.launcher.is_playing());
  }
}
