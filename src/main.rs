mod app;
mod config;
mod constants;
mod display;
mod format;
mod graphics;
mod innertube;
mod input;
mod logging;
mod payload;
mod player;
mod projection;
mod theme;
mod thumbnail;
mod ui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use ratatui::{
  DefaultTerminal,
  crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, enable_raw_mode},
  },
};
use std::time::{Duration, Instant};
use tracing::info;

use app::App;
use config::Config;
use constants::constants;
use display::{CliDisplayMode, resolve_display_mode};
use graphics::{kitty_clear, kitty_render_image};
use innertube::InnerTube;
use thumbnail::Preview;

/// How often the loop wakes while the player owns the terminal.
const HIDDEN_IDLE: Duration = Duration::from_millis(100);

/// How long to wait for a key before redrawing.
const EVENT_POLL: Duration = Duration::from_millis(100);

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Search to run on startup
  query: Vec<String>,

  /// Player executable to launch on a result (default: mpv, or `player` in prefs.toml)
  #[arg(short, long)]
  player: Option<String>,

  /// Thumbnail display mode: 'auto', 'kitty', 'direct', or 'ascii' (default: auto-detect)
  #[arg(short, long, default_value = "auto")]
  display_mode: CliDisplayMode,

  /// Log filter, e.g. 'debug' or 'yts=trace' (default: $YTS_LOG or 'info')
  #[arg(long, value_name = "FILTER")]
  log_level: Option<String>,

  /// Print shell completions and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<clap_complete::Shell>,
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), "yts", &mut std::io::stdout());
    return Ok(());
  }

  let _log_guard = logging::init(args.log_level.as_deref())?;

  let config = Config::load();
  let player = args.player.or_else(|| config.player.clone()).unwrap_or_else(|| constants().default_player.clone());
  let display_mode = resolve_display_mode(args.display_mode);
  let api = InnerTube::new(innertube::http_client()?);
  info!(version = env!("CARGO_PKG_VERSION"), player = %player, display = display_mode.label(), "starting");

  let mut app = App::new(config, display_mode, api, player);
  let query = args.query.join(" ");
  if !query.trim().is_empty() {
    app.editor.set_text(&query);
    app.trigger_search();
  }

  // ratatui::init also installs a panic hook that restores the terminal.
  let mut terminal = ratatui::init();
  let result = run(&mut terminal, &mut app).await;
  ratatui::restore();
  app.shutdown().await;
  info!("exiting");
  result
}

async fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  let liveness = constants().liveness_interval();
  let mut next_liveness = Instant::now() + liveness;
  let mut shown = true;

  loop {
    app.check_pending();
    app.expire_status();

    if Instant::now() >= next_liveness {
      app.check_playback();
      next_liveness = Instant::now() + liveness;
    }

    if let Some(url) = app.take_launch_request() {
      hide(app)?;
      if !app.start_player(url).await {
        show(terminal)?;
      }
      shown = app.visible;
    }

    if app.visible && !shown {
      show(terminal)?;
      shown = true;
    }

    if !shown {
      tokio::time::sleep(HIDDEN_IDLE).await;
      continue;
    }

    terminal.draw(|frame| ui::ui(frame, app))?;
    sync_graphics(app)?;

    if event::poll(EVENT_POLL)?
      && let Event::Key(key) = event::read()?
      && key.kind == KeyEventKind::Press
    {
      input::handle_key_event(app, key);
    }

    if app.should_quit {
      break;
    }
  }

  if app.display_mode.uses_graphics_protocol() && shown {
    kitty_clear()?;
  }
  Ok(())
}

/// Hand the terminal to the player before it is spawned: leave the alternate
/// screen and raw mode.
fn hide(app: &mut App) -> Result<()> {
  if app.display_mode.uses_graphics_protocol() {
    kitty_clear()?;
  }
  app.gfx.last_sent = None;
  ratatui::restore();
  info!("ui: hidden while player runs");
  Ok(())
}

/// Take the terminal back and repaint from scratch.
fn show(terminal: &mut DefaultTerminal) -> Result<()> {
  enable_raw_mode().context("Failed to enable raw mode")?;
  execute!(std::io::stdout(), EnterAlternateScreen).context("Failed to enter alternate screen")?;
  terminal.clear().context("Failed to clear terminal")?;
  info!("ui: restored");
  Ok(())
}

/// Keep the Kitty placement in sync with the selected, loaded preview.
fn sync_graphics(app: &mut App) -> Result<()> {
  if !app.display_mode.uses_graphics_protocol() {
    return Ok(());
  }
  let ticket = app.current_ticket();
  let selected = app.list_state.selected();
  let ready = match (app.gfx.thumb_area, selected.and_then(|i| app.entries.get(i).map(|e| (i, e)))) {
    (Some(area), Some((index, entry))) => match &entry.preview {
      Preview::Ready(image) => Some((index, area, image)),
      _ => None,
    },
    _ => None,
  };

  match ready {
    Some((index, area, image)) => {
      let key = (ticket, index, area);
      if app.gfx.last_sent != Some(key) {
        kitty_render_image(image, area)?;
        app.gfx.last_sent = Some(key);
      }
    }
    None => {
      if app.gfx.last_sent.take().is_some() {
        kitty_clear()?;
      }
    }
  }
  Ok(())
}
