use clap::ValueEnum;

/// `--display-mode` values.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliDisplayMode {
  Auto,
  Kitty,
  Direct,
  Ascii,
}

/// How thumbnails are drawn in the preview pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
  /// Grayscale character ramp.
  Ascii,
  /// True-color half blocks, two pixels per cell.
  Direct,
  /// Kitty graphics protocol, written outside the ratatui buffer.
  Kitty,
}

impl DisplayMode {
  pub fn label(self) -> &'static str {
    match self {
      DisplayMode::Ascii => "ascii",
      DisplayMode::Direct => "half-block",
      DisplayMode::Kitty => "kitty",
    }
  }

  pub fn uses_graphics_protocol(self) -> bool {
    self == DisplayMode::Kitty
  }
}

fn detect_from(term: &str, term_program: &str, colorterm: &str) -> DisplayMode {
  let term_program = term_program.to_lowercase();
  if term == "xterm-kitty" || matches!(term_program.as_str(), "kitty" | "wezterm" | "ghostty") {
    return DisplayMode::Kitty;
  }
  if matches!(colorterm.to_lowercase().as_str(), "truecolor" | "24bit") {
    return DisplayMode::Direct;
  }
  DisplayMode::Ascii
}

/// Probe order: Kitty graphics, then true-color half blocks, then ASCII.
pub fn detect_display_mode() -> DisplayMode {
  let var = |name: &str| std::env::var(name).unwrap_or_default();
  detect_from(&var("TERM"), &var("TERM_PROGRAM"), &var("COLORTERM"))
}

pub fn resolve_display_mode(cli: CliDisplayMode) -> DisplayMode {
  match cli {
    CliDisplayMode::Auto => detect_display_mode(),
    CliDisplayMode::Kitty => DisplayMode::Kitty,
    CliDisplayMode::Direct => DisplayMode::Direct,
    CliDisplayMode::Ascii => DisplayMode::Ascii,
  }
}
