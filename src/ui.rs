use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, List, ListItem, Padding, Paragraph},
};

use crate::app::{App, Focus, SearchPhase};
use crate::graphics::{ThumbnailWidget, fit_to_cells};
use crate::theme::Theme;
use crate::thumbnail::Preview;

// --- Helpers ---

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

fn panel<'a>(theme: &Theme, title: impl Into<Line<'a>>) -> Block<'a> {
  let title: Line<'a> = title.into();
  Block::bordered()
    .title(title)
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
}

/// Offset of the moving segment of an indeterminate progress bar.
pub fn bounce_offset(elapsed_ms: u128, track: usize, segment: usize) -> usize {
  let span = track.saturating_sub(segment);
  if span == 0 {
    return 0;
  }
  let step = (elapsed_ms / 40) as usize % (span * 2);
  if step < span { step } else { span * 2 - step }
}

/// Largest 16:9 area (in cells, where a cell is about twice as tall as wide) centered at the top of `area`.
fn sixteen_by_nine(area: Rect) -> Rect {
  let ideal_h = ((f32::from(area.width) * 9.0 / 32.0).round() as u16).max(1);
  if ideal_h <= area.height {
    Rect { height: ideal_h, ..area }
  } else {
    let w = ((f32::from(area.height) * 32.0 / 9.0).round() as u16).min(area.width);
    Rect { x: area.x + (area.width - w) / 2, width: w, ..area }
  }
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();
  app.gfx.thumb_area = None;

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, theme, header_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(Span::styled(" ▶ yts ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let width = version.len() as u16;
  let right_area = Rect { x: area.x + area.width.saturating_sub(width), width: width.min(area.width), ..area };
  frame.render_widget(Line::from(Span::styled(version, Style::default().fg(theme.muted))), right_area);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  if let SearchPhase::Searching { query, since } = &app.phase {
    render_searching(frame, app.theme(), query, since.elapsed().as_millis(), area);
  } else if app.row_count() > 0 {
    let [list_area, preview_area] =
      Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(area);
    render_results(frame, app, list_area);
    render_preview(frame, app, preview_area);
  } else {
    render_welcome(frame, app.theme(), area);
  }
}

fn render_welcome(frame: &mut Frame, theme: &Theme, area: Rect) {
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("▶  yts", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled("Search YouTube. Watch in your player.", Style::default().fg(theme.fg))),
    Line::from(""),
    Line::from(Span::styled("Type a query below and press Enter.", Style::default().fg(theme.muted))),
  ];
  let block = Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border));
  frame.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(block), area);
}

fn render_searching(frame: &mut Frame, theme: &Theme, query: &str, elapsed_ms: u128, area: Rect) {
  let block = panel(theme, " Searching ");
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let [_, bar_area, _, label_area, query_area] = Layout::vertical([
    Constraint::Percentage(40),
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(1),
  ])
  .areas(inner);

  let track = usize::from(bar_area.width.saturating_sub(4));
  let segment = (track / 4).max(1);
  let offset = bounce_offset(elapsed_ms, track, segment);
  let bar = Line::from(vec![
    Span::styled("─".repeat(offset), Style::default().fg(theme.border)),
    Span::styled("━".repeat(segment.min(track)), Style::default().fg(theme.accent)),
    Span::styled("─".repeat(track.saturating_sub(offset + segment)), Style::default().fg(theme.border)),
  ]);
  frame.render_widget(Paragraph::new(bar).alignment(Alignment::Center), bar_area);
  frame.render_widget(
    Paragraph::new(Span::styled("Searching...", Style::default().fg(theme.fg))).alignment(Alignment::Center),
    label_area,
  );
  let query = truncate_str(query, usize::from(query_area.width.saturating_sub(4)));
  frame.render_widget(
    Paragraph::new(Span::styled(format!("“{}”", query), Style::default().fg(theme.muted))).alignment(Alignment::Center),
    query_area,
  );
}

fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  // Area minus 2 borders minus 2 chars for the highlight symbol.
  let inner_w = usize::from(area.width.saturating_sub(4));

  let mut items: Vec<ListItem> = app
    .entries
    .iter()
    .enumerate()
    .map(|(i, entry)| {
      let r = &entry.result;
      let bg = if i % 2 == 1 { theme.stripe_bg } else { theme.bg };
      ListItem::new(vec![
        Line::from(Span::styled(truncate_str(&r.title, inner_w), Style::default().fg(theme.fg).bold())),
        Line::from(Span::styled(truncate_str(&r.author, inner_w), Style::default().fg(theme.muted))),
        Line::from(Span::styled(truncate_str(&r.meta_line(), inner_w), Style::default().fg(theme.muted))),
      ])
      .bg(bg)
    })
    .collect();
  items.extend(app.notices.iter().map(|notice| {
    ListItem::new(Line::from(Span::styled(truncate_str(notice, inner_w), Style::default().fg(theme.error))))
  }));

  let title = format!(" Results ({}) ", app.entries.len());
  let border = if app.focus == Focus::Results { theme.accent } else { theme.border };
  let list = List::new(items)
    .block(panel(theme, title).border_style(Style::default().fg(border)))
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_preview(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let block = panel(theme, " Preview ").padding(Padding::horizontal(1));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let Some(index) = app.list_state.selected() else { return };
  let Some(entry) = app.entries.get(index) else { return };

  let [image_area, _, details_area] =
    Layout::vertical([Constraint::Percentage(60), Constraint::Length(1), Constraint::Min(0)]).areas(inner);
  let image_area = sixteen_by_nine(image_area);
  let ticket = app.current_ticket();

  match &entry.preview {
    Preview::Ready(image) => {
      if app.display_mode.uses_graphics_protocol() {
        app.gfx.thumb_area = Some(image_area);
      } else {
        let key_matches =
          matches!(&app.gfx.fitted, Some((t, i, a, _)) if *t == ticket && *i == index && *a == image_area);
        if !key_matches {
          let fitted = fit_to_cells(image, app.display_mode, image_area);
          app.gfx.fitted = Some((ticket, index, image_area, fitted));
        }
        if let Some((_, _, _, ref fitted)) = app.gfx.fitted {
          frame.render_widget(ThumbnailWidget { image: fitted, display_mode: app.display_mode }, image_area);
        }
      }
    }
    Preview::Loading => {
      frame.render_widget(
        Paragraph::new(Span::styled("Loading preview…", Style::default().fg(theme.muted))).alignment(Alignment::Center),
        image_area,
      );
    }
    Preview::Unavailable => {
      frame.render_widget(
        Paragraph::new(Span::styled("No preview", Style::default().fg(theme.muted))).alignment(Alignment::Center),
        image_area,
      );
    }
  }

  let r = &entry.result;
  let w = usize::from(details_area.width);
  let details = vec![
    Line::from(Span::styled(truncate_str(&r.title, w), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(Span::styled(truncate_str(&r.author, w), Style::default().fg(theme.muted))),
    Line::from(Span::styled(truncate_str(&r.meta_line(), w), Style::default().fg(theme.muted))),
    Line::from(""),
    Line::from(Span::styled(
      truncate_str(&crate::player::watch_url(&r.identifier), w),
      Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
    )),
  ];
  frame.render_widget(Paragraph::new(details), details_area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ℹ  {}", msg), Style::default().fg(theme.status))
  } else if app.is_searching() {
    (" ⏳ Searching...".to_string(), Style::default().fg(theme.status))
  } else if let Some(notice) = app.notices.last() {
    (format!(" ⚠  {}", notice), Style::default().fg(theme.error))
  } else {
    (format!(" Ready · player: {}", app.launcher.program()), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let enabled = !app.is_searching();
  let focused = enabled && app.focus == Focus::Input;
  let border_color = if focused { theme.accent } else { theme.border };
  let block = Block::bordered()
    .title(" Search YouTube ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = usize::from(area.width.saturating_sub(4));
  let (visible, cursor_col) = app.editor.viewport(inner_w);

  let paragraph = if app.editor.is_empty() {
    Paragraph::new(Span::styled("Enter search query...", Style::default().fg(theme.muted)))
  } else {
    let fg = if enabled { theme.fg } else { theme.muted };
    Paragraph::new(visible).style(Style::default().fg(fg))
  };
  frame.render_widget(paragraph.block(block), area);

  if focused {
    frame.set_cursor_position((area.x + 2 + cursor_col as u16, area.y + 1));
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let keys: Vec<(&str, &str)> = if app.is_searching() {
    vec![("^c", "Quit")]
  } else {
    match app.focus {
      Focus::Input => {
        let mut k = vec![("Enter", "Search"), ("^t", "Theme")];
        if app.row_count() > 0 {
          k.push(("↓", "Results"));
        } else {
          k.push(("Esc", "Quit"));
        }
        k
      }
      Focus::Results => vec![("Enter", "Play"), ("j/k", "Navigate"), ("^t", "Theme"), ("Esc", "Search")],
    }
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i + 1 < keys.len() {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();
  frame.render_widget(Line::from(spans), area);

  let label = format!("{} · {} ", theme.name, app.display_mode.label());
  let width = label.chars().count() as u16;
  let right_area = Rect { x: area.x + area.width.saturating_sub(width), width: width.min(area.width), ..area };
  frame.render_widget(Line::from(Span::styled(label, Style::default().fg(theme.muted))), right_area);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn truncate_keeps_short_strings() {
    assert_eq!(truncate_str("lofi", 10), "lofi");
    assert_eq!(truncate_str("lofi beats to study", 8), "lofi be…");
  }

  #[test]
  fn bounce_stays_on_track() {
    for ms in (0..20_000u128).step_by(37) {
      assert!(bounce_offset(ms, 40, 10) <= 30);
    }
    assert_eq!(bounce_offset(0, 40, 10), 0);
    assert_eq!(bounce_offset(500, 5, 10), 0);
  }

  #[test]
  fn sixteen_by_nine_fits_area() {
    let wide = sixteen_by_nine(Rect::new(0, 0, 100, 10));
    assert!(wide.width <= 100 && wide.height <= 10);
    let tall = sixteen_by_nine(Rect::new(0, 0, 32, 40));
    assert_eq!(tall.height, 9);
  }
}
