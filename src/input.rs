use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, Focus};

// --- Line editor ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

/// Single-line text input with a char-indexed cursor and horizontal scroll.
#[derive(Debug, Default, Clone)]
pub struct LineEditor {
  text: String,
  /// Cursor position in chars.
  cursor: usize,
  /// First visible display column.
  scroll: usize,
}

impl LineEditor {
  pub fn text(&self) -> &str {
    &self.text
  }

  #[cfg(test)]
  pub fn cursor(&self) -> usize {
    self.cursor
  }

  pub fn set_text(&mut self, text: &str) {
    self.text = text.to_string();
    self.cursor = self.len();
    self.scroll = 0;
  }

  pub fn clear(&mut self) {
    self.set_text("");
  }

  pub fn is_empty(&self) -> bool {
    self.text.is_empty()
  }

  fn len(&self) -> usize {
    self.text.chars().count()
  }

  pub fn insert(&mut self, c: char) {
    let at = char_to_byte_index(&self.text, self.cursor);
    self.text.insert(at, c);
    self.cursor += 1;
  }

  pub fn backspace(&mut self) {
    if self.cursor == 0 {
      return;
    }
    self.cursor -= 1;
    let at = char_to_byte_index(&self.text, self.cursor);
    self.text.remove(at);
  }

  pub fn delete(&mut self) {
    if self.cursor < self.len() {
      let at = char_to_byte_index(&self.text, self.cursor);
      self.text.remove(at);
    }
  }

  pub fn left(&mut self) {
    self.cursor = self.cursor.saturating_sub(1);
  }

  pub fn right(&mut self) {
    self.cursor = (self.cursor + 1).min(self.len());
  }

  pub fn home(&mut self) {
    self.cursor = 0;
  }

  pub fn end(&mut self) {
    self.cursor = self.len();
  }

  /// Display column of the cursor (double-width chars count twice).
  pub fn cursor_column(&self) -> usize {
    self.text.chars().take(self.cursor).map(|c| c.width().unwrap_or(0)).sum()
  }

  /// Scroll so the cursor is inside a window `width` columns wide, then return
  /// the visible slice and the cursor's column within it.
  pub fn viewport(&mut self, width: usize) -> (String, usize) {
    let col = self.cursor_column();
    let width = width.max(1);
    if col < self.scroll {
      self.scroll = col;
    } else if col >= self.scroll + width {
      self.scroll = col + 1 - width;
    }

    let mut visible = String::new();
    let mut start = 0usize;
    for c in self.text.chars() {
      let w = c.width().unwrap_or(0);
      let end = start + w;
      if end > self.scroll && start < self.scroll + width {
        visible.push(c);
      }
      start = end;
    }
    (visible, col - self.scroll)
  }
}

// --- Key handling ---

pub fn handle_key_event(app: &mut App, key: KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    match key.code {
      KeyCode::Char('c') => {
        app.should_quit = true;
        return;
      }
      KeyCode::Char('t') => {
        app.next_theme();
        return;
      }
      _ => {}
    }
  }

  // Input and submit are disabled until the search finishes.
  if app.is_searching() {
    return;
  }

  match app.focus {
    Focus::Input => handle_input_key(app, key),
    Focus::Results => handle_results_key(app, key),
  }
}

fn handle_input_key(app: &mut App, key: KeyEvent) {
  match key.code {
    KeyCode::Enter => app.trigger_search(),
    KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => app.editor.insert(c),
    KeyCode::Backspace => app.editor.backspace(),
    KeyCode::Delete => app.editor.delete(),
    KeyCode::Left => app.editor.left(),
    KeyCode::Right => app.editor.right(),
    KeyCode::Home => app.editor.home(),
    KeyCode::End => app.editor.end(),
    KeyCode::Esc => {
      if !app.editor.is_empty() {
        app.editor.clear();
      } else if app.row_count() > 0 {
        focus_results(app);
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down | KeyCode::Tab => {
      if app.row_count() > 0 {
        focus_results(app);
      }
    }
    _ => {}
  }
}

fn focus_results(app: &mut App) {
  app.focus = Focus::Results;
  if app.list_state.selected().is_none() {
    app.list_state.select(Some(0));
  }
}

fn handle_results_key(app: &mut App, key: KeyEvent) {
  let count = app.row_count();
  match key.code {
    KeyCode::Enter => app.launch_selected(),
    KeyCode::Down | KeyCode::Char('j') if count > 0 => {
      let i = app.list_state.selected().map_or(0, |i| (i + 1) % count);
      app.list_state.select(Some(i));
    }
    KeyCode::Up | KeyCode::Char('k') if count > 0 => {
      let i = app.list_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
      app.list_state.select(Some(i));
    }
    KeyCode::Home | KeyCode::Char('g') if count > 0 => app.list_state.select(Some(0)),
    KeyCode::End | KeyCode::Char('G') if count > 0 => app.list_state.select(Some(count - 1)),
    KeyCode::Esc | KeyCode::Tab | KeyCode::Char('/') => app.focus = Focus::Input,
    _ => {}
  }
}
