use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{DynamicImage, ImageFormat, imageops::FilterType};
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};
use std::io::{Cursor, Write};

use crate::display::DisplayMode;

/// Darkest to brightest.
const ASCII_RAMP: &[u8] = b" .:-=+*#%@";

/// Pixel size to resize a thumbnail to before drawing it in `area` cells.
/// Half blocks carry two pixels per cell vertically; ASCII carries one.
pub fn cell_target(mode: DisplayMode, area: Rect) -> (u32, u32) {
  let w = u32::from(area.width).max(1);
  let h = match mode {
    DisplayMode::Direct => u32::from(area.height) * 2,
    _ => u32::from(area.height),
  };
  (w, h.max(1))
}

/// Resize `image` to fit within `area`, keeping its aspect ratio.
/// Terminal cells are roughly twice as tall as wide, which ASCII compensates for.
pub fn fit_to_cells(image: &DynamicImage, mode: DisplayMode, area: Rect) -> DynamicImage {
  let (w, h) = cell_target(mode, area);
  match mode {
    DisplayMode::Ascii => {
      let squashed = image.resize_exact(image.width(), (image.height() / 2).max(1), FilterType::Triangle);
      squashed.resize(w, h, FilterType::Triangle)
    }
    _ => image.resize(w, h, FilterType::Triangle),
  }
}

/// Draws an already-fitted thumbnail into the buffer, centered in the area.
pub struct ThumbnailWidget<'a> {
  pub image: &'a DynamicImage,
  pub display_mode: DisplayMode,
}

impl Widget for ThumbnailWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match self.display_mode {
      DisplayMode::Direct => draw_half_blocks(self.image, area, buf),
      DisplayMode::Ascii => draw_ascii(self.image, area, buf),
      DisplayMode::Kitty => {}
    }
  }
}

/// Top-left cell of a `cols` x `rows` block centered in `area`.
fn centered_origin(area: Rect, cols: u32, rows: u32) -> (u16, u16) {
  let dx = u32::from(area.width).saturating_sub(cols) / 2;
  let dy = u32::from(area.height).saturating_sub(rows) / 2;
  (area.x.saturating_add(dx as u16), area.y.saturating_add(dy as u16))
}

fn draw_half_blocks(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let rgb = image.to_rgb8();
  let cols = rgb.width().min(u32::from(area.width));
  let rows = rgb.height().div_ceil(2).min(u32::from(area.height));
  let (x0, y0) = centered_origin(area, cols, rows);

  for row in 0..rows {
    for col in 0..cols {
      let top = rgb.get_pixel(col, row * 2);
      let bottom = if row * 2 + 1 < rgb.height() {
        let p = rgb.get_pixel(col, row * 2 + 1);
        Color::Rgb(p[0], p[1], p[2])
      } else {
        Color::Reset
      };
      if let Some(cell) = buf.cell_mut((x0 + col as u16, y0 + row as u16)) {
        cell.set_symbol("▀").set_style(Style::default().fg(Color::Rgb(top[0], top[1], top[2])).bg(bottom));
      }
    }
  }
}

fn draw_ascii(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let luma = image.to_luma8();
  let cols = luma.width().min(u32::from(area.width));
  let rows = luma.height().min(u32::from(area.height));
  let (x0, y0) = centered_origin(area, cols, rows);
  let top = ASCII_RAMP.len() - 1;

  for row in 0..rows {
    for col in 0..cols {
      let level = usize::from(luma.get_pixel(col, row)[0]) * top / 255;
      let ch = ASCII_RAMP[level.min(top)] as char;
      if let Some(cell) = buf.cell_mut((x0 + col as u16, y0 + row as u16)) {
        cell.set_char(ch);
      }
    }
  }
}

// --- Kitty graphics protocol ---
//
// The PNG is base64'd and sent in chunks of at most 4096 bytes:
//   first:  ESC _G a=T,f=100,i=<id>,p=<id>,c=<cols>,r=<rows>,q=2,m=<more>;<data> ESC \
//   rest:   ESC _G m=<more>;<data> ESC \
// Re-sending with the same image/placement id replaces the previous preview.

const KITTY_CHUNK: usize = 4096;
const KITTY_IMAGE_ID: u32 = 31;

fn kitty_escape(image: &DynamicImage, area: Rect) -> Result<String> {
  let mut png = Vec::new();
  image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).context("Failed to encode preview as PNG")?;
  let encoded = BASE64.encode(&png);

  let mut out = format!("\x1B[{};{}H", area.y + 1, area.x + 1);
  let chunks: Vec<&str> = encoded.as_bytes().chunks(KITTY_CHUNK).filter_map(|c| std::str::from_utf8(c).ok()).collect();
  for (i, chunk) in chunks.iter().enumerate() {
    let more = u8::from(i + 1 < chunks.len());
    if i == 0 {
      out.push_str(&format!(
        "\x1B_Ga=T,f=100,i={id},p={id},c={},r={},q=2,m={};{}\x1B\\",
        area.width,
        area.height,
        more,
        chunk,
        id = KITTY_IMAGE_ID
      ));
    } else {
      out.push_str(&format!("\x1B_Gm={};{}\x1B\\", more, chunk));
    }
  }
  Ok(out)
}

pub fn kitty_render_image(image: &DynamicImage, area: Rect) -> Result<()> {
  if area.is_empty() {
    return Ok(());
  }
  let escape = kitty_escape(image, area)?;
  let mut stdout = std::io::stdout();
  stdout.write_all(escape.as_bytes()).context("Failed to write kitty image")?;
  stdout.flush().context("Failed to flush kitty image")
}

/// Remove the preview placement.
pub fn kitty_clear() -> Result<()> {
  let mut stdout = std::io::stdout();
  write!(stdout, "\x1B_Ga=d,d=i,i={},q=2\x1B\\", KITTY_IMAGE_ID).context("Failed to write kitty delete")?;
  stdout.flush().context("Failed to flush kitty delete")
}
