use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub muted: Color,
  pub accent: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub const THEMES: [Theme; 3] = [
  Theme {
    name: "ember",
    bg: Color::Rgb(24, 22, 22),
    fg: Color::Rgb(232, 226, 220),
    muted: Color::Rgb(140, 132, 126),
    accent: Color::Rgb(255, 78, 69),
    border: Color::Rgb(70, 62, 60),
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(92, 38, 36),
    stripe_bg: Color::Rgb(30, 28, 28),
    status: Color::Rgb(250, 200, 110),
    error: Color::Rgb(255, 110, 100),
    key_fg: Color::Rgb(24, 22, 22),
    key_bg: Color::Rgb(200, 190, 182),
  },
  Theme {
    name: "tide",
    bg: Color::Rgb(16, 24, 32),
    fg: Color::Rgb(214, 226, 236),
    muted: Color::Rgb(118, 138, 156),
    accent: Color::Rgb(94, 196, 230),
    border: Color::Rgb(48, 66, 82),
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(30, 74, 102),
    stripe_bg: Color::Rgb(20, 30, 40),
    status: Color::Rgb(150, 220, 170),
    error: Color::Rgb(240, 120, 120),
    key_fg: Color::Rgb(16, 24, 32),
    key_bg: Color::Rgb(170, 196, 214),
  },
  Theme {
    name: "paper",
    bg: Color::Rgb(250, 248, 242),
    fg: Color::Rgb(40, 40, 40),
    muted: Color::Rgb(120, 118, 110),
    accent: Color::Rgb(190, 30, 45),
    border: Color::Rgb(200, 196, 186),
    highlight_fg: Color::Rgb(20, 20, 20),
    highlight_bg: Color::Rgb(236, 220, 200),
    stripe_bg: Color::Rgb(242, 240, 232),
    status: Color::Rgb(150, 100, 20),
    error: Color::Rgb(180, 20, 20),
    key_fg: Color::Rgb(250, 248, 242),
    key_bg: Color::Rgb(90, 88, 84),
  },
];

/// Index of the theme called `name`, falling back to the first theme.
pub fn theme_index(name: Option<&str>) -> usize {
  name.and_then(|n| THEMES.iter().position(|t| t.name == n)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn theme_names_are_unique() {
    for (i, a) in THEMES.iter().enumerate() {
      assert!(THEMES.iter().skip(i + 1).all(|b| b.name != a.name));
    }
  }

  #[test]
  fn theme_index_lookup() {
    assert_eq!(theme_index(Some("tide")), 1);
    assert_eq!(theme_index(Some("missing")), 0);
    assert_eq!(theme_index(None), 0);
  }
}
