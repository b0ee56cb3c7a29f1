use chrono::NaiveDate;

/// Human-readable view count, e.g. `1.2M views`, `3.4K views`, `999 views`.
pub fn format_views(views: u64) -> String {
  if views >= 1_000_000 {
    format!("{:.1}M views", views as f64 / 1_000_000.0)
  } else if views >= 1_000 {
    format!("{:.1}K views", views as f64 / 1_000.0)
  } else {
    format!("{} views", views)
  }
}

/// Render `YYYY-MM-DD` as `May 03, 2021`. Anything that does not parse
/// (relative dates like "3 years ago", the unknown-date placeholder) is returned as is.
pub fn format_date(raw: &str) -> String {
  match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
    Ok(date) => date.format("%b %d, %Y").to_string(),
    Err(_) => raw.to_string(),
  }
}

/// Keep only the ASCII digits of a localized count string ("1,234 views" → "1234").
pub fn strip_non_digits(text: &str) -> String {
  text.chars().filter(char::is_ascii_digit).collect()
}

/// Extract a view count from an optional display string.
/// Absent or digit-free text yields 0; counts beyond `u64` saturate.
pub fn parse_view_count(text: Option<&str>) -> u64 {
  let digits = strip_non_digits(text.unwrap_or("0"));
  if digits.is_empty() {
    return 0;
  }
  digits.parse().unwrap_or(u64::MAX)
}
