//! Turn an InnerTube search payload into display records.

use serde_json::Value;

use crate::format::{format_date, format_views, parse_view_count};
use crate::payload::{ShapeError, Step, lookup, lookup_array, lookup_str};

/// Where the result items live inside a search response.
pub const RESULTS_PATH: &[Step] = &[
  Step::Key("contents"),
  Step::Key("twoColumnSearchResultsRenderer"),
  Step::Key("primaryContents"),
  Step::Key("sectionListRenderer"),
  Step::Key("contents"),
  Step::Index(0),
  Step::Key("itemSectionRenderer"),
  Step::Key("contents"),
];

/// Marker key of the item variant that represents a playable video.
pub const VIDEO_MARKER: &str = "videoRenderer";

const TITLE: &[Step] = &[Step::Key("title"), Step::Key("runs"), Step::Index(0), Step::Key("text")];
const AUTHOR: &[Step] = &[Step::Key("ownerText"), Step::Key("runs"), Step::Index(0), Step::Key("text")];
const VIDEO_ID: &[Step] = &[Step::Key("videoId")];
const VIEW_COUNT: &[Step] = &[Step::Key("viewCountText"), Step::Key("simpleText")];
const PUBLISHED: &[Step] = &[Step::Key("publishedTimeText"), Step::Key("simpleText")];
const THUMBNAIL: &[Step] = &[Step::Key("thumbnail"), Step::Key("thumbnails"), Step::Last, Step::Key("url")];

pub const UNKNOWN_DATE: &str = "Unknown date";

/// One playable video from a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
  /// Opaque video id, used verbatim in the watch URL.
  pub identifier: String,
  pub title: String,
  pub author: String,
  pub view_count: u64,
  /// Raw publish date text as YouTube sent it.
  pub publish_date: String,
  pub thumbnail_url: String,
}

impl SearchResult {
  pub fn views_label(&self) -> String {
    format_views(self.view_count)
  }

  pub fn date_label(&self) -> String {
    format_date(&self.publish_date)
  }

  /// The "views • date" line shown under the author.
  pub fn meta_line(&self) -> String {
    format!("{} • {}", self.views_label(), self.date_label())
  }
}

/// Prefix protocol-relative thumbnail URLs (`//i.ytimg.com/...`) with `https:`.
fn absolute_url(url: &str) -> String {
  if url.starts_with("//") { format!("https:{}", url) } else { url.to_string() }
}

fn project_video(video: &Value) -> Result<SearchResult, ShapeError> {
  let identifier = lookup_str(video, VIDEO_ID)?;
  if identifier.is_empty() {
    return Err(ShapeError { path: "videoRenderer.videoId".to_string(), expected: "a non-empty video id" });
  }
  let optional = |steps: &[Step]| lookup(video, steps).ok().and_then(Value::as_str);

  Ok(SearchResult {
    identifier: identifier.to_string(),
    title: lookup_str(video, TITLE)?.to_string(),
    author: lookup_str(video, AUTHOR)?.to_string(),
    view_count: parse_view_count(optional(VIEW_COUNT)),
    publish_date: optional(PUBLISHED).unwrap_or(UNKNOWN_DATE).to_string(),
    thumbnail_url: absolute_url(lookup_str(video, THUMBNAIL)?),
  })
}

/// Project every video item of a search payload, in payload order.
///
/// Items that are not videos (channels, shelves, ads) are skipped. A payload
/// without the expected result path, or a video item missing a required field,
/// fails the whole projection.
pub fn project(payload: &Value) -> Result<Vec<SearchResult>, ShapeError> {
  lookup_array(payload, RESULTS_PATH)?.iter().filter_map(|item| item.get(VIDEO_MARKER)).map(project_video).collect()
}
