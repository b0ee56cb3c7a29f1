use anyhow::{Context, Result, anyhow};
use futures::stream::{self, StreamExt};
use image::DynamicImage;
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::warn;

use crate::constants::constants;

/// Preview state of one result row.
#[derive(Debug, Clone, Default)]
pub enum Preview {
  #[default]
  Loading,
  Ready(DynamicImage),
  /// Fetch or decode failed; rendered as "No preview".
  Unavailable,
}

/// A finished thumbnail fetch, tagged with the search it belongs to.
#[derive(Debug)]
pub struct ThumbnailDelivery {
  pub ticket: u64,
  pub index: usize,
  pub image: Option<DynamicImage>,
}

pub async fn fetch_thumbnail(client: &Client, url: &str) -> Result<DynamicImage> {
  let response = client.get(url).send().await.with_context(|| format!("Failed to request thumbnail {}", url))?;
  if !response.status().is_success() {
    return Err(anyhow!("Thumbnail {} returned HTTP {}", url, response.status()));
  }
  let bytes = response.bytes().await.with_context(|| format!("Failed to read thumbnail bytes from {}", url))?;
  image::load_from_memory(&bytes).with_context(|| format!("Failed to decode thumbnail (URL: {})", url))
}

/// Fetch thumbnails for `(index, url)` pairs with bounded concurrency and a
/// per-item timeout, delivering each outcome through `tx` as it completes.
pub async fn fetch_previews(client: Client, ticket: u64, jobs: Vec<(usize, String)>, tx: mpsc::Sender<ThumbnailDelivery>) {
  let c = constants();
  let timeout = c.thumbnail_timeout();

  stream::iter(jobs)
    .map(|(index, url)| {
      let client = client.clone();
      let tx = tx.clone();
      async move {
        let image = match tokio::time::timeout(timeout, fetch_thumbnail(&client, &url)).await {
          Ok(Ok(image)) => Some(image),
          Ok(Err(e)) => {
            warn!(index, err = %format!("{:#}", e), "thumbnail: fetch failed");
            None
          }
          Err(_) => {
            warn!(index, url = %url, "thumbnail: timed out");
            None
          }
        };
        let _ = tx.send(ThumbnailDelivery { ticket, index, image }).await;
      }
    })
    .buffer_unordered(c.thumbnail_concurrency.max(1))
    .collect::<()>()
    .await;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn unreachable_thumbnails_are_delivered_as_missing() {
    let client = Client::new();
    let (tx, mut rx) = mpsc::channel(8);
    let jobs = vec![(0, "http://127.0.0.1:1/a.jpg".to_string()), (1, "not a url".to_string())];

    fetch_previews(client, 7, jobs, tx).await;

    let mut seen = Vec::new();
    while let Some(delivery) = rx.recv().await {
      assert_eq!(delivery.ticket, 7);
      assert!(delivery.image.is_none());
      seen.push(delivery.index);
    }
    seen.sort();
    assert_eq!(seen, [0, 1]);
  }

  #[test]
  fn preview_defaults_to_loading() {
    assert!(matches!(Preview::default(), Preview::Loading));
  }
}
