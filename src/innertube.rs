//! Minimal client for YouTube's internal "InnerTube" search endpoint.
//!
//! The response is returned untouched as a JSON value; its shape is handled
//! by `projection`.

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::constants::constants;
use crate::projection::{self, SearchResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientInfo<'a> {
  client_name: &'a str,
  client_version: &'a str,
  hl: &'a str,
  gl: &'a str,
}

#[derive(Debug, Serialize)]
struct RequestContext<'a> {
  client: ClientInfo<'a>,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
  context: RequestContext<'a>,
  query: &'a str,
}

fn search_request(query: &str) -> SearchRequest<'_> {
  let c = constants();
  SearchRequest {
    context: RequestContext {
      client: ClientInfo {
        client_name: &c.client_name,
        client_version: &c.client_version,
        hl: &c.client_hl,
        gl: &c.client_gl,
      },
    },
    query,
  }
}

/// Build the shared HTTP client used for search and thumbnail requests.
pub fn http_client() -> Result<Client> {
  let c = constants();
  Client::builder()
    .user_agent(c.user_agent.as_str())
    .timeout(c.request_timeout())
    .build()
    .context("Failed to build HTTP client")
}

#[derive(Debug, Clone)]
pub struct InnerTube {
  http: Client,
  endpoint: String,
}

impl InnerTube {
  pub fn new(http: Client) -> Self {
    Self { http, endpoint: constants().search_endpoint.clone() }
  }

  /// Point searches at a different URL.
  pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
    self.endpoint = endpoint.into();
    self
  }

  #[cfg(test)]
  pub fn endpoint(&self) -> &str {
    &self.endpoint
  }

  pub fn http(&self) -> &Client {
    &self.http
  }

  /// Run a search and return the raw response payload.
  pub async fn search(&self, query: &str) -> Result<Value> {
    let c = constants();
    let response = self
      .http
      .post(&self.endpoint)
      .header("X-YouTube-Client-Name", &c.client_name_id)
      .header("X-YouTube-Client-Version", &c.client_version)
      .json(&search_request(query))
      .send()
      .await
      .context("Failed to reach YouTube")?;

    let status = response.status();
    if !status.is_success() {
      return Err(anyhow!("YouTube search returned HTTP {}", status));
    }

    let payload: Value = response.json().await.context("Failed to decode search response")?;
    debug!(query = %query, "innertube: search payload received");
    Ok(payload)
  }
}

/// Fetch a search payload and project it into records. Runs off the UI task.
pub async fn run_search(api: &InnerTube, query: &str) -> Result<Vec<SearchResult>> {
  let payload = api.search(query).await?;
  Ok(projection::project(&payload)?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn request_body_carries_web_client_context() {
    let body = serde_json::to_value(search_request("lofi")).unwrap();
    assert_eq!(
      body,
      json!({
        "context": {
          "client": {
            "clientName": "WEB",
            "clientVersion": constants().client_version,
            "hl": "en",
            "gl": "US"
          }
        },
        "query": "lofi"
      })
    );
  }

  #[test]
  fn http_client_builds() {
    assert!(http_client().is_ok());
  }

  #[test]
  fn endpoint_defaults_to_constants() {
    let api = InnerTube::new(http_client().unwrap());
    assert_eq!(api.endpoint(), constants().search_endpoint);
    let api = api.with_endpoint("http://127.0.0.1:1/");
    assert_eq!(api.endpoint(), "http://127.0.0.1:1/");
  }

  #[tokio::test]
  async fn unreachable_endpoint_is_an_error() {
    let api = InnerTube::new(http_client().unwrap()).with_endpoint("http://127.0.0.1:1/");
    let err = run_search(&api, "lofi").await.unwrap_err();
    assert!(format!("{:#}", err).starts_with("Failed to reach YouTube"));
  }
}
