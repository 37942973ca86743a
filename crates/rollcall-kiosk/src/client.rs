//! Async HTTP client wrapping the rollcall JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use reqwest::{Client, Url};
use rollcall_core::{
  attendance::{AttendanceIntent, LogRecord, OnShift, Reply},
  subject::RosterEntry,
};

use crate::report::{Outcome, Reporter};

/// Connection settings for the rollcall API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub timeout:  Duration,
}

impl ApiConfig {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self { base_url: base_url.into(), timeout: Duration::from_secs(30) }
  }
}

/// Async HTTP client for the rollcall API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn base(&self) -> &str { self.config.base_url.trim_end_matches('/') }

  fn url(&self, path: &str) -> String { format!("{}/api{}", self.base(), path) }

  /// URL of `label`'s enrollment photo, with a cache-busting query so a
  /// re-enrolled photo is fetched fresh.
  pub fn photo_url(&self, label: &str) -> Result<String> {
    let mut url = Url::parse(self.base())
      .with_context(|| format!("invalid base URL {:?}", self.config.base_url))?;
    url
      .path_segments_mut()
      .map_err(|()| anyhow!("base URL {:?} cannot carry a path", self.config.base_url))?
      .pop_if_empty()
      .push("images")
      .push(&format!("{label}.jpg"));
    url
      .query_pairs_mut()
      .append_pair("t", &Utc::now().timestamp_millis().to_string());
    Ok(url.into())
  }

  // ── Roster ────────────────────────────────────────────────────────────────

  /// `GET /api/users`
  pub async fn list_users(&self) -> Result<Vec<RosterEntry>> {
    let resp = self
      .client
      .get(self.url("/users"))
      .send()
      .await
      .context("GET /users failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET /users → {}", resp.status()));
    }
    resp.json().await.context("deserialising roster")
  }

  // ── Ledger ────────────────────────────────────────────────────────────────

  /// `GET /api/current`
  pub async fn current(&self) -> Result<Vec<OnShift>> {
    let resp = self
      .client
      .get(self.url("/current"))
      .send()
      .await
      .context("GET /current failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET /current → {}", resp.status()));
    }
    resp.json().await.context("deserialising on-shift list")
  }

  /// `GET /api/logs`
  pub async fn logs(&self) -> Result<Vec<LogRecord>> {
    let resp = self
      .client
      .get(self.url("/logs"))
      .send()
      .await
      .context("GET /logs failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET /logs → {}", resp.status()));
    }
    resp.json().await.context("deserialising logs")
  }

  // ── Attendance ────────────────────────────────────────────────────────────

  /// `POST /api/attendance`
  ///
  /// Any decodable reply is a verdict, whatever its status code, except a
  /// 5xx: a server fault is not a decision about the subject.
  pub async fn report_attendance(&self, intent: &AttendanceIntent) -> Outcome {
    let resp = match self.client.post(self.url("/attendance")).json(intent).send().await {
      Ok(resp) => resp,
      Err(e) => return Outcome::TransportFailed(format!("POST /attendance failed: {e}")),
    };

    let status = resp.status();
    if status.is_server_error() {
      return Outcome::TransportFailed(format!("POST /attendance → {status}"));
    }

    match resp.json::<Reply>().await {
      Ok(reply) => Outcome::Adjudicated(reply),
      Err(e) => Outcome::TransportFailed(format!("undecodable reply ({status}): {e}")),
    }
  }
}

impl Reporter for ApiClient {
  async fn report(&self, intent: AttendanceIntent) -> Outcome {
    self.report_attendance(&intent).await
  }
}
