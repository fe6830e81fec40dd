use crate::core::models::MultiSheetResponse;
use reqwest::blocking::Client as HttpClient;
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Client for the document extraction service.
///
/// Fetches are generation-numbered: each call gets a number from a
/// monotonic counter, and [`crate::session::Session::install_response`]
/// discards results whose generation is older than the newest installed
/// one. That is the whole supersession story; retry/backoff belongs to the
/// caller.
#[derive(Debug)]
pub struct ExtractionClient {
    base_url: String,
    token: String,
    generation: AtomicU64,
}

impl ExtractionClient {
    pub fn new<S: Into<String>, T: Into<String>>(base_url: S, token: T) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            token: token.into(),
            generation: AtomicU64::new(0),
        }
    }

    /// Build a client from `TABVIZ_API_URL` and `TABVIZ_API_TOKEN`.
    pub fn from_env() -> Option<Self> {
        let url = env::var("TABVIZ_API_URL").ok()?;
        match env::var("TABVIZ_API_TOKEN") {
            Ok(token) if !token.trim().is_empty() => Some(Self::new(url, token)),
            _ => None,
        }
    }

    /// Fetch the extraction result for a document reference.
    ///
    /// Returns the fetch generation alongside the normalized response so
    /// the caller can hand both to the session.
    pub fn fetch_results(&self, document: &str) -> anyhow::Result<(u64, MultiSheetResponse)> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let url = format!("{}/results/{document}", self.base_url);
        info!(%url, generation, "fetching extraction results");

        let http = HttpClient::builder()
            .user_agent(concat!("tabviz/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let body = http
            .get(&url)
            .bearer_auth(&self.token)
            .send()?
            .error_for_status()?
            .text()?;

        let response = MultiSheetResponse::from_json(&body)?;
        Ok((generation, response))
    }
}
