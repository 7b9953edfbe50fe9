use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

use crate::error::WidgetError;

/// Asynchronous GET returning a parsed JSON document.
#[async_trait]
pub trait HttpClient: Send + Sync + Debug {
    async fn get_json(&self, url: Url) -> Result<Value, WidgetError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestClient {
    http: Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> Result<Self, WidgetError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_json(&self, url: Url) -> Result<Value, WidgetError> {
        debug!(host = url.host_str().unwrap_or_default(), path = url.path(), "GET");

        let res = self.http.get(url).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(WidgetError::Transport(format!(
                "request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body).map_err(|e| WidgetError::parse("response body", e.to_string()))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_bodies() {
        assert_eq!(truncate_body("ok"), "ok");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "臺".repeat(300);
        let cut = truncate_body(&body);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
    }
}
