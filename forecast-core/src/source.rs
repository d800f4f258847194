use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fmt::Debug;
use tracing::{debug, warn};

use crate::request::RequestDescriptor;

/// Response body as fetched, with the URL that served it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: String,
    pub status: StatusCode,
    pub body: String,
}

#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<FetchedPage>;
}

#[derive(Debug, Clone, Default)]
pub struct WeatherComSource {
    http: Client,
}

impl WeatherComSource {
    pub fn new() -> Self {
        Self { http: Client::new() }
    }
}

#[async_trait]
impl ForecastSource for WeatherComSource {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<FetchedPage> {
        debug!(url = %request.url, body = %request.body, "Sending forecast request");

        let mut builder = self.http.request(request.method.clone(), request.url.as_str());
        for (name, value) in request.headers {
            builder = builder.header(*name, *value);
        }

        let res = builder
            .body(request.body.clone())
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", request.url))?;

        let status = res.status();
        let url = res.url().to_string();
        let body = res
            .text()
            .await
            .context("Failed to read forecast response body")?;

        if !status.is_success() {
            // Left to the extractor: an error page never has the forecast shape.
            warn!(
                %status,
                %url,
                body = %truncate_body(&body),
                "Forecast request returned non-success status"
            );
        }

        Ok(FetchedPage { url, status, body })
    }
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_body_keeps_short_bodies() {
        assert_eq!(truncate_body("{}"), "{}");
    }

    #[test]
    fn truncate_body_cuts_on_char_boundary() {
        let body = "é".repeat(300);
        let cut = truncate_body(&body);
        assert_eq!(cut.chars().count(), 200);
    }
}
