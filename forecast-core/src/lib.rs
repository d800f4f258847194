//! Core library for the `forecast` scraper.
//!
//! This crate defines:
//! - Request construction for the weather.com daily forecast endpoint
//! - Extraction of per-day records from the forecast response
//! - Configuration, fetching and CSV output around that core
//!
//! It is used by `forecast-cli`, but can also be reused by other binaries or services.

use chrono::{DateTime, Utc};
use tracing::info;

pub mod config;
pub mod extract;
pub mod model;
pub mod request;
pub mod sink;
pub mod source;

pub use config::{Config, Location};
pub use extract::{DailyRecords, DayError, ExtractError, extract, extract_or_empty};
pub use model::{DayCount, ForecastRecord, ParamsError, RecordStatus, RequestParameters, UnitSystem};
pub use request::RequestDescriptor;
pub use sink::{CsvSink, write_csv_file};
pub use source::{FetchedPage, ForecastSource, WeatherComSource};

/// Fetch the forecast for `params` from `endpoint` and extract its records.
///
/// Transport failures are returned; an unusable response body is logged
/// and yields an empty batch.
pub async fn scrape(
    source: &dyn ForecastSource,
    endpoint: &str,
    params: &RequestParameters,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<ForecastRecord>> {
    let request = RequestDescriptor::build_for(endpoint, params)?;
    let page = source.fetch(&request).await?;

    let records = extract_or_empty(&page.body, params, &page.url, now);
    let failed = records.iter().filter(|r| !r.status.is_ok()).count();
    info!(
        days = records.len(),
        failed,
        status = %page.status,
        "Scraped forecast for {}",
        params.geocode()
    );

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use reqwest::StatusCode;
    use serde_json::{Number, json};
    use std::sync::Mutex;

    /// Serves a fixed body and remembers the last request body.
    #[derive(Debug)]
    struct FixedSource {
        body: String,
        seen: Mutex<Option<String>>,
    }

    impl FixedSource {
        fn new(body: String) -> Self {
            Self { body, seen: Mutex::new(None) }
        }
    }

    #[async_trait]
    impl ForecastSource for FixedSource {
        async fn fetch(&self, request: &RequestDescriptor) -> anyhow::Result<FetchedPage> {
            *self.seen.lock().unwrap() = Some(request.body.clone());
            Ok(FetchedPage {
                url: request.url.clone(),
                status: StatusCode::OK,
                body: self.body.clone(),
            })
        }
    }

    #[derive(Debug)]
    struct OfflineSource;

    #[async_trait]
    impl ForecastSource for OfflineSource {
        async fn fetch(&self, request: &RequestDescriptor) -> anyhow::Result<FetchedPage> {
            Err(anyhow::anyhow!("connection refused: {}", request.url))
        }
    }

    fn params() -> RequestParameters {
        RequestParameters::new(DayCount::new(2).unwrap(), 26.231, -98.445, UnitSystem::Imperial)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 14, 12, 0, 0).unwrap()
    }

    fn fixture(params: &RequestParameters) -> String {
        json!({
            "dal": {
                "getSunV3DailyForecastWithHeadersUrlConfig": {
                    params.payload_key(): {
                        "data": {
                            "validTimeLocal": [
                                "2024-01-14T07:00:00-06:00",
                                "2024-01-15T07:00:00-06:00",
                                "2024-01-16T07:00:00-06:00"
                            ],
                            "temperatureMax": [70, 75, 80],
                            "temperatureMin": [50, 55, 60],
                            "daypart": [{
                                "uvIndex": [null, 0, 5, 0, 6, 0],
                                "cloudCover": [null, 10, 20, 30, 40, 50],
                                "precipChance": [null, 1, 2, 3, 4, 5],
                                "windSpeed": [null, 8, 9, 10, 11, 12]
                            }]
                        }
                    }
                }
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn scrape_extracts_records_from_fetched_page() {
        let params = params();
        let source = FixedSource::new(fixture(&params));

        let records = scrape(&source, request::DEFAULT_ENDPOINT, &params, now()).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].local_date.as_deref(), Some("2024-01-15T07:00"));
        assert_eq!(records[0].max_temp, Some(Number::from(75)));
        assert_eq!(records[0].min_temp, Some(Number::from(55)));
        assert_eq!(records[1].max_temp, Some(Number::from(80)));
        assert_eq!(records[1].min_temp, Some(Number::from(60)));
        assert_eq!(records[1].cloud_cover_am, Some(Number::from(40)));
        assert_eq!(records[1].cloud_cover_pm, Some(Number::from(50)));
        assert_eq!(records[1].source_url, request::DEFAULT_ENDPOINT);

        let sent = source.seen.lock().unwrap().clone().unwrap();
        assert!(sent.contains(r#""geocode": "26.231,-98.445""#));
    }

    #[tokio::test]
    async fn scrape_returns_empty_batch_for_unusable_body() {
        let source = FixedSource::new("<html>Access Denied</html>".to_string());

        let records = scrape(&source, request::DEFAULT_ENDPOINT, &params(), now()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn scrape_propagates_transport_errors() {
        let err = scrape(&OfflineSource, request::DEFAULT_ENDPOINT, &params(), now())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("connection refused"));
    }
}
