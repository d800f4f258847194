use reqwest::Method;
use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use std::io;

use crate::model::RequestParameters;

pub const DEFAULT_ENDPOINT: &str = "https://weather.com/api/v1/p/redux-dal";

/// Name of the provider operation returning the daily forecast.
pub const OPERATION: &str = "getSunV3DailyForecastWithHeadersUrlConfig";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

/// Headers the endpoint expects from its own web client.
pub const HEADERS: [(&str, &str); 9] = [
    ("authority", "weather.com"),
    ("accept", "*/*"),
    ("accept-language", "en-US,en;q=0.9"),
    ("cache-control", "no-cache"),
    ("content-type", "application/json"),
    ("origin", "https://weather.com"),
    ("pragma", "no-cache"),
    ("referer", "https://weather.com/"),
    ("user-agent", USER_AGENT),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub headers: &'static [(&'static str, &'static str)],
    pub body: String,
}

#[derive(Debug, Serialize)]
struct Operation<'a> {
    name: &'a str,
    params: OperationParams,
}

#[derive(Debug, Serialize)]
struct OperationParams {
    duration: String,
    geocode: String,
    units: &'static str,
}

impl RequestDescriptor {
    pub fn build(params: &RequestParameters) -> serde_json::Result<Self> {
        Self::build_for(DEFAULT_ENDPOINT, params)
    }

    /// Same as [`RequestDescriptor::build`] against a different endpoint.
    pub fn build_for(endpoint: &str, params: &RequestParameters) -> serde_json::Result<Self> {
        let body = [Operation {
            name: OPERATION,
            params: OperationParams {
                duration: params.duration(),
                geocode: params.geocode(),
                units: params.units.code(),
            },
        }];

        Ok(Self {
            method: Method::POST,
            url: endpoint.to_string(),
            headers: &HEADERS,
            body: to_spaced_json(&body)?,
        })
    }
}

/// Writes JSON with `", "` and `": "` separators, as the endpoint's web client does.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

fn to_spaced_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut out = Vec::with_capacity(160);
    let mut ser = Serializer::with_formatter(&mut out, SpacedFormatter);
    value.serialize(&mut ser)?;

    String::from_utf8(out)
        .map_err(|e| serde_json::Error::io(io::Error::new(io::ErrorKind::InvalidData, e)))
}
