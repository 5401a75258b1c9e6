//! Nominatim / `OpenStreetMap` geocoder client.
//!
//! The public instance has strict rate limits: **1 request per second**
//! maximum, and requests must carry an identifying `User-Agent`. Pacing is
//! done by the caller (see [`crate::rate_limit`]).
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use std::time::Duration;

use async_trait::async_trait;

use crate::service_registry::NominatimService;
use crate::{GeocodeError, GeocodedAddress, Geocoder};

/// Maximum length of the response body preview included in errors.
const BODY_PREVIEW_LEN: usize = 200;

/// A [`Geocoder`] backed by a Nominatim search endpoint.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    country_codes: Option<String>,
    timeout: Duration,
}

impl NominatimGeocoder {
    /// Builds an HTTP client for `service` with its `User-Agent` and
    /// per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(service: &NominatimService) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(service.user_agent.clone())
            .timeout(service.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: service.base_url.clone(),
            country_codes: service
                .country_codes
                .clone()
                .filter(|codes| !codes.trim().is_empty()),
            timeout: service.timeout(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    fn name(&self) -> &str {
        "nominatim"
    }

    async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
        geocode_freeform(
            &self.client,
            &self.base_url,
            self.country_codes.as_deref(),
            query,
        )
        .await
        .map_err(|e| into_timeout(e, self.timeout))
    }
}

/// Geocodes a free-form query using Nominatim.
///
/// The caller is responsible for rate limiting (see `rate_limit_ms` in the
/// service TOML configuration).
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request fails, the service answers
/// with an error status, or the response cannot be parsed.
pub async fn geocode_freeform(
    client: &reqwest::Client,
    base_url: &str,
    country_codes: Option<&str>,
    query: &str,
) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let mut params = vec![("q", query), ("format", "jsonv2"), ("limit", "1")];
    if let Some(codes) = country_codes {
        params.push(("countrycodes", codes));
    }

    let resp = client.get(base_url).query(&params).send().await?;

    let status = resp.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("unknown").to_string()
        } else {
            body.chars().take(BODY_PREVIEW_LEN).collect()
        };
        return Err(GeocodeError::Service {
            status: status.as_u16(),
            message,
        });
    }

    let body: serde_json::Value = resp.json().await?;
    parse_response(&body)
}

/// Reclassifies reqwest timeouts as [`GeocodeError::Timeout`].
fn into_timeout(error: GeocodeError, timeout: Duration) -> GeocodeError {
    match error {
        GeocodeError::Http(e) if e.is_timeout() => GeocodeError::Timeout {
            timeout_secs: timeout.as_secs(),
        },
        other => other,
    }
}

/// Parses Nominatim JSON response.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let lat = first["lat"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lat in Nominatim response".to_string(),
        })?;

    let lon = first["lon"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lon in Nominatim response".to_string(),
        })?;

    let display_name = first["display_name"].as_str().map(String::from);

    Ok(Some(GeocodedAddress {
        latitude: lat,
        longitude: lon,
        matched_address: display_name,
    }))
}
