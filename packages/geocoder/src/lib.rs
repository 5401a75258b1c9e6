#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding of free-text event addresses.
//!
//! Converts addresses typed into the event submission form to
//! latitude/longitude coordinates:
//!
//! 1. [`address`] strips floor/room qualifiers the lookup service cannot
//!    parse.
//! 2. A [`Geocoder`] backend performs the lookup. [`nominatim`] talks to a
//!    Nominatim / `OpenStreetMap` instance configured via
//!    [`service_registry`].
//! 3. [`resolver::Resolver`] owns the backend and a [`rate_limit::RateLimiter`]
//!    and turns every outcome (match, no match, timeout, service error) into
//!    an optional coordinate pair so that one bad address never aborts a
//!    batch.

pub mod address;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod nominatim;
pub mod rate_limit;
pub mod resolver;
pub mod service_registry;

use async_trait::async_trait;
use pride_map_event_models::GeoPoint;
use thiserror::Error;

pub use resolver::{Resolver, ResolverStats};

/// A geocoding result with coordinates and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// The matched/canonical address returned by the geocoder.
    pub matched_address: Option<String>,
}

impl GeocodedAddress {
    /// The coordinate pair of this match.
    #[must_use]
    pub const fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed for a reason other than a timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend did not answer within the request timeout.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout {
        /// The timeout that was exceeded, in seconds.
        timeout_secs: u64,
    },

    /// The backend answered with an error status.
    #[error("Service error (HTTP {status}): {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Response body preview or reason phrase.
        message: String,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// An address lookup backend.
///
/// Implementations perform exactly one lookup per call and do not rate
/// limit themselves; pacing is the job of [`Resolver`].
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &str;

    /// Looks up a free-form address.
    ///
    /// Returns `Ok(None)` when the backend has no match.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] on timeouts, error responses, transport
    /// failures and unparseable responses.
    async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError>;
}
