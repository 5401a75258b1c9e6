//! Address → coordinate resolution with failure isolation.
//!
//! [`Resolver`] is the only way the pipeline talks to a geocoding backend.
//! It validates and cleans the address, waits for its [`RateLimiter`],
//! performs one lookup and folds every outcome into an
//! `Option<GeoPoint>`. Failures are logged and counted, never returned.
//!
//! Answers are remembered for the lifetime of the resolver, keyed by the
//! query sent to the backend, so an address repeated across events costs
//! one lookup. Only definite answers (a match or "no match") are
//! remembered; a timed-out or failed address is looked up again the next
//! time it appears.

use std::collections::HashMap;
use std::time::Duration;

use pride_map_event_models::GeoPoint;

use crate::address::{CleanedAddress, clean_address};
use crate::rate_limit::RateLimiter;
use crate::{GeocodeError, Geocoder};

/// Outcome counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Lookups sent to the backend.
    pub attempted: u64,
    /// Lookups that returned coordinates.
    pub resolved: u64,
    /// Addresses rejected before any lookup (blank or placeholder).
    pub skipped: u64,
    /// Lookups the backend answered with "no match".
    pub not_found: u64,
    /// Lookups that timed out.
    pub timed_out: u64,
    /// Lookups that failed with a service or unexpected error.
    pub failed: u64,
    /// Addresses answered from earlier lookups without a backend call.
    pub cached: u64,
}

/// Resolves free-text addresses through a rate-limited [`Geocoder`].
#[derive(Debug)]
pub struct Resolver<G> {
    geocoder: G,
    limiter: RateLimiter,
    clean_addresses: bool,
    cache: HashMap<String, Option<GeoPoint>>,
    stats: ResolverStats,
}

impl<G: Geocoder> Resolver<G> {
    /// Creates a resolver that spaces backend calls by at least
    /// `min_delay`. Address cleaning is enabled.
    #[must_use]
    pub fn new(geocoder: G, min_delay: Duration) -> Self {
        let limiter = RateLimiter::new(min_delay);
        log::debug!(
            "Spacing {} lookups by at least {}ms",
            geocoder.name(),
            limiter.min_delay().as_millis()
        );

        Self {
            geocoder,
            limiter,
            clean_addresses: true,
            cache: HashMap::new(),
            stats: ResolverStats::default(),
        }
    }

    /// Enables or disables floor/room cleaning before lookup. Blank input
    /// is rejected either way.
    #[must_use]
    pub fn with_address_cleaning(mut self, enabled: bool) -> Self {
        self.clean_addresses = enabled;
        self
    }

    /// The backend.
    #[must_use]
    pub const fn geocoder(&self) -> &G {
        &self.geocoder
    }

    /// Counters accumulated so far.
    #[must_use]
    pub const fn stats(&self) -> &ResolverStats {
        &self.stats
    }

    /// Resolves one address.
    ///
    /// Returns `None` for missing or blank input without calling the
    /// backend, and for every lookup failure (no match, timeout, service
    /// error, anything else). Timeouts are not retried. A query answered
    /// before is served from the cache without waiting for the limiter.
    pub async fn resolve(&mut self, address: Option<&str>) -> Option<GeoPoint> {
        let Some(query) = self.prepare(address) else {
            self.stats.skipped += 1;
            return None;
        };

        if let Some(cached) = self.cache.get(&query) {
            self.stats.cached += 1;
            log::debug!("Using cached answer for: {query}");
            return *cached;
        }

        log::info!("Geocoding address: {query}");
        self.limiter.acquire().await;
        self.stats.attempted += 1;

        match self.geocoder.geocode(&query).await {
            Ok(Some(geocoded)) => {
                self.stats.resolved += 1;
                log::info!(
                    "Found coordinates: ({}, {}) for {}",
                    geocoded.latitude,
                    geocoded.longitude,
                    geocoded.matched_address.as_deref().unwrap_or(&query)
                );
                let point = geocoded.point();
                self.cache.insert(query, Some(point));
                Some(point)
            }
            Ok(None) => {
                self.stats.not_found += 1;
                log::warn!("Address not found or geocoding failed for: {query}");
                self.cache.insert(query, None);
                None
            }
            Err(GeocodeError::Timeout { timeout_secs }) => {
                self.stats.timed_out += 1;
                log::error!("Geocoder timed out after {timeout_secs}s for address: {query}");
                None
            }
            Err(e @ (GeocodeError::Service { .. } | GeocodeError::RateLimited)) => {
                self.stats.failed += 1;
                log::error!(
                    "Geocoder service error from {} for address {query}: {e}",
                    self.geocoder.name()
                );
                None
            }
            Err(e) => {
                self.stats.failed += 1;
                log::error!("Unexpected error while geocoding {query}: {e}");
                None
            }
        }
    }

    fn prepare(&self, address: Option<&str>) -> Option<String> {
        let Some(raw) = address.map(str::trim).filter(|a| !a.is_empty()) else {
            log::warn!("Geocoding attempt with invalid address (None or empty).");
            return None;
        };

        if !self.clean_addresses {
            return Some(raw.to_string());
        }

        match clean_address(raw) {
            CleanedAddress::Query(query) => {
                if query != raw {
                    log::debug!("Cleaned address '{raw}' -> '{query}'");
                }
                Some(query)
            }
            CleanedAddress::NotGeocodable => {
                log::warn!("Address is not geocodable: '{raw}'");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Answer, MemoryGeocoder};

    fn resolver(geocoder: MemoryGeocoder) -> Resolver<MemoryGeocoder> {
        Resolver::new(geocoder, Duration::ZERO)
    }

    #[tokio::test]
    async fn rejects_missing_and_blank_without_lookup() {
        let mut resolver = resolver(MemoryGeocoder::new().otherwise(Answer::Found(1.0, 2.0)));

        assert!(resolver.resolve(None).await.is_none());
        assert!(resolver.resolve(Some("")).await.is_none());
        assert!(resolver.resolve(Some("   ")).await.is_none());

        assert!(resolver.geocoder().calls().is_empty());
        assert_eq!(resolver.stats().skipped, 3);
        assert_eq!(resolver.stats().attempted, 0);
    }

    #[tokio::test]
    async fn returns_coordinates_on_match() {
        let mut resolver = resolver(
            MemoryGeocoder::new().with("Rådhuspladsen 1, 8000 Aarhus C", Answer::Found(56.15, 10.2)),
        );

        let point = resolver
            .resolve(Some(" Rådhuspladsen 1, 8000 Aarhus C "))
            .await;

        assert_eq!(point, Some(GeoPoint::new(56.15, 10.2)));
        assert_eq!(resolver.stats().resolved, 1);
    }

    #[tokio::test]
    async fn cleans_address_before_lookup() {
        let mut resolver = resolver(MemoryGeocoder::new());
        resolver
            .resolve(Some("Mejlgade 10, 1. sal, 8000 Aarhus C"))
            .await;
        assert_eq!(
            resolver.geocoder().calls(),
            vec!["Mejlgade 10, 8000 Aarhus C".to_string()]
        );
    }

    #[tokio::test]
    async fn sends_raw_address_when_cleaning_disabled() {
        let mut resolver = resolver(MemoryGeocoder::new()).with_address_cleaning(false);
        resolver
            .resolve(Some("Mejlgade 10, 1. sal, 8000 Aarhus C"))
            .await;
        assert_eq!(
            resolver.geocoder().calls(),
            vec!["Mejlgade 10, 1. sal, 8000 Aarhus C".to_string()]
        );
    }

    #[tokio::test]
    async fn placeholder_is_skipped() {
        let mut resolver = resolver(MemoryGeocoder::new());
        assert!(resolver.resolve(Some("TBA")).await.is_none());
        assert!(resolver.geocoder().calls().is_empty());
    }

    #[tokio::test]
    async fn failures_are_swallowed_and_counted() {
        let mut resolver = resolver(
            MemoryGeocoder::new()
                .with("a", Answer::NotFound)
                .with("b", Answer::Timeout)
                .with("c", Answer::ServiceError("overloaded".to_string()))
                .with("d", Answer::Garbled),
        );

        for address in ["a", "b", "c", "d"] {
            assert!(resolver.resolve(Some(address)).await.is_none());
        }

        let stats = resolver.stats();
        assert_eq!(stats.attempted, 4);
        assert_eq!(stats.not_found, 1);
        assert_eq!(stats.timed_out, 1);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.resolved, 0);
    }

    #[tokio::test]
    async fn timeout_is_not_retried() {
        let mut resolver = resolver(MemoryGeocoder::new().otherwise(Answer::Timeout));
        resolver.resolve(Some("Dokk1")).await;
        assert_eq!(resolver.geocoder().calls().len(), 1);
    }

    #[tokio::test]
    async fn repeated_address_is_looked_up_once() {
        let mut resolver = resolver(
            MemoryGeocoder::new().with("Rådhusparken, 8000 Aarhus C", Answer::Found(56.15, 10.2)),
        );

        for _ in 0..3 {
            assert_eq!(
                resolver.resolve(Some("Rådhusparken, 8000 Aarhus C")).await,
                Some(GeoPoint::new(56.15, 10.2))
            );
        }

        assert_eq!(
            resolver.geocoder().calls(),
            vec!["Rådhusparken, 8000 Aarhus C".to_string()]
        );
        assert_eq!(resolver.stats().attempted, 1);
        assert_eq!(resolver.stats().resolved, 1);
        assert_eq!(resolver.stats().cached, 2);
    }

    #[tokio::test]
    async fn cache_is_keyed_by_cleaned_query() {
        let mut resolver = resolver(MemoryGeocoder::new().otherwise(Answer::Found(1.0, 2.0)));

        resolver.resolve(Some("Mejlgade 10, 1. sal, 8000 Aarhus C")).await;
        resolver.resolve(Some("Mejlgade 10, 8000 Aarhus C")).await;

        assert_eq!(resolver.geocoder().calls().len(), 1);
        assert_eq!(resolver.stats().cached, 1);
    }

    #[tokio::test]
    async fn remembers_no_match() {
        let mut resolver = resolver(MemoryGeocoder::new());

        assert!(resolver.resolve(Some("Atlantis")).await.is_none());
        assert!(resolver.resolve(Some("Atlantis")).await.is_none());

        assert_eq!(resolver.geocoder().calls().len(), 1);
        assert_eq!(resolver.stats().not_found, 1);
        assert_eq!(resolver.stats().cached, 1);
    }

    #[tokio::test]
    async fn does_not_remember_failures() {
        let mut resolver = resolver(
            MemoryGeocoder::new()
                .with("Dokk1", Answer::Timeout)
                .with("Godsbanen", Answer::ServiceError("busy".to_string())),
        );

        for address in ["Dokk1", "Godsbanen", "Dokk1", "Godsbanen"] {
            assert!(resolver.resolve(Some(address)).await.is_none());
        }

        assert_eq!(resolver.geocoder().calls().len(), 4);
        assert_eq!(resolver.stats().cached, 0);
        assert_eq!(resolver.stats().timed_out, 2);
        assert_eq!(resolver.stats().failed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cached_answers_skip_the_rate_limiter() {
        let mut resolver = Resolver::new(
            MemoryGeocoder::new().otherwise(Answer::Found(1.0, 1.0)),
            Duration::from_secs(1),
        );
        let start = tokio::time::Instant::now();

        resolver.resolve(Some("a")).await;
        resolver.resolve(Some("a")).await;
        resolver.resolve(Some("a")).await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn lookups_share_one_rate_limiter() {
        let mut resolver = Resolver::new(
            MemoryGeocoder::new().otherwise(Answer::Found(1.0, 1.0)),
            Duration::from_secs(1),
        );
        let start = tokio::time::Instant::now();

        resolver.resolve(Some("a")).await;
        resolver.resolve(Some("b")).await;
        resolver.resolve(None).await;
        resolver.resolve(Some("c")).await;

        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_secs(3));
    }
}
