//! In-memory [`Geocoder`] with scripted answers, for tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{GeocodeError, GeocodedAddress, Geocoder};

/// What the in-memory backend answers for a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// A match at the given coordinates.
    Found(f64, f64),
    /// No match.
    NotFound,
    /// [`GeocodeError::Timeout`].
    Timeout,
    /// [`GeocodeError::Service`] with the given message.
    ServiceError(String),
    /// [`GeocodeError::Parse`], standing in for any unexpected failure.
    Garbled,
}

/// A [`Geocoder`] answering from a fixed table and recording every query.
#[derive(Debug)]
pub struct MemoryGeocoder {
    answers: BTreeMap<String, Answer>,
    fallback: Answer,
    calls: Mutex<Vec<String>>,
}

impl Default for MemoryGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGeocoder {
    /// Creates a backend that answers [`Answer::NotFound`] to everything.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            answers: BTreeMap::new(),
            fallback: Answer::NotFound,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Scripts the answer for an exact query string.
    #[must_use]
    pub fn with(mut self, query: &str, answer: Answer) -> Self {
        self.answers.insert(query.to_string(), answer);
        self
    }

    /// Sets the answer for queries that were not scripted.
    #[must_use]
    pub fn otherwise(mut self, answer: Answer) -> Self {
        self.fallback = answer;
        self
    }

    /// Every query received so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the call log mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Geocoder for MemoryGeocoder {
    fn name(&self) -> &str {
        "memory"
    }

    async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
        self.calls.lock().unwrap().push(query.to_string());

        match self.answers.get(query).unwrap_or(&self.fallback) {
            Answer::Found(latitude, longitude) => Ok(Some(GeocodedAddress {
                latitude: *latitude,
                longitude: *longitude,
                matched_address: Some(query.to_string()),
            })),
            Answer::NotFound => Ok(None),
            Answer::Timeout => Err(GeocodeError::Timeout { timeout_secs: 10 }),
            Answer::ServiceError(message) => Err(GeocodeError::Service {
                status: 503,
                message: message.clone(),
            }),
            Answer::Garbled => Err(GeocodeError::Parse {
                message: "garbled response".to_string(),
            }),
        }
    }
}
