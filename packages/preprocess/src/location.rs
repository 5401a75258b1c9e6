//! Location splitting and per-event coordinate aggregation.
//!
//! Multi-part events (a parade route, a bar crawl) list one address per
//! line in the location field. Each address is geocoded separately and the
//! results are collected into parallel latitude/longitude lists.

use pride_map_event_models::{
    COORDINATE_COLUMNS, Coordinates, FieldValue, LATITUDE_COLUMN, LATITUDE_LIST_COLUMN,
    LONGITUDE_COLUMN, LONGITUDE_LIST_COLUMN, Table,
};
use pride_map_geocoder::{Geocoder, Resolver};

/// Characters separating the addresses of a multi-address location.
const SEPARATORS: &[char] = &['\n', '\r', ';'];

/// The addresses found in a location field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationSpec {
    /// The field was missing or held only separators and whitespace.
    Empty,
    /// Exactly one address.
    Single(String),
    /// Two or more addresses, in the order they were written.
    Multi(Vec<String>),
}

impl LocationSpec {
    /// Splits a location field on line breaks and semicolons, trimming
    /// each part and discarding blank ones.
    #[must_use]
    pub fn parse(text: Option<&str>) -> Self {
        let mut addresses: Vec<String> = text
            .unwrap_or_default()
            .split(SEPARATORS)
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(ToString::to_string)
            .collect();

        match addresses.len() {
            0 => Self::Empty,
            1 => Self::Single(addresses.remove(0)),
            _ => Self::Multi(addresses),
        }
    }

    /// Number of addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Single(_) => 1,
            Self::Multi(addresses) => addresses.len(),
        }
    }

    /// Whether no address was found.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Resolves every address of `spec`.
///
/// Single (and empty) locations yield [`Coordinates::Single`]. Multi-address
/// locations are resolved left to right and yield [`Coordinates::Multi`]
/// holding only the addresses that resolved; failed ones are left out, so
/// the list can be shorter than the address list.
pub async fn resolve_location<G: Geocoder>(
    resolver: &mut Resolver<G>,
    spec: &LocationSpec,
) -> Coordinates {
    match spec {
        LocationSpec::Empty => Coordinates::Single(resolver.resolve(None).await),
        LocationSpec::Single(address) => {
            let point = resolver.resolve(Some(address.as_str())).await;
            if point.is_none() {
                log::warn!("Could not find coordinates for '{address}'.");
            }
            Coordinates::Single(point)
        }
        LocationSpec::Multi(addresses) => {
            let mut points = Vec::with_capacity(addresses.len());
            for (i, address) in addresses.iter().enumerate() {
                match resolver.resolve(Some(address.as_str())).await {
                    Some(point) => points.push(point),
                    None => log::warn!(
                        "Could not find coordinates for stop {}/{} '{address}'; leaving it off the list.",
                        i + 1,
                        addresses.len()
                    ),
                }
            }
            Coordinates::Multi(points)
        }
    }
}

/// Appends the coordinate columns to `table`, one [`Coordinates`] per row
/// in row order.
///
/// Coordinate columns already present (e.g. when re-processing a previous
/// output) are replaced. Lists are written as JSON arrays.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if a coordinate cannot be serialized
/// (non-finite values).
pub fn append_coordinates(
    table: &mut Table,
    coordinates: &[Coordinates],
) -> Result<(), serde_json::Error> {
    let replaced = table.drop_columns(&COORDINATE_COLUMNS);
    if !replaced.is_empty() {
        log::debug!("Replacing existing coordinate columns: {replaced:?}");
    }

    let mut latitude = Vec::with_capacity(coordinates.len());
    let mut longitude = Vec::with_capacity(coordinates.len());
    let mut latitude_list = Vec::with_capacity(coordinates.len());
    let mut longitude_list = Vec::with_capacity(coordinates.len());

    for coords in coordinates {
        latitude.push(to_cell(coords.latitude())?);
        longitude.push(to_cell(coords.longitude())?);
        latitude_list.push(to_cell(coords.latitude_list())?);
        longitude_list.push(to_cell(coords.longitude_list())?);
    }

    table.push_column(LATITUDE_COLUMN, latitude);
    table.push_column(LONGITUDE_COLUMN, longitude);
    table.push_column(LATITUDE_LIST_COLUMN, latitude_list);
    table.push_column(LONGITUDE_LIST_COLUMN, longitude_list);

    Ok(())
}

fn to_cell<T: serde::Serialize>(value: Option<T>) -> Result<FieldValue, serde_json::Error> {
    value
        .map(|v| serde_json::to_string(&v))
        .transpose()
        .map(FieldValue::from)
}
