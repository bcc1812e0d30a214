use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::DistanceError;
use crate::haversine::haversine_meters;

/// Longitude/latitude pair as returned by geocoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

/// Driving distance and duration between two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub distance_meters: u64,
    pub duration_seconds: u64,
}

/// Geocoding and routing, the two calls the quote flow needs from a mapping
/// backend. Implementations wrap a real service; the core never depends on
/// which one.
#[async_trait]
pub trait DistanceProvider: Send + Sync {
    /// Resolve a free-form address to coordinates.
    async fn geocode(&self, address: &str) -> Result<Coordinates, DistanceError>;

    /// Compute the driving route between two coordinates.
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RouteSummary, DistanceError>;
}

// ═══════════════════════════════════════════════════════════════════════════
// STRAIGHT-LINE PROVIDER
// ═══════════════════════════════════════════════════════════════════════════

/// Registry-backed provider that geocodes from a fixed address table and
/// routes as the crow flies at a configured average speed.
///
/// For tests and local development; production uses a real routing service
/// behind the same trait.
#[derive(Debug, Clone)]
pub struct StraightLineProvider {
    addresses: HashMap<String, Coordinates>,
    average_speed_kmh: f64,
}

impl StraightLineProvider {
    pub fn new() -> Self {
        Self {
            addresses: HashMap::new(),
            average_speed_kmh: 30.0,
        }
    }

    pub fn with_average_speed_kmh(mut self, speed: f64) -> Self {
        self.average_speed_kmh = speed;
        self
    }

    /// Register an address so `geocode` can resolve it. Lookup is
    /// case-insensitive on the full string.
    pub fn register_address(&mut self, address: impl Into<String>, coords: Coordinates) {
        self.addresses.insert(address.into().to_lowercase(), coords);
    }
}

impl Default for StraightLineProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DistanceProvider for StraightLineProvider {
    async fn geocode(&self, address: &str) -> Result<Coordinates, DistanceError> {
        self.addresses
            .get(&address.to_lowercase())
            .copied()
            .ok_or_else(|| DistanceError::AddressNotFound(address.to_string()))
    }

    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RouteSummary, DistanceError> {
        let distance_meters = haversine_meters(origin, destination);
        let duration_seconds = distance_meters / (self.average_speed_kmh * 1000.0 / 3600.0);
        Ok(RouteSummary {
            distance_meters: distance_meters.round() as u64,
            duration_seconds: duration_seconds.round() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> StraightLineProvider {
        let mut p = StraightLineProvider::new();
        p.register_address(
            "100 Rue Principale, Montreal",
            Coordinates {
                lon: -73.5673,
                lat: 45.5017,
            },
        );
        p.register_address(
            "200 Rue Sainte-Catherine, Montreal",
            Coordinates {
                lon: -73.5540,
                lat: 45.5088,
            },
        );
        p
    }

    #[tokio::test]
    async fn test_geocode_known_address() {
        let p = provider();
        let coords = p.geocode("100 Rue Principale, Montreal").await.unwrap();
        assert_eq!(coords.lat, 45.5017);
    }

    #[tokio::test]
    async fn test_geocode_is_case_insensitive() {
        let p = provider();
        assert!(p.geocode("100 RUE PRINCIPALE, MONTREAL").await.is_ok());
    }

    #[tokio::test]
    async fn test_geocode_unknown_address() {
        let p = provider();
        let err = p.geocode("1 Nowhere Lane").await.unwrap_err();
        assert!(matches!(err, DistanceError::AddressNotFound(_)));
    }

    #[tokio::test]
    async fn test_route_between_registered_points() {
        let p = provider();
        let origin = p.geocode("100 Rue Principale, Montreal").await.unwrap();
        let dest = p
            .geocode("200 Rue Sainte-Catherine, Montreal")
            .await
            .unwrap();
        let route = p.route(origin, dest).await.unwrap();
        assert!(route.distance_meters > 900 && route.distance_meters < 1_500);
        assert!(route.duration_seconds > 0);
    }

    #[tokio::test]
    async fn test_duration_scales_with_speed() {
        let slow = provider().with_average_speed_kmh(15.0);
        let fast = provider().with_average_speed_kmh(60.0);
        let origin = Coordinates {
            lon: -73.5673,
            lat: 45.5017,
        };
        let dest = Coordinates {
            lon: -73.5540,
            lat: 45.5088,
        };
        let a = slow.route(origin, dest).await.unwrap();
        let b = fast.route(origin, dest).await.unwrap();
        assert!(a.duration_seconds > b.duration_seconds);
        assert_eq!(a.distance_meters, b.distance_meters);
    }
}
