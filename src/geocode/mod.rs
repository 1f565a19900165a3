//! Turning free-form addresses into coordinates.

pub mod error;
pub mod nominatim;

use crate::types::station::LatLon;
use async_trait::async_trait;
use std::fmt::Debug;

/// Resolves an address to a location.
///
/// `None` means the address could not be resolved, either because nothing matched or because
/// the service failed. Implementations log the cause.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn geocode(&self, address: &str) -> Option<LatLon>;
}
