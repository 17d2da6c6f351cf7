pub mod geofence;
pub mod geoip;

pub use geofence::{Geofence, Proximity};
pub use geoip::{Coordinates, ExternalApiProvider, GeoLocator, GeoLookup};
