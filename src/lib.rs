//! geofence-ip - decide whether an IP address is near a fixed anchor point
//!
//! An anchor location is resolved once from an IP geolocation provider.
//! Each queried address is geolocated, compared against the anchor, and the
//! boolean verdict is memoized in a cache so repeated queries for the same
//! address skip the network.
//!
//! # Features
//! - **cli**: `geofence` command-line binary (default)
//!
//! # Architecture
//! - `cli`: Command-line argument definitions
//! - `cache`: Verdict cache trait with in-memory (moka) and Redis backends
//! - `services`: Geolocation provider and the geofence engine
//! - `config`: Configuration loading (TOML + environment)
//! - `system`: Logging initialization
//! - `errors`: Error taxonomy
//!
//! # Example
//! ```no_run
//! use geofence_ip::config::StaticConfig;
//! use geofence_ip::services::Geofence;
//!
//! # async fn run() -> geofence_ip::errors::Result<()> {
//! let config = StaticConfig::load(None)?;
//! let geofence = Geofence::new(&config).await?;
//! let near = geofence.is_near("8.8.8.8").await?;
//! # let _ = near;
//! # Ok(())
//! # }
//! ```

pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
pub mod services;
pub mod system;

pub use errors::{GeofenceError, Result};
pub use services::{Coordinates, Geofence, Proximity};
