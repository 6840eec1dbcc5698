//! # scat_ephem
//!
//! Spacecraft ephemeris handling for scatterometer ground processing: buffered
//! reading of sampled orbit states, polynomial interpolation between samples, and
//! geolocation of ground points relative to the spacecraft ground track (subtrack
//! coordinates and Space Oblique Mercator grid coordinates).
//!
//! Units: positions in km and velocities in km/s (binary files store meters), times
//! in seconds since 1970-01-01 UTC, angles in radians unless a type says degrees.
pub mod config_list;
pub mod constants;
pub mod earth_position;
pub mod ephem_errors;
pub mod ephemeris;
pub mod gap_fill;
pub mod orbit_elements;
pub mod orbit_state;
pub mod params;
pub mod som;
pub mod subtrack;
pub mod time;
