//! # Constants and type definitions for scat_ephem
//!
//! This module centralizes the **physical constants**, **numerical tolerances**, and
//! **unit aliases** used by the ephemeris and geolocation code.
//!
//! ## Overview
//!
//! - WGS-84 ellipsoid and Earth gravity/rotation constants
//! - Search tolerances for the closest-approach and SOM solvers
//! - Empirical scale corrections of the subtrack inverse mapping
//! - Default layout of the wind vector cell grid
//! - Type aliases documenting the unit of a scalar
//!
//! In-memory lengths are **kilometers** and velocities **km/s**; on-disk ephemeris
//! records are meters and m/s.

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Meters → kilometers
pub const M_TO_KM: f64 = 1.0e-3;

/// Kilometers → meters
pub const KM_TO_M: f64 = 1.0e3;

/// Earth equatorial radius in kilometers (WGS-84)
pub const R1_EARTH: f64 = 6_378.137;

/// Earth flattening (WGS-84)
pub const FLATTENING: f64 = 1.0 / 298.257_223_563;

/// Earth polar radius in kilometers (WGS-84)
pub const R2_EARTH: f64 = R1_EARTH * (1.0 - FLATTENING);

/// Square of the first eccentricity of the Earth ellipsoid, `f (2 - f)`
pub const E2: f64 = FLATTENING * (2.0 - FLATTENING);

/// Earth gravitational parameter in m³/s²
pub const EARTH_GRAV_PARAM: f64 = 3.986_00e14;

/// Second zonal harmonic of the Earth gravity field
pub const RJ2: f64 = 1.082_60e-3;

/// Earth sidereal rotation rate in rad/s
pub const EARTH_ROTATION_RATE: f64 = 7.292_115_9e-5;

// -------------------------------------------------------------------------------------------------
// Numerical tolerances
// -------------------------------------------------------------------------------------------------

/// Near-zero divisor guard for the orbit element and SOM computations.
pub const EPSILON: f64 = 1e-30;

/// Width (seconds) below which the golden-section search for the closest approach stops.
pub const RANGE_TIME_TOL: f64 = 1e-3;

/// Initial time step (seconds) of the downhill bracketing of the range function.
pub const RANGE_BRACKET_STEP: f64 = 40.0;

/// Geometric expansion factor of the downhill bracketing.
pub const BRACKET_EXPANSION: f64 = 1.6;

/// Golden ratio fraction used by the golden-section search.
pub const GOLDEN_R: f64 = 0.618_033_99;

/// Complement of [`GOLDEN_R`].
pub const GOLDEN_C: f64 = 1.0 - GOLDEN_R;

/// Time step (seconds) of the along-track arclength integration.
pub const SUBTRACK_INTEGRATION_STEPSIZE: f64 = 10.0;

/// Convergence tolerance (radians) of the SOM along-track longitude iteration.
pub const SOM_TOLERANCE: f64 = 1e-5;

/// Default polynomial order of the ephemeris interpolation.
pub const EPHEMERIS_INTERP_ORDER: usize = 8;

/// Default cap on the number of orbit states kept in memory.
pub const EPHEMERIS_MAX_NODES: usize = 50_000;

// -------------------------------------------------------------------------------------------------
// Empirical corrections of the subtrack inverse mapping
// -------------------------------------------------------------------------------------------------

/// Scale applied to the elapsed time estimated from an along-track distance.
///
/// Determined by trial and error against the forward subtrack search; there is no
/// closed-form derivation.
pub const ALONG_TRACK_CORRECTION: f64 = 1.00932;

/// Scale applied to the cross-track step taken at spacecraft altitude before the
/// result is projected back to the surface.
///
/// Determined by trial and error against the forward subtrack search; there is no
/// closed-form derivation.
pub const CROSS_TRACK_CORRECTION: f64 = 1.1347;

// -------------------------------------------------------------------------------------------------
// Wind vector cell grid
// -------------------------------------------------------------------------------------------------

/// Cells along one revolution, pole to pole.
pub const GRID_ALONG_TRACK_CELLS: usize = 1624;

/// Cells across the swath; the subtrack runs between the two central columns.
pub const GRID_CROSS_TRACK_CELLS: usize = 76;

/// Cell size in kilometers at the equatorial radius.
pub const GRID_CELL_SIZE: f64 = 25.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Distance in meters
pub type Meter = f64;
/// Seconds since the sim epoch (1970-01-01T00:00:00 UTC)
pub type SimTime = f64;
