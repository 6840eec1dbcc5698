#![allow(dead_code)]

use camino::Utf8PathBuf;
use nalgebra::Vector3;
use scat_ephem::{
    constants::EARTH_GRAV_PARAM,
    ephemeris::writer::write_ephemeris_file,
    orbit_state::{OrbitState, Precision},
};
use tempfile::TempDir;

/// Radius (km) of the synthetic circular orbit, about 800 km altitude.
pub const ORBIT_RADIUS: f64 = 7178.0;

/// Sampling interval (s) of the synthetic ephemeris.
pub const SAMPLE_STEP: f64 = 10.0;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Mean motion (rad/s) of the synthetic orbit.
pub fn angular_rate() -> f64 {
    (EARTH_GRAV_PARAM * 1e-9 / ORBIT_RADIUS.powi(3)).sqrt()
}

/// Circular polar orbit in the x-z plane, crossing the equator northbound on the
/// x axis at t = 0.
pub fn polar_state(time: f64) -> OrbitState {
    let w = angular_rate();
    let (s, c) = (w * time).sin_cos();
    OrbitState::new(
        time,
        Vector3::new(ORBIT_RADIUS * c, 0.0, ORBIT_RADIUS * s),
        Vector3::new(-ORBIT_RADIUS * w * s, 0.0, ORBIT_RADIUS * w * c),
    )
}

/// `n` samples of [`polar_state`] from t = 0.
pub fn polar_states(n: usize) -> Vec<OrbitState> {
    (0..n)
        .map(|i| polar_state(i as f64 * SAMPLE_STEP))
        .collect()
}

/// Write `states` to a binary ephemeris file in a fresh temporary directory. The
/// directory lives as long as the returned guard.
pub fn write_temp_ephemeris(
    states: &[OrbitState],
    precision: Precision,
) -> (TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().expect("temporary directory");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("orbit.eph"))
        .expect("utf-8 temporary path");
    write_ephemeris_file(&path, states, precision).expect("ephemeris written");
    (dir, path)
}
