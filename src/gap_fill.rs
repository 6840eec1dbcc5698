//! # Ephemeris gap filling
//!
//! Ephemeris products mark samples that could not be determined with NaN positions
//! (see [`OrbitState::is_missing`]). A missing sample is rebuilt from its valid
//! neighbours by propagating the last valid state before the gap forward and the
//! first valid state after it backward (two-body motion with secular J2 drift,
//! [`propagate_orbit_state`]). The two predictions are blended linearly in time,
//! each weighted by its proximity to the sample. A gap at either end of the
//! sequence uses the single neighbour available.
use camino::Utf8Path;

use crate::{
    ephem_errors::{EphemError, EphemResult},
    ephemeris::{
        source::{EphemerisFile, OrbitStateSource},
        writer::EphemerisWriter,
    },
    orbit_elements::propagate_orbit_state,
    orbit_state::{OrbitState, Precision},
};

/// Fill every missing sample of `states` in place.
///
/// Return
/// ------
/// * the number of samples filled, or [`EphemError::InsufficientData`] when the
///   sequence holds missing samples but no valid one.
pub fn fill_gaps(states: &mut [OrbitState]) -> EphemResult<usize> {
    let valid: Vec<usize> = states
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_missing())
        .map(|(i, _)| i)
        .collect();

    let missing = states.len() - valid.len();
    if missing == 0 {
        return Ok(0);
    }
    if valid.is_empty() {
        return Err(EphemError::InsufficientData(format!(
            "all {missing} orbit states are missing, nothing to fill from"
        )));
    }

    for idx in 0..states.len() {
        if !states[idx].is_missing() {
            continue;
        }
        let time = states[idx].time;

        // first valid sample after idx
        let after = valid.partition_point(|&v| v < idx);
        let next = valid.get(after).map(|&i| states[i]);
        let prev = after.checked_sub(1).map(|k| states[valid[k]]);

        states[idx] = match (prev, next) {
            (Some(prev), Some(next)) => {
                let forward = propagate_orbit_state(&prev, time)?;
                let backward = propagate_orbit_state(&next, time)?;
                let back_weight = (time - prev.time) / (next.time - prev.time);
                OrbitState::new(
                    time,
                    forward.position.lerp(&backward.position, back_weight),
                    forward.velocity.lerp(&backward.velocity, back_weight),
                )
            }
            (Some(prev), None) => propagate_orbit_state(&prev, time)?,
            (None, Some(next)) => propagate_orbit_state(&next, time)?,
            (None, None) => {
                return Err(EphemError::InsufficientData(format!(
                    "no valid orbit state around {time}"
                )))
            }
        };
    }

    log::info!("filled {missing} missing orbit states");
    Ok(missing)
}

/// Read an ephemeris file, fill its gaps and write the result to `output`.
///
/// Return
/// ------
/// * the number of samples filled
pub fn fill_ephemeris_file(
    input: &Utf8Path,
    output: &Utf8Path,
    precision: Precision,
) -> EphemResult<usize> {
    let mut source = EphemerisFile::open(input, precision)?;
    let mut states = Vec::new();
    while let Some(state) = source.read_next()? {
        states.push(state);
    }

    let filled = fill_gaps(&mut states)?;

    let mut writer = EphemerisWriter::create(output, precision)?;
    writer.write_all(&states)?;
    writer.finish()?;
    Ok(filled)
}

#[cfg(test)]
mod gap_fill_test {
    use super::*;
    use crate::constants::EARTH_GRAV_PARAM;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    fn truth() -> Vec<OrbitState> {
        let r = 7178.0;
        let v = (EARTH_GRAV_PARAM * 1e-9 / r).sqrt();
        let seed = OrbitState::new(0.0, Vector3::new(r, 0.0, 0.0), Vector3::new(0.0, -0.5, v));
        (0..12)
            .map(|i| propagate_orbit_state(&seed, 60.0 * i as f64).unwrap())
            .collect()
    }

    fn blank(state: &mut OrbitState) {
        state.position = Vector3::repeat(f64::NAN);
        state.velocity = Vector3::repeat(f64::NAN);
    }

    #[test]
    fn test_fills_inner_and_edge_gaps() {
        let truth = truth();
        let mut states = truth.clone();
        for i in [0, 4, 5, 6, 11] {
            blank(&mut states[i]);
        }

        assert_eq!(fill_gaps(&mut states).unwrap(), 5);
        for (filled, expected) in states.iter().zip(&truth) {
            assert_eq!(filled.time, expected.time);
            assert_abs_diff_eq!(filled.position, expected.position, epsilon = 1e-5);
            assert_abs_diff_eq!(filled.velocity, expected.velocity, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_nothing_to_fill() {
        let mut states = truth();
        assert_eq!(fill_gaps(&mut states).unwrap(), 0);
        assert_eq!(states, truth());
    }

    #[test]
    fn test_all_missing() {
        let mut states = truth();
        states.iter_mut().for_each(blank);
        assert!(matches!(
            fill_gaps(&mut states),
            Err(EphemError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_fill_file() {
        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(dir.path()).unwrap().to_owned();
        let input = dir.join("gappy.eph");
        let output = dir.join("filled.eph");

        let mut states = truth();
        blank(&mut states[3]);
        crate::ephemeris::writer::write_ephemeris_file(&input, &states, Precision::Double)
            .unwrap();

        assert_eq!(
            fill_ephemeris_file(&input, &output, Precision::Double).unwrap(),
            1
        );

        let mut source = EphemerisFile::open(&output, Precision::Double).unwrap();
        let mut count = 0;
        while let Some(state) = source.read_next().unwrap() {
            assert!(!state.is_missing());
            count += 1;
        }
        assert_eq!(count, 12);
    }
}
