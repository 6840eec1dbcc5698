use approx::assert_abs_diff_eq;
use scat_ephem::{
    config_list::ConfigList,
    ephem_errors::EphemError,
    ephemeris::Ephemeris,
    gap_fill::fill_ephemeris_file,
    orbit_state::Precision,
    params::EphemerisParams,
};

mod common;
use common::{init_logger, polar_state, polar_states, write_temp_ephemeris, SAMPLE_STEP};

fn params(order: usize) -> EphemerisParams {
    EphemerisParams::builder()
        .interpolation_order(order)
        .build()
        .unwrap()
}

#[test]
fn interpolated_position_matches_orbit() {
    init_logger();
    let (_dir, path) = write_temp_ephemeris(&polar_states(20), Precision::Double);
    let mut ephem = Ephemeris::open(&path, params(3)).unwrap();

    // between samples 10 and 11
    for time in [100.0, 102.5, 105.0, 109.9] {
        let state = ephem.get_orbit_state(time, 3).unwrap();
        let truth = polar_state(time);
        assert!(
            (state.position - truth.position).norm() < 1e-3,
            "position error at {time}: {} km",
            (state.position - truth.position).norm()
        );
        assert_abs_diff_eq!(state.velocity, truth.velocity, epsilon = 1e-6);
        assert_eq!(state.time, time);
    }
}

#[test]
fn queries_outside_the_file_are_not_found() {
    init_logger();
    let (_dir, path) = write_temp_ephemeris(&polar_states(20), Precision::Double);
    let mut ephem = Ephemeris::open(&path, params(3)).unwrap();

    let last = 19.0 * SAMPLE_STEP;
    assert_eq!(
        ephem.get_orbit_state(last + 5.0, 3),
        Err(EphemError::NotFound { time: last + 5.0 })
    );
    assert_eq!(
        ephem.get_orbit_state(last, 3),
        Err(EphemError::NotFound { time: last })
    );
    assert_eq!(
        ephem.get_orbit_state(-5.0, 3),
        Err(EphemError::NotFound { time: -5.0 })
    );

    // the ephemeris stays usable
    assert!(ephem.get_orbit_state(55.0, 3).is_ok());
}

#[test]
fn bracketing_holds_over_a_forward_sweep() {
    let (_dir, path) = write_temp_ephemeris(&polar_states(60), Precision::Double);
    let params = EphemerisParams::builder()
        .max_nodes(8)
        .interpolation_order(3)
        .build()
        .unwrap();
    let mut ephem = Ephemeris::open(&path, params).unwrap();

    let mut time = 0.0;
    while time < 59.0 * SAMPLE_STEP {
        let (s1, s2) = ephem.bracketing_orbit_states(time).unwrap();
        assert!(s1.time <= time && time < s2.time);
        assert_eq!(s2.time - s1.time, SAMPLE_STEP);
        assert!(ephem.get_orbit_state(time, 3).is_ok());
        time += 3.7;
    }

    assert!(ephem.len() <= 8);
    assert!(ephem.evicted() > 0);
}

#[test]
fn window_rebuilt_on_new_bracket_or_order() {
    let (_dir, path) = write_temp_ephemeris(&polar_states(20), Precision::Double);
    let mut ephem = Ephemeris::open(&path, params(3)).unwrap();

    ephem.get_orbit_state(105.0, 3).unwrap();
    ephem.get_orbit_state(107.0, 3).unwrap();
    assert_eq!(ephem.window_rebuilds(), 1);

    let cubic = ephem.get_orbit_state(107.0, 3).unwrap();
    let quintic = ephem.get_orbit_state(107.0, 5).unwrap();
    assert_eq!(ephem.window_rebuilds(), 2);
    assert_abs_diff_eq!(cubic.position, quintic.position, epsilon = 1e-3);

    ephem.get_orbit_state(115.0, 5).unwrap();
    assert_eq!(ephem.window_rebuilds(), 3);

    ephem.get_orbit_state(105.0, 3).unwrap();
    assert_eq!(ephem.window_rebuilds(), 4);
}

#[test]
fn float_records_keep_meter_precision() {
    let (_dir, path) = write_temp_ephemeris(&polar_states(20), Precision::Float);
    let params = EphemerisParams::builder()
        .precision(Precision::Float)
        .interpolation_order(3)
        .build()
        .unwrap();
    let mut ephem = Ephemeris::open(&path, params).unwrap();

    let state = ephem.get_orbit_state(105.0, 3).unwrap();
    assert!((state.position - polar_state(105.0).position).norm() < 2e-3);
}

#[test]
fn open_from_config_file() {
    let (dir, path) = write_temp_ephemeris(&polar_states(20), Precision::Double);
    let config_path = dir.path().join("ephem.cfg");
    std::fs::write(
        &config_path,
        format!("# test configuration\nEPHEMERIS_FILE {path}\nEPHEMERIS_INTERP_ORDER 5\n"),
    )
    .unwrap();

    let config = ConfigList::read(camino::Utf8Path::from_path(&config_path).unwrap()).unwrap();
    let mut ephem = Ephemeris::from_config_list(&config).unwrap();
    assert_eq!(ephem.params().interpolation_order, 5);

    let order = ephem.params().interpolation_order;
    let state = ephem.get_orbit_state(95.0, order).unwrap();
    assert!((state.position - polar_state(95.0).position).norm() < 1e-3);
}

#[test]
fn filled_gaps_can_be_interpolated() {
    init_logger();
    let mut states = polar_states(20);
    for state in &mut states[8..11] {
        state.position.fill(f64::NAN);
        state.velocity.fill(f64::NAN);
    }
    let (_dir, input) = write_temp_ephemeris(&states, Precision::Double);
    let output = input.with_file_name("filled.eph");

    assert_eq!(
        fill_ephemeris_file(&input, &output, Precision::Double).unwrap(),
        3
    );

    let mut ephem = Ephemeris::open(&output, params(3)).unwrap();
    let state = ephem.get_orbit_state(95.0, 3).unwrap();
    // the synthetic orbit ignores J2 and the earth rotation
    assert!((state.position - polar_state(95.0).position).norm() < 5.0);
}
