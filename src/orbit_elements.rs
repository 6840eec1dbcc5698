//! # Osculating orbit elements
//!
//! Conversion of an instantaneous position/velocity pair into classical osculating
//! elements, the secular J2 drift rates of those elements, and the reverse
//! conversion used to propagate a state over short gaps.
//!
//! Units
//! -----
//! * positions/velocities passed in and returned: **km** and **km/s**,
//! * semi-major axis: **m** (the gravity constant is in m³/s²),
//! * angles: **radians**, periods: **seconds**.
//!
//! The velocity given to [`OrbitElements::from_state`] must be inertial. Earth-fixed
//! velocities are converted with [`inertial_velocity`] first, which treats the
//! Earth-fixed frame as an inertial frame instantaneously aligned with it.
use std::f64::consts::PI;

use nalgebra::{Rotation3, Vector3};
use roots::{find_root_newton_raphson, SimpleConvergency};

use crate::{
    constants::{
        Meter, Radian, SimTime, DPI, EARTH_GRAV_PARAM, EARTH_ROTATION_RATE, EPSILON, KM_TO_M,
        M_TO_KM, R1_EARTH, RJ2,
    },
    ephem_errors::{EphemError, EphemResult},
    orbit_state::OrbitState,
};

/// Return the principal value of an angle in `[0, 2π)`.
pub fn principal_angle(a: Radian) -> Radian {
    a.rem_euclid(DPI)
}

/// Earth rotation vector in rad/s.
fn earth_spin() -> Vector3<f64> {
    Vector3::new(0.0, 0.0, EARTH_ROTATION_RATE)
}

/// Velocity in the inertial frame aligned with the Earth-fixed frame at this instant,
/// `v + ω⊕ × r`.
pub fn inertial_velocity(position: &Vector3<f64>, velocity: &Vector3<f64>) -> Vector3<f64> {
    velocity + earth_spin().cross(position)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitElements {
    /// Node-to-node period including the first order J2 correction (s).
    pub nodal_period: f64,
    pub arg_of_latitude: Radian,
    pub long_of_asc_node: Radian,
    pub inclination: Radian,
    pub arg_of_perigee: Radian,
    pub mean_anomaly: Radian,
    pub semi_major_axis: Meter,
    pub eccentricity: f64,
}

impl OrbitElements {
    /// Compute the osculating elements of an inertial position/velocity pair.
    ///
    /// Arguments
    /// -----------------
    /// * `position`: position in km
    /// * `velocity`: inertial velocity in km/s
    ///
    /// Return
    /// ----------
    /// * the elements, or [`EphemError::DegenerateGeometry`] when the position is null,
    ///   the orbit is not elliptic, or the semi-major axis, semi-latus rectum or
    ///   `1 - e²` collapse to zero.
    pub fn from_state(position: &Vector3<f64>, velocity: &Vector3<f64>) -> EphemResult<Self> {
        let pos = position * KM_TO_M;
        let vel = velocity * KM_TO_M;
        let mu = EARTH_GRAV_PARAM;

        let rr = pos.norm_squared();
        let r0 = rr.sqrt();
        if r0 < EPSILON {
            return Err(EphemError::DegenerateGeometry(
                "position vector has zero length".into(),
            ));
        }

        let vv = vel.norm_squared();
        let rv = pos.dot(&vel);

        let aa = 2.0 / r0 - vv / mu;
        if aa.abs() < EPSILON || aa < 0.0 {
            return Err(EphemError::DegenerateGeometry(format!(
                "orbit is not elliptic (2/r - v²/mu = {aa:e})"
            )));
        }
        let smaj = 1.0 / aa;
        if smaj < EPSILON {
            return Err(EphemError::DegenerateGeometry(format!(
                "semi-major axis {smaj:e} m"
            )));
        }

        let ce = 1.0 - r0 / smaj;
        let se = rv / (mu * smaj).sqrt();
        let ecc = (se * se + ce * ce).sqrt();

        let ree2 = 1.0 - ecc * ecc;
        if ree2 < EPSILON {
            return Err(EphemError::DegenerateGeometry(format!(
                "1 - e² = {ree2:e} for eccentricity {ecc}"
            )));
        }
        let param = smaj * ree2;
        if param < EPSILON {
            return Err(EphemError::DegenerateGeometry(format!(
                "semi-latus rectum {param:e} m"
            )));
        }

        // radial and in-plane transverse unit vectors
        let u = pos / r0;
        let w = (vel * rr - pos * rv) / (r0 * (mu * param).sqrt());

        let sini = (u.z * u.z + w.z * w.z).sqrt();
        let cosi = ((u.x + w.y).powi(2) + (u.y - w.x).powi(2)).sqrt() - 1.0;
        let inclination = sini.atan2(cosi);

        let long_of_asc_node =
            principal_angle((u.y * w.z - w.y * u.z).atan2(u.x * w.z - w.x * u.z));
        let arg_of_latitude = principal_angle(u.z.atan2(w.z));

        let cos2i = inclination.cos().powi(2);
        let r1 = R1_EARTH * KM_TO_M;
        let j2_term = 0.75 * RJ2 * r1 * r1 / (smaj * smaj)
            * ((1.0 - 3.0 * cos2i) * ree2.sqrt() + (1.0 - 5.0 * cos2i))
            / (ree2 * ree2);
        let nodal_period = DPI * (smaj.powi(3) / mu).sqrt() * (1.0 + j2_term);

        let ecosv = param / r0 - 1.0;
        let esinv = (param / mu).sqrt() * rv / r0;
        let true_anomaly = esinv.atan2(ecosv);
        let arg_of_perigee = principal_angle(arg_of_latitude - true_anomaly);

        let ecc_anomaly =
            2.0 * (((1.0 - ecc) / (1.0 + ecc)).sqrt() * (true_anomaly / 2.0).tan()).atan();
        let mean_anomaly = principal_angle(ecc_anomaly - ecc * ecc_anomaly.sin());

        Ok(OrbitElements {
            nodal_period,
            arg_of_latitude,
            long_of_asc_node,
            inclination,
            arg_of_perigee,
            mean_anomaly,
            semi_major_axis: smaj,
            eccentricity: ecc,
        })
    }

    /// Elements of an Earth-fixed orbit state, see [`inertial_velocity`].
    pub fn from_orbit_state(state: &OrbitState) -> EphemResult<Self> {
        OrbitElements::from_state(
            &state.position,
            &inertial_velocity(&state.position, &state.velocity),
        )
    }

    pub fn semi_latus_rectum(&self) -> Meter {
        self.semi_major_axis * (1.0 - self.eccentricity * self.eccentricity)
    }

    /// Keplerian mean motion (rad/s).
    pub fn mean_motion(&self) -> f64 {
        (EARTH_GRAV_PARAM / self.semi_major_axis.powi(3)).sqrt()
    }

    /// Secular J2 precession rate of the ascending node (rad/s).
    pub fn node_rate(&self) -> f64 {
        let r_over_p = R1_EARTH * KM_TO_M / self.semi_latus_rectum();
        -1.5 * self.mean_motion() * RJ2 * r_over_p * r_over_p * self.inclination.cos()
    }

    /// Secular J2 rotation rate of the argument of perigee (rad/s).
    pub fn perigee_rate(&self) -> f64 {
        let r_over_p = R1_EARTH * KM_TO_M / self.semi_latus_rectum();
        0.75 * self.mean_motion()
            * RJ2
            * r_over_p
            * r_over_p
            * (5.0 * self.inclination.cos().powi(2) - 1.0)
    }

    /// Solve Kepler's equation `E - e sin E = M` for the eccentric anomaly.
    fn eccentric_anomaly(&self) -> EphemResult<Radian> {
        let ecc = self.eccentricity;
        let mean_anomaly = self.mean_anomaly;

        let f = |e: f64| e - ecc * e.sin() - mean_anomaly;
        let df = |e: f64| 1.0 - ecc * e.cos();

        let x0 = if ecc > 0.8 { PI } else { mean_anomaly };
        let mut tol = SimpleConvergency {
            eps: 1e-14,
            max_iter: 30,
        };
        Ok(find_root_newton_raphson(x0, &f, &df, &mut tol)?)
    }

    fn true_anomaly(&self) -> EphemResult<Radian> {
        let ecc_anomaly = self.eccentric_anomaly()?;
        let half = ecc_anomaly / 2.0;
        Ok(2.0
            * ((1.0 + self.eccentricity).sqrt() * half.sin())
                .atan2((1.0 - self.eccentricity).sqrt() * half.cos()))
    }

    /// Advance the elements by `dt` seconds with the secular J2 drift of the node
    /// and perigee and the Keplerian mean motion.
    pub fn propagate(&self, dt: f64) -> EphemResult<Self> {
        let mut next = OrbitElements {
            long_of_asc_node: principal_angle(self.long_of_asc_node + self.node_rate() * dt),
            arg_of_perigee: principal_angle(self.arg_of_perigee + self.perigee_rate() * dt),
            mean_anomaly: principal_angle(self.mean_anomaly + self.mean_motion() * dt),
            ..*self
        };
        next.arg_of_latitude = principal_angle(next.arg_of_perigee + next.true_anomaly()?);
        Ok(next)
    }

    /// Inertial position (km) and velocity (km/s) described by the elements.
    pub fn to_state(&self) -> EphemResult<(Vector3<f64>, Vector3<f64>)> {
        let ecc = self.eccentricity;
        let nu = self.true_anomaly()?;
        let param = self.semi_latus_rectum();
        let radius = param / (1.0 + ecc * nu.cos());

        let u = self.arg_of_perigee + nu;
        let (su, cu) = u.sin_cos();
        let (sn, cn) = self.long_of_asc_node.sin_cos();
        let (si, ci) = self.inclination.sin_cos();

        let radial = Vector3::new(cn * cu - sn * su * ci, sn * cu + cn * su * ci, su * si);
        let transverse = Vector3::new(-cn * su - sn * cu * ci, -sn * su + cn * cu * ci, cu * si);

        let speed = (EARTH_GRAV_PARAM / param).sqrt();
        let position = radial * radius;
        let velocity =
            radial * (speed * ecc * nu.sin()) + transverse * (speed * (1.0 + ecc * nu.cos()));

        Ok((position * M_TO_KM, velocity * M_TO_KM))
    }
}

/// Propagate an Earth-fixed orbit state to `time` with two-body motion plus secular
/// J2 drift, accounting for the Earth rotation between the two epochs.
///
/// Arguments
/// -----------------
/// * `state`: the Earth-fixed state to start from
/// * `time`: the target time (s), before or after `state.time`
///
/// Return
/// ----------
/// * the Earth-fixed state at `time`
pub fn propagate_orbit_state(state: &OrbitState, time: SimTime) -> EphemResult<OrbitState> {
    let dt = time - state.time;
    let (position, velocity) = OrbitElements::from_orbit_state(state)?
        .propagate(dt)?
        .to_state()?;

    let earth_rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), -EARTH_ROTATION_RATE * dt);
    let position = earth_rotation * position;
    let velocity = earth_rotation * velocity - earth_spin().cross(&position);

    Ok(OrbitState::new(time, position, velocity))
}

#[cfg(test)]
mod orbit_elements_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    const MU_KM: f64 = EARTH_GRAV_PARAM * 1e-9;

    fn polar_circular() -> (Vector3<f64>, Vector3<f64>) {
        let r = 7178.0;
        let v = (MU_KM / r).sqrt();
        (Vector3::new(r, 0.0, 0.0), Vector3::new(0.0, 0.0, v))
    }

    #[test]
    fn test_polar_circular_elements() {
        let (r, v) = polar_circular();
        let elem = OrbitElements::from_state(&r, &v).unwrap();

        assert_abs_diff_eq!(elem.semi_major_axis, 7_178_000.0, epsilon = 1e-3);
        assert_abs_diff_eq!(elem.eccentricity, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(elem.inclination, PI / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(elem.long_of_asc_node, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(elem.arg_of_latitude, 0.0, epsilon = 1e-12);

        let keplerian = DPI * (elem.semi_major_axis.powi(3) / EARTH_GRAV_PARAM).sqrt();
        assert!(elem.nodal_period > keplerian);
        assert!((elem.nodal_period - keplerian) / keplerian < 2e-3);
    }

    #[test]
    fn test_node_longitude_follows_position() {
        let r = 7178.0;
        let v = (MU_KM / r).sqrt();
        let elem =
            OrbitElements::from_state(&Vector3::new(0.0, r, 0.0), &Vector3::new(0.0, 0.0, v))
                .unwrap();
        assert_abs_diff_eq!(elem.long_of_asc_node, PI / 2.0, epsilon = 1e-12);

        let elem =
            OrbitElements::from_state(&Vector3::new(0.0, 0.0, r), &Vector3::new(-v, 0.0, 0.0))
                .unwrap();
        assert_abs_diff_eq!(elem.arg_of_latitude, PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_elements_reproduce_state() {
        let position = Vector3::new(5000.0, -3200.0, 4100.0);
        let velocity = Vector3::new(2.1, 5.9, -3.3);
        let elem = OrbitElements::from_state(&position, &velocity).unwrap();
        assert!(elem.eccentricity > 0.01);

        let (p, v) = elem.to_state().unwrap();
        assert_abs_diff_eq!(p, position, epsilon = 1e-6);
        assert_abs_diff_eq!(v, velocity, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_inputs() {
        let zero = Vector3::zeros();
        assert!(matches!(
            OrbitElements::from_state(&zero, &Vector3::new(0.0, 7.0, 0.0)),
            Err(EphemError::DegenerateGeometry(_))
        ));

        // escape velocity
        let (r, _) = polar_circular();
        let escape = Vector3::new(0.0, 0.0, (2.0 * MU_KM / 7178.0).sqrt() * 1.01);
        assert!(matches!(
            OrbitElements::from_state(&r, &escape),
            Err(EphemError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_quarter_orbit_propagation() {
        let (r, v) = polar_circular();
        let elem = OrbitElements::from_state(&r, &v).unwrap();
        let quarter = 0.25 * DPI / elem.mean_motion();

        // the perigee drift of a polar orbit lags the Keplerian quarter by ~1e-3 rad
        let later = elem.propagate(quarter).unwrap();
        assert_abs_diff_eq!(later.arg_of_latitude, PI / 2.0, epsilon = 2e-3);

        let (p, _) = later.to_state().unwrap();
        assert_abs_diff_eq!(p.z, 7178.0, epsilon = 1e-2);
    }

    #[test]
    fn test_propagate_earth_fixed_state_both_ways() {
        let (r, v_inertial) = polar_circular();
        let v_fixed = v_inertial - earth_spin().cross(&r);
        let state = OrbitState::new(100.0, r, v_fixed);

        let forward = propagate_orbit_state(&state, 160.0).unwrap();
        let back = propagate_orbit_state(&forward, 100.0).unwrap();
        assert_abs_diff_eq!(back.position, state.position, epsilon = 1e-6);
        assert_abs_diff_eq!(back.velocity, state.velocity, epsilon = 1e-9);

        // the ground track drifts west as the earth turns under the orbit
        assert!(forward.position.y < 0.0);
        assert_abs_diff_eq!(forward.position.norm(), 7178.0, epsilon = 1e-6);
    }
}
