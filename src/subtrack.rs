//! # Subtrack geolocation
//!
//! Ground positions are located relative to the spacecraft ground track (the
//! subtrack, the path of the nadir point on the surface):
//!
//! * **cross-track** – signed great-circle distance from the closest subtrack point
//!   to the ground position, negative on the left of the direction of motion,
//! * **along-track** – subtrack arclength from a reference start point to that
//!   closest point.
//!
//! The closest subtrack point is found by minimizing the slant range from the
//! spacecraft to the ground position over time: a downhill bracketing of the
//! minimum ([`bracket_minimum`]) followed by a golden-section search
//! ([`golden_section_minimum`]). [`Ephemeris::get_subtrack_position`] is the
//! approximate inverse mapping.
use nalgebra::Vector3;

use crate::{
    constants::{
        Kilometer, SimTime, ALONG_TRACK_CORRECTION, BRACKET_EXPANSION, CROSS_TRACK_CORRECTION,
        EPSILON, GOLDEN_C, GOLDEN_R,
    },
    earth_position::EarthPosition,
    ephem_errors::{EphemError, EphemResult},
    ephemeris::Ephemeris,
};

/// Cap on the downhill steps of [`bracket_minimum`].
const MAX_BRACKET_STEPS: usize = 100;

/// Slant range from the spacecraft to a fixed ground position, as a function of time.
pub struct RangeFunction<'a> {
    ephemeris: &'a mut Ephemeris,
    ground: Vector3<f64>,
    order: usize,
}

impl<'a> RangeFunction<'a> {
    pub fn new(ephemeris: &'a mut Ephemeris, ground: Vector3<f64>) -> Self {
        let order = ephemeris.params().interpolation_order;
        RangeFunction {
            ephemeris,
            ground,
            order,
        }
    }

    /// Range (km) between the interpolated spacecraft position at `time` and the
    /// ground position.
    pub fn eval(&mut self, time: SimTime) -> EphemResult<Kilometer> {
        let position = self.ephemeris.get_position(time, self.order)?;
        Ok((position - self.ground).norm())
    }
}

/// Three abscissas `a`, `b`, `c` (in either order) with `f(b) ≤ f(a)` and
/// `f(b) ≤ f(c)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimumBracket {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub fa: f64,
    pub fb: f64,
    pub fc: f64,
}

/// Bracket a minimum of `f` by walking downhill from `start`.
///
/// The second point is `start + step`; the two are swapped if `f` increases so
/// that the walk goes downhill. Each new point is `1.6` times further than the
/// previous step, until `f` increases.
///
/// Arguments
/// -----------------
/// * `f`: fallible scalar function, any error aborts the search
/// * `start`: first abscissa
/// * `step`: first step
///
/// Return
/// ----------
/// * the bracket, or [`EphemError::NoConvergence`] if `f` keeps decreasing
pub fn bracket_minimum<F>(mut f: F, start: f64, step: f64) -> EphemResult<MinimumBracket>
where
    F: FnMut(f64) -> EphemResult<f64>,
{
    let (mut a, mut b) = (start, start + step);
    let (mut fa, mut fb) = (f(a)?, f(b)?);
    if fb > fa {
        std::mem::swap(&mut a, &mut b);
        std::mem::swap(&mut fa, &mut fb);
    }

    let mut c = b + BRACKET_EXPANSION * (b - a);
    let mut fc = f(c)?;

    for _ in 0..MAX_BRACKET_STEPS {
        if fc >= fb {
            return Ok(MinimumBracket {
                a,
                b,
                c,
                fa,
                fb,
                fc,
            });
        }
        (a, fa) = (b, fb);
        (b, fb) = (c, fc);
        c = b + BRACKET_EXPANSION * (b - a);
        fc = f(c)?;
    }

    Err(EphemError::NoConvergence(format!(
        "no minimum bracketed after {MAX_BRACKET_STEPS} steps from {start}"
    )))
}

/// Golden-section search of a bracketed minimum.
///
/// Arguments
/// -----------------
/// * `f`: fallible scalar function, any error aborts the search
/// * `bracket`: a bracket from [`bracket_minimum`]
/// * `tol`: absolute width of the final interval
///
/// Return
/// ----------
/// * `(x_min, f(x_min))`, the interior point with the lower value once the interval
///   is narrower than `tol`
pub fn golden_section_minimum<F>(
    mut f: F,
    bracket: &MinimumBracket,
    tol: f64,
) -> EphemResult<(f64, f64)>
where
    F: FnMut(f64) -> EphemResult<f64>,
{
    let (ax, bx, cx) = (bracket.a, bracket.b, bracket.c);

    let mut x0 = ax;
    let mut x3 = cx;
    let (mut x1, mut x2) = if (cx - bx).abs() > (bx - ax).abs() {
        (bx, bx + GOLDEN_C * (cx - bx))
    } else {
        (bx - GOLDEN_C * (bx - ax), bx)
    };

    let mut f1 = f(x1)?;
    let mut f2 = f(x2)?;

    while (x3 - x0).abs() > tol {
        if f2 < f1 {
            x0 = x1;
            x1 = x2;
            x2 = GOLDEN_R * x1 + GOLDEN_C * x3;
            f1 = f2;
            f2 = f(x2)?;
        } else {
            x3 = x2;
            x2 = x1;
            x1 = GOLDEN_R * x2 + GOLDEN_C * x0;
            f2 = f1;
            f1 = f(x1)?;
        }
    }

    Ok(if f1 < f2 { (x1, f1) } else { (x2, f2) })
}

/// Outcome of the along-track arclength integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlongTrackStatus {
    Complete,
    /// The ephemeris could not be interpolated past `reached_time`; the along-track
    /// distance only covers the subtrack up to there.
    Truncated { reached_time: SimTime },
}

/// Position of a ground point relative to the subtrack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubtrackCoordinates {
    /// Signed distance (km) from the subtrack, negative on the left.
    pub cross_track: Kilometer,
    /// Subtrack distance (km) from the start point, negative before it.
    pub along_track: Kilometer,
    /// Time of closest approach (s).
    pub min_time: SimTime,
    pub along_track_status: AlongTrackStatus,
}

impl Ephemeris {
    /// Time at which the spacecraft is closest to `ground`, searched from `time`.
    pub fn closest_approach_time(
        &mut self,
        ground: &Vector3<f64>,
        time: SimTime,
    ) -> EphemResult<SimTime> {
        let step = self.params().bracket_step;
        let tol = self.params().range_time_tol;

        let mut range = RangeFunction::new(self, *ground);
        let bracket = bracket_minimum(|t| range.eval(t), time, step)?;
        let (min_time, min_range) = golden_section_minimum(|t| range.eval(t), &bracket, tol)?;

        log::trace!("closest approach at t = {min_time}, range {min_range} km");
        Ok(min_time)
    }

    /// Subtrack coordinates of a ground position.
    ///
    /// Arguments
    /// -----------------
    /// * `ground`: the ground position (km)
    /// * `subtrack_start`: spacecraft position at `start_time`, whose nadir is the
    ///   origin of the along-track axis
    /// * `start_time`: time of the along-track origin (s)
    /// * `meas_time`: time near the closest approach, starting point of the search (s)
    ///
    /// Return
    /// ----------
    /// * the coordinates; if the ephemeris ends while integrating the along-track
    ///   distance, the partial distance is returned with
    ///   [`AlongTrackStatus::Truncated`]. Any other failure is an error.
    pub fn get_subtrack_coordinates(
        &mut self,
        ground: &Vector3<f64>,
        subtrack_start: &Vector3<f64>,
        start_time: SimTime,
        meas_time: SimTime,
    ) -> EphemResult<SubtrackCoordinates> {
        let order = self.params().interpolation_order;

        let min_time = self.closest_approach_time(ground, meas_time)?;
        let state = self.get_orbit_state(min_time, order)?;
        let subtrack_min = state.position.nadir()?;

        let mut cross_track = subtrack_min.surface_distance(ground);
        if subtrack_min.cross(ground).dot(&state.velocity) < 0.0 {
            cross_track = -cross_track;
        }

        let start_nadir = subtrack_start.nadir()?;
        let (along_track, along_track_status) =
            self.along_track_distance(start_nadir, start_time, min_time);

        Ok(SubtrackCoordinates {
            cross_track,
            along_track,
            min_time,
            along_track_status,
        })
    }

    /// Integrate the subtrack arclength from `start_nadir` (at `start_time`) to
    /// `end_time` in steps of `subtrack_step` seconds.
    fn along_track_distance(
        &mut self,
        start_nadir: Vector3<f64>,
        start_time: SimTime,
        end_time: SimTime,
    ) -> (Kilometer, AlongTrackStatus) {
        let order = self.params().interpolation_order;
        let step = self.params().subtrack_step;
        let direction = if end_time >= start_time { 1.0 } else { -1.0 };
        let span = (end_time - start_time).abs();

        let full_steps = (span / step).floor() as usize;
        let mut times: Vec<SimTime> = (1..=full_steps)
            .map(|k| start_time + direction * k as f64 * step)
            .collect();
        if span - full_steps as f64 * step > 0.0 {
            times.push(end_time);
        }

        let mut distance = 0.0;
        let mut previous = start_nadir;
        let mut reached = start_time;
        for time in times {
            match self
                .get_position(time, order)
                .and_then(|position| position.nadir())
            {
                Ok(nadir) => {
                    distance += previous.surface_distance(&nadir);
                    previous = nadir;
                    reached = time;
                }
                Err(e) => {
                    log::warn!(
                        "along-track integration from {start_time} to {end_time} \
                         stopped at {reached}: {e}"
                    );
                    return (
                        direction * distance,
                        AlongTrackStatus::Truncated {
                            reached_time: reached,
                        },
                    );
                }
            }
        }

        (direction * distance, AlongTrackStatus::Complete)
    }

    /// Approximate surface position at the given subtrack coordinates.
    ///
    /// The elapsed time is the along-track distance over the ground speed at
    /// `start_time`; the cross-track step is taken at spacecraft altitude
    /// perpendicular to the track (right positive) and projected to the surface.
    /// Both steps carry an empirical scale ([`ALONG_TRACK_CORRECTION`],
    /// [`CROSS_TRACK_CORRECTION`]).
    ///
    /// Arguments
    /// -----------------
    /// * `cross_track`: signed cross-track distance (km), negative on the left
    /// * `along_track`: along-track distance (km) from the nadir at `start_time`
    /// * `start_time`: time of the along-track origin (s)
    ///
    /// Return
    /// ----------
    /// * the surface position (km)
    pub fn get_subtrack_position(
        &mut self,
        cross_track: Kilometer,
        along_track: Kilometer,
        start_time: SimTime,
    ) -> EphemResult<Vector3<f64>> {
        let order = self.params().interpolation_order;

        let start = self.get_orbit_state(start_time, order)?;
        let start_nadir = start.position.nadir()?;
        let ground_speed = start.velocity.norm() * start_nadir.norm() / start.position.norm();
        if ground_speed < EPSILON {
            return Err(EphemError::DegenerateGeometry(format!(
                "ground speed {ground_speed} km/s at {start_time}"
            )));
        }

        let time = start_time + along_track / ground_speed * ALONG_TRACK_CORRECTION;
        let position = self.get_position(time, order)?;
        let ahead = self.get_position(time + 1.0, order)?;

        let track_dir = (ahead - position).normalize();
        let cross_dir = track_dir.cross(&position.normalize());
        let target = position + cross_dir * (cross_track * CROSS_TRACK_CORRECTION);

        target.nadir()
    }
}
