//! Polynomial interpolation of orbit states.
//!
//! [`polynomial_interpolate`] evaluates the unique polynomial of degree `n - 1`
//! through `n` samples with Neville's scheme. [`InterpolationWindow`] keeps the
//! `order + 1` samples around the current bracket so that repeated queries inside
//! the same bracket do not reload them.
use itertools::Itertools;

use crate::{
    constants::SimTime,
    ephem_errors::{EphemError, EphemResult},
    orbit_state::OrbitState,
};

/// Evaluate at `x` the polynomial passing through the points `(xs[i], ys[i])`.
///
/// Arguments
/// -----------------
/// * `xs`: abscissas, pairwise distinct
/// * `ys`: ordinates, same length as `xs`
/// * `x`: evaluation point, no extrapolation guard
///
/// Return
/// ----------
/// * the interpolated value; exactly `ys[i]` when `x == xs[i]`
/// * [`EphemError::MalformedSamples`] for empty input, mismatched lengths or
///   duplicated abscissas
pub fn polynomial_interpolate(xs: &[f64], ys: &[f64], x: f64) -> EphemResult<f64> {
    check_samples(xs, ys)?;
    Ok(neville(xs, ys, x))
}

/// Reject empty, mismatched or duplicated abscissas.
fn check_samples(xs: &[f64], ys: &[f64]) -> EphemResult<()> {
    if xs.is_empty() {
        return Err(EphemError::MalformedSamples("no samples".into()));
    }
    if xs.len() != ys.len() {
        return Err(EphemError::MalformedSamples(format!(
            "{} abscissas for {} ordinates",
            xs.len(),
            ys.len()
        )));
    }
    if let Some((a, _)) = xs.iter().tuple_combinations().find(|(a, b)| a == b) {
        return Err(EphemError::MalformedSamples(format!(
            "duplicated abscissa {a}"
        )));
    }
    Ok(())
}

/// Neville's scheme on samples already accepted by [`check_samples`].
fn neville(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    if let Some(i) = xs.iter().position(|&xi| xi == x) {
        return ys[i];
    }

    let n = xs.len();
    let mut p = ys.to_vec();
    for k in 1..n {
        for i in 0..n - k {
            p[i] = ((x - xs[i + k]) * p[i] + (xs[i] - x) * p[i + 1]) / (xs[i] - xs[i + k]);
        }
    }
    p[0]
}

/// The samples of the current interpolation window.
///
/// Times are stored relative to the window midpoint (the time of the first sample
/// of the bracket the window was built for) to keep the polynomial well
/// conditioned over long ephemerides.
#[derive(Debug, Clone, Default)]
pub struct InterpolationWindow {
    order: Option<usize>,
    midpoint: SimTime,
    times: Vec<f64>,
    components: [Vec<f64>; 6],
    rebuilds: usize,
}

impl InterpolationWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// The window holds the samples for this `(midpoint, order)` pair.
    pub fn is_valid_for(&self, midpoint: SimTime, order: usize) -> bool {
        self.order == Some(order) && self.midpoint == midpoint
    }

    /// Number of times the window has been (re)loaded.
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn invalidate(&mut self) {
        self.order = None;
    }

    /// Replace the window content with `states`, keyed by `(midpoint, order)`.
    ///
    /// The scratch buffers are reused and only grow when the order increases. The
    /// sample times are checked here once, so [`InterpolationWindow::evaluate`] does
    /// not repeat the check on every query.
    ///
    /// Return
    /// ------
    /// * [`EphemError::MalformedSamples`] if `states` is empty or repeats a time; the
    ///   window is left invalid.
    pub fn load<'a, I>(&mut self, order: usize, midpoint: SimTime, states: I) -> EphemResult<()>
    where
        I: IntoIterator<Item = &'a OrbitState>,
    {
        self.times.clear();
        self.components.iter_mut().for_each(Vec::clear);

        for state in states {
            self.times.push(state.time - midpoint);
            let values = state.position.iter().chain(state.velocity.iter());
            for (component, value) in self.components.iter_mut().zip(values) {
                component.push(*value);
            }
        }

        if let Err(err) = check_samples(&self.times, &self.components[0]) {
            self.invalidate();
            self.times.clear();
            return Err(err);
        }

        self.order = Some(order);
        self.midpoint = midpoint;
        self.rebuilds += 1;
        Ok(())
    }

    /// Interpolate the six kinematic components at `time`.
    pub fn evaluate(&self, time: SimTime) -> EphemResult<OrbitState> {
        if self.order.is_none() || self.times.is_empty() {
            return Err(EphemError::MalformedSamples(
                "interpolation window not loaded".into(),
            ));
        }

        let x = time - self.midpoint;
        let mut values = [0.0; 6];
        for (value, component) in values.iter_mut().zip(&self.components) {
            *value = neville(&self.times, component, x);
        }
        Ok(OrbitState::new(
            time,
            [values[0], values[1], values[2]].into(),
            [values[3], values[4], values[5]].into(),
        ))
    }
}
