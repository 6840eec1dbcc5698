//! # Ephemeris buffer
//!
//! An [`Ephemeris`] answers "where is the spacecraft at time `t`" from a sequence of
//! sampled [`OrbitState`]s. Samples are held in memory in time order and, when the
//! ephemeris is backed by a file (or any [`OrbitStateSource`]), read lazily as
//! queries move forward in time. The number of samples held is capped by
//! [`EphemerisParams::max_nodes`]: samples behind the cursor are dropped as new ones
//! are read, so a long ephemeris can be swept with bounded memory.
//!
//! Queries
//! -------
//! * [`Ephemeris::get_orbit_state`] / [`Ephemeris::get_position`] – interpolated
//!   state at any time bracketed by two samples,
//! * [`Ephemeris::get_next_orbit_state`] – walk the raw samples,
//! * [`Ephemeris::find_south_pole`] – locate the sample at the southernmost point of
//!   the current revolution.
//!
//! Interpolation uses `order + 1` consecutive samples centered on the bracketing
//! pair. The window is rebuilt only when the bracket or the order changes, so dense
//! queries inside one sample interval reuse it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use camino::Utf8Path;
//! use scat_ephem::{ephemeris::Ephemeris, params::EphemerisParams};
//!
//! let mut ephem = Ephemeris::open(Utf8Path::new("rev_01234.eph"), EphemerisParams::default())?;
//! let state = ephem.get_orbit_state(9.5e8, 8)?;
//! println!("{state}");
//! # Ok::<(), scat_ephem::ephem_errors::EphemError>(())
//! ```
pub mod interpolation;
pub mod sequence;
pub mod source;
pub mod writer;

use std::fmt;

use camino::Utf8Path;
use nalgebra::Vector3;

use crate::{
    config_list::ConfigList,
    constants::SimTime,
    ephem_errors::{EphemError, EphemResult},
    orbit_state::OrbitState,
    params::EphemerisParams,
};

use interpolation::InterpolationWindow;
use sequence::OrbitStateSequence;
use source::{EphemerisFile, OrbitStateSource};

/// Keyword naming the binary ephemeris file in a [`ConfigList`].
pub const EPHEMERIS_FILE_KEYWORD: &str = "EPHEMERIS_FILE";

pub struct Ephemeris {
    params: EphemerisParams,
    sequence: OrbitStateSequence,
    source: Option<Box<dyn OrbitStateSource + Send>>,
    window: InterpolationWindow,
}

impl fmt::Debug for Ephemeris {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ephemeris")
            .field("params", &self.params)
            .field("held", &self.sequence.len())
            .field("cursor", &self.sequence.cursor())
            .field("has_source", &self.source.is_some())
            .field("window_rebuilds", &self.window.rebuilds())
            .finish()
    }
}

impl Ephemeris {
    /// Ephemeris backed by a binary file, read lazily.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: the ephemeris file, records in `params.precision`
    /// * `params`: buffer and search parameters
    pub fn open(path: &Utf8Path, params: EphemerisParams) -> EphemResult<Self> {
        let file = EphemerisFile::open(path, params.precision)?;
        Ok(Ephemeris::with_source(file, params))
    }

    /// Ephemeris configured from a keyword file: the parameters of
    /// [`EphemerisParams::from_config_list`] plus the mandatory `EPHEMERIS_FILE`.
    pub fn from_config_list(config: &ConfigList) -> EphemResult<Self> {
        let params = EphemerisParams::from_config_list(config)?;
        let path = config.get(EPHEMERIS_FILE_KEYWORD).ok_or_else(|| {
            EphemError::InvalidConfig(format!("missing keyword {EPHEMERIS_FILE_KEYWORD}"))
        })?;
        Ephemeris::open(Utf8Path::new(path), params)
    }

    /// Ephemeris over states already in memory. Every state is held; there is no
    /// backing source to extend from.
    ///
    /// Return
    /// ------
    /// * [`EphemError::InvalidRecord`] if the states are not in time order.
    pub fn from_states(
        states: impl IntoIterator<Item = OrbitState>,
        params: EphemerisParams,
    ) -> EphemResult<Self> {
        let mut ephem = Ephemeris::new(params, None);
        for state in states {
            ephem.sequence.append(state)?;
        }
        Ok(ephem)
    }

    /// Ephemeris extended lazily from any source.
    pub fn with_source<S>(source: S, params: EphemerisParams) -> Self
    where
        S: OrbitStateSource + Send + 'static,
    {
        Ephemeris::new(params, Some(Box::new(source)))
    }

    fn new(params: EphemerisParams, source: Option<Box<dyn OrbitStateSource + Send>>) -> Self {
        Ephemeris {
            sequence: OrbitStateSequence::new(params.max_nodes),
            params,
            source,
            window: InterpolationWindow::new(),
        }
    }

    pub fn params(&self) -> &EphemerisParams {
        &self.params
    }

    /// Number of orbit states currently held in memory.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Number of orbit states dropped from memory so far.
    pub fn evicted(&self) -> usize {
        self.sequence.evicted()
    }

    /// Number of times the interpolation window has been (re)built.
    pub fn window_rebuilds(&self) -> usize {
        self.window.rebuilds()
    }

    /// Orbit state under the cursor, if the cursor has been placed.
    pub fn current_orbit_state(&self) -> Option<OrbitState> {
        self.sequence.current().copied()
    }

    /// Read one more state from the backing source into the sequence.
    fn extend(&mut self) -> EphemResult<bool> {
        let Some(source) = self.source.as_mut() else {
            return Ok(false);
        };
        match source.read_next()? {
            Some(state) => {
                self.sequence.append(state)?;
                Ok(true)
            }
            None => {
                log::debug!(
                    "ephemeris source exhausted ({} states held, {} evicted)",
                    self.sequence.len(),
                    self.sequence.evicted()
                );
                self.source = None;
                Ok(false)
            }
        }
    }

    /// Move the cursor forward (onto the head if unset), reading from the source if
    /// needed.
    fn advance(&mut self) -> EphemResult<bool> {
        if self.sequence.goto_next().is_some() {
            return Ok(true);
        }
        Ok(self.extend()? && self.sequence.goto_next().is_some())
    }

    /// State after the cursor, reading it from the source if needed.
    fn next_state(&mut self) -> EphemResult<Option<OrbitState>> {
        if let Some(next) = self.sequence.peek_next() {
            return Ok(Some(*next));
        }
        if self.extend()? {
            Ok(self.sequence.peek_next().copied())
        } else {
            Ok(None)
        }
    }

    /// Place the cursor on the head if it is not placed yet.
    fn ensure_cursor(&mut self) -> EphemResult<Option<OrbitState>> {
        if self.sequence.current().is_none() {
            self.advance()?;
        }
        Ok(self.current_orbit_state())
    }

    /// Find the consecutive states `(s1, s2)` with `s1.time ≤ time < s2.time`.
    ///
    /// The cursor walks forward from its current place while it is before `time`
    /// (reading from the source as needed), then backward while it is after `time`.
    /// It is left on `s1`.
    ///
    /// Return
    /// ------
    /// * the bracketing pair, or [`EphemError::NotFound`] if `time` is before the
    ///   first held state or at/after the last available one.
    pub fn bracketing_orbit_states(
        &mut self,
        time: SimTime,
    ) -> EphemResult<(OrbitState, OrbitState)> {
        let not_found = || EphemError::NotFound { time };
        if !time.is_finite() {
            return Err(not_found());
        }

        let mut current = self.ensure_cursor()?.ok_or_else(not_found)?;

        while current.time < time {
            if !self.advance()? {
                break;
            }
            current = self.current_orbit_state().ok_or_else(not_found)?;
        }
        while current.time > time {
            match self.sequence.goto_prev().copied() {
                Some(prev) => current = prev,
                None => break,
            }
        }
        if current.time > time {
            return Err(not_found());
        }

        // step over states sharing the same time stamp
        loop {
            match self.next_state()? {
                None => return Err(not_found()),
                Some(next) if next.time > time => return Ok((current, next)),
                Some(next) => {
                    self.advance()?;
                    current = next;
                }
            }
        }
    }

    /// Interpolated orbit state at `time`.
    ///
    /// Arguments
    /// -----------------
    /// * `time`: query time (s)
    /// * `order`: polynomial order, `order + 1` samples are used; `0` returns the
    ///   state of the sample at or before `time`
    ///
    /// Return
    /// ----------
    /// * the state, [`EphemError::NotFound`] if `time` cannot be bracketed, or
    ///   [`EphemError::InsufficientData`] if fewer than `order + 1` states exist.
    pub fn get_orbit_state(&mut self, time: SimTime, order: usize) -> EphemResult<OrbitState> {
        let (s1, _) = self.bracketing_orbit_states(time)?;
        if !self.window.is_valid_for(s1.time, order) {
            self.rebuild_window(order, s1.time)?;
        }
        self.window.evaluate(time)
    }

    /// Interpolated position (km) at `time`, see [`Ephemeris::get_orbit_state`].
    pub fn get_position(&mut self, time: SimTime, order: usize) -> EphemResult<Vector3<f64>> {
        Ok(self.get_orbit_state(time, order)?.position)
    }

    /// Load the `order + 1` samples around the cursor into the window.
    ///
    /// The window starts `(order + 1) / 2` samples before the sample under the
    /// cursor, clamped to the head. When the tail is exhausted it slides back toward
    /// the head.
    fn rebuild_window(&mut self, order: usize, midpoint: SimTime) -> EphemResult<()> {
        let size = order + 1;
        let before_cursor = size / 2;

        let start = loop {
            let cursor = self.sequence.cursor().ok_or_else(|| {
                EphemError::InsufficientData("no orbit state under the cursor".into())
            })?;
            let start = cursor.saturating_sub(before_cursor);
            if start + size <= self.sequence.len() {
                break start;
            }
            if !self.extend()? {
                let held = self.sequence.len();
                if held < size {
                    return Err(EphemError::InsufficientData(format!(
                        "{held} orbit states available, order {order} needs {size}"
                    )));
                }
                break held - size;
            }
        };

        log::debug!(
            "rebuilding interpolation window: order {order}, midpoint {midpoint}, \
             samples {start}..{}",
            start + size
        );
        self.window
            .load(order, midpoint, self.sequence.range(start, start + size))
    }

    /// Advance the cursor one state and return it; the first call returns the first
    /// state.
    ///
    /// Return
    /// ------
    /// * the state, or [`EphemError::EndOfData`] once every state has been visited.
    pub fn get_next_orbit_state(&mut self) -> EphemResult<OrbitState> {
        if self.advance()? {
            self.current_orbit_state().ok_or(EphemError::EndOfData)
        } else {
            Err(EphemError::EndOfData)
        }
    }

    /// Find the sample at the southernmost point (minimum `z`) nearest the cursor.
    ///
    /// If `z` decreases after the cursor the search goes forward until it increases
    /// again; otherwise it goes backward until `z` stops decreasing. The cursor is
    /// left on the returned sample.
    ///
    /// Return
    /// ------
    /// * the minimum-`z` sample, or [`EphemError::InsufficientData`] when the states
    ///   run out before `z` turns.
    pub fn find_south_pole(&mut self) -> EphemResult<OrbitState> {
        let insufficient = || {
            EphemError::InsufficientData(
                "orbit states run out before the south pole crossing".into(),
            )
        };

        let mut current = self.ensure_cursor()?.ok_or_else(insufficient)?;
        let next = self.next_state()?.ok_or_else(insufficient)?;

        if next.position.z < current.position.z {
            loop {
                let next = self.next_state()?.ok_or_else(insufficient)?;
                if next.position.z >= current.position.z {
                    return Ok(current);
                }
                self.advance()?;
                current = next;
            }
        }

        loop {
            let prev = self.sequence.peek_prev().copied().ok_or_else(insufficient)?;
            if prev.position.z >= current.position.z {
                return Ok(current);
            }
            self.sequence.goto_prev();
            current = prev;
        }
    }
}
