//! # Space Oblique Mercator (SOM) coordinates
//!
//! Scatterometer products are gridded in a satellite-relative frame that follows the
//! ground track: the **along-track** coordinate is the SOM transformed longitude
//! λ'' (angle along the orbit measured from the ascending node), the
//! **cross-track** coordinate is the transformed latitude φ'' (angle off the orbit
//! plane). Both are returned in degrees.
//!
//! The forward transform of a ground point needs the orbit geometry at the
//! measurement time. It is derived from osculating elements of the interpolated
//! state (Earth-fixed velocity made inertial with `v + ω⊕ × r`):
//!
//! * `P2` – nodal period, `P1 = 2π / (ω⊕ - Ω̇)` – Earth rotation period relative to
//!   the precessing node, `s = P2 / P1`,
//! * `λ0 = Ω + s·u` – Earth-fixed longitude of the node at the last crossing.
//!
//! λ'' is then the fixed point of
//!
//! ```text
//! λt  = λ - λ0 + s·λ''
//! λ'' = atan2((1 - e²) tan φ sin i + sin λt cos i, cos λt)
//! ```
//!
//! and `sin φ'' = ((1 - e²) cos i sin φ - sin i cos φ sin λt) / sqrt(1 - e² sin² φ)`.
//!
//! The along-track coordinate is finally unwrapped into the 360° range starting at
//! the configured [`GridOrigin`], using the sign of the spacecraft `z` velocity to
//! put points near the seam on the side of the revolution the spacecraft is on.
//!
//! A [`CellGrid`] bins the coordinates into 1-based wind vector cell indices: the
//! along-track angle from the origin pole in steps of `360° / along_track_cells`,
//! the cross-track angle in steps of `cell_size / R1_EARTH` counted from the
//! central column, with the column number decreasing toward positive angles and
//! clamped to the swath.
use std::str::FromStr;

use nalgebra::Vector3;

use crate::{
    constants::{
        Degree, Kilometer, SimTime, DPI, E2, EARTH_ROTATION_RATE, EPSILON,
        GRID_ALONG_TRACK_CELLS, GRID_CELL_SIZE, GRID_CROSS_TRACK_CELLS, R1_EARTH,
    },
    earth_position::EarthPosition,
    ephem_errors::{EphemError, EphemResult},
    ephemeris::Ephemeris,
    orbit_elements::OrbitElements,
};

/// Pole at which the along-track grid coordinate starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridOrigin {
    /// Along-track coordinate in `[-90°, 270°)`.
    SouthPole,
    /// Along-track coordinate in `[90°, 450°)`.
    NorthPole,
}

impl GridOrigin {
    /// First value of the along-track range (degrees).
    pub fn start(&self) -> Degree {
        match self {
            GridOrigin::SouthPole => -90.0,
            GridOrigin::NorthPole => 90.0,
        }
    }
}

impl FromStr for GridOrigin {
    type Err = EphemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "south" | "south_pole" => Ok(GridOrigin::SouthPole),
            "north" | "north_pole" => Ok(GridOrigin::NorthPole),
            _ => Err(EphemError::InvalidConfig(format!(
                "unknown SOM grid origin '{s}' (expected south or north)"
            ))),
        }
    }
}

/// SOM coordinates of a ground point (degrees).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SomCoordinates {
    pub along_track: Degree,
    pub cross_track: Degree,
}

impl SomCoordinates {
    /// Approximate surface distances (km) along the equatorial radius.
    pub fn to_km(&self) -> (Kilometer, Kilometer) {
        (
            self.along_track.to_radians() * R1_EARTH,
            self.cross_track.to_radians() * R1_EARTH,
        )
    }
}

/// 1-based indices of a wind vector cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub along_track: usize,
    pub cross_track: usize,
}

/// Layout of the wind vector cell grid.
///
/// Fields
/// ------
/// * `along_track_cells` – cells in one revolution
/// * `cross_track_cells` – cells across the swath
/// * `cell_size` – cross-track cell size (km) at the equatorial radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellGrid {
    pub along_track_cells: usize,
    pub cross_track_cells: usize,
    pub cell_size: Kilometer,
}

impl Default for CellGrid {
    fn default() -> Self {
        CellGrid {
            along_track_cells: GRID_ALONG_TRACK_CELLS,
            cross_track_cells: GRID_CROSS_TRACK_CELLS,
            cell_size: GRID_CELL_SIZE,
        }
    }
}

impl CellGrid {
    /// Angular width (degrees) of an along-track cell.
    pub fn along_track_width(&self) -> Degree {
        360.0 / self.along_track_cells as f64
    }

    /// Angular width (degrees) of a cross-track cell.
    pub fn cross_track_width(&self) -> Degree {
        (self.cell_size / R1_EARTH).to_degrees()
    }

    /// Cell holding `coords`, with the along-track angle counted from `origin`.
    ///
    /// The along-track index wraps at the seam, the cross-track index is clamped
    /// to `1..=cross_track_cells`.
    pub fn cell(&self, coords: &SomCoordinates, origin: GridOrigin) -> GridCell {
        let angle = (coords.along_track - origin.start()).rem_euclid(360.0);
        let mut along_track = (angle / self.along_track_width()).floor() as usize + 1;
        if along_track > self.along_track_cells {
            along_track -= self.along_track_cells;
        }

        let center = (self.cross_track_cells / 2) as i64;
        let column = center - (coords.cross_track / self.cross_track_width()).floor() as i64;
        let cross_track = column.clamp(1, self.cross_track_cells as i64) as usize;

        GridCell {
            along_track,
            cross_track,
        }
    }
}

/// Put the along-track angle in the grid range, then move points across the seam to
/// the side of the revolution the spacecraft is on.
fn wrap_along_track(along_track: Degree, origin: GridOrigin, vz: f64) -> Degree {
    let start = origin.start();
    let mut along = (along_track - start).rem_euclid(360.0) + start;

    match origin {
        GridOrigin::SouthPole => {
            if vz < 0.0 && along < 0.0 {
                along += 360.0;
            } else if vz > 0.0 && along > 180.0 {
                along -= 360.0;
            }
        }
        GridOrigin::NorthPole => {
            if vz > 0.0 && along < 180.0 {
                along += 360.0;
            } else if vz < 0.0 && along > 360.0 {
                along -= 360.0;
            }
        }
    }
    along
}

impl Ephemeris {
    /// SOM coordinates of a ground position at `meas_time`.
    ///
    /// Arguments
    /// -----------------
    /// * `ground`: the ground position (km)
    /// * `meas_time`: the measurement time (s)
    ///
    /// Return
    /// ----------
    /// * the coordinates in degrees
    /// * [`EphemError::DegenerateGeometry`] for a zero nodal period or semi-latus
    ///   rectum, a node precession resonant with the Earth rotation, or a ground
    ///   point at a pole
    /// * [`EphemError::NoConvergence`] if the along-track iteration does not settle
    ///   within `som_max_iterations`
    pub fn get_som_coordinates(
        &mut self,
        ground: &Vector3<f64>,
        meas_time: SimTime,
    ) -> EphemResult<SomCoordinates> {
        let order = self.params().interpolation_order;
        let tolerance = self.params().som_tolerance;
        let max_iterations = self.params().som_max_iterations;
        let origin = self.params().grid_origin;

        let state = self.get_orbit_state(meas_time, order)?;
        let elements = OrbitElements::from_orbit_state(&state)?;

        if elements.nodal_period < EPSILON {
            return Err(EphemError::DegenerateGeometry(format!(
                "nodal period {} s at {meas_time}",
                elements.nodal_period
            )));
        }
        if elements.semi_latus_rectum() < EPSILON {
            return Err(EphemError::DegenerateGeometry(format!(
                "semi-latus rectum {} m at {meas_time}",
                elements.semi_latus_rectum()
            )));
        }
        let relative_rate = EARTH_ROTATION_RATE - elements.node_rate();
        if relative_rate.abs() < EPSILON {
            return Err(EphemError::DegenerateGeometry(format!(
                "node precession resonant with the earth rotation at {meas_time}"
            )));
        }

        let (_, lon, lat) = ground.alt_lon_gd_lat()?;
        let (sin_lat, cos_lat) = lat.sin_cos();
        if cos_lat.abs() < EPSILON {
            return Err(EphemError::DegenerateGeometry(format!(
                "ground point at latitude {} deg",
                lat.to_degrees()
            )));
        }
        let tan_lat = sin_lat / cos_lat;

        let s = elements.nodal_period * relative_rate / DPI;
        let lambda_0 = elements.long_of_asc_node + s * elements.arg_of_latitude;
        let (sin_i, cos_i) = elements.inclination.sin_cos();

        let transformed_lon = |lambda_pp: f64| lon - lambda_0 + s * lambda_pp;

        let mut lambda_pp = elements.arg_of_latitude;
        let mut converged = false;
        for _ in 0..max_iterations {
            let lambda_t = transformed_lon(lambda_pp);
            let mut next = ((1.0 - E2) * tan_lat * sin_i + lambda_t.sin() * cos_i)
                .atan2(lambda_t.cos());
            next += DPI * ((lambda_pp - next) / DPI).round();

            let delta = (next - lambda_pp).abs();
            lambda_pp = next;
            if delta < tolerance {
                converged = true;
                break;
            }
        }
        if !converged {
            return Err(EphemError::NoConvergence(format!(
                "SOM along-track longitude after {max_iterations} iterations at {meas_time}"
            )));
        }

        let lambda_t = transformed_lon(lambda_pp);
        let sin_phi_pp = ((1.0 - E2) * cos_i * sin_lat - sin_i * cos_lat * lambda_t.sin())
            / (1.0 - E2 * sin_lat * sin_lat).sqrt();
        let phi_pp = sin_phi_pp.clamp(-1.0, 1.0).asin();

        Ok(SomCoordinates {
            along_track: wrap_along_track(lambda_pp.to_degrees(), origin, state.velocity.z),
            cross_track: phi_pp.to_degrees(),
        })
    }

    /// Wind vector cell of a ground position at `meas_time`, binned with the
    /// configured [`CellGrid`].
    ///
    /// Return
    /// ----------
    /// * the cell, or any error of [`Ephemeris::get_som_coordinates`]
    pub fn get_grid_cell(
        &mut self,
        ground: &Vector3<f64>,
        meas_time: SimTime,
    ) -> EphemResult<GridCell> {
        let som = self.get_som_coordinates(ground, meas_time)?;
        let params = self.params();
        Ok(params.grid.cell(&som, params.grid_origin))
    }
}
