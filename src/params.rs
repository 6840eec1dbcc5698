//! # Ephemeris and geolocation parameters
//!
//! This module defines the [`EphemerisParams`] struct and its builder, which control
//! how an [`Ephemeris`](crate::ephemeris::Ephemeris) buffers orbit states, how
//! densely it interpolates, and the tolerances of the closest-approach and SOM
//! solvers built on top of it.
//!
//! ## Example
//!
//! ```rust
//! use scat_ephem::params::EphemerisParams;
//!
//! let params = EphemerisParams::builder()
//!     .max_nodes(200)
//!     .interpolation_order(5)
//!     .subtrack_step(5.0)
//!     .build()
//!     .unwrap();
//! assert_eq!(params.interpolation_order, 5);
//! ```
//!
//! Parameters can also be read from a keyword [`ConfigList`], see
//! [`EphemerisParams::from_config_list`].
use crate::{
    config_list::ConfigList,
    constants::{
        EPHEMERIS_INTERP_ORDER, EPHEMERIS_MAX_NODES, RANGE_BRACKET_STEP, RANGE_TIME_TOL,
        SOM_TOLERANCE, SUBTRACK_INTEGRATION_STEPSIZE,
    },
    ephem_errors::{EphemError, EphemResult},
    orbit_state::Precision,
    som::{CellGrid, GridOrigin},
};

pub const EPHEMERIS_MAX_NODES_KEYWORD: &str = "EPHEMERIS_MAX_NODES";
pub const EPHEMERIS_INTERP_ORDER_KEYWORD: &str = "EPHEMERIS_INTERP_ORDER";
pub const EPHEMERIS_FLOAT_RECORDS_KEYWORD: &str = "EPHEMERIS_FLOAT_RECORDS";
pub const SUBTRACK_INTEGRATION_STEPSIZE_KEYWORD: &str = "SUBTRACK_INTEGRATION_STEPSIZE";
pub const RANGE_TIME_TOL_KEYWORD: &str = "RANGE_TIME_TOL";
pub const SOM_GRID_ORIGIN_KEYWORD: &str = "SOM_GRID_ORIGIN";
pub const GRID_ALONG_TRACK_CELLS_KEYWORD: &str = "GRID_ALONG_TRACK_CELLS";
pub const GRID_CROSS_TRACK_CELLS_KEYWORD: &str = "GRID_CROSS_TRACK_CELLS";
pub const GRID_CELL_SIZE_KEYWORD: &str = "GRID_CELL_SIZE";

/// Configuration of an ephemeris buffer and of the searches that query it.
///
/// Fields
/// ------
/// * `max_nodes` – cap on the orbit states kept in memory; states behind the cursor
///   are evicted past this count.
/// * `interpolation_order` – default polynomial order (`order + 1` samples).
/// * `precision` – on-disk record precision of the backing file.
/// * `bracket_step` – first step (s) of the downhill range bracketing.
/// * `range_time_tol` – golden-section stop width (s).
/// * `subtrack_step` – along-track integration step (s).
/// * `som_tolerance` – SOM fixed-point convergence (rad).
/// * `som_max_iterations` – SOM iteration cap.
/// * `grid_origin` – pole at which the SOM along-track coordinate starts.
/// * `grid` – wind vector cell layout used to bin SOM coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct EphemerisParams {
    pub max_nodes: usize,
    pub interpolation_order: usize,
    pub precision: Precision,

    // --- Closest approach search ---
    pub bracket_step: f64,
    pub range_time_tol: f64,
    pub subtrack_step: f64,

    // --- SOM transform ---
    pub som_tolerance: f64,
    pub som_max_iterations: usize,
    pub grid_origin: GridOrigin,
    pub grid: CellGrid,
}

impl EphemerisParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> EphemerisParamsBuilder {
        EphemerisParamsBuilder::new()
    }

    /// Read parameters from a keyword configuration, starting from the defaults.
    ///
    /// Recognized keywords: `EPHEMERIS_MAX_NODES`, `EPHEMERIS_INTERP_ORDER`,
    /// `EPHEMERIS_FLOAT_RECORDS` (boolean), `SUBTRACK_INTEGRATION_STEPSIZE`,
    /// `RANGE_TIME_TOL`, `SOM_GRID_ORIGIN` (`south`/`north`), `GRID_ALONG_TRACK_CELLS`,
    /// `GRID_CROSS_TRACK_CELLS`, `GRID_CELL_SIZE` (km). The result is validated like
    /// [`EphemerisParamsBuilder::build`].
    pub fn from_config_list(config: &ConfigList) -> EphemResult<Self> {
        let mut builder = EphemerisParams::builder();

        if let Some(v) = config.get_parsed::<usize>(EPHEMERIS_MAX_NODES_KEYWORD)? {
            builder = builder.max_nodes(v);
        }
        if let Some(v) = config.get_parsed::<usize>(EPHEMERIS_INTERP_ORDER_KEYWORD)? {
            builder = builder.interpolation_order(v);
        }
        if let Some(float) = config.get_bool(EPHEMERIS_FLOAT_RECORDS_KEYWORD)? {
            builder = builder.precision(if float {
                Precision::Float
            } else {
                Precision::Double
            });
        }
        if let Some(v) = config.get_parsed::<f64>(SUBTRACK_INTEGRATION_STEPSIZE_KEYWORD)? {
            builder = builder.subtrack_step(v);
        }
        if let Some(v) = config.get_parsed::<f64>(RANGE_TIME_TOL_KEYWORD)? {
            builder = builder.range_time_tol(v);
        }
        if let Some(origin) = config.get(SOM_GRID_ORIGIN_KEYWORD) {
            builder = builder.grid_origin(origin.parse()?);
        }
        if let Some(v) = config.get_parsed::<usize>(GRID_ALONG_TRACK_CELLS_KEYWORD)? {
            builder = builder.along_track_cells(v);
        }
        if let Some(v) = config.get_parsed::<usize>(GRID_CROSS_TRACK_CELLS_KEYWORD)? {
            builder = builder.cross_track_cells(v);
        }
        if let Some(v) = config.get_parsed::<f64>(GRID_CELL_SIZE_KEYWORD)? {
            builder = builder.cell_size(v);
        }

        builder.build()
    }
}

impl Default for EphemerisParams {
    fn default() -> Self {
        EphemerisParams {
            max_nodes: EPHEMERIS_MAX_NODES,
            interpolation_order: EPHEMERIS_INTERP_ORDER,
            precision: Precision::Double,

            bracket_step: RANGE_BRACKET_STEP,
            range_time_tol: RANGE_TIME_TOL,
            subtrack_step: SUBTRACK_INTEGRATION_STEPSIZE,

            som_tolerance: SOM_TOLERANCE,
            som_max_iterations: 100,
            grid_origin: GridOrigin::SouthPole,
            grid: CellGrid::default(),
        }
    }
}

/// Builder for [`EphemerisParams`], with validation.
#[derive(Debug, Clone)]
pub struct EphemerisParamsBuilder {
    params: EphemerisParams,
}

impl Default for EphemerisParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EphemerisParamsBuilder {
    /// Create a new builder initialized with default values.
    pub fn new() -> Self {
        Self {
            params: EphemerisParams::default(),
        }
    }

    pub fn max_nodes(mut self, v: usize) -> Self {
        self.params.max_nodes = v;
        self
    }
    pub fn interpolation_order(mut self, v: usize) -> Self {
        self.params.interpolation_order = v;
        self
    }
    pub fn precision(mut self, v: Precision) -> Self {
        self.params.precision = v;
        self
    }

    // --- Closest approach search ---
    pub fn bracket_step(mut self, v: f64) -> Self {
        self.params.bracket_step = v;
        self
    }
    pub fn range_time_tol(mut self, v: f64) -> Self {
        self.params.range_time_tol = v;
        self
    }
    pub fn subtrack_step(mut self, v: f64) -> Self {
        self.params.subtrack_step = v;
        self
    }

    // --- SOM transform ---
    pub fn som_tolerance(mut self, v: f64) -> Self {
        self.params.som_tolerance = v;
        self
    }
    pub fn som_max_iterations(mut self, v: usize) -> Self {
        self.params.som_max_iterations = v;
        self
    }
    pub fn grid_origin(mut self, v: GridOrigin) -> Self {
        self.params.grid_origin = v;
        self
    }

    // --- Wind vector cell grid ---
    pub fn along_track_cells(mut self, v: usize) -> Self {
        self.params.grid.along_track_cells = v;
        self
    }
    pub fn cross_track_cells(mut self, v: usize) -> Self {
        self.params.grid.cross_track_cells = v;
        self
    }
    pub fn cell_size(mut self, v: f64) -> Self {
        self.params.grid.cell_size = v;
        self
    }

    /// Finalize the builder and produce an [`EphemerisParams`] instance.
    ///
    /// Validation rules
    /// ----------------
    /// * `max_nodes ≥ 2·(interpolation_order + 1)`, so a full interpolation window
    ///   always fits next to the cursor.
    /// * `bracket_step`, `range_time_tol`, `subtrack_step`, `som_tolerance`,
    ///   `grid.cell_size` are finite and `> 0`.
    /// * `som_max_iterations ≥ 1`, and the grid has at least one cell each way.
    ///
    /// Return
    /// ------
    /// * the parameters, or [`EphemError::InvalidParameter`] naming the first
    ///   violated rule.
    pub fn build(self) -> EphemResult<EphemerisParams> {
        let p = &self.params;

        let window = p.interpolation_order + 1;
        if p.max_nodes < 2 * window {
            return Err(EphemError::InvalidParameter(format!(
                "max_nodes ({}) must be at least twice the interpolation window ({window})",
                p.max_nodes
            )));
        }

        for (name, value) in [
            ("bracket_step", p.bracket_step),
            ("range_time_tol", p.range_time_tol),
            ("subtrack_step", p.subtrack_step),
            ("som_tolerance", p.som_tolerance),
            ("cell_size", p.grid.cell_size),
        ] {
            if !Self::gt0(value) {
                return Err(EphemError::InvalidParameter(format!(
                    "{name} must be > 0"
                )));
            }
        }

        if p.som_max_iterations == 0 {
            return Err(EphemError::InvalidParameter(
                "som_max_iterations must be >= 1".into(),
            ));
        }

        if p.grid.along_track_cells == 0 || p.grid.cross_track_cells == 0 {
            return Err(EphemError::InvalidParameter(format!(
                "grid needs at least one cell each way ({} along-track, {} cross-track)",
                p.grid.along_track_cells, p.grid.cross_track_cells
            )));
        }

        Ok(self.params)
    }

    #[inline]
    fn gt0(x: f64) -> bool {
        x.is_finite() && x > 0.0
    }
}

#[cfg(test)]
mod params_test {
    use super::*;

    #[test]
    fn default_builds() {
        let params = EphemerisParams::builder().build().unwrap();
        assert_eq!(params, EphemerisParams::default());
        assert_eq!(params.max_nodes, 50_000);
        assert_eq!(params.grid_origin, GridOrigin::SouthPole);
        assert_eq!(params.grid.along_track_cells, 1624);
        assert_eq!(params.grid.cross_track_cells, 76);
    }

    #[test]
    fn rejects_empty_grid() {
        assert_eq!(
            EphemerisParams::builder()
                .cross_track_cells(0)
                .build()
                .unwrap_err(),
            EphemError::InvalidParameter(
                "grid needs at least one cell each way (1624 along-track, 0 cross-track)"
                    .into()
            )
        );
        assert!(EphemerisParams::builder().cell_size(-25.0).build().is_err());
    }

    #[test]
    fn rejects_small_node_cap() {
        let err = EphemerisParams::builder()
            .max_nodes(10)
            .interpolation_order(8)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            EphemError::InvalidParameter(
                "max_nodes (10) must be at least twice the interpolation window (9)".into()
            )
        );
    }

    #[test]
    fn rejects_non_positive_tolerances() {
        assert!(EphemerisParams::builder()
            .range_time_tol(0.0)
            .build()
            .is_err());
        assert!(EphemerisParams::builder()
            .subtrack_step(f64::NAN)
            .build()
            .is_err());
        assert!(EphemerisParams::builder()
            .som_max_iterations(0)
            .build()
            .is_err());
    }

    #[test]
    fn from_config_list_overrides_defaults() {
        let config = ConfigList::parse(
            "EPHEMERIS_MAX_NODES 200\n\
             EPHEMERIS_INTERP_ORDER 3\n\
             EPHEMERIS_FLOAT_RECORDS 1\n\
             SUBTRACK_INTEGRATION_STEPSIZE 2.5\n\
             SOM_GRID_ORIGIN north\n\
             GRID_CROSS_TRACK_CELLS 152\n\
             GRID_CELL_SIZE 12.5\n",
            None,
        )
        .unwrap();

        let params = EphemerisParams::from_config_list(&config).unwrap();
        assert_eq!(params.max_nodes, 200);
        assert_eq!(params.interpolation_order, 3);
        assert_eq!(params.precision, Precision::Float);
        assert_eq!(params.subtrack_step, 2.5);
        assert_eq!(params.grid_origin, GridOrigin::NorthPole);
        assert_eq!(
            params.grid,
            CellGrid {
                along_track_cells: 1624,
                cross_track_cells: 152,
                cell_size: 12.5,
            }
        );
        assert_eq!(params.range_time_tol, RANGE_TIME_TOL);
    }

    #[test]
    fn from_config_list_rejects_bad_origin() {
        let config = ConfigList::parse("SOM_GRID_ORIGIN east\n", None).unwrap();
        assert!(EphemerisParams::from_config_list(&config).is_err());
    }
}
