//! # Positions relative to the Earth ellipsoid
//!
//! Earth-fixed positions are plain [`nalgebra::Vector3<f64>`] in kilometers. The
//! [`EarthPosition`] extension trait adds what geolocation needs on top of the
//! vector algebra:
//!
//! * construction from altitude, east longitude and geocentric/geodetic latitude,
//! * the inverse conversions (iterative for geodetic latitude),
//! * projection to the nadir point on the WGS-84 surface,
//! * the surface normal, and
//! * great-circle distance between two surface points.
//!
//! Angles are in **radians**, altitudes and distances in **kilometers**.
use nalgebra::Vector3;

use crate::{
    constants::{Kilometer, Radian, DPI, E2, FLATTENING, R1_EARTH, R2_EARTH},
    ephem_errors::{EphemError, EphemResult},
};

const GEODETIC_TOLERANCE: f64 = 1.0e-14;
const GEODETIC_MAX_ITER: usize = 10;

/// Geodetic → geocentric latitude on the ellipsoid surface.
pub fn gd_to_gc_latitude(gd_latitude: Radian) -> Radian {
    (gd_latitude.tan() * (1.0 - E2)).atan()
}

/// Geocentric → geodetic latitude on the ellipsoid surface.
pub fn gc_to_gd_latitude(gc_latitude: Radian) -> Radian {
    (gc_latitude.tan() / (1.0 - E2)).atan()
}

pub trait EarthPosition: Sized {
    /// Position at `altitude` above the ellipsoid, east `longitude` and geocentric latitude.
    fn from_alt_lon_gc_lat(altitude: Kilometer, longitude: Radian, gc_latitude: Radian) -> Self;

    /// Position at `altitude` above the ellipsoid, east `longitude` and geodetic latitude.
    fn from_alt_lon_gd_lat(altitude: Kilometer, longitude: Radian, gd_latitude: Radian) -> Self {
        Self::from_alt_lon_gc_lat(altitude, longitude, gd_to_gc_latitude(gd_latitude))
    }

    /// Altitude, east longitude in `[0, 2π)` and geodetic latitude.
    fn alt_lon_gd_lat(&self) -> EphemResult<(Kilometer, Radian, Radian)>;

    /// Altitude, east longitude in `[0, 2π)` and geocentric latitude of the surface point below.
    fn alt_lon_gc_lat(&self) -> EphemResult<(Kilometer, Radian, Radian)> {
        let (altitude, longitude, gd_latitude) = self.alt_lon_gd_lat()?;
        Ok((altitude, longitude, gd_to_gc_latitude(gd_latitude)))
    }

    /// Point on the ellipsoid surface directly below (or above) this position.
    fn nadir(&self) -> EphemResult<Self> {
        let (_, longitude, gc_latitude) = self.alt_lon_gc_lat()?;
        Ok(Self::from_alt_lon_gc_lat(0.0, longitude, gc_latitude))
    }

    /// Unit vector normal to the ellipsoid at this position.
    fn normal(&self) -> Self;

    /// Great-circle distance between two surface positions.
    ///
    /// Uses a spherical approximation with the radius of `self`; both positions are
    /// assumed to be on the surface, which is not checked.
    fn surface_distance(&self, other: &Self) -> Kilometer;
}

impl EarthPosition for Vector3<f64> {
    fn from_alt_lon_gc_lat(altitude: Kilometer, longitude: Radian, gc_latitude: Radian) -> Self {
        let (slat, clat) = gc_latitude.sin_cos();
        let (slon, clon) = longitude.sin_cos();

        // approximate ellipsoid radius at this latitude
        let radius = R1_EARTH * (1.0 - FLATTENING * slat * slat);
        let sea_level = Vector3::new(radius * clat * clon, radius * clat * slon, radius * slat);

        if altitude == 0.0 {
            return sea_level;
        }
        sea_level + sea_level.normal() * altitude
    }

    fn alt_lon_gd_lat(&self) -> EphemResult<(Kilometer, Radian, Radian)> {
        let rho = self.norm();
        let r = self.x.hypot(self.y);

        if rho == 0.0 {
            // center of the earth
            return Ok((-R2_EARTH, 0.0, 0.0));
        }

        let longitude = if self.x == 0.0 {
            if self.y > 0.0 {
                DPI / 4.0
            } else {
                3.0 * DPI / 4.0
            }
        } else {
            self.y.atan2(self.x).rem_euclid(DPI)
        };

        let mut gd_latitude = (self.z / rho).asin();
        let sinlat = gd_latitude.sin();
        let mut altitude = rho - R1_EARTH * (1.0 - FLATTENING * sinlat * sinlat);

        for _ in 0..GEODETIC_MAX_ITER {
            let (sinlat, coslat) = gd_latitude.sin_cos();
            let g0 = R1_EARTH / (1.0 - E2 * sinlat * sinlat).sqrt();
            let g1 = g0 + altitude;
            let g2 = g0 * (1.0 - FLATTENING) * (1.0 - FLATTENING) + altitude;
            let dr = r - g1 * coslat;
            let dz = self.z - g2 * sinlat;
            let dalt = dr * coslat + dz * sinlat;
            let dlat = (dz * coslat - dr * sinlat) / (R1_EARTH + altitude + dalt);
            gd_latitude += dlat;
            altitude += dalt;
            if dlat.abs() < GEODETIC_TOLERANCE
                && dalt.abs() / (R1_EARTH + altitude) < GEODETIC_TOLERANCE
            {
                return Ok((altitude, longitude, gd_latitude));
            }
        }

        Err(EphemError::NoConvergence(format!(
            "geodetic latitude of ({:.6}, {:.6}, {:.6}) km",
            self.x, self.y, self.z
        )))
    }

    fn normal(&self) -> Self {
        Vector3::new(
            self.x / (R1_EARTH * R1_EARTH),
            self.y / (R1_EARTH * R1_EARTH),
            self.z / (R2_EARTH * R2_EARTH),
        )
        .normalize()
    }

    fn surface_distance(&self, other: &Self) -> Kilometer {
        let mag = self.norm();
        let cos_theta = (self.dot(other) / (mag * other.norm())).clamp(-1.0, 1.0);
        mag * cos_theta.acos()
    }
}

#[cfg(test)]
mod earth_position_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_nadir_on_equator() {
        let sat = Vector3::new(7178.0, 0.0, 0.0);
        let nadir = sat.nadir().unwrap();
        assert_abs_diff_eq!(nadir, Vector3::new(R1_EARTH, 0.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_nadir_over_pole() {
        let sat = Vector3::new(0.0, 0.0, 7000.0);
        let nadir = sat.nadir().unwrap();
        assert_abs_diff_eq!(nadir.z, R2_EARTH, epsilon = 1e-6);
        assert_abs_diff_eq!(nadir.x.hypot(nadir.y), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_geodetic_round_trip() {
        let lon = 1.2_f64;
        let lat = 0.7_f64;
        let pos = Vector3::from_alt_lon_gd_lat(800.0, lon, lat);
        let (alt, lon2, lat2) = pos.alt_lon_gd_lat().unwrap();
        assert_abs_diff_eq!(lon2, lon, epsilon = 1e-12);
        assert_abs_diff_eq!(lat2, lat, epsilon = 1e-4);
        assert_abs_diff_eq!(alt, 800.0, epsilon = 0.5);

        let surface = Vector3::from_alt_lon_gd_lat(0.0, lon, lat);
        let (alt, _, lat3) = surface.alt_lon_gd_lat().unwrap();
        assert_abs_diff_eq!(alt, 0.0, epsilon = 0.1);
        assert_abs_diff_eq!(lat3, lat, epsilon = 1e-5);
    }

    #[test]
    fn test_longitude_range() {
        let pos = Vector3::new(-1.0, -1.0, 0.0) * 5000.0;
        let (_, lon, _) = pos.alt_lon_gd_lat().unwrap();
        assert_abs_diff_eq!(lon, 1.25 * std::f64::consts::PI, epsilon = 1e-12);
    }

    #[test]
    fn test_surface_distance_quarter_circle() {
        let a = Vector3::new(R1_EARTH, 0.0, 0.0);
        let b = Vector3::new(0.0, R1_EARTH, 0.0);
        assert_abs_diff_eq!(
            a.surface_distance(&b),
            R1_EARTH * std::f64::consts::FRAC_PI_2,
            epsilon = 1e-9
        );
        assert_eq!(a.surface_distance(&a), 0.0);
    }

    #[test]
    fn test_latitude_conversions_are_inverse() {
        let gd = 0.9;
        assert_abs_diff_eq!(gc_to_gd_latitude(gd_to_gc_latitude(gd)), gd, epsilon = 1e-14);
        assert!(gd_to_gc_latitude(gd) < gd);
    }
}
