//! Conversions between ephemeris sim time and calendar epochs.
//!
//! Ephemeris records store time as `f64` seconds since 1970-01-01T00:00:00 UTC
//! (the "sim epoch"). These helpers map that scalar to and from [`hifitime::Epoch`]
//! and parse the day-of-year time codes (`YYYY-DDDTHH:MM:SS.sss`) found in
//! instrument product attributes.
use hifitime::{Epoch, Unit};
use std::str::FromStr;

use crate::{
    constants::SimTime,
    ephem_errors::{EphemError, EphemResult},
};

/// Transformation from sim time (seconds since 1970-01-01 UTC) to an [`Epoch`].
pub fn sim_time_to_epoch(time: SimTime) -> Epoch {
    Epoch::from_unix_seconds(time)
}

/// Transformation from an [`Epoch`] to sim time (seconds since 1970-01-01 UTC).
pub fn epoch_to_sim_time(epoch: &Epoch) -> SimTime {
    epoch.to_unix_seconds()
}

/// Parse an ISO-8601 calendar date (e.g. `2021-07-04T12:47:24`) into sim time.
///
/// Argument
/// --------
/// * `date`: a date string accepted by [`Epoch::from_str`]; UTC is assumed when no
///   time scale is given.
///
/// Return
/// ------
/// * the sim time, or [`EphemError::InvalidParameter`] if the string does not parse
pub fn iso_to_sim_time(date: &str) -> EphemResult<SimTime> {
    let epoch = Epoch::from_str(date)
        .map_err(|e| EphemError::InvalidParameter(format!("bad date '{date}': {e}")))?;
    Ok(epoch_to_sim_time(&epoch))
}

/// Parse a day-of-year time code (`YYYY-DDDTHH:MM:SS.sss`) into sim time.
///
/// The fractional seconds and the whole time-of-day part are optional
/// (`1999-200` is midnight of day 200).
///
/// Argument
/// --------
/// * `code`: the time code string
///
/// Return
/// ------
/// * the sim time, or [`EphemError::InvalidParameter`] if the code is malformed
pub fn code_b_to_sim_time(code: &str) -> EphemResult<SimTime> {
    let bad = || EphemError::InvalidParameter(format!("bad day-of-year time code '{code}'"));

    let (date, clock) = match code.trim().split_once('T') {
        Some((date, clock)) => (date, Some(clock)),
        None => (code.trim(), None),
    };

    let (year, doy) = date.split_once('-').ok_or_else(bad)?;
    let year = i32::from_str(year).map_err(|_| bad())?;
    let doy = u16::from_str(doy).map_err(|_| bad())?;
    let days_in_year = if is_leap_year(year) { 366 } else { 365 };
    if !(1..=days_in_year).contains(&doy) {
        return Err(bad());
    }

    let mut seconds_of_day = 0.0;
    if let Some(clock) = clock {
        let parts: Vec<&str> = clock.split(':').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(bad());
        }
        let weights = [3600.0, 60.0, 1.0];
        for (part, weight) in parts.iter().zip(weights) {
            let value = f64::from_str(part).map_err(|_| bad())?;
            seconds_of_day += value * weight;
        }
    }

    let epoch = Epoch::from_gregorian_utc_at_midnight(year, 1, 1)
        + Unit::Day * (doy - 1) as f64
        + Unit::Second * seconds_of_day;
    Ok(epoch_to_sim_time(&epoch))
}

fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}
