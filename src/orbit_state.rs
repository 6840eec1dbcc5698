//! # Orbit state records
//!
//! An [`OrbitState`] is one time-stamped spacecraft position/velocity sample in the
//! Earth-centered Earth-fixed frame. In memory positions are **km** and velocities
//! **km/s**; ephemeris files store **m** and **m/s**.
//!
//! Binary layout (little-endian), one record after the other with no header:
//!
//! | field    | [`Precision::Double`] | [`Precision::Float`] |
//! |----------|-----------------------|----------------------|
//! | time     | f64                   | f64                  |
//! | position | 3 × f64               | 3 × f32              |
//! | velocity | 3 × f64               | 3 × f32              |
//! | size     | 56 bytes              | 32 bytes             |
//!
//! A human readable block is also provided by the [`Display`](std::fmt::Display)
//! implementation and can be read back with [`OrbitState::read_ascii`]:
//!
//! ```text
//! OrbitState time: 1000.000000 (1970-01-01T00:16:40 UTC)
//!   Pos_x: 7178.000000000 Pos_y: 0.000000000 Pos_z: 0.000000000
//!   Vel_x: 0.000000000000 Vel_y: 0.000000000000 Vel_z: 7.451974...
//! ```
use std::{
    fmt,
    io::{ErrorKind, Read, Write},
};

use nalgebra::Vector3;
use nom::{
    number::complete::{le_f32, le_f64},
    IResult, Parser,
};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{SimTime, KM_TO_M, M_TO_KM},
    ephem_errors::{EphemError, EphemResult},
    time::sim_time_to_epoch,
};

/// Floating point width of the vector components of a binary record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    Double,
    Float,
}

impl Precision {
    /// Size in bytes of one binary record.
    pub fn record_size(&self) -> usize {
        match self {
            Precision::Double => 8 + 6 * 8,
            Precision::Float => 8 + 6 * 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitState {
    pub time: SimTime,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

fn vector_f64(input: &[u8]) -> IResult<&[u8], Vector3<f64>> {
    (le_f64, le_f64, le_f64)
        .map(|(x, y, z)| Vector3::new(x, y, z) * M_TO_KM)
        .parse(input)
}

fn vector_f32(input: &[u8]) -> IResult<&[u8], Vector3<f64>> {
    (le_f32, le_f32, le_f32)
        .map(|(x, y, z)| Vector3::new(x as f64, y as f64, z as f64) * M_TO_KM)
        .parse(input)
}

impl OrbitState {
    pub fn new(time: SimTime, position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        OrbitState {
            time,
            position,
            velocity,
        }
    }

    /// A record with NaN position and velocity marks a missing sample (see
    /// [`fill_gaps`](crate::gap_fill::fill_gaps)).
    pub fn is_missing(&self) -> bool {
        self.position.iter().any(|c| c.is_nan())
    }

    /// Parse a [`Precision::Double`] binary record.
    pub fn parse_double(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, time) = le_f64(input)?;
        let (input, position) = vector_f64(input)?;
        let (input, velocity) = vector_f64(input)?;
        Ok((input, OrbitState::new(time, position, velocity)))
    }

    /// Parse a [`Precision::Float`] binary record.
    pub fn parse_float(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, time) = le_f64(input)?;
        let (input, position) = vector_f32(input)?;
        let (input, velocity) = vector_f32(input)?;
        Ok((input, OrbitState::new(time, position, velocity)))
    }

    /// Decode exactly one binary record.
    ///
    /// Arguments
    /// -----------------
    /// * `bytes`: the raw record, `precision.record_size()` bytes long
    /// * `precision`: width of the vector components
    ///
    /// Return
    /// ----------
    /// * the orbit state in km and km/s, [`EphemError::TruncatedRecord`] when `bytes`
    ///   is too short, or [`EphemError::InvalidRecord`] for a non-finite time stamp.
    pub fn decode(bytes: &[u8], precision: Precision) -> EphemResult<Self> {
        let expected = precision.record_size();
        if bytes.len() < expected {
            return Err(EphemError::TruncatedRecord {
                got: bytes.len(),
                expected,
            });
        }

        let parsed = match precision {
            Precision::Double => OrbitState::parse_double(&bytes[..expected]),
            Precision::Float => OrbitState::parse_float(&bytes[..expected]),
        };
        let (_, state) = parsed.map_err(|e| EphemError::InvalidRecord(e.to_string()))?;

        if !state.time.is_finite() {
            return Err(EphemError::InvalidRecord(format!(
                "non-finite time stamp {}",
                state.time
            )));
        }
        Ok(state)
    }

    /// Encode the state as one binary record (meters, m/s).
    pub fn encode(&self, precision: Precision) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(precision.record_size());
        bytes.extend_from_slice(&self.time.to_le_bytes());
        for component in self.position.iter().chain(self.velocity.iter()) {
            let value = component * KM_TO_M;
            match precision {
                Precision::Double => bytes.extend_from_slice(&value.to_le_bytes()),
                Precision::Float => bytes.extend_from_slice(&(value as f32).to_le_bytes()),
            }
        }
        bytes
    }

    /// Read the next binary record from a stream.
    ///
    /// Return
    /// ------
    /// * `Ok(Some(state))` for a complete record, `Ok(None)` at end of stream on a
    ///   record boundary, [`EphemError::TruncatedRecord`] when the stream ends inside
    ///   a record.
    pub fn read_binary<R: Read>(reader: &mut R, precision: Precision) -> EphemResult<Option<Self>> {
        let expected = precision.record_size();
        let mut buf = vec![0u8; expected];
        let mut got = 0;

        while got < expected {
            match reader.read(&mut buf[got..]) {
                Ok(0) => break,
                Ok(n) => got += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        match got {
            0 => Ok(None),
            n if n < expected => Err(EphemError::TruncatedRecord { got: n, expected }),
            _ => OrbitState::decode(&buf, precision).map(Some),
        }
    }

    pub fn write_binary<W: Write>(&self, writer: &mut W, precision: Precision) -> EphemResult<()> {
        writer.write_all(&self.encode(precision))?;
        Ok(())
    }

    pub fn write_ascii<W: Write>(&self, writer: &mut W) -> EphemResult<()> {
        writeln!(writer, "{self}")?;
        Ok(())
    }

    /// Read every ASCII block of `text`, in order.
    ///
    /// Lines outside of the blocks are ignored. A block missing its position or
    /// velocity line, or holding a value that does not parse, is an
    /// [`EphemError::InvalidRecord`].
    pub fn read_ascii(text: &str) -> EphemResult<Vec<Self>> {
        let mut states = Vec::new();
        let mut lines = text.lines().map(str::trim);

        while let Some(line) = lines.next() {
            let Some(rest) = line.strip_prefix("OrbitState time:") else {
                continue;
            };
            let time_token = rest.split_whitespace().next().unwrap_or_default();
            let time: f64 = time_token
                .parse()
                .map_err(|_| EphemError::InvalidRecord(format!("bad time '{time_token}'")))?;

            let position = parse_ascii_vector(lines.next(), ["Pos_x:", "Pos_y:", "Pos_z:"])?;
            let velocity = parse_ascii_vector(lines.next(), ["Vel_x:", "Vel_y:", "Vel_z:"])?;
            states.push(OrbitState::new(time, position, velocity));
        }
        Ok(states)
    }
}

fn parse_ascii_vector(line: Option<&str>, labels: [&str; 3]) -> EphemResult<Vector3<f64>> {
    let line = line.ok_or_else(|| {
        EphemError::InvalidRecord(format!("missing {} line", labels[0].trim_end_matches(':')))
    })?;
    let tokens: Vec<&str> = line.split_whitespace().collect();

    let mut values = [0.0; 3];
    for (value, label) in values.iter_mut().zip(labels) {
        let raw = tokens
            .iter()
            .position(|t| *t == label)
            .and_then(|i| tokens.get(i + 1))
            .ok_or_else(|| EphemError::InvalidRecord(format!("missing {label} in '{line}'")))?;
        *value = raw
            .parse()
            .map_err(|_| EphemError::InvalidRecord(format!("bad {label} value '{raw}'")))?;
    }
    Ok(Vector3::from(values))
}

impl fmt::Display for OrbitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "OrbitState time: {:.6} ({})",
            self.time,
            sim_time_to_epoch(self.time)
        )?;
        writeln!(
            f,
            "  Pos_x: {:.9} Pos_y: {:.9} Pos_z: {:.9}",
            self.position.x, self.position.y, self.position.z
        )?;
        write!(
            f,
            "  Vel_x: {:.12} Vel_y: {:.12} Vel_z: {:.12}",
            self.velocity.x, self.velocity.y, self.velocity.z
        )
    }
}
