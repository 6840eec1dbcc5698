use std::{
    fs::File,
    io::{BufWriter, Write},
};

use camino::Utf8Path;

use crate::{
    constants::SimTime,
    ephem_errors::{EphemError, EphemResult},
    orbit_state::{OrbitState, Precision},
};

/// Writes binary ephemeris records in time order.
///
/// Records are buffered; call [`EphemerisWriter::finish`] to flush them and get
/// any I/O error, dropping the writer flushes silently.
#[derive(Debug)]
pub struct EphemerisWriter<W: Write> {
    writer: BufWriter<W>,
    precision: Precision,
    last_time: Option<SimTime>,
    records_written: usize,
}

impl EphemerisWriter<File> {
    /// Create (or truncate) an ephemeris file.
    pub fn create(path: &Utf8Path, precision: Precision) -> EphemResult<Self> {
        let file = File::create(path)?;
        log::info!("writing ephemeris file {path} ({precision:?} records)");
        Ok(EphemerisWriter::new(file, precision))
    }
}

impl<W: Write> EphemerisWriter<W> {
    pub fn new(writer: W, precision: Precision) -> Self {
        EphemerisWriter {
            writer: BufWriter::new(writer),
            precision,
            last_time: None,
            records_written: 0,
        }
    }

    /// Append one record.
    ///
    /// Return
    /// ------
    /// * [`EphemError::InvalidRecord`] if `state` is older than the previous record.
    pub fn write(&mut self, state: &OrbitState) -> EphemResult<()> {
        if let Some(last) = self.last_time {
            if state.time < last {
                return Err(EphemError::InvalidRecord(format!(
                    "orbit state at {} written after orbit state at {last}",
                    state.time
                )));
            }
        }
        state.write_binary(&mut self.writer, self.precision)?;
        self.last_time = Some(state.time);
        self.records_written += 1;
        Ok(())
    }

    pub fn write_all<'a, I>(&mut self, states: I) -> EphemResult<()>
    where
        I: IntoIterator<Item = &'a OrbitState>,
    {
        states.into_iter().try_for_each(|s| self.write(s))
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Flush the buffered records and return the underlying writer.
    pub fn finish(self) -> EphemResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| EphemError::IoError(e.into_error()))
    }
}

/// Write `states` to a new ephemeris file.
pub fn write_ephemeris_file(
    path: &Utf8Path,
    states: &[OrbitState],
    precision: Precision,
) -> EphemResult<()> {
    let mut writer = EphemerisWriter::create(path, precision)?;
    writer.write_all(states)?;
    writer.finish()?;
    Ok(())
}
