//! Backing storage an [`Ephemeris`](super::Ephemeris) extends itself from.
use std::{collections::VecDeque, fs::File, io::BufReader};

use camino::{Utf8Path, Utf8PathBuf};

use crate::{
    ephem_errors::EphemResult,
    orbit_state::{OrbitState, Precision},
};

/// A forward-only supply of orbit states in time order.
pub trait OrbitStateSource {
    /// Next orbit state, `Ok(None)` once the source is exhausted.
    fn read_next(&mut self) -> EphemResult<Option<OrbitState>>;
}

/// Binary ephemeris file read record by record.
#[derive(Debug)]
pub struct EphemerisFile {
    path: Utf8PathBuf,
    reader: BufReader<File>,
    precision: Precision,
    records_read: usize,
}

impl EphemerisFile {
    pub fn open(path: &Utf8Path, precision: Precision) -> EphemResult<Self> {
        let file = File::open(path)?;
        log::info!("opened ephemeris file {path} ({precision:?} records)");
        Ok(EphemerisFile {
            path: path.to_owned(),
            reader: BufReader::new(file),
            precision,
            records_read: 0,
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn records_read(&self) -> usize {
        self.records_read
    }
}

impl OrbitStateSource for EphemerisFile {
    fn read_next(&mut self) -> EphemResult<Option<OrbitState>> {
        let state = OrbitState::read_binary(&mut self.reader, self.precision)?;
        if state.is_some() {
            self.records_read += 1;
        }
        Ok(state)
    }
}

/// Orbit states already in memory, handed out one at a time.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    states: VecDeque<OrbitState>,
}

impl MemorySource {
    pub fn new(states: impl IntoIterator<Item = OrbitState>) -> Self {
        MemorySource {
            states: states.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.states.len()
    }
}

impl OrbitStateSource for MemorySource {
    fn read_next(&mut self) -> EphemResult<Option<OrbitState>> {
        Ok(self.states.pop_front())
    }
}
