use std::collections::VecDeque;

use crate::{
    ephem_errors::{EphemError, EphemResult},
    orbit_state::OrbitState,
};

/// Time-ordered orbit states with a cursor.
///
/// States are appended at the tail in non-decreasing time order. Once more than
/// `max_nodes` states are held, the oldest states behind the cursor are evicted;
/// the state under the cursor and everything after it are never evicted.
#[derive(Debug, Clone)]
pub struct OrbitStateSequence {
    states: VecDeque<OrbitState>,
    cursor: Option<usize>,
    max_nodes: usize,
    evicted: usize,
}

impl OrbitStateSequence {
    pub fn new(max_nodes: usize) -> Self {
        OrbitStateSequence {
            states: VecDeque::new(),
            cursor: None,
            max_nodes,
            evicted: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Total number of states dropped from the head since creation.
    pub fn evicted(&self) -> usize {
        self.evicted
    }

    pub fn get(&self, index: usize) -> Option<&OrbitState> {
        self.states.get(index)
    }

    pub fn last(&self) -> Option<&OrbitState> {
        self.states.back()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// State under the cursor.
    pub fn current(&self) -> Option<&OrbitState> {
        self.cursor.and_then(|i| self.states.get(i))
    }

    /// Move the cursor to `index`, returning the state there.
    pub fn set_cursor(&mut self, index: usize) -> Option<&OrbitState> {
        if index < self.states.len() {
            self.cursor = Some(index);
        }
        self.current()
    }

    /// Move the cursor one state forward if there is one.
    pub fn goto_next(&mut self) -> Option<&OrbitState> {
        let next = self.cursor.map_or(0, |i| i + 1);
        if next < self.states.len() {
            self.cursor = Some(next);
            self.current()
        } else {
            None
        }
    }

    /// Move the cursor one state backward if there is one.
    pub fn goto_prev(&mut self) -> Option<&OrbitState> {
        match self.cursor {
            Some(i) if i > 0 => {
                self.cursor = Some(i - 1);
                self.current()
            }
            _ => None,
        }
    }

    /// State after the cursor, without moving it.
    pub fn peek_next(&self) -> Option<&OrbitState> {
        self.cursor.and_then(|i| self.states.get(i + 1))
    }

    /// State before the cursor, without moving it.
    pub fn peek_prev(&self) -> Option<&OrbitState> {
        match self.cursor {
            Some(i) if i > 0 => self.states.get(i - 1),
            _ => None,
        }
    }

    /// Append a state at the tail, then evict from the head past the node cap.
    ///
    /// Return
    /// ------
    /// * [`EphemError::InvalidRecord`] if `state` is older than the current tail.
    pub fn append(&mut self, state: OrbitState) -> EphemResult<()> {
        if let Some(last) = self.states.back() {
            if state.time < last.time {
                return Err(EphemError::InvalidRecord(format!(
                    "orbit state at {} follows orbit state at {}",
                    state.time, last.time
                )));
            }
        }
        self.states.push_back(state);
        self.evict();
        Ok(())
    }

    fn evict(&mut self) {
        while self.states.len() > self.max_nodes {
            match self.cursor {
                Some(i) if i > 0 => {
                    self.states.pop_front();
                    self.cursor = Some(i - 1);
                    self.evicted += 1;
                }
                _ => break,
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrbitState> {
        self.states.iter()
    }

    /// States in `start..end`, clamped to the stored range.
    pub fn range(&self, start: usize, end: usize) -> impl Iterator<Item = &OrbitState> {
        let end = end.min(self.states.len());
        self.states.range(start.min(end)..end)
    }
}
