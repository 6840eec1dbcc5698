//! # Keyword/value configuration files
//!
//! Ground-processing programs are configured with plain-text files holding one
//! `KEYWORD value` pair per line:
//!
//! ```text
//! # ephemeris configuration
//! EPHEMERIS_FILE          /data/rev_01234.eph
//! EPHEMERIS_MAX_NODES     50000
//! INSERT_FILE             common.cfg
//! ```
//!
//! Rules
//! -----
//! * Blank lines and lines whose first token does not start with an alphanumeric
//!   character are ignored (comments).
//! * A keyword without a value is an error.
//! * `INSERT_FILE path` reads another configuration file in place; relative paths
//!   are resolved against the directory of the including file.
//! * Later entries override earlier ones.
//!
//! See also
//! --------
//! * [`EphemerisParams::from_config_list`](crate::params::EphemerisParams::from_config_list)
use std::{collections::HashMap, fs, str::FromStr};

use camino::{Utf8Path, Utf8PathBuf};

use crate::ephem_errors::{EphemError, EphemResult};

/// Keyword that includes another configuration file.
pub const INSERT_FILE_KEYWORD: &str = "INSERT_FILE";

/// Guard against `INSERT_FILE` cycles.
const MAX_INSERT_DEPTH: usize = 16;

/// Parsed keyword/value configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigList {
    entries: HashMap<String, String>,
}

impl ConfigList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a configuration file, following `INSERT_FILE` directives.
    pub fn read(path: &Utf8Path) -> EphemResult<Self> {
        let mut list = ConfigList::new();
        list.read_into(path, 0)?;
        Ok(list)
    }

    /// Parse configuration text. `INSERT_FILE` paths are resolved relative to `base_dir`.
    pub fn parse(content: &str, base_dir: Option<&Utf8Path>) -> EphemResult<Self> {
        let mut list = ConfigList::new();
        list.parse_into(content, base_dir, 0)?;
        Ok(list)
    }

    fn read_into(&mut self, path: &Utf8Path, depth: usize) -> EphemResult<()> {
        if depth > MAX_INSERT_DEPTH {
            return Err(EphemError::InvalidConfig(format!(
                "{INSERT_FILE_KEYWORD} nested deeper than {MAX_INSERT_DEPTH} levels at {path}"
            )));
        }
        let content = fs::read_to_string(path)?;
        self.parse_into(&content, path.parent(), depth)
    }

    fn parse_into(
        &mut self,
        content: &str,
        base_dir: Option<&Utf8Path>,
        depth: usize,
    ) -> EphemResult<()> {
        for (line_number, line) in content.lines().enumerate() {
            let mut tokens = line.split_whitespace();
            let Some(keyword) = tokens.next() else {
                continue;
            };
            if !keyword
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphanumeric())
            {
                continue;
            }
            let Some(value) = tokens.next() else {
                return Err(EphemError::InvalidConfig(format!(
                    "line {}: keyword {keyword} has no value",
                    line_number + 1
                )));
            };

            if keyword == INSERT_FILE_KEYWORD {
                let inserted = match base_dir {
                    Some(dir) if Utf8Path::new(value).is_relative() => dir.join(value),
                    _ => Utf8PathBuf::from(value),
                };
                self.read_into(&inserted, depth + 1)?;
            } else {
                self.entries.insert(keyword.to_string(), value.to_string());
            }
        }
        Ok(())
    }

    pub fn set(&mut self, keyword: &str, value: impl ToString) {
        self.entries.insert(keyword.to_string(), value.to_string());
    }

    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.entries.get(keyword).map(String::as_str)
    }

    /// Get and parse a value, `Ok(None)` when the keyword is absent.
    pub fn get_parsed<T: FromStr>(&self, keyword: &str) -> EphemResult<Option<T>> {
        match self.get(keyword) {
            None => Ok(None),
            Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
                EphemError::InvalidConfig(format!("cannot parse {keyword} value '{raw}'"))
            }),
        }
    }

    /// Boolean values accept `1/0`, `true/false`, `yes/no` (case-insensitive).
    pub fn get_bool(&self, keyword: &str) -> EphemResult<Option<bool>> {
        match self.get(keyword) {
            None => Ok(None),
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Ok(Some(true)),
                "0" | "false" | "no" => Ok(Some(false)),
                _ => Err(EphemError::InvalidConfig(format!(
                    "cannot parse {keyword} value '{raw}' as a boolean"
                ))),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod config_list_test {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_overrides() {
        let text = "\
# comment line
EPHEMERIS_MAX_NODES 200
   ; another comment
EPHEMERIS_INTERP_ORDER 5 trailing words ignored

EPHEMERIS_MAX_NODES 400
";
        let list = ConfigList::parse(text, None).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.get("EPHEMERIS_MAX_NODES"), Some("400"));
        assert_eq!(
            list.get_parsed::<usize>("EPHEMERIS_INTERP_ORDER").unwrap(),
            Some(5)
        );
        assert_eq!(list.get_parsed::<usize>("MISSING").unwrap(), None);
    }

    #[test]
    fn test_keyword_without_value_is_an_error() {
        let err = ConfigList::parse("EPHEMERIS_FILE\n", None).unwrap_err();
        assert_eq!(
            err,
            EphemError::InvalidConfig("line 1: keyword EPHEMERIS_FILE has no value".into())
        );
    }

    #[test]
    fn test_bad_values() {
        let list = ConfigList::parse("A x\nB maybe\nC Yes\n", None).unwrap();
        assert!(list.get_parsed::<f64>("A").is_err());
        assert!(list.get_bool("B").is_err());
        assert_eq!(list.get_bool("C").unwrap(), Some(true));
    }

    #[test]
    fn test_insert_file_relative_to_including_file() {
        let dir = tempfile::tempdir().unwrap();
        let dir_path = Utf8Path::from_path(dir.path()).unwrap();
        fs::write(dir_path.join("common.cfg"), "RANGE_TIME_TOL 0.01\n").unwrap();
        fs::write(
            dir_path.join("main.cfg"),
            "INSERT_FILE common.cfg\nEPHEMERIS_FILE rev.eph\n",
        )
        .unwrap();

        let list = ConfigList::read(&dir_path.join("main.cfg")).unwrap();
        assert_eq!(list.get("RANGE_TIME_TOL"), Some("0.01"));
        assert_eq!(list.get("EPHEMERIS_FILE"), Some("rev.eph"));
    }

    #[test]
    fn test_insert_cycle_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let dir_path = Utf8Path::from_path(dir.path()).unwrap();
        fs::write(dir_path.join("loop.cfg"), "INSERT_FILE loop.cfg\n").unwrap();

        let err = ConfigList::read(&dir_path.join("loop.cfg")).unwrap_err();
        assert!(matches!(err, EphemError::InvalidConfig(_)));
    }
}
