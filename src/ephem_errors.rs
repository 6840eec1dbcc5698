use thiserror::Error;

use crate::constants::SimTime;

#[derive(Error, Debug)]
pub enum EphemError {
    #[error("No ephemeris samples bracket time {time}")]
    NotFound { time: SimTime },

    #[error("Insufficient ephemeris data: {0}")]
    InsufficientData(String),

    #[error("End of ephemeris data")]
    EndOfData,

    #[error("Degenerate orbit geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Iteration did not converge: {0}")]
    NoConvergence(String),

    #[error("Root finding error: {0}")]
    RootFindingError(#[from] roots::SearchError),

    #[error("Malformed interpolation samples: {0}")]
    MalformedSamples(String),

    #[error("Truncated ephemeris record: got {got} of {expected} bytes")]
    TruncatedRecord { got: usize, expected: usize },

    #[error("Invalid orbit state record: {0}")]
    InvalidRecord(String),

    #[error("Invalid ephemeris parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for ephemeris and geolocation operations
pub type EphemResult<T> = Result<T, EphemError>;

impl PartialEq for EphemError {
    fn eq(&self, other: &Self) -> bool {
        use EphemError::*;
        match (self, other) {
            (NotFound { time: a }, NotFound { time: b }) => a == b,
            (InsufficientData(a), InsufficientData(b)) => a == b,
            (DegenerateGeometry(a), DegenerateGeometry(b)) => a == b,
            (NoConvergence(a), NoConvergence(b)) => a == b,
            (RootFindingError(a), RootFindingError(b)) => a == b,
            (MalformedSamples(a), MalformedSamples(b)) => a == b,
            (
                TruncatedRecord {
                    got: g1,
                    expected: e1,
                },
                TruncatedRecord {
                    got: g2,
                    expected: e2,
                },
            ) => g1 == g2 && e1 == e2,
            (InvalidRecord(a), InvalidRecord(b)) => a == b,
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (InvalidConfig(a), InvalidConfig(b)) => a == b,

            // io::Error is not comparable: same kind is enough
            (IoError(a), IoError(b)) => a.kind() == b.kind(),

            (EndOfData, EndOfData) => true,

            _ => false,
        }
    }
}

#[cfg(test)]
mod ephem_errors_test {
    use super::*;

    #[test]
    fn io_errors_compare_by_kind() {
        let a = EphemError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "a"));
        let b = EphemError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "b"));
        let c = EphemError::from(std::io::Error::other("c"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn messages_carry_context() {
        let err = EphemError::NotFound { time: 12.5 };
        assert_eq!(err.to_string(), "No ephemeris samples bracket time 12.5");

        let err = EphemError::TruncatedRecord {
            got: 10,
            expected: 56,
        };
        assert_eq!(
            err.to_string(),
            "Truncated ephemeris record: got 10 of 56 bytes"
        );
    }
}
