use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (non-positive window, inverted wrap range, etc.).
    ConfigValidation(String),
    /// The run log declares no data parts, or none survived stop recovery.
    NoDataParts,
    /// A sky-condition code is not exactly seven ASCII digits.
    FormatError(String),
    /// Unknown comparison mode, or a time-weighted comparison with zero total weight.
    UnsupportedAlgorithm(String),
    /// No accepted weather observation exists to assign data parts from.
    NoObservations,
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::NoDataParts => write!(f, "no data parts found in run log"),
            Self::FormatError(value) => {
                write!(f, "'{value}' is not a 7-digit sky-condition code")
            }
            Self::UnsupportedAlgorithm(msg) => write!(f, "unsupported algorithm: {msg}"),
            Self::NoObservations => {
                write!(f, "no weather observations available to assign data parts")
            }
        }
    }
}

impl std::error::Error for ReconError {}
