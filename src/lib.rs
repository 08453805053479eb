/////////////////////////////////////////////////////////////////////////////////////
//
// Outbreak model
//
// a stochastic, agent-based SEIHCRD epidemic simulator
//
// populations are split across locations (home, school, work, a random mixing
// pool).  Each cycle - people make contacts, maybe pass the infection on, and
// move through the disease states
//
////////////////////////////////////////////////////////////////////////////////////

use std::fmt;
use std::io;

pub mod data_management;
pub mod disease;
pub mod random;
pub mod stats;
pub mod world;

/// Crate-wide error type.  Everything here signals misconfiguration or a
/// failed read/write; nothing is retried.
#[derive(Debug)]
pub enum ModelError {
    /// A configuration invariant does not hold (bad durations, step size...)
    Config(String),
    /// Gaussian mixture weights do not come close enough to summing to 1
    InvalidMixture(String),
    IoError(io::Error),
    CsvError(csv::Error),
    YamlError(yaml_rust::ScanError),
}

impl From<io::Error> for ModelError {
    fn from(error: io::Error) -> Self {
        ModelError::IoError(error)
    }
}

impl From<csv::Error> for ModelError {
    fn from(error: csv::Error) -> Self {
        ModelError::CsvError(error)
    }
}

impl From<yaml_rust::ScanError> for ModelError {
    fn from(error: yaml_rust::ScanError) -> Self {
        ModelError::YamlError(error)
    }
}

impl std::error::Error for ModelError {}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelError::Config(msg) => write!(f, "configuration error: {}", msg),
            ModelError::InvalidMixture(msg) => write!(f, "invalid mixture: {}", msg),
            ModelError::IoError(e) => write!(f, "io error: {}", e),
            ModelError::CsvError(e) => write!(f, "csv error: {}", e),
            ModelError::YamlError(e) => write!(f, "yaml error: {}", e),
        }
    }
}
