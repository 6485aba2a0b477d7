//! Error type shared by the netlist reader and the engines

use std::path::PathBuf;

use snafu::Snafu;

/// Errors reported to the caller for bad input
///
/// A PODEM run that finds no test vector is not an error; it is a regular
/// `false` outcome. Conflicting node assignments during simulation are
/// logged and the first-written value is kept.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// A file could not be opened or read
    #[snafu(display("unable to read {}: {}", path.display(), source))]
    FileRead {
        /// The file involved
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
    /// A file could not be created or written
    #[snafu(display("unable to write {}: {}", path.display(), source))]
    FileWrite {
        /// The file involved
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
    /// A malformed netlist or fault-list line
    #[snafu(display("line {line}: {msg}"))]
    Syntax {
        /// 1-based line number
        line: usize,
        /// What went wrong
        msg: String,
    },
    /// The test vector does not match the primary-input count
    #[snafu(display("test vector has {got} bits but the circuit has {expected} primary inputs"))]
    BadTestVectorLength {
        /// Number of primary inputs
        expected: usize,
        /// Number of bits given
        got: usize,
    },
    /// The test vector contains something other than '0' or '1'
    #[snafu(display("test vector may only contain '0' and '1', got {got:?}"))]
    BadTestVectorChar {
        /// The offending character
        got: char,
    },
    /// A fault refers to a node the circuit does not have
    #[snafu(display("node {name} does not exist in the circuit"))]
    UnknownNode {
        /// The unknown netlist name
        name: i32,
    },
    /// A stuck-at value other than 0 or 1
    #[snafu(display("stuck-at value must be 0 or 1, got {got:?}"))]
    BadStuckValue {
        /// The offending token
        got: String,
    },
    /// The PODEM engine was given a netlist with XOR/XNOR gates
    #[snafu(display("xor and xnor gates are not supported by the podem engine"))]
    XorUnsupported,
}
