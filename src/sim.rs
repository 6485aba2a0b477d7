//! Simulation of circuits under test vectors

mod deductive;
mod fault;
mod logic_sim;

pub use deductive::DeductiveFaultSim;
pub use fault::Fault;
pub use logic_sim::LogicSim;

use crate::errors::Error;

/// Check and decode a '0'/'1' test vector against the primary-input count
pub(crate) fn parse_test_vector(vector: &str, expected: usize) -> Result<Vec<bool>, Error> {
    if vector.chars().count() != expected {
        return Err(Error::BadTestVectorLength {
            expected,
            got: vector.chars().count(),
        });
    }
    vector
        .chars()
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            got => Err(Error::BadTestVectorChar { got }),
        })
        .collect()
}
