//! Test pattern generation

mod five_valued;
mod podem;

pub use five_valued::Lv;
pub use podem::Podem;

use itertools::Itertools;

use crate::circuit::Circuit;
use crate::errors::Error;
use crate::sim::Fault;

/// Generate a test for both polarities of every node of the circuit
///
/// Runs a fresh engine per fault, stuck-at-0 for every node first, then
/// stuck-at-1, nodes in name order. Each entry is the target fault and the
/// generated vector, or None for an undetectable fault.
pub fn generate_all_tests(circuit: &Circuit) -> Result<Vec<(Fault, Option<String>)>, Error> {
    let mut ret = Vec::new();
    for stuck in [false, true] {
        for &name in circuit.node_names().iter().sorted() {
            let mut podem = Podem::new(circuit, name, stuck)?;
            let fault = podem.fault();
            let vector = if podem.run() {
                podem.test_vector()
            } else {
                None
            };
            ret.push((fault, vector));
        }
    }
    Ok(ret)
}
