//! Representation of combinational circuits

mod circuit;
mod gates;

pub use circuit::Circuit;
pub use gates::{Gate, GateKind};
