//! Binary for Faultline
//!
//! Three engines over a shared combinational-circuit representation: an
//! event-driven logic simulator, a deductive fault simulator and a PODEM
//! test generator for single stuck-at faults.

#![warn(missing_docs)]

mod cmd;

pub mod atpg;
pub mod circuit;
pub mod errors;
pub mod io;
pub mod sim;

use clap::Parser;

#[doc(hidden)]
fn main() {
    let cli = cmd::Cli::parse();

    match cli.command {
        cmd::Commands::Simulate(a) => a.run(),
        cmd::Commands::Deduce(a) => a.run(),
        cmd::Commands::Podem(a) => a.run(),
    }
}
