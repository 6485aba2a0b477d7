//! Reading netlists and fault lists from files

pub mod netlist;

use std::fs::File;
use std::path::Path;

use snafu::ResultExt;

use crate::circuit::Circuit;
use crate::errors::{self, Error};
use crate::sim::Fault;

pub use netlist::{read_fault_list, read_netlist};

/// Parse a netlist from a file
pub fn read_netlist_file(path: &Path) -> Result<Circuit, Error> {
    let f = File::open(path).context(errors::FileReadSnafu { path })?;
    read_netlist(f)
}

/// Parse a fault list from a file
pub fn read_fault_list_file(path: &Path) -> Result<Vec<Fault>, Error> {
    let f = File::open(path).context(errors::FileReadSnafu { path })?;
    read_fault_list(f)
}
