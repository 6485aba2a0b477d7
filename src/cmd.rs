//! Command line interface

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use fxhash::FxHashSet;
use kdam::tqdm;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use snafu::ResultExt;

use crate::atpg::{self, Podem};
use crate::errors::{self, Error};
use crate::io::{read_fault_list_file, read_netlist_file};
use crate::sim::{DeductiveFaultSim, Fault, LogicSim};

/// Reference netlists used by the sweep modes
const REFERENCE_NETLISTS: [&str; 4] = ["s27.txt", "s298f_2.txt", "s344f_2.txt", "s349f_2.txt"];

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Command line arguments
#[derive(Subcommand)]
pub enum Commands {
    /// Simulate a test vector on a netlist
    ///
    /// Prints the primary-output vector in declaration order. With
    /// --split-fanout, fan-out stems are split into explicit branches first
    /// and the transformed netlist is printed before the output vector.
    #[clap(alias = "sim")]
    Simulate(SimulateArgs),

    /// Deductive fault simulation of a test vector
    ///
    /// Computes, in one pass, every activated stuck-at fault the vector
    /// detects at the primary outputs. Faults are activated on every node
    /// (-l) or taken from a fault-list file (-p). The sweep mode (-a -d)
    /// applies random vectors to the reference netlists and records
    /// cumulative fault coverage in a CSV file.
    #[clap(alias = "fsim")]
    Deduce(DeduceArgs),

    /// PODEM test generation for a stuck-at fault
    ///
    /// Searches for a primary-input vector that activates the fault and
    /// propagates it to a primary output, or reports it undetectable.
    /// The sweep mode (-d) targets both polarities of every node of the
    /// reference netlists.
    #[clap(alias = "tpg")]
    Podem(PodemArgs),
}

/// Report an error and exit with a non-zero code
fn unwrap_or_exit<T>(res: Result<T, Error>) -> T {
    match res {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}

fn usage_error(msg: &str) -> ! {
    eprintln!("{msg}");
    process::exit(1);
}

/// Command arguments for logic simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Netlist to simulate
    netlist: PathBuf,

    /// Test vector, one '0' or '1' per primary input
    vector: String,

    /// Split fan-out stems before simulating and print the netlist
    #[arg(short = 's', long)]
    split_fanout: bool,
}

impl SimulateArgs {
    pub fn run(&self) {
        let mut circuit = unwrap_or_exit(read_netlist_file(&self.netlist));
        if self.split_fanout {
            circuit.split_fanout();
            print!("{circuit}");
        }
        let output = unwrap_or_exit(LogicSim::new(&circuit).run(&self.vector));
        println!("{output}");
    }
}

/// Command arguments for deductive fault simulation
#[derive(Args)]
pub struct DeduceArgs {
    /// Netlist to simulate
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,

    /// Test vector to apply
    #[arg(short = 't', long)]
    vector: Option<String>,

    /// Activate both stuck-at faults on every node
    #[arg(short = 'l', long, conflicts_with = "fault_list")]
    all_faults: bool,

    /// Fault list file, one `<node> <0|1>` per line
    #[arg(short = 'p', long)]
    fault_list: Option<PathBuf>,

    /// Sweep the reference netlists with random vectors for coverage
    #[arg(short = 'a', long, conflicts_with_all = ["file", "vector", "all_faults", "fault_list"])]
    all: bool,

    /// Directory containing the reference netlists (sweep mode)
    #[arg(short = 'd', long)]
    dir: Option<PathBuf>,

    /// Number of random vectors per netlist in sweep mode
    #[arg(short = 'n', long, default_value_t = 101)]
    num_vectors: usize,

    /// Seed for the random sweep vectors
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Output CSV file for sweep coverage
    #[arg(short = 'o', long, default_value = "coverage.csv")]
    output: PathBuf,
}

impl DeduceArgs {
    pub fn run(&self) {
        if self.all {
            match &self.dir {
                Some(dir) => self.run_sweep(dir),
                None => usage_error("sweep mode needs a netlist directory: -a -d <dir>"),
            }
            return;
        }
        let file = match &self.file {
            Some(f) => f,
            None => usage_error("a netlist is needed: -f <netlist> -t <vector> [-l | -p <faults>]"),
        };
        let vector = match &self.vector {
            Some(v) => v,
            None => usage_error("a test vector is needed: -t <vector>"),
        };

        let circuit = unwrap_or_exit(read_netlist_file(file));
        let mut sim = DeductiveFaultSim::new(&circuit);
        if self.all_faults {
            sim.activate_all_faults();
        } else if let Some(path) = &self.fault_list {
            for fault in unwrap_or_exit(read_fault_list_file(path)) {
                unwrap_or_exit(sim.activate_fault(fault));
            }
        } else {
            usage_error("activate faults with -l, or give a fault list with -p <faults>");
        }

        let output = unwrap_or_exit(sim.run(vector));
        println!("Output vector: {output}");
        println!("Faults detected:");
        for fault in sim.detected_faults() {
            println!("{fault}");
        }
        println!();
        println!("Total faults in circuit: {}", sim.total_faults());
        println!("Faults detected at the outputs: {}", sim.detected_faults().len());
        println!("Fault coverage: {:.2}%", sim.coverage());
    }

    /// Random-vector coverage sweep over the reference netlists
    fn run_sweep(&self, dir: &Path) {
        let mut csv = unwrap_or_exit(
            File::create(&self.output).context(errors::FileWriteSnafu { path: &self.output }),
        );
        let write_failed = |e: std::io::Error| Error::FileWrite {
            path: self.output.clone(),
            source: e,
        };
        unwrap_or_exit(
            writeln!(csv, "netlist,vectors_run,coverage_pct")
                .map_err(write_failed),
        );

        let mut rng = SmallRng::seed_from_u64(self.seed);
        for name in REFERENCE_NETLISTS {
            let path = dir.join(name);
            let circuit = unwrap_or_exit(read_netlist_file(&path));
            let mut seen = FxHashSet::default();
            let mut detected: FxHashSet<Fault> = FxHashSet::default();
            let mut total = 0;
            for i in tqdm!(0..self.num_vectors, desc = name) {
                let vector = random_vector(&mut rng, circuit.nb_inputs(), &mut seen);
                let mut sim = DeductiveFaultSim::new(&circuit);
                sim.activate_all_faults();
                unwrap_or_exit(sim.run(&vector));
                total = sim.total_faults();
                detected.extend(sim.detected_faults());
                let coverage = detected.len() as f64 * 100.0 / total as f64;
                unwrap_or_exit(
                    writeln!(csv, "{},{},{:.2}", name, i + 1, coverage).map_err(write_failed),
                );
            }
            eprintln!();
            println!(
                "{}: {} vectors, {}/{} faults detected ({:.2}%)",
                name,
                self.num_vectors,
                detected.len(),
                total,
                detected.len() as f64 * 100.0 / total as f64
            );
        }
        println!("Coverage data written to {}", self.output.display());
    }
}

/// Draw a random test vector distinct from the ones seen so far
///
/// Falls back to a repeat when the vector space is nearly exhausted.
fn random_vector(rng: &mut SmallRng, nb_inputs: usize, seen: &mut FxHashSet<String>) -> String {
    for _ in 0..1000 {
        let vector: String = (0..nb_inputs)
            .map(|_| if rng.gen() { '1' } else { '0' })
            .collect();
        if seen.insert(vector.clone()) {
            return vector;
        }
    }
    (0..nb_inputs)
        .map(|_| if rng.gen() { '1' } else { '0' })
        .collect()
}

/// Command arguments for test generation
#[derive(Args)]
pub struct PodemArgs {
    /// Netlist to generate a test for
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,

    /// Name of the faulty node
    #[arg(short = 'n', long)]
    node: Option<i32>,

    /// Stuck-at value of the fault, 0 or 1
    #[arg(short = 'v', long)]
    value: Option<u8>,

    /// Generate tests for every fault of the reference netlists
    #[arg(short = 'd', long, conflicts_with_all = ["file", "node", "value"])]
    dir: Option<PathBuf>,
}

impl PodemArgs {
    pub fn run(&self) {
        if let Some(dir) = &self.dir {
            self.run_sweep(dir);
            return;
        }
        let file = match &self.file {
            Some(f) => f,
            None => usage_error("a netlist is needed: -f <netlist> -n <node> -v <0|1>"),
        };
        let node = match self.node {
            Some(n) => n,
            None => usage_error("a fault node is needed: -n <node>"),
        };
        let stuck = match self.value {
            Some(0) => false,
            Some(1) => true,
            _ => usage_error("a stuck-at value is needed: -v <0|1>"),
        };

        let circuit = unwrap_or_exit(read_netlist_file(file));
        let mut podem = unwrap_or_exit(Podem::new(&circuit, node, stuck));
        let found = podem.run();
        match podem.test_vector() {
            Some(vector) if found => println!("{vector}"),
            _ => println!("No test vector generated. Fault is undetectable"),
        }
    }

    /// Generate tests for both polarities of every node of each netlist
    fn run_sweep(&self, dir: &Path) {
        for name in REFERENCE_NETLISTS {
            let path = dir.join(name);
            println!("Generating tests for {}", path.display());
            let circuit = unwrap_or_exit(read_netlist_file(&path));
            let tests = unwrap_or_exit(atpg::generate_all_tests(&circuit));
            for (fault, vector) in tests {
                match vector {
                    Some(v) => println!("{fault}: {v}"),
                    None => println!("{fault}: undetectable"),
                }
            }
        }
    }
}
