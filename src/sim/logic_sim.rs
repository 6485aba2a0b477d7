use std::collections::VecDeque;

use crate::circuit::Circuit;
use crate::errors::Error;
use crate::sim::parse_test_vector;

/// Event-driven binary simulator
///
/// Borrows the circuit and keeps all per-node state internally, so a fresh
/// simulator gives a fresh run on the same circuit.
#[derive(Clone, Debug)]
pub struct LogicSim<'a> {
    circuit: &'a Circuit,
    values: Vec<Option<bool>>,
    evaluated: Vec<bool>,
}

impl<'a> LogicSim<'a> {
    /// Build a simulator for a circuit, split or not
    pub fn new(circuit: &'a Circuit) -> LogicSim<'a> {
        LogicSim {
            circuit,
            values: vec![None; circuit.nb_nodes()],
            evaluated: vec![false; circuit.nb_gates()],
        }
    }

    /// Apply a test vector and propagate it to the primary outputs
    ///
    /// The vector is one '0' or '1' per primary input, in declaration order;
    /// the returned string is the primary-output values in declaration order.
    pub fn run(&mut self, vector: &str) -> Result<String, Error> {
        let circuit = self.circuit;
        let bits = parse_test_vector(vector, circuit.nb_inputs())?;

        self.values = vec![None; circuit.nb_nodes()];
        self.evaluated = vec![false; circuit.nb_gates()];

        let mut ready: VecDeque<usize> = VecDeque::new();
        for (&node, bit) in circuit.inputs().iter().zip(bits) {
            self.assign(node, bit);
            ready.push_back(node);
        }

        // Nodes that could not activate all their gates yet are re-enqueued;
        // the stall counter catches malformed circuits where a gate input can
        // never become definite, which would otherwise cycle forever.
        let mut stalled = 0;
        while let Some(node) = ready.pop_front() {
            let mut progressed = false;

            if let Some(branches) = circuit.branches(node) {
                if let Some(v) = self.values[node] {
                    for &b in branches {
                        self.assign(b, v);
                        ready.push_back(b);
                    }
                    progressed = true;
                }
            }

            let mut used = true;
            for &g in circuit.driven_gates(node) {
                if self.evaluated[g] {
                    continue;
                }
                if self.try_evaluate(g) {
                    ready.push_back(circuit.gate(g).output);
                    progressed = true;
                } else {
                    used = false;
                }
            }

            if progressed {
                stalled = 0;
            }
            if !used {
                if !ready.contains(&node) {
                    ready.push_back(node);
                }
                if !progressed {
                    stalled += 1;
                    if stalled > ready.len() {
                        eprintln!("simulation stalled: some gate inputs are never assigned");
                        break;
                    }
                }
            }
        }

        Ok(self.output_vector())
    }

    /// Value of a node after a run, if it was reached
    pub fn value(&self, node: usize) -> Option<bool> {
        self.values[node]
    }

    /// Write-once assignment; a conflicting later write is logged and ignored
    fn assign(&mut self, node: usize, value: bool) {
        match self.values[node] {
            None => self.values[node] = Some(value),
            Some(old) if old == value => (),
            Some(_) => eprintln!(
                "conflicting assignment on node {}, keeping the first value",
                self.circuit.node_name(node)
            ),
        }
    }

    /// Evaluate a gate if all its inputs are definite
    fn try_evaluate(&mut self, g: usize) -> bool {
        let gate = self.circuit.gate(g);
        let a = match self.values[gate.input1] {
            Some(v) => v,
            None => return false,
        };
        let b = match gate.input2 {
            Some(i2) => match self.values[i2] {
                Some(v) => v,
                None => return false,
            },
            None => false,
        };
        let out = gate.kind.eval(a, b);
        self.evaluated[g] = true;
        self.assign(gate.output, out);
        true
    }

    fn output_vector(&self) -> String {
        self.circuit
            .outputs()
            .iter()
            .map(|&o| match self.values[o] {
                Some(true) => '1',
                Some(false) => '0',
                None => {
                    eprintln!(
                        "primary output {} was never assigned",
                        self.circuit.node_name(o)
                    );
                    'X'
                }
            })
            .collect()
    }
}
