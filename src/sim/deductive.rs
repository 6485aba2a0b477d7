use std::collections::VecDeque;

use fxhash::FxHashSet;
use itertools::Itertools;

use crate::circuit::{Circuit, Gate};
use crate::errors::Error;
use crate::sim::{parse_test_vector, Fault};

/// Deductive fault simulator
///
/// Propagates both binary values and fault lists in a single pass, and
/// reports every activated stuck-at fault observable at a primary output.
/// Runs on the unsplit circuit: the fault list of a fan-out stem is shared
/// by all its consumers through the stem node itself.
#[derive(Clone, Debug)]
pub struct DeductiveFaultSim<'a> {
    circuit: &'a Circuit,
    values: Vec<Option<bool>>,
    evaluated: Vec<bool>,
    stuck_at_0: Vec<bool>,
    stuck_at_1: Vec<bool>,
    fault_lists: Vec<FxHashSet<Fault>>,
}

impl<'a> DeductiveFaultSim<'a> {
    /// Build a simulator with no fault activated yet
    pub fn new(circuit: &'a Circuit) -> DeductiveFaultSim<'a> {
        assert!(
            !circuit.is_split(),
            "deductive simulation runs on the unsplit circuit"
        );
        DeductiveFaultSim {
            circuit,
            values: vec![None; circuit.nb_nodes()],
            evaluated: vec![false; circuit.nb_gates()],
            stuck_at_0: vec![false; circuit.nb_nodes()],
            stuck_at_1: vec![false; circuit.nb_nodes()],
            fault_lists: vec![FxHashSet::default(); circuit.nb_nodes()],
        }
    }

    /// Activate both stuck-at faults on every node
    pub fn activate_all_faults(&mut self) {
        self.stuck_at_0 = vec![true; self.circuit.nb_nodes()];
        self.stuck_at_1 = vec![true; self.circuit.nb_nodes()];
    }

    /// Activate a single stuck-at fault given by node name
    pub fn activate_fault(&mut self, fault: Fault) -> Result<(), Error> {
        let node = self
            .circuit
            .node_id(fault.node)
            .ok_or(Error::UnknownNode { name: fault.node })?;
        if fault.stuck {
            self.stuck_at_1[node] = true;
        } else {
            self.stuck_at_0[node] = true;
        }
        Ok(())
    }

    /// Number of activated faults in the circuit
    pub fn total_faults(&self) -> usize {
        self.stuck_at_0.iter().filter(|b| **b).count()
            + self.stuck_at_1.iter().filter(|b| **b).count()
    }

    /// Apply a test vector, propagating values and fault lists
    pub fn run(&mut self, vector: &str) -> Result<String, Error> {
        let circuit = self.circuit;
        let bits = parse_test_vector(vector, circuit.nb_inputs())?;

        self.values = vec![None; circuit.nb_nodes()];
        self.evaluated = vec![false; circuit.nb_gates()];
        self.fault_lists = vec![FxHashSet::default(); circuit.nb_nodes()];

        let mut ready: VecDeque<usize> = VecDeque::new();
        for (&node, bit) in circuit.inputs().iter().zip(bits) {
            self.assign(node, bit);
            self.fault_lists[node] = self.sensitized_fault(node).into_iter().collect();
            ready.push_back(node);
        }

        let mut stalled = 0;
        while let Some(node) = ready.pop_front() {
            let mut progressed = false;
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

        Ok(self
            .circuit
            .outputs()
            .iter()
            .map(|&o| match self.values[o] {
                Some(true) => '1',
                Some(false) => '0',
                None => 'X',
            })
            .collect())
    }

    /// Faults observable at the primary outputs after a run, sorted
    pub fn detected_faults(&self) -> Vec<Fault> {
        let mut all: FxHashSet<Fault> = FxHashSet::default();
        for &o in self.circuit.outputs() {
            all.extend(self.fault_lists[o].iter().copied());
        }
        all.into_iter().sorted().collect()
    }

    /// Fault coverage of the last run, in percent
    pub fn coverage(&self) -> f64 {
        let total = self.total_faults();
        if total == 0 {
            return 0.0;
        }
        self.detected_faults().len() as f64 * 100.0 / total as f64
    }

    /// The activated fault this node currently exhibits, if any
    ///
    /// A stuck-at-v fault is sensitized when the node computes the opposite
    /// value.
    fn sensitized_fault(&self, node: usize) -> Option<Fault> {
        let name = self.circuit.node_name(node);
        match self.values[node] {
            Some(true) if self.stuck_at_0[node] => Some(Fault::new(name, false)),
            Some(false) if self.stuck_at_1[node] => Some(Fault::new(name, true)),
            _ => None,
        }
    }

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

    /// Evaluate a gate if all its inputs are definite, value and fault list
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

        let mut list = self.merged_fault_list(gate);
        if let Some(fault) = self.sensitized_fault(gate.output) {
            list.insert(fault);
        }
        self.fault_lists[gate.output] = list;
        true
    }

    /// The fault-list algebra over the gate's controlling value
    ///
    /// Non-controlling inputs let every fault through (union); a controlling
    /// input masks the other side (difference); two controlling inputs keep
    /// only faults that flip both (intersection); XOR family keeps faults
    /// that flip an odd number of inputs (symmetric difference).
    fn merged_fault_list(&self, gate: &Gate) -> FxHashSet<Fault> {
        let l1 = &self.fault_lists[gate.input1];
        let i2 = match gate.input2 {
            None => return l1.clone(),
            Some(i2) => i2,
        };
        let l2 = &self.fault_lists[i2];
        match gate.kind.controlling_value() {
            None => l1.symmetric_difference(l2).copied().collect(),
            Some(c) => {
                let c1 = self.values[gate.input1] == Some(c);
                let c2 = self.values[i2] == Some(c);
                match (c1, c2) {
                    (false, false) => l1.union(l2).copied().collect(),
                    (true, false) => l1.difference(l2).copied().collect(),
                    (false, true) => l2.difference(l1).copied().collect(),
                    (true, true) => l1.intersection(l2).copied().collect(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::GateKind;

    fn and_inv_circuit() -> Circuit {
        // INPUT 1 2 -1; OUTPUT 5 -1; AND 1 2 3; INV 3 5
        let mut ckt = Circuit::new();
        ckt.add_input(1);
        ckt.add_input(2);
        ckt.add_output(5);
        ckt.add_gate(GateKind::And, 1, Some(2), 3);
        ckt.add_gate(GateKind::Inv, 3, None, 5);
        ckt
    }

    fn faults(pairs: &[(i32, bool)]) -> FxHashSet<Fault> {
        pairs.iter().map(|&(n, s)| Fault::new(n, s)).collect()
    }

    #[test]
    fn test_noncontrolling_and_is_union() {
        // both AND inputs at 1: output list is the union of the input lists
        let ckt = and_inv_circuit();
        let mut sim = DeductiveFaultSim::new(&ckt);
        sim.activate_fault(Fault::new(1, false)).unwrap();
        sim.activate_fault(Fault::new(2, false)).unwrap();
        assert_eq!(sim.run("11").unwrap(), "0");
        let n3 = ckt.node_id(3).unwrap();
        assert_eq!(sim.fault_lists[n3], faults(&[(1, false), (2, false)]));
        assert_eq!(
            sim.detected_faults(),
            vec![Fault::new(1, false), Fault::new(2, false)]
        );
    }

    #[test]
    fn test_controlling_input_masks() {
        // input1 at the controlling value of an AND: list1 minus list2
        let ckt = and_inv_circuit();
        let mut sim = DeductiveFaultSim::new(&ckt);
        let n1 = ckt.node_id(1).unwrap();
        let n2 = ckt.node_id(2).unwrap();
        sim.values[n1] = Some(false);
        sim.values[n2] = Some(true);
        sim.fault_lists[n1] = faults(&[(1, true), (7, true)]);
        sim.fault_lists[n2] = faults(&[(7, true)]);
        let merged = sim.merged_fault_list(ckt.gate(0));
        assert_eq!(merged, faults(&[(1, true)]));
    }

    #[test]
    fn test_both_controlling_is_intersection() {
        let ckt = and_inv_circuit();
        let mut sim = DeductiveFaultSim::new(&ckt);
        let n1 = ckt.node_id(1).unwrap();
        let n2 = ckt.node_id(2).unwrap();
        sim.values[n1] = Some(false);
        sim.values[n2] = Some(false);
        sim.fault_lists[n1] = faults(&[(1, true), (7, true)]);
        sim.fault_lists[n2] = faults(&[(7, true), (2, true)]);
        let merged = sim.merged_fault_list(ckt.gate(0));
        assert_eq!(merged, faults(&[(7, true)]));
    }

    #[test]
    fn test_xor_is_symmetric_difference() {
        // INPUT 1 2 -1; OUTPUT 3 -1; XOR 1 2 3
        let mut ckt = Circuit::new();
        ckt.add_input(1);
        ckt.add_input(2);
        ckt.add_output(3);
        ckt.add_gate(GateKind::Xor, 1, Some(2), 3);
        let mut sim = DeductiveFaultSim::new(&ckt);
        let n1 = ckt.node_id(1).unwrap();
        let n2 = ckt.node_id(2).unwrap();
        sim.values[n1] = Some(true);
        sim.values[n2] = Some(false);
        sim.fault_lists[n1] = faults(&[(4, false), (5, true)]);
        sim.fault_lists[n2] = faults(&[(5, true), (6, false)]);
        let merged = sim.merged_fault_list(ckt.gate(0));
        assert_eq!(merged, faults(&[(4, false), (6, false)]));
    }

    #[test]
    fn test_all_faults_run() {
        let ckt = and_inv_circuit();
        let mut sim = DeductiveFaultSim::new(&ckt);
        sim.activate_all_faults();
        assert_eq!(sim.total_faults(), 8);
        assert_eq!(sim.run("11").unwrap(), "0");
        assert_eq!(
            sim.detected_faults(),
            vec![
                Fault::new(1, false),
                Fault::new(2, false),
                Fault::new(3, false),
                Fault::new(5, true),
            ]
        );
        assert_eq!(sim.coverage(), 50.0);
    }

    #[test]
    fn test_controlling_run() {
        // input1 = 0 dominates the AND; only its own faults propagate
        let ckt = and_inv_circuit();
        let mut sim = DeductiveFaultSim::new(&ckt);
        sim.activate_all_faults();
        assert_eq!(sim.run("01").unwrap(), "1");
        assert_eq!(
            sim.detected_faults(),
            vec![
                Fault::new(1, true),
                Fault::new(3, true),
                Fault::new(5, false),
            ]
        );
    }

    #[test]
    fn test_stem_shares_fault_list() {
        // INPUT 1 -1; OUTPUT 4 -1; BUF 1 2; BUF 1 3; AND 2 3 4
        let mut ckt = Circuit::new();
        ckt.add_input(1);
        ckt.add_output(4);
        ckt.add_gate(GateKind::Buf, 1, None, 2);
        ckt.add_gate(GateKind::Buf, 1, None, 3);
        ckt.add_gate(GateKind::And, 2, Some(3), 4);
        let mut sim = DeductiveFaultSim::new(&ckt);
        sim.activate_fault(Fault::new(1, false)).unwrap();
        assert_eq!(sim.run("1").unwrap(), "1");
        // the stem fault reconverges on both AND inputs and stays visible
        assert_eq!(sim.detected_faults(), vec![Fault::new(1, false)]);
    }

    #[test]
    fn test_unknown_node() {
        let ckt = and_inv_circuit();
        let mut sim = DeductiveFaultSim::new(&ckt);
        assert!(matches!(
            sim.activate_fault(Fault::new(99, true)),
            Err(Error::UnknownNode { name: 99 })
        ));
    }

    #[test]
    fn test_fresh_runs_agree() {
        let ckt = and_inv_circuit();
        let mut first = DeductiveFaultSim::new(&ckt);
        first.activate_all_faults();
        first.run("10").unwrap();
        let mut second = DeductiveFaultSim::new(&ckt);
        second.activate_all_faults();
        second.run("10").unwrap();
        assert_eq!(first.detected_faults(), second.detected_faults());
    }
}
