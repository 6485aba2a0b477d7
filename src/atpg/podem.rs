use crate::atpg::five_valued::{eval, Lv};
use crate::circuit::{Circuit, GateKind};
use crate::errors::Error;
use crate::sim::Fault;

/// PODEM test generator for a single stuck-at fault
///
/// Searches for a primary-input assignment that activates the fault and
/// propagates its effect to a primary output, by recursive decisions on
/// backtraced primary inputs with forward implication.
#[derive(Clone, Debug)]
pub struct Podem<'a> {
    circuit: &'a Circuit,
    values: Vec<Lv>,
    fault_node: usize,
    stuck: bool,
}

/// Record the prior value of a node in a change log, first write wins
///
/// Reverting the log then restores the state at the start of the frame even
/// if the node was assigned several times.
fn record(log: &mut Vec<(usize, Lv)>, node: usize, prior: Lv) {
    if !log.iter().any(|&(n, _)| n == node) {
        log.push((node, prior));
    }
}

impl<'a> Podem<'a> {
    /// Build an engine for one fault, given by node name and stuck-at value
    ///
    /// Netlists with XOR or XNOR gates are rejected here rather than
    /// producing wrong values during the search.
    pub fn new(circuit: &'a Circuit, fault_node: i32, stuck: bool) -> Result<Podem<'a>, Error> {
        assert!(!circuit.is_split(), "podem runs on the unsplit circuit");
        if circuit
            .gates()
            .iter()
            .any(|g| matches!(g.kind, GateKind::Xor | GateKind::Xnor))
        {
            return Err(Error::XorUnsupported);
        }
        let node = circuit
            .node_id(fault_node)
            .ok_or(Error::UnknownNode { name: fault_node })?;
        Ok(Podem {
            circuit,
            values: vec![Lv::X; circuit.nb_nodes()],
            fault_node: node,
            stuck,
        })
    }

    /// The fault this engine targets
    pub fn fault(&self) -> Fault {
        Fault::new(self.circuit.node_name(self.fault_node), self.stuck)
    }

    /// Run the search; returns whether a test vector was found
    pub fn run(&mut self) -> bool {
        self.search()
    }

    /// The generated primary-input vector, in declaration order
    ///
    /// D renders as the good-circuit 1, DBar as 0, and primary inputs the
    /// search never assigned stay 'X'. None when no input was assigned.
    pub fn test_vector(&self) -> Option<String> {
        let inputs = self.circuit.inputs();
        if inputs.iter().all(|&n| self.values[n] == Lv::X) {
            return None;
        }
        Some(
            inputs
                .iter()
                .map(|&n| match self.values[n] {
                    Lv::One | Lv::D => '1',
                    Lv::Zero | Lv::DBar => '0',
                    Lv::X => 'X',
                })
                .collect(),
        )
    }

    fn search(&mut self) -> bool {
        // a fault effect reached a primary output
        if self
            .circuit
            .outputs()
            .iter()
            .any(|&o| self.values[o].is_fault_effect())
        {
            return true;
        }

        let frontier = self.d_frontier();

        // the fault site settled at its stuck value: activation is impossible
        let fv = self.values[self.fault_node];
        if fv != Lv::X && fv == Lv::from(self.stuck) {
            return false;
        }

        let (obj_node, obj_value) = match self.objective(&frontier) {
            Some(o) => o,
            None => return false,
        };
        let (pi, value) = self.backtrace(obj_node, obj_value);

        let mut log = Vec::new();
        if self.imply(pi, value, &mut log) && self.search() {
            return true;
        }
        self.revert(&log);
        log.clear();

        if self.imply(pi, !value, &mut log) && self.search() {
            return true;
        }
        self.revert(&log);
        log.clear();

        // both polarities exhausted: release the input before failing upward
        self.imply(pi, Lv::X, &mut log);
        false
    }

    /// Gates whose output is X with a fault effect on at least one input
    fn d_frontier(&self) -> Vec<usize> {
        let mut frontier = Vec::new();
        for (g, gate) in self.circuit.gates().iter().enumerate() {
            if self.values[gate.output] != Lv::X {
                continue;
            }
            if gate.inputs().any(|n| self.values[n].is_fault_effect()) {
                frontier.push(g);
            }
        }
        frontier
    }

    /// Next value to pursue: activate the fault, else advance the D-frontier
    fn objective(&self, frontier: &[usize]) -> Option<(usize, Lv)> {
        if self.values[self.fault_node] == Lv::X {
            return Some((self.fault_node, Lv::from(!self.stuck)));
        }
        let &g = frontier.first()?;
        let gate = self.circuit.gate(g);
        let c = match gate.kind.controlling_value() {
            Some(c) => c,
            None => {
                eprintln!("d-frontier gate without a controlling value");
                return None;
            }
        };
        let want = Lv::from(!c);
        if self.values[gate.input1] == Lv::X {
            return Some((gate.input1, want));
        }
        if let Some(i2) = gate.input2 {
            if self.values[i2] == Lv::X {
                return Some((i2, want));
            }
        }
        eprintln!("d-frontier gate has no unassigned input");
        None
    }

    /// Walk the objective back to a primary input through unassigned inputs
    ///
    /// The wanted value flips at every inverting gate; at each gate input1 is
    /// taken when unassigned, input2 otherwise.
    fn backtrace(&self, mut node: usize, mut value: Lv) -> (usize, Lv) {
        while let Some(&g) = self.circuit.driver_gates(node).first() {
            let gate = self.circuit.gate(g);
            if gate.kind.inversion_parity() {
                value = !value;
            }
            node = if self.values[gate.input1] == Lv::X {
                gate.input1
            } else {
                match gate.input2 {
                    Some(i2) => i2,
                    None => {
                        eprintln!("backtrace reached a gate with no unassigned input");
                        return (node, value);
                    }
                }
            };
        }
        (node, value)
    }

    /// Assign a node and propagate forward; false on a fault-site conflict
    fn imply(&mut self, node: usize, value: Lv, log: &mut Vec<(usize, Lv)>) -> bool {
        let resolved = match self.resolve_fault(node, value) {
            Some(v) => v,
            None => return false,
        };
        if self.values[node] != resolved {
            record(log, node, self.values[node]);
            self.values[node] = resolved;
        }
        for &g in self.circuit.driven_gates(node) {
            let gate = self.circuit.gate(g);
            let a = self.values[gate.input1];
            let b = gate.input2.map_or(Lv::X, |i2| self.values[i2]);
            let new = eval(gate.kind, a, b);
            if new == self.values[gate.output] {
                continue;
            }
            if !self.imply(gate.output, new, log) {
                return false;
            }
        }
        true
    }

    /// Resolve an assignment against the fault site
    ///
    /// Writing the opposite of the stuck value turns into D or DBar; writing
    /// the stuck value itself is a conflict (None).
    fn resolve_fault(&self, node: usize, value: Lv) -> Option<Lv> {
        if node != self.fault_node {
            return Some(value);
        }
        match (self.stuck, value) {
            (false, Lv::One) => Some(Lv::D),
            (true, Lv::Zero) => Some(Lv::DBar),
            (false, Lv::Zero) | (true, Lv::One) => None,
            _ => Some(value),
        }
    }

    fn revert(&mut self, log: &[(usize, Lv)]) {
        for &(node, value) in log {
            self.values[node] = value;
        }
    }
}
