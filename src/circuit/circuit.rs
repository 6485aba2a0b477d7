use std::fmt;

use fxhash::FxHashMap;
use itertools::Itertools;

use crate::circuit::{Gate, GateKind};

/// A combinational netlist as an arena of nodes and gates
///
/// Nodes and gates are addressed by dense indices; netlist names are kept
/// alongside. The structure is fixed after construction (plus the optional
/// fan-out split); all simulation state lives in the engines.
#[derive(Clone, Debug, Default)]
pub struct Circuit {
    names: Vec<i32>,
    name_to_node: FxHashMap<i32, usize>,
    gates: Vec<Gate>,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
    /// Gates fed by each node, in netlist order
    driven: Vec<Vec<usize>>,
    /// Gates driving each node; singleton for a well-formed circuit
    drivers: Vec<Vec<usize>>,
    /// Branch nodes inserted for each fan-out stem, in creation order
    stems_to_branches: FxHashMap<usize, Vec<usize>>,
    /// Next fresh netlist name for branch nodes
    next_name: i32,
}

impl Circuit {
    /// Create an empty circuit
    pub fn new() -> Circuit {
        Circuit::default()
    }

    /// Return the number of nodes
    pub fn nb_nodes(&self) -> usize {
        self.names.len()
    }

    /// Return the number of gates
    pub fn nb_gates(&self) -> usize {
        self.gates.len()
    }

    /// Return the number of primary inputs
    pub fn nb_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Return the number of primary outputs
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Primary inputs in declaration order
    pub fn inputs(&self) -> &[usize] {
        &self.inputs
    }

    /// Primary outputs in declaration order
    pub fn outputs(&self) -> &[usize] {
        &self.outputs
    }

    /// Get the gate at index i
    pub fn gate(&self, i: usize) -> &Gate {
        &self.gates[i]
    }

    /// All gates in netlist order
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Netlist name of a node
    pub fn node_name(&self, node: usize) -> i32 {
        self.names[node]
    }

    /// Netlist names of all nodes, in creation order
    pub fn node_names(&self) -> &[i32] {
        &self.names
    }

    /// Look up a node by its netlist name
    pub fn node_id(&self, name: i32) -> Option<usize> {
        self.name_to_node.get(&name).copied()
    }

    /// Gates this node feeds as an input
    pub fn driven_gates(&self, node: usize) -> &[usize] {
        &self.driven[node]
    }

    /// Gates driving this node as their output
    pub fn driver_gates(&self, node: usize) -> &[usize] {
        &self.drivers[node]
    }

    /// Branch nodes of a split fan-out stem, if the node is one
    pub fn branches(&self, node: usize) -> Option<&[usize]> {
        self.stems_to_branches.get(&node).map(|v| v.as_slice())
    }

    /// Return whether any stem has been split
    pub fn is_split(&self) -> bool {
        !self.stems_to_branches.is_empty()
    }

    /// Return whether the node feeds more than one gate input, or has been split
    pub fn is_fanout_stem(&self, node: usize) -> bool {
        self.driven[node].len() > 1 || self.stems_to_branches.contains_key(&node)
    }

    /// Get the node with this name, creating it if needed
    pub fn add_node(&mut self, name: i32) -> usize {
        if let Some(&node) = self.name_to_node.get(&name) {
            return node;
        }
        let node = self.names.len();
        self.names.push(name);
        self.name_to_node.insert(name, node);
        self.driven.push(Vec::new());
        self.drivers.push(Vec::new());
        // keep fresh branch names clear of sparse netlist names
        self.next_name = self.next_name.max(name + 1);
        node
    }

    /// Declare a primary input
    pub fn add_input(&mut self, name: i32) {
        let node = self.add_node(name);
        self.inputs.push(node);
    }

    /// Declare a primary output
    pub fn add_output(&mut self, name: i32) {
        let node = self.add_node(name);
        self.outputs.push(node);
    }

    /// Add a gate connecting the named nodes; returns its index
    pub fn add_gate(
        &mut self,
        kind: GateKind,
        input1: i32,
        input2: Option<i32>,
        output: i32,
    ) -> usize {
        let i1 = self.add_node(input1);
        let i2 = input2.map(|n| self.add_node(n));
        let out = self.add_node(output);
        let g = self.gates.len();
        self.gates.push(Gate::new(kind, i1, i2, out));
        self.driven[i1].push(g);
        if let Some(i2) = i2 {
            self.driven[i2].push(g);
        }
        self.drivers[out].push(g);
        g
    }

    /// Split every fan-out stem into explicit branch nodes
    ///
    /// Every gate input fed by a stem is rewired to a fresh branch node, the
    /// first included, so the stem keeps no direct gate consumer. Downstream
    /// topology is unchanged up to the renamed inputs.
    pub fn split_fanout(&mut self) {
        for stem in 0..self.nb_nodes() {
            if self.driven[stem].len() <= 1 {
                continue;
            }
            while let Some(g) = self.driven[stem].pop() {
                let branch = self.add_node(self.next_name);
                self.stems_to_branches.entry(stem).or_default().push(branch);
                let gate = &mut self.gates[g];
                if gate.input1 == stem {
                    gate.input1 = branch;
                } else if gate.input2 == Some(stem) {
                    gate.input2 = Some(branch);
                }
                self.driven[branch].push(g);
            }
        }
    }

    /// Check consistency of the datastructure
    pub fn check(&self) {
        assert_eq!(self.names.len(), self.driven.len());
        assert_eq!(self.names.len(), self.drivers.len());
        for (i, g) in self.gates.iter().enumerate() {
            for n in g.inputs() {
                assert!(n < self.nb_nodes(), "gate {i} input out of bounds");
                assert!(self.driven[n].contains(&i));
            }
            assert!(g.output < self.nb_nodes(), "gate {i} output out of bounds");
            assert!(self.drivers[g.output].contains(&i));
        }
        for &n in self.inputs.iter().chain(self.outputs.iter()) {
            assert!(n < self.nb_nodes());
        }
    }
}

impl fmt::Display for Circuit {
    /// Netlist listing: CONNECT lines for split stems, then the gate list
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (&stem, branches) in self
            .stems_to_branches
            .iter()
            .sorted_by_key(|&(&stem, _)| self.node_name(stem))
        {
            writeln!(
                f,
                "CONNECT {} {}",
                self.node_name(stem),
                branches.iter().map(|&b| self.node_name(b)).join(" ")
            )?;
        }
        for g in &self.gates {
            write!(f, "{} {}", g.kind, self.node_name(g.input1))?;
            if let Some(i2) = g.input2 {
                write!(f, " {}", self.node_name(i2))?;
            }
            writeln!(f, " {}", self.node_name(g.output))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn and_inv_circuit() -> Circuit {
        let mut ckt = Circuit::new();
        ckt.add_input(1);
        ckt.add_input(2);
        ckt.add_output(5);
        ckt.add_gate(GateKind::And, 1, Some(2), 3);
        ckt.add_gate(GateKind::Inv, 3, None, 5);
        ckt
    }

    #[test]
    fn test_basic() {
        let ckt = and_inv_circuit();
        assert_eq!(ckt.nb_inputs(), 2);
        assert_eq!(ckt.nb_outputs(), 1);
        assert_eq!(ckt.nb_nodes(), 4);
        assert_eq!(ckt.nb_gates(), 2);
        ckt.check();

        let n3 = ckt.node_id(3).unwrap();
        assert_eq!(ckt.driven_gates(n3), &[1]);
        assert_eq!(ckt.driver_gates(n3), &[0]);
        assert_eq!(ckt.node_id(4), None);
        assert!(!ckt.is_fanout_stem(n3));
    }

    #[test]
    fn test_node_dedup() {
        let mut ckt = Circuit::new();
        let a = ckt.add_node(7);
        let b = ckt.add_node(7);
        assert_eq!(a, b);
        assert_eq!(ckt.nb_nodes(), 1);
    }

    #[test]
    fn test_split_fanout() {
        // INPUT 1; OUTPUT 4; BUF 1 2; BUF 1 3; AND 2 3 4
        let mut ckt = Circuit::new();
        ckt.add_input(1);
        ckt.add_output(4);
        ckt.add_gate(GateKind::Buf, 1, None, 2);
        ckt.add_gate(GateKind::Buf, 1, None, 3);
        ckt.add_gate(GateKind::And, 2, Some(3), 4);
        let stem = ckt.node_id(1).unwrap();
        assert!(ckt.is_fanout_stem(stem));

        ckt.split_fanout();
        ckt.check();
        let branches = ckt.branches(stem).unwrap();
        assert_eq!(branches.len(), 2);
        assert!(ckt.driven_gates(stem).is_empty());
        for &b in branches {
            assert_eq!(ckt.driven_gates(b).len(), 1);
        }
        // branch names stay clear of existing node names
        for &b in branches {
            assert!(ckt.node_name(b) > 4);
        }
        // downstream gate unchanged
        assert_eq!(ckt.gate(2).kind, GateKind::And);
        assert_eq!(ckt.node_name(ckt.gate(2).output), 4);
    }

    #[test]
    fn test_split_same_node_twice() {
        // a gate fed twice by the same stem gets two distinct branches
        let mut ckt = Circuit::new();
        ckt.add_input(1);
        ckt.add_output(2);
        ckt.add_gate(GateKind::And, 1, Some(1), 2);
        let stem = ckt.node_id(1).unwrap();
        ckt.split_fanout();
        ckt.check();
        let branches = ckt.branches(stem).unwrap();
        assert_eq!(branches.len(), 2);
        let g = ckt.gate(0);
        assert_ne!(g.input1, g.input2.unwrap());
        assert_ne!(g.input1, stem);
    }

    #[test]
    fn test_display_listing() {
        let mut ckt = and_inv_circuit();
        ckt.split_fanout();
        let listing = ckt.to_string();
        assert_eq!(listing, "AND 1 2 3\nINV 3 5\n");
    }
}
