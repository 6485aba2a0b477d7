use std::fmt;

/// The combinational primitives supported in netlists
///
/// All gates have one or two inputs; Inv and Buf are the single-input kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// 2-input And gate
    And,
    /// 2-input Or gate
    Or,
    /// 2-input Nand gate
    Nand,
    /// 2-input Nor gate
    Nor,
    /// 2-input Xor gate
    Xor,
    /// 2-input Xnor gate
    Xnor,
    /// Inverter
    Inv,
    /// Buffer
    Buf,
}

impl GateKind {
    /// Parse a netlist keyword, case-insensitively
    pub fn from_keyword(s: &str) -> Option<GateKind> {
        use GateKind::*;
        match s.to_lowercase().as_str() {
            "and" => Some(And),
            "or" => Some(Or),
            "nand" => Some(Nand),
            "nor" => Some(Nor),
            "xor" => Some(Xor),
            "xnor" => Some(Xnor),
            "inv" => Some(Inv),
            "buf" => Some(Buf),
            _ => None,
        }
    }

    /// Return whether the gate takes a single input (Inv and Buf)
    pub fn is_single_input(&self) -> bool {
        matches!(self, GateKind::Inv | GateKind::Buf)
    }

    /// Return the input value that alone determines the output, if any
    ///
    /// 0 for And/Nand, 1 for Or/Nor; the other kinds have no controlling value.
    pub fn controlling_value(&self) -> Option<bool> {
        use GateKind::*;
        match self {
            And | Nand => Some(false),
            Or | Nor => Some(true),
            Xor | Xnor | Inv | Buf => None,
        }
    }

    /// Return whether the gate complements its output (Nand, Nor, Inv, Xnor)
    pub fn inversion_parity(&self) -> bool {
        use GateKind::*;
        matches!(self, Nand | Nor | Inv | Xnor)
    }

    /// Two-valued evaluation; single-input kinds ignore `b`
    pub fn eval(&self, a: bool, b: bool) -> bool {
        use GateKind::*;
        match self {
            And => a && b,
            Or => a || b,
            Nand => !(a && b),
            Nor => !(a || b),
            Xor => a ^ b,
            Xnor => !(a ^ b),
            Inv => !a,
            Buf => a,
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use GateKind::*;
        let s = match self {
            And => "AND",
            Or => "OR",
            Nand => "NAND",
            Nor => "NOR",
            Xor => "XOR",
            Xnor => "XNOR",
            Inv => "INV",
            Buf => "BUF",
        };
        write!(f, "{}", s)
    }
}

/// A gate instance: a kind plus node indices for its ports
///
/// `input2` is present exactly when the kind is not single-input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gate {
    /// The gate's logic function
    pub kind: GateKind,
    /// First input node
    pub input1: usize,
    /// Second input node, absent for Inv/Buf
    pub input2: Option<usize>,
    /// Output node
    pub output: usize,
}

impl Gate {
    /// Create a gate; the input count must match the kind
    pub fn new(kind: GateKind, input1: usize, input2: Option<usize>, output: usize) -> Gate {
        assert_eq!(
            kind.is_single_input(),
            input2.is_none(),
            "{} gate with wrong input count",
            kind
        );
        Gate {
            kind,
            input1,
            input2,
            output,
        }
    }

    /// Node indices of the gate inputs, in port order
    pub fn inputs(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::once(self.input1).chain(self.input2)
    }
}
