use std::fmt;
use std::ops::Not;

use crate::circuit::GateKind;

/// Five-valued logic for test generation
///
/// `D` is 1 in the good circuit and 0 in the faulty one; `DBar` is the
/// opposite. `X` is unassigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lv {
    /// 0 in both the good and the faulty circuit
    Zero,
    /// 1 in both the good and the faulty circuit
    One,
    /// Unassigned
    X,
    /// 1 in the good circuit, 0 in the faulty one
    D,
    /// 0 in the good circuit, 1 in the faulty one
    DBar,
}

impl Lv {
    /// Return whether the value carries a fault effect (D or DBar)
    pub fn is_fault_effect(&self) -> bool {
        matches!(self, Lv::D | Lv::DBar)
    }
}

impl From<bool> for Lv {
    fn from(b: bool) -> Lv {
        if b {
            Lv::One
        } else {
            Lv::Zero
        }
    }
}

impl Not for Lv {
    type Output = Lv;
    fn not(self) -> Lv {
        use Lv::*;
        match self {
            Zero => One,
            One => Zero,
            D => DBar,
            DBar => D,
            X => X,
        }
    }
}

impl fmt::Display for Lv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Lv::*;
        let s = match self {
            Zero => "0",
            One => "1",
            X => "X",
            D => "D",
            DBar => "DBar",
        };
        write!(f, "{}", s)
    }
}

/// Five-valued And: a controlling 0 wins, a 1 passes the other input,
/// opposite fault effects cancel to 0
fn and5(a: Lv, b: Lv) -> Lv {
    use Lv::*;
    if a == Zero || b == Zero {
        Zero
    } else if a == One {
        b
    } else if b == One {
        a
    } else if a == b {
        // D with D, DBar with DBar
        a
    } else if a.is_fault_effect() && b.is_fault_effect() {
        // D with DBar
        Zero
    } else {
        X
    }
}

/// Five-valued Or, the dual of [`and5`]
fn or5(a: Lv, b: Lv) -> Lv {
    use Lv::*;
    if a == One || b == One {
        One
    } else if a == Zero {
        b
    } else if b == Zero {
        a
    } else if a == b {
        a
    } else if a.is_fault_effect() && b.is_fault_effect() {
        One
    } else {
        X
    }
}

/// Evaluate a gate under five-valued logic; single-input kinds ignore `b`
///
/// XOR/XNOR netlists are rejected before the engine runs.
pub fn eval(kind: GateKind, a: Lv, b: Lv) -> Lv {
    use GateKind::*;
    match kind {
        And => and5(a, b),
        Or => or5(a, b),
        Nand => !and5(a, b),
        Nor => !or5(a, b),
        Inv => !a,
        Buf => a,
        Xor | Xnor => unreachable!("xor gates are rejected before the podem engine runs"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::Lv::*;

    const ALL: [Lv; 5] = [Zero, One, X, D, DBar];

    #[test]
    fn test_not() {
        assert_eq!(!Zero, One);
        assert_eq!(!One, Zero);
        assert_eq!(!D, DBar);
        assert_eq!(!DBar, D);
        assert_eq!(!X, X);
        for v in ALL {
            assert_eq!(!!v, v);
        }
    }

    #[test]
    fn test_and() {
        for v in ALL {
            // controlling zero and passing one
            assert_eq!(eval(GateKind::And, Zero, v), Zero);
            assert_eq!(eval(GateKind::And, v, Zero), Zero);
            assert_eq!(eval(GateKind::And, One, v), v);
            assert_eq!(eval(GateKind::And, v, One), v);
        }
        assert_eq!(eval(GateKind::And, D, D), D);
        assert_eq!(eval(GateKind::And, DBar, DBar), DBar);
        assert_eq!(eval(GateKind::And, D, DBar), Zero);
        assert_eq!(eval(GateKind::And, DBar, D), Zero);
        assert_eq!(eval(GateKind::And, X, D), X);
        assert_eq!(eval(GateKind::And, X, X), X);
    }

    #[test]
    fn test_or() {
        for v in ALL {
            assert_eq!(eval(GateKind::Or, One, v), One);
            assert_eq!(eval(GateKind::Or, v, One), One);
            assert_eq!(eval(GateKind::Or, Zero, v), v);
            assert_eq!(eval(GateKind::Or, v, Zero), v);
        }
        assert_eq!(eval(GateKind::Or, D, D), D);
        assert_eq!(eval(GateKind::Or, DBar, DBar), DBar);
        assert_eq!(eval(GateKind::Or, D, DBar), One);
        assert_eq!(eval(GateKind::Or, X, DBar), X);
    }

    #[test]
    fn test_complemented_kinds() {
        for a in ALL {
            for b in ALL {
                assert_eq!(eval(GateKind::Nand, a, b), !eval(GateKind::And, a, b));
                assert_eq!(eval(GateKind::Nor, a, b), !eval(GateKind::Or, a, b));
            }
            assert_eq!(eval(GateKind::Inv, a, X), !a);
            assert_eq!(eval(GateKind::Buf, a, X), a);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(D.to_string(), "D");
        assert_eq!(DBar.to_string(), "DBar");
        assert_eq!(X.to_string(), "X");
    }
}
