use std::fmt;

/// A single stuck-at fault: a node name and the value it is stuck at
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fault {
    /// Netlist name of the faulty node
    pub node: i32,
    /// Stuck-at value: false for stuck-at-0, true for stuck-at-1
    pub stuck: bool,
}

impl Fault {
    /// Create a fault from a node name and a stuck-at value
    pub fn new(node: i32, stuck: bool) -> Fault {
        Fault { node, stuck }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stuck at {}", self.node, self.stuck as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Fault::new(12, false).to_string(), "12 stuck at 0");
        assert_eq!(Fault::new(3, true).to_string(), "3 stuck at 1");
    }

    #[test]
    fn test_ordering() {
        let mut faults = vec![
            Fault::new(5, true),
            Fault::new(2, true),
            Fault::new(2, false),
        ];
        faults.sort();
        assert_eq!(
            faults,
            vec![
                Fault::new(2, false),
                Fault::new(2, true),
                Fault::new(5, true),
            ]
        );
    }
}
