//! IO for gate-level netlists and fault lists

use std::io::{BufRead, BufReader, Read};

use crate::circuit::{Circuit, GateKind};
use crate::errors::Error;
use crate::sim::Fault;

fn syntax(line: usize, msg: String) -> Error {
    Error::Syntax { line, msg }
}

fn parse_name(token: &str, line: usize) -> Result<i32, Error> {
    token
        .parse::<i32>()
        .map_err(|_| syntax(line, format!("expected a node name, got {token:?}")))
}

/// Read a netlist
///
/// Line-oriented and whitespace-tolerant; tabs are stripped and runs of
/// spaces collapse. Three kinds of line:
/// ```text
///     INPUT 1 2 3 -1
///     OUTPUT 7 -1
///     AND 1 2 5
///     INV 5 7
/// ```
/// `-1` terminates INPUT/OUTPUT lists (as does any token that is not a
/// name). Keywords are matched case-insensitively; INV and BUF take a
/// single input. Lines with an unknown keyword are skipped with a warning.
pub fn read_netlist<R: Read>(r: R) -> Result<Circuit, Error> {
    let mut circuit = Circuit::new();
    for (i, l) in BufReader::new(r).lines().enumerate() {
        let line = i + 1;
        let l = l.map_err(|e| syntax(line, e.to_string()))?;
        let l = l.replace('\t', "");
        let tokens: Vec<&str> = l.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        let keyword = tokens[0].to_lowercase();
        if keyword == "input" || keyword == "output" {
            for token in &tokens[1..] {
                let name = token.parse::<i32>().unwrap_or(-1);
                if name == -1 {
                    break;
                }
                if keyword == "input" {
                    circuit.add_input(name);
                } else {
                    circuit.add_output(name);
                }
            }
        } else if let Some(kind) = GateKind::from_keyword(&keyword) {
            let operands = if kind.is_single_input() { 2 } else { 3 };
            if tokens.len() != operands + 1 {
                return Err(syntax(
                    line,
                    format!("{kind} expects {operands} operands, got {}", tokens.len() - 1),
                ));
            }
            let input1 = parse_name(tokens[1], line)?;
            let (input2, output) = if kind.is_single_input() {
                (None, parse_name(tokens[2], line)?)
            } else {
                (Some(parse_name(tokens[2], line)?), parse_name(tokens[3], line)?)
            };
            circuit.add_gate(kind, input1, input2, output);
        } else {
            eprintln!("skipping unrecognized netlist line: {}", l.trim());
        }
    }
    circuit.check();
    Ok(circuit)
}

/// Read a fault list, one `<node> <0|1>` per line
pub fn read_fault_list<R: Read>(r: R) -> Result<Vec<Fault>, Error> {
    let mut faults = Vec::new();
    for (i, l) in BufReader::new(r).lines().enumerate() {
        let line = i + 1;
        let l = l.map_err(|e| syntax(line, e.to_string()))?;
        let tokens: Vec<&str> = l.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        if tokens.len() != 2 {
            return Err(syntax(
                line,
                format!("expected <node> <0|1>, got {:?}", l.trim()),
            ));
        }
        let node = parse_name(tokens[0], line)?;
        let stuck = match tokens[1] {
            "0" => false,
            "1" => true,
            got => {
                return Err(Error::BadStuckValue {
                    got: got.to_string(),
                })
            }
        };
        faults.push(Fault::new(node, stuck));
    }
    Ok(faults)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_read() {
        let example = "
* a comment the reader warns about and skips
INPUT 1 2 -1
OUTPUT 5 -1

and 1 2 3
\tINV 3  5
";
        let ckt = read_netlist(example.as_bytes()).unwrap();
        assert_eq!(ckt.nb_inputs(), 2);
        assert_eq!(ckt.nb_outputs(), 1);
        assert_eq!(ckt.nb_gates(), 2);
        assert_eq!(ckt.gate(0).kind, GateKind::And);
        assert_eq!(ckt.gate(1).kind, GateKind::Inv);
        assert_eq!(ckt.node_name(ckt.gate(1).output), 5);
    }

    #[test]
    fn test_terminator_stops_the_list() {
        // tokens after -1 are ignored, and an unparsable token terminates too
        let ckt = read_netlist("INPUT 1 2 -1 3 4\nOUTPUT 2 x 3\nBUF 1 2\n".as_bytes()).unwrap();
        assert_eq!(ckt.nb_inputs(), 2);
        assert_eq!(ckt.nb_outputs(), 1);
    }

    #[test]
    fn test_read_write_roundtrip() {
        let example = "INPUT 1 2 -1\nOUTPUT 4 -1\nNAND 1 2 3\nINV 3 4\n";
        let ckt = read_netlist(example.as_bytes()).unwrap();
        let listing = ckt.to_string();
        assert_eq!(listing, "NAND 1 2 3\nINV 3 4\n");
        let reread = read_netlist(listing.as_bytes()).unwrap();
        assert_eq!(reread.nb_gates(), 2);
        assert_eq!(reread.gate(0).kind, GateKind::Nand);
    }

    #[test]
    fn test_bad_gate_line() {
        assert!(matches!(
            read_netlist("AND 1 2\n".as_bytes()),
            Err(Error::Syntax { line: 1, .. })
        ));
        assert!(matches!(
            read_netlist("INV 1 2 3\n".as_bytes()),
            Err(Error::Syntax { line: 1, .. })
        ));
        assert!(matches!(
            read_netlist("AND 1 x 3\n".as_bytes()),
            Err(Error::Syntax { line: 1, .. })
        ));
    }

    #[test]
    fn test_fault_list() {
        let faults = read_fault_list("1 0\n  3   1\n\n5 0\n".as_bytes()).unwrap();
        assert_eq!(
            faults,
            vec![
                Fault::new(1, false),
                Fault::new(3, true),
                Fault::new(5, false),
            ]
        );
        assert!(matches!(
            read_fault_list("1 2\n".as_bytes()),
            Err(Error::BadStuckValue { .. })
        ));
        assert!(matches!(
            read_fault_list("1\n".as_bytes()),
            Err(Error::Syntax { .. })
        ));
    }
}
