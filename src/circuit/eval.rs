use super::{Circuit, GateKind};
use crate::error::CircuitError;

/// Gate semantics over some wire value domain.
///
/// [`evaluate`] owns the traversal; implementors only say what each gate does to
/// already-computed wire values. The plain evaluator, the encoded evaluator and
/// the encryption-time planners all share it, so they visit the same gates
/// in the same order and read the same wires.
pub trait GateAlgebra {
    type Value;

    fn input(&mut self, gate: usize, a: &Self::Value) -> Result<Self::Value, CircuitError>;
    fn and(&mut self, gate: usize, a: &Self::Value, b: &Self::Value) -> Result<Self::Value, CircuitError>;
    fn or(&mut self, gate: usize, a: &Self::Value, b: &Self::Value) -> Result<Self::Value, CircuitError>;
    fn not(&mut self, gate: usize, a: &Self::Value) -> Result<Self::Value, CircuitError>;
}

fn load<V>(wires: &[V], gate: usize, wire: Option<usize>) -> Result<&V, CircuitError> {
    match wire {
        Some(w) if w < wires.len() => Ok(&wires[w]),
        w => Err(CircuitError::BadWireReference { gate, wire: w }),
    }
}

/// Single left-to-right pass over all wires; returns the output gate's wire.
pub fn evaluate<A: GateAlgebra>(
    circuit: &Circuit,
    inputs: Vec<A::Value>,
    algebra: &mut A,
) -> Result<A::Value, CircuitError> {
    if inputs.len() != circuit.num_inputs() {
        return Err(CircuitError::LengthMismatch {
            got: inputs.len(),
            want: circuit.num_inputs(),
        });
    }
    let gates = circuit.gates();
    if circuit.output_gate() >= gates.len() {
        return Err(CircuitError::BadOutputGate {
            output: circuit.output_gate(),
            gates: gates.len(),
        });
    }

    let mut wires = inputs;
    wires.reserve(gates.len());
    for (i, gate) in gates.iter().enumerate() {
        // `wires` holds exactly the wires below this gate's output index.
        let out = match gate.kind {
            GateKind::Input => {
                if gate.in2.is_some() {
                    return Err(CircuitError::MalformedGate { gate: i });
                }
                algebra.input(i, load(&wires, i, gate.in1)?)?
            }
            GateKind::And => {
                let a = load(&wires, i, gate.in1)?;
                let b = load(&wires, i, gate.in2)?;
                algebra.and(i, a, b)?
            }
            GateKind::Or => {
                let a = load(&wires, i, gate.in1)?;
                let b = load(&wires, i, gate.in2)?;
                algebra.or(i, a, b)?
            }
            GateKind::Not => {
                if gate.in2.is_some() {
                    return Err(CircuitError::MalformedGate { gate: i });
                }
                algebra.not(i, load(&wires, i, gate.in1)?)?
            }
        };
        wires.push(out);
    }

    let output = circuit.num_inputs() + circuit.output_gate();
    Ok(wires.swap_remove(output))
}

struct Bits;

impl GateAlgebra for Bits {
    type Value = bool;

    fn input(&mut self, _: usize, a: &bool) -> Result<bool, CircuitError> {
        Ok(*a)
    }

    fn and(&mut self, _: usize, a: &bool, b: &bool) -> Result<bool, CircuitError> {
        Ok(*a & *b)
    }

    fn or(&mut self, _: usize, a: &bool, b: &bool) -> Result<bool, CircuitError> {
        Ok(*a | *b)
    }

    fn not(&mut self, _: usize, a: &bool) -> Result<bool, CircuitError> {
        Ok(!*a)
    }
}

/// Evaluate on raw bits.
pub fn evaluate_plain(circuit: &Circuit, inputs: &[bool]) -> Result<bool, CircuitError> {
    evaluate(circuit, inputs.to_vec(), &mut Bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Gate;

    fn truth_table(c: &Circuit) -> Vec<bool> {
        (0..4u8)
            .map(|x| evaluate_plain(c, &[x & 2 != 0, x & 1 != 0]).unwrap())
            .collect()
    }

    #[test]
    fn basic_gates() {
        assert_eq!(truth_table(&Circuit::and2()), vec![false, false, false, true]);
        let or = Circuit::new(2, vec![Gate::or(0, 1)], 0).unwrap();
        assert_eq!(truth_table(&or), vec![false, true, true, true]);
        let nand = Circuit::new(2, vec![Gate::and(0, 1), Gate::not(2)], 1).unwrap();
        assert_eq!(truth_table(&nand), vec![true, true, true, false]);
        let first = Circuit::new(2, vec![Gate::input(0)], 0).unwrap();
        assert_eq!(truth_table(&first), vec![false, false, true, true]);
    }

    #[test]
    fn output_gate_need_not_be_last() {
        // gates: w2 = a & b, w3 = !w2; output the AND.
        let c = Circuit::new(2, vec![Gate::and(0, 1), Gate::not(2)], 0).unwrap();
        assert!(evaluate_plain(&c, &[true, true]).unwrap());
    }

    #[test]
    fn xor_from_and_or_not() {
        // (a | b) & !(a & b)
        let gates = vec![Gate::or(0, 1), Gate::and(0, 1), Gate::not(3), Gate::and(2, 4)];
        let xor = Circuit::new(2, gates, 3).unwrap();
        assert_eq!(truth_table(&xor), vec![false, true, true, false]);
    }

    #[test]
    fn length_mismatch() {
        let err = evaluate_plain(&Circuit::and2(), &[true]).unwrap_err();
        assert!(matches!(err, CircuitError::LengthMismatch { got: 1, want: 2 }));
    }
}
