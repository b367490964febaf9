//! Boolean circuits and their two evaluators.
//!
//! Wires are numbered `0..num_inputs` for circuit inputs, then one wire per gate
//! in gate-list order. A gate may only read wires with a strictly smaller index
//! than its own output, so a single left-to-right pass evaluates the circuit.

mod encoded;
mod eval;

pub use encoded::{evaluate_encoded, GateAux};
pub(crate) use encoded::at_gate;
pub use eval::{evaluate, evaluate_plain, GateAlgebra};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CircuitError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateKind {
    Input,
    And,
    Or,
    Not,
}

impl GateKind {
    pub fn code(self) -> u8 {
        match self {
            GateKind::Input => 0,
            GateKind::And => 1,
            GateKind::Or => 2,
            GateKind::Not => 3,
        }
    }
}

impl TryFrom<u8> for GateKind {
    type Error = CircuitError;

    fn try_from(code: u8) -> Result<Self, CircuitError> {
        match code {
            0 => Ok(GateKind::Input),
            1 => Ok(GateKind::And),
            2 => Ok(GateKind::Or),
            3 => Ok(GateKind::Not),
            code => Err(CircuitError::UnknownGateType { code }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    pub kind: GateKind,
    pub in1: Option<usize>,
    pub in2: Option<usize>,
}

impl Gate {
    pub fn input(wire: usize) -> Self {
        Self { kind: GateKind::Input, in1: Some(wire), in2: None }
    }

    pub fn and(a: usize, b: usize) -> Self {
        Self { kind: GateKind::And, in1: Some(a), in2: Some(b) }
    }

    pub fn or(a: usize, b: usize) -> Self {
        Self { kind: GateKind::Or, in1: Some(a), in2: Some(b) }
    }

    pub fn not(a: usize) -> Self {
        Self { kind: GateKind::Not, in1: Some(a), in2: None }
    }

    /// Build a gate from its raw form: a type code and two wire indices where
    /// `-1` means "unused". `gate` is the position used in error reports.
    pub fn from_raw(gate: usize, code: u8, in1: i64, in2: i64) -> Result<Self, CircuitError> {
        let kind = GateKind::try_from(code)?;
        let wire = |w: i64| -> Result<Option<usize>, CircuitError> {
            match w {
                -1 => Ok(None),
                w => usize::try_from(w)
                    .map(Some)
                    .map_err(|_| CircuitError::BadWireReference { gate, wire: None }),
            }
        };
        Ok(Self { kind, in1: wire(in1)?, in2: wire(in2)? })
    }

    fn raw_wire(w: Option<usize>) -> i64 {
        w.map_or(-1, |w| w as i64)
    }
}

/// A validated, acyclic boolean circuit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCircuit", into = "RawCircuit")]
pub struct Circuit {
    num_inputs: usize,
    gates: Vec<Gate>,
    output_gate: usize,
}

#[derive(Clone, Serialize, Deserialize)]
struct RawCircuit {
    num_inputs: usize,
    gates: Vec<Gate>,
    output_gate: usize,
}

impl TryFrom<RawCircuit> for Circuit {
    type Error = CircuitError;

    fn try_from(raw: RawCircuit) -> Result<Self, CircuitError> {
        Circuit::new(raw.num_inputs, raw.gates, raw.output_gate)
    }
}

impl From<Circuit> for RawCircuit {
    fn from(c: Circuit) -> Self {
        RawCircuit { num_inputs: c.num_inputs, gates: c.gates, output_gate: c.output_gate }
    }
}

impl Circuit {
    pub fn new(num_inputs: usize, gates: Vec<Gate>, output_gate: usize) -> Result<Self, CircuitError> {
        let circuit = Self { num_inputs, gates, output_gate };
        circuit.validate()?;
        Ok(circuit)
    }

    /// `a AND b`.
    pub fn and2() -> Self {
        Self { num_inputs: 2, gates: vec![Gate::and(0, 1)], output_gate: 0 }
    }

    /// One input forwarded through a single `Input` gate.
    pub fn pass_through() -> Self {
        Self { num_inputs: 1, gates: vec![Gate::input(0)], output_gate: 0 }
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn output_gate(&self) -> usize {
        self.output_gate
    }

    pub fn total_wires(&self) -> usize {
        self.num_inputs + self.gates.len()
    }

    /// Structural checks: output gate in range, every gate reads only earlier
    /// wires, unary gates carry no second input.
    pub fn validate(&self) -> Result<(), CircuitError> {
        if self.output_gate >= self.gates.len() {
            return Err(CircuitError::BadOutputGate {
                output: self.output_gate,
                gates: self.gates.len(),
            });
        }
        for (i, gate) in self.gates.iter().enumerate() {
            let avail = self.num_inputs + i;
            let check = |w: Option<usize>| match w {
                Some(w) if w < avail => Ok(()),
                w => Err(CircuitError::BadWireReference { gate: i, wire: w }),
            };
            match gate.kind {
                GateKind::Input | GateKind::Not => {
                    check(gate.in1)?;
                    if gate.in2.is_some() {
                        return Err(CircuitError::MalformedGate { gate: i });
                    }
                }
                GateKind::And | GateKind::Or => {
                    check(gate.in1)?;
                    check(gate.in2)?;
                }
            }
        }
        Ok(())
    }

    /// Domain-separated SHA-256 over the circuit's canonical layout.
    pub fn digest(&self) -> [u8; 32] {
        let mut h = Sha256::new();
        h.update(b"GRADED_WE_CIRCUIT_V1");
        h.update((self.num_inputs as u64).to_le_bytes());
        h.update((self.gates.len() as u64).to_le_bytes());
        for gate in &self.gates {
            h.update([gate.kind.code()]);
            h.update(Gate::raw_wire(gate.in1).to_le_bytes());
            h.update(Gate::raw_wire(gate.in2).to_le_bytes());
        }
        h.update((self.output_gate as u64).to_le_bytes());
        h.finalize().into()
    }
}
