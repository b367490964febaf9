//! Straddling-set slot layout.
//!
//! Every wire `w` is split into `k_w` pieces: piece 0 defines the wire (the
//! witness choice for an input, the gate row for a gate output) and pieces
//! `1..` are consumed by the gates that read it, in gate and operand order. The
//! output wire gets one extra piece, consumed by the output lift.
//!
//! Each wire owns `2k - 1` private slots. For bit `b`, piece `j` covers one or
//! two of them (see [`straddle`]) such that the pieces of one bit partition the
//! wire's slots and no mix of pieces from both bits does. With a top index of
//! one per slot, reaching the top therefore forces every wire to carry a single
//! consistent value throughout the product.

use crate::circuit::{evaluate, Circuit, GateAlgebra};
use crate::error::CircuitError;

/// Local slots of piece `j` of bit `bit` on a wire with `k` pieces.
pub(crate) fn straddle(k: usize, j: usize, bit: bool) -> (usize, Option<usize>) {
    match (bit, j) {
        (false, 0) => (0, None),
        (false, j) => (2 * j - 1, Some(2 * j)),
        (true, j) if j + 1 == k => (2 * j, None),
        (true, j) => (2 * j, Some(2 * j + 1)),
    }
}

/// Counts reads per wire; wire values are wire indices.
struct Reads {
    num_inputs: usize,
    reads: Vec<usize>,
}

impl Reads {
    fn read(&mut self, gate: usize, wires: &[usize]) -> usize {
        for &w in wires {
            self.reads[w] += 1;
        }
        self.num_inputs + gate
    }
}

impl GateAlgebra for Reads {
    type Value = usize;

    fn input(&mut self, gate: usize, a: &usize) -> Result<usize, CircuitError> {
        Ok(self.read(gate, &[*a]))
    }

    fn and(&mut self, gate: usize, a: &usize, b: &usize) -> Result<usize, CircuitError> {
        Ok(self.read(gate, &[*a, *b]))
    }

    fn or(&mut self, gate: usize, a: &usize, b: &usize) -> Result<usize, CircuitError> {
        Ok(self.read(gate, &[*a, *b]))
    }

    fn not(&mut self, gate: usize, a: &usize) -> Result<usize, CircuitError> {
        Ok(self.read(gate, &[*a]))
    }
}

/// Piece counts and slot offsets of every wire of one circuit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Layout {
    pieces: Vec<usize>,
    base: Vec<usize>,
    output: usize,
    slots: usize,
}

impl Layout {
    pub(crate) fn new(circuit: &Circuit) -> Result<Self, CircuitError> {
        let total = circuit.total_wires();
        let mut counter = Reads {
            num_inputs: circuit.num_inputs(),
            reads: vec![0; total],
        };
        let output = evaluate(circuit, (0..circuit.num_inputs()).collect(), &mut counter)?;
        counter.reads[output] += 1;

        let pieces: Vec<usize> = counter.reads.iter().map(|r| r + 1).collect();
        let mut base = Vec::with_capacity(total);
        let mut slots = 0;
        for k in &pieces {
            base.push(slots);
            slots += 2 * k - 1;
        }
        Ok(Self { pieces, base, output, slots })
    }

    /// Slots used by the whole circuit.
    pub(crate) fn slots(&self) -> usize {
        self.slots
    }

    pub(crate) fn total_wires(&self) -> usize {
        self.pieces.len()
    }

    pub(crate) fn pieces(&self, wire: usize) -> usize {
        self.pieces[wire]
    }

    /// Global slots of piece `j` of `wire` carrying `bit`.
    pub(crate) fn piece(&self, wire: usize, j: usize, bit: bool) -> impl Iterator<Item = usize> {
        let base = self.base[wire];
        let (first, second) = straddle(self.pieces[wire], j, bit);
        core::iter::once(base + first).chain(second.map(move |s| base + s))
    }

    /// The piece left for the output lift when the output wire carries `bit`.
    pub(crate) fn output_piece(&self, bit: bool) -> impl Iterator<Item = usize> {
        self.piece(self.output, self.pieces[self.output] - 1, bit)
    }
}
