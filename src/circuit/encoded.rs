use ges_backend::GradedEncoding;

use super::eval::{evaluate, GateAlgebra};
use super::Circuit;
use crate::error::{CircuitError, GesError};
use crate::ges::{Context, GradedElement};

/// Per-gate auxiliary encodings, one variant per gate type.
///
/// Each variant holds the gate's truth table: the row for operand bits `x`
/// (and `y`) encodes the pieces that read those operand values together with
/// the piece that defines the output wire as `g(x, y)`. There is no separate
/// complement or constant element; `Not` and `Or` are tables like `And`.
pub enum GateAux<B: GradedEncoding> {
    /// `rows[x]`, output `x`.
    Input { rows: [GradedElement<B>; 2] },
    /// `rows[x][y]`, output `x & y`.
    And { rows: [[GradedElement<B>; 2]; 2] },
    /// `rows[x][y]`, output `x | y`.
    Or { rows: [[GradedElement<B>; 2]; 2] },
    /// `rows[x]`, output `!x`.
    Not { rows: [GradedElement<B>; 2] },
}

impl<B: GradedEncoding> GateAux<B> {
    pub fn name(&self) -> &'static str {
        match self {
            GateAux::Input { .. } => "input",
            GateAux::And { .. } => "and",
            GateAux::Or { .. } => "or",
            GateAux::Not { .. } => "not",
        }
    }

    /// Every row element, in table order.
    pub fn rows(&self) -> Vec<&GradedElement<B>> {
        match self {
            GateAux::Input { rows } | GateAux::Not { rows } => rows.iter().collect(),
            GateAux::And { rows } | GateAux::Or { rows } => rows.iter().flatten().collect(),
        }
    }
}

impl<B: GradedEncoding> Clone for GateAux<B> {
    fn clone(&self) -> Self {
        match self {
            GateAux::Input { rows } => GateAux::Input { rows: rows.clone() },
            GateAux::And { rows } => GateAux::And { rows: rows.clone() },
            GateAux::Or { rows } => GateAux::Or { rows: rows.clone() },
            GateAux::Not { rows } => GateAux::Not { rows: rows.clone() },
        }
    }
}

impl<B: GradedEncoding> core::fmt::Debug for GateAux<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "GateAux::{}", self.name())
    }
}

/// Wire values are the witness bits; every gate multiplies the row they select
/// into one running product.
struct Encoded<'a, B: GradedEncoding> {
    aux: &'a [GateAux<B>],
    acc: GradedElement<B>,
}

impl<'a, B: GradedEncoding> Encoded<'a, B> {
    fn aux(&self, gate: usize) -> Result<&'a GateAux<B>, CircuitError> {
        self.aux.get(gate).ok_or(CircuitError::AuxMismatch { gate })
    }

    fn absorb(&mut self, gate: usize, row: &GradedElement<B>) -> Result<(), CircuitError> {
        self.acc = self.acc.mul(row).map_err(at_gate(gate))?;
        Ok(())
    }
}

pub(crate) fn at_gate(gate: usize) -> impl FnOnce(GesError) -> CircuitError {
    move |source| CircuitError::CircuitEvalError { gate, source }
}

impl<B: GradedEncoding> GateAlgebra for Encoded<'_, B> {
    type Value = bool;

    fn input(&mut self, gate: usize, a: &bool) -> Result<bool, CircuitError> {
        let GateAux::Input { rows } = self.aux(gate)? else {
            return Err(CircuitError::AuxMismatch { gate });
        };
        self.absorb(gate, &rows[usize::from(*a)])?;
        Ok(*a)
    }

    fn and(&mut self, gate: usize, a: &bool, b: &bool) -> Result<bool, CircuitError> {
        let GateAux::And { rows } = self.aux(gate)? else {
            return Err(CircuitError::AuxMismatch { gate });
        };
        self.absorb(gate, &rows[usize::from(*a)][usize::from(*b)])?;
        Ok(*a & *b)
    }

    fn or(&mut self, gate: usize, a: &bool, b: &bool) -> Result<bool, CircuitError> {
        let GateAux::Or { rows } = self.aux(gate)? else {
            return Err(CircuitError::AuxMismatch { gate });
        };
        self.absorb(gate, &rows[usize::from(*a)][usize::from(*b)])?;
        Ok(*a | *b)
    }

    fn not(&mut self, gate: usize, a: &bool) -> Result<bool, CircuitError> {
        let GateAux::Not { rows } = self.aux(gate)? else {
            return Err(CircuitError::AuxMismatch { gate });
        };
        self.absorb(gate, &rows[usize::from(*a)])?;
        Ok(!*a)
    }
}

/// Evaluate the circuit homomorphically over graded elements.
///
/// `wires` is the `[wire][bit]` input table and `witness` picks one entry per
/// wire; `aux` holds one entry per gate. Returns the product of the selected
/// input encodings and of every gate row the witness reaches. Its level records
/// which output piece is still missing, so exactly one of the two output lifts
/// completes it to the top index.
pub fn evaluate_encoded<B: GradedEncoding>(
    circuit: &Circuit,
    ctx: &Context<B>,
    wires: &[[GradedElement<B>; 2]],
    witness: &[bool],
    aux: &[GateAux<B>],
) -> Result<GradedElement<B>, CircuitError> {
    let want = circuit.num_inputs();
    for got in [witness.len(), wires.len()] {
        if got != want {
            return Err(CircuitError::LengthMismatch { got, want });
        }
    }
    if aux.len() != circuit.gates().len() {
        return Err(CircuitError::AuxMismatch {
            gate: aux.len().min(circuit.gates().len()),
        });
    }
    let selected: Vec<&GradedElement<B>> = wires
        .iter()
        .zip(witness)
        .map(|(pair, &bit)| &pair[usize::from(bit)])
        .collect();
    if let Some(wire) = selected.iter().position(|e| !ctx.owns(e)) {
        return Err(CircuitError::ForeignEncoding { wire });
    }

    let (first, rest) = selected
        .split_first()
        .ok_or(CircuitError::LengthMismatch { got: 0, want })?;
    let mut acc = (*first).clone();
    for (i, e) in rest.iter().enumerate() {
        acc = acc
            .mul(e)
            .map_err(|source| CircuitError::InputEncoding { wire: i + 1, source })?;
    }

    let mut algebra = Encoded { aux, acc };
    evaluate(circuit, witness.to_vec(), &mut algebra)?;
    tracing::trace!(level = %algebra.acc.index(), "encoded evaluation finished");
    Ok(algebra.acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::we::{compile, ges_params, CompiledCircuit};
    use crate::DefaultBackend;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    type Ctx = Context<DefaultBackend>;

    fn compiled(seed: u64) -> (Ctx, CompiledCircuit<DefaultBackend>) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let ctx = Ctx::setup(&ges_params(&Circuit::and2(), 128).unwrap(), &mut rng).unwrap();
        let compiled = compile(&Circuit::and2(), &ctx, &mut rng).unwrap();
        (ctx, compiled)
    }

    #[test]
    fn lengths_are_checked_before_aux_and_ownership() {
        let (_ctx, c) = compiled(1);
        let (other, _) = compiled(2);
        let and2 = Circuit::and2();

        let err = evaluate_encoded(&and2, &other, &c.wire_encodings[..1], &[true, true], &[])
            .unwrap_err();
        assert!(matches!(err, CircuitError::LengthMismatch { got: 1, want: 2 }));

        let err = evaluate_encoded(&and2, &other, &c.wire_encodings, &[true], &[]).unwrap_err();
        assert!(matches!(err, CircuitError::LengthMismatch { got: 1, want: 2 }));

        let err = evaluate_encoded(&and2, &other, &c.wire_encodings, &[true, true], &[])
            .unwrap_err();
        assert!(matches!(err, CircuitError::AuxMismatch { gate: 0 }));

        let err = evaluate_encoded(&and2, &other, &c.wire_encodings, &[true, true], &c.gate_aux)
            .unwrap_err();
        assert!(matches!(err, CircuitError::ForeignEncoding { wire: 0 }));
    }

    #[test]
    fn aux_kind_must_match_gate() {
        let (ctx, c) = compiled(3);
        let wrong = [GateAux::Not { rows: c.wire_encodings[0].clone() }];
        let err = evaluate_encoded(&Circuit::and2(), &ctx, &c.wire_encodings, &[true, true], &wrong)
            .unwrap_err();
        assert!(matches!(err, CircuitError::AuxMismatch { gate: 0 }));
        assert_eq!(wrong[0].name(), "not");
        assert_eq!(c.gate_aux[0].rows().len(), 4);
    }

    #[test]
    fn honest_product_leaves_one_output_piece() {
        let (ctx, c) = compiled(4);
        for bits in [[false, false], [true, false], [true, true]] {
            let out =
                evaluate_encoded(&Circuit::and2(), &ctx, &c.wire_encodings, &bits, &c.gate_aux)
                    .unwrap();
            let lift = c.lift_level(bits[0] && bits[1]);
            assert_eq!(out.index().checked_add(lift).as_ref(), Some(ctx.top_index()));
        }
    }
}
