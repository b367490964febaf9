//! Witness encryption over boolean circuits.
//!
//! Encryption lays the circuit out on straddling slot sets (see `cover`):
//! every input bit and every gate truth-table row is an encoding of a random
//! weight product at the level of the pieces it covers. A witness picks one
//! encoding per input wire and one row per gate; the product misses exactly
//! one piece of the output wire, and that piece depends on the output bit. Two
//! lifts complete it to the top index: the one for output 1 carries the key
//! scalar, the one for output 0 an unrelated scalar. The symmetric key is
//! masked with a hash of the extracted top-level element.

mod cover;
mod types;

pub use types::{
    Ciphertext, CiphertextBlob, CompiledCircuit, GateAuxBlob, OutputMask, OutputMaskBlob,
    Statement,
};

use ark_ff::{One, Zero};
use ark_std::UniformRand;
use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use ges_backend::{GesParams, GradedEncoding};

use crate::aead;
use crate::circuit::{at_gate, evaluate, evaluate_encoded, Circuit, GateAlgebra, GateAux};
use crate::error::{CircuitError, GesError, WeError};
use crate::ges::{Context, GradedElement, Level};
use cover::Layout;

/// Secret per-slot weights, wiped on drop.
struct Weights<F: Zeroize>(Vec<F>);

impl<F: ark_ff::Field> Weights<F> {
    fn sample<R: RngCore + CryptoRng>(slots: usize, rng: &mut R) -> Self {
        let nonzero = |rng: &mut R| loop {
            let a = F::rand(rng);
            if !a.is_zero() {
                break a;
            }
        };
        Self((0..slots).map(|_| nonzero(rng)).collect())
    }

    fn product(&self, slots: &[usize]) -> F {
        slots.iter().fold(F::one(), |acc, &j| acc * self.0[j])
    }
}

impl<F: Zeroize> Drop for Weights<F> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Walks the circuit over wire indices, emitting each gate's truth table.
struct CoverPlanner<'a, B: GradedEncoding> {
    ctx: &'a Context<B>,
    layout: &'a Layout,
    weights: &'a Weights<B::Scalar>,
    num_inputs: usize,
    next_read: Vec<usize>,
    aux: Vec<GateAux<B>>,
}

impl<B: GradedEncoding> CoverPlanner<'_, B> {
    fn read(&mut self, wire: usize) -> usize {
        let j = self.next_read[wire];
        self.next_read[wire] += 1;
        j
    }

    /// Row reading `(wire, piece, bit)` operands and defining `out` as `z`.
    fn row(
        &self,
        gate: usize,
        operands: &[(usize, usize, bool)],
        z: bool,
    ) -> Result<GradedElement<B>, CircuitError> {
        let out = self.num_inputs + gate;
        let slots: Vec<usize> = operands
            .iter()
            .flat_map(|&(w, j, x)| self.layout.piece(w, j, x))
            .chain(self.layout.piece(out, 0, z))
            .collect();
        let mut value = self.weights.product(&slots);
        let level = Level::covering(self.ctx.num_slots(), slots);
        let row = self.ctx.encode(&value, &level).map_err(at_gate(gate));
        value.zeroize();
        row
    }

    fn unary(
        &mut self,
        gate: usize,
        a: usize,
        f: fn(bool) -> bool,
    ) -> Result<[GradedElement<B>; 2], CircuitError> {
        let j = self.read(a);
        let row = |x: bool| self.row(gate, &[(a, j, x)], f(x));
        Ok([row(false)?, row(true)?])
    }

    fn binary(
        &mut self,
        gate: usize,
        a: usize,
        b: usize,
        f: fn(bool, bool) -> bool,
    ) -> Result<[[GradedElement<B>; 2]; 2], CircuitError> {
        let ja = self.read(a);
        let jb = self.read(b);
        let row = |x: bool, y: bool| self.row(gate, &[(a, ja, x), (b, jb, y)], f(x, y));
        Ok([
            [row(false, false)?, row(false, true)?],
            [row(true, false)?, row(true, true)?],
        ])
    }
}

impl<B: GradedEncoding> GateAlgebra for CoverPlanner<'_, B> {
    type Value = usize;

    fn input(&mut self, gate: usize, a: &usize) -> Result<usize, CircuitError> {
        let rows = self.unary(gate, *a, |x| x)?;
        self.aux.push(GateAux::Input { rows });
        Ok(self.num_inputs + gate)
    }

    fn and(&mut self, gate: usize, a: &usize, b: &usize) -> Result<usize, CircuitError> {
        let rows = self.binary(gate, *a, *b, |x, y| x & y)?;
        self.aux.push(GateAux::And { rows });
        Ok(self.num_inputs + gate)
    }

    fn or(&mut self, gate: usize, a: &usize, b: &usize) -> Result<usize, CircuitError> {
        let rows = self.binary(gate, *a, *b, |x, y| x | y)?;
        self.aux.push(GateAux::Or { rows });
        Ok(self.num_inputs + gate)
    }

    fn not(&mut self, gate: usize, a: &usize) -> Result<usize, CircuitError> {
        let rows = self.unary(gate, *a, |x| !x)?;
        self.aux.push(GateAux::Not { rows });
        Ok(self.num_inputs + gate)
    }
}

fn encoding_error(e: CircuitError) -> WeError {
    match e {
        CircuitError::CircuitEvalError { gate, source } => WeError::EncodingError {
            gate: Some(gate),
            source,
        },
        other => WeError::StatementError(other),
    }
}

fn top_encoding_error(source: GesError) -> WeError {
    WeError::EncodingError { gate: None, source }
}

/// Graded encoding parameters sized for `circuit`: one slot per layout slot,
/// each with top component 1.
pub fn ges_params(circuit: &Circuit, lambda: u32) -> Result<GesParams, WeError> {
    circuit.validate().map_err(WeError::StatementError)?;
    let layout = Layout::new(circuit).map_err(WeError::StatementError)?;
    Ok(GesParams::with_top(lambda, vec![1; layout.slots()]))
}

/// Produce fresh wire encodings and gate truth tables for `circuit` under `ctx`.
///
/// `ctx` needs at least the slots [`ges_params`] asks for, each with a
/// positive top component; anything above that is absorbed by the lifts.
pub fn compile<B: GradedEncoding, R: RngCore + CryptoRng>(
    circuit: &Circuit,
    ctx: &Context<B>,
    rng: &mut R,
) -> Result<CompiledCircuit<B>, WeError> {
    compile_with_weights(circuit, ctx, rng).map(|(compiled, ..)| compiled)
}

fn compile_with_weights<B: GradedEncoding, R: RngCore + CryptoRng>(
    circuit: &Circuit,
    ctx: &Context<B>,
    rng: &mut R,
) -> Result<(CompiledCircuit<B>, Layout, Weights<B::Scalar>), WeError> {
    circuit.validate().map_err(WeError::StatementError)?;
    let layout = Layout::new(circuit).map_err(WeError::StatementError)?;
    let top = ctx.top_index();
    let slots = ctx.num_slots().max(layout.slots());
    let all = Level::covering(slots, 0..layout.slots());
    let gap = top.checked_sub(&all).ok_or_else(|| {
        top_encoding_error(GesError::InvalidIndex {
            index: all.clone(),
            top: top.clone(),
        })
    })?;

    let weights = Weights::sample(layout.slots(), rng);
    let encode_piece = |slots: Vec<usize>| {
        let mut value = weights.product(&slots);
        let e = ctx.encode(&value, &Level::covering(ctx.num_slots(), slots));
        value.zeroize();
        e.map_err(top_encoding_error)
    };
    let wire_encodings = (0..circuit.num_inputs())
        .map(|w| {
            Ok([
                encode_piece(layout.piece(w, 0, false).collect())?,
                encode_piece(layout.piece(w, 0, true).collect())?,
            ])
        })
        .collect::<Result<Vec<_>, WeError>>()?;

    let mut planner = CoverPlanner {
        ctx,
        layout: &layout,
        weights: &weights,
        num_inputs: circuit.num_inputs(),
        next_read: vec![1; layout.total_wires()],
        aux: Vec::with_capacity(circuit.gates().len()),
    };
    let output = evaluate(circuit, (0..circuit.num_inputs()).collect(), &mut planner)
        .map_err(encoding_error)?;
    debug_assert!((0..layout.total_wires())
        .all(|w| planner.next_read[w] + usize::from(w == output) == layout.pieces(w)));
    let CoverPlanner { aux: gate_aux, .. } = planner;

    let lift = |bit: bool| {
        let piece = Level::covering(ctx.num_slots(), layout.output_piece(bit));
        gap.checked_add(&piece).ok_or_else(|| {
            top_encoding_error(GesError::InvalidIndex {
                index: piece,
                top: top.clone(),
            })
        })
    };
    let lift_levels = [lift(false)?, lift(true)?];

    tracing::debug!(
        inputs = circuit.num_inputs(),
        gates = gate_aux.len(),
        slots = layout.slots(),
        "circuit compiled"
    );
    let compiled = CompiledCircuit {
        wire_encodings,
        gate_aux,
        lift_levels,
    };
    Ok((compiled, layout, weights))
}

fn output_mask<B: GradedEncoding>(
    ctx: &Context<B>,
    compiled: &CompiledCircuit<B>,
    layout: &Layout,
    weights: &Weights<B::Scalar>,
    secret: &B::Scalar,
    decoy: &B::Scalar,
) -> Result<OutputMask<B>, WeError> {
    let opened: Vec<usize> = layout.output_piece(true).collect();
    let mut value = *secret * weights.product(&opened);
    let secret = ctx.encode(&value, compiled.lift_level(true));
    value.zeroize();
    Ok(OutputMask {
        secret: secret.map_err(top_encoding_error)?,
        decoy: ctx
            .encode(decoy, compiled.lift_level(false))
            .map_err(top_encoding_error)?,
    })
}

/// Key mask from a top-level element's extracted bytes, bound to the statement.
pub fn derive_pad(statement_digest: &[u8; 32], top_bytes: &[u8]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(b"GRADED_WE_KEY_MASK_V1");
    h.update(statement_digest);
    h.update((top_bytes.len() as u64).to_le_bytes());
    h.update(top_bytes);
    h.finalize().into()
}

fn xor_into(dst: &mut [u8; 32], pad: &[u8; 32]) {
    for (d, p) in dst.iter_mut().zip(pad) {
        *d ^= p;
    }
}

/// Encrypt `message` so that any witness satisfying `statement` opens it.
pub fn encrypt<B: GradedEncoding, R: RngCore + CryptoRng>(
    statement: &Statement,
    ctx: &Context<B>,
    message: &[u8],
    rng: &mut R,
) -> Result<Ciphertext<B>, WeError> {
    let (compiled, layout, weights) = compile_with_weights(statement.circuit(), ctx, rng)?;
    let digest = statement.digest();

    let mut secret = B::Scalar::rand(rng);
    let mut decoy = B::Scalar::rand(rng);
    let mask = output_mask(ctx, &compiled, &layout, &weights, &secret, &decoy);
    let all: Vec<usize> = (0..layout.slots()).collect();
    let mut key_value = secret * weights.product(&all);
    let target = ctx
        .encode_top(&key_value)
        .and_then(|t| t.extract())
        .map_err(top_encoding_error);
    secret.zeroize();
    decoy.zeroize();
    key_value.zeroize();
    drop(weights);
    let output_mask = mask?;
    let mut target = target?;

    let mut pad = derive_pad(&digest, &target);
    target.zeroize();

    let mut key = [0u8; 32];
    rng.fill_bytes(&mut key);
    let sealed = aead::seal(&key, message, &digest, rng);
    let mut masked_key = key;
    xor_into(&mut masked_key, &pad);
    key.zeroize();
    pad.zeroize();
    let sealed_message = sealed.map_err(WeError::Seal)?;

    tracing::debug!(
        wires = compiled.wire_encodings.len(),
        gates = compiled.gate_aux.len(),
        sealed_len = sealed_message.len(),
        "witness encryption done"
    );
    Ok(Ciphertext {
        wire_encodings: compiled.wire_encodings,
        gate_aux: compiled.gate_aux,
        output_mask,
        masked_key,
        sealed_message,
    })
}

/// Only a dead context is reported; every other failure is indistinguishable.
fn collapse_circuit(e: CircuitError) -> WeError {
    match e {
        CircuitError::CircuitEvalError {
            gate,
            source: GesError::UseAfterRelease,
        } => WeError::EncodingError {
            gate: Some(gate),
            source: GesError::UseAfterRelease,
        },
        CircuitError::InputEncoding {
            source: GesError::UseAfterRelease,
            ..
        } => top_encoding_error(GesError::UseAfterRelease),
        _ => WeError::DecryptionFailed,
    }
}

fn collapse_ges(e: GesError) -> WeError {
    match e {
        GesError::UseAfterRelease => top_encoding_error(e),
        _ => WeError::DecryptionFailed,
    }
}

/// Recover the message with `witness`. The AEAD tag is the only check made;
/// any witness that does not satisfy the circuit fails with `DecryptionFailed`,
/// as does a corrupted ciphertext.
pub fn decrypt<B: GradedEncoding>(
    statement: &Statement,
    ctx: &Context<B>,
    witness: &[bool],
    ct: &Ciphertext<B>,
) -> Result<Vec<u8>, WeError> {
    let circuit = statement.circuit();
    if witness.len() != circuit.num_inputs() {
        return Err(WeError::WitnessLengthError {
            got: witness.len(),
            want: circuit.num_inputs(),
        });
    }

    let result = evaluate_encoded(circuit, ctx, &ct.wire_encodings, witness, &ct.gate_aux)
        .map_err(collapse_circuit)
        .and_then(|out| ct.output_mask.apply(&out).map_err(collapse_ges))
        .and_then(|top| top.extract().map_err(collapse_ges))
        .and_then(|mut candidate| {
            let digest = statement.digest();
            let mut key = ct.masked_key;
            let mut pad = derive_pad(&digest, &candidate);
            xor_into(&mut key, &pad);
            let opened = aead::open(&key, &ct.sealed_message, &digest);
            key.zeroize();
            pad.zeroize();
            candidate.zeroize();
            opened.map_err(|_| WeError::DecryptionFailed)
        });
    if result.is_err() {
        tracing::debug!("decryption attempt failed");
    }
    result
}
