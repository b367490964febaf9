use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use ges_backend::GradedEncoding;

use crate::circuit::{Circuit, GateAux};
use crate::error::{GesError, WeError};
use crate::ges::{Context, EncodingBlob, GradedElement, Level};

/// A circuit plus the public parameters that define what a satisfying witness is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    circuit: Circuit,
    #[serde(with = "hex::serde")]
    public_params: Vec<u8>,
}

impl Statement {
    pub fn new(circuit: Circuit) -> Self {
        Self { circuit, public_params: Vec::new() }
    }

    pub fn with_public_params(circuit: Circuit, public_params: Vec<u8>) -> Self {
        Self { circuit, public_params }
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn public_params(&self) -> &[u8] {
        &self.public_params
    }

    /// Binding hash over the circuit and public parameters.
    pub fn digest(&self) -> [u8; 32] {
        let mut h = Sha256::new();
        h.update(b"GRADED_WE_STATEMENT_V1");
        h.update(self.circuit.digest());
        h.update((self.public_params.len() as u64).to_le_bytes());
        h.update(&self.public_params);
        h.finalize().into()
    }
}

/// The two output lifts. `secret` carries the key scalar and completes the
/// piece a satisfying evaluation leaves open; `decoy` carries an unrelated
/// scalar and completes the piece any other evaluation leaves open. The two
/// overlap on one slot, so no product holds both.
pub struct OutputMask<B: GradedEncoding> {
    pub(crate) secret: GradedElement<B>,
    pub(crate) decoy: GradedElement<B>,
}

impl<B: GradedEncoding> OutputMask<B> {
    /// Complete `out` to the top index with whichever lift fits.
    pub(crate) fn apply(&self, out: &GradedElement<B>) -> Result<GradedElement<B>, GesError> {
        for lift in [&self.secret, &self.decoy] {
            let lifted = match out.mul(lift) {
                Ok(e) => e,
                Err(GesError::LevelOverflow { .. }) => continue,
                Err(e) => return Err(e),
            };
            if lifted.is_top()? {
                return Ok(lifted);
            }
        }
        Err(GesError::NotTopLevel(out.index().clone()))
    }
}

impl<B: GradedEncoding> Clone for OutputMask<B> {
    fn clone(&self) -> Self {
        Self {
            secret: self.secret.clone(),
            decoy: self.decoy.clone(),
        }
    }
}

/// Public per-wire and per-gate encodings produced when compiling a circuit.
pub struct CompiledCircuit<B: GradedEncoding> {
    /// `[wire][bit]`.
    pub wire_encodings: Vec<[GradedElement<B>; 2]>,
    pub gate_aux: Vec<GateAux<B>>,
    /// `[bit]`: level of the lift that completes an evaluation whose output
    /// wire carries `bit`.
    pub lift_levels: [Level; 2],
}

impl<B: GradedEncoding> CompiledCircuit<B> {
    pub fn lift_level(&self, bit: bool) -> &Level {
        &self.lift_levels[usize::from(bit)]
    }
}

fn pair<T, U, E>(p: &[T; 2], mut f: impl FnMut(&T) -> Result<U, E>) -> Result<[U; 2], E> {
    let [a, b] = p;
    Ok([f(a)?, f(b)?])
}

/// Self-contained witness-encryption ciphertext.
pub struct Ciphertext<B: GradedEncoding> {
    pub(crate) wire_encodings: Vec<[GradedElement<B>; 2]>,
    pub(crate) gate_aux: Vec<GateAux<B>>,
    pub(crate) output_mask: OutputMask<B>,
    pub(crate) masked_key: [u8; 32],
    pub(crate) sealed_message: Vec<u8>,
}

impl<B: GradedEncoding> Clone for Ciphertext<B> {
    fn clone(&self) -> Self {
        Self {
            wire_encodings: self.wire_encodings.clone(),
            gate_aux: self.gate_aux.clone(),
            output_mask: self.output_mask.clone(),
            masked_key: self.masked_key,
            sealed_message: self.sealed_message.clone(),
        }
    }
}

impl<B: GradedEncoding> core::fmt::Debug for Ciphertext<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Ciphertext")
            .field("wires", &self.wire_encodings.len())
            .field("gates", &self.gate_aux.len())
            .field("masked_key", &hex::encode(self.masked_key))
            .field("sealed_len", &self.sealed_message.len())
            .finish()
    }
}

impl<B: GradedEncoding> Ciphertext<B> {
    pub fn wire_encodings(&self) -> &[[GradedElement<B>; 2]] {
        &self.wire_encodings
    }

    pub fn gate_aux(&self) -> &[GateAux<B>] {
        &self.gate_aux
    }

    pub fn masked_key(&self) -> &[u8; 32] {
        &self.masked_key
    }

    pub fn sealed_message(&self) -> &[u8] {
        &self.sealed_message
    }

    pub fn to_blob(&self) -> Result<CiphertextBlob, WeError> {
        let wire_encodings = self
            .wire_encodings
            .iter()
            .map(|w| pair(w, GradedElement::to_blob))
            .collect::<Result<Vec<_>, GesError>>()
            .map_err(blob_error)?;
        let gate_aux = self
            .gate_aux
            .iter()
            .map(GateAuxBlob::from_aux)
            .collect::<Result<Vec<_>, GesError>>()
            .map_err(blob_error)?;
        let output_mask = OutputMaskBlob {
            secret: self.output_mask.secret.to_blob().map_err(blob_error)?,
            decoy: self.output_mask.decoy.to_blob().map_err(blob_error)?,
        };
        Ok(CiphertextBlob {
            wire_encodings,
            gate_aux,
            output_mask,
            masked_key: self.masked_key,
            sealed_message: self.sealed_message.clone(),
        })
    }

    /// Rebind a persisted ciphertext to the context that produced it.
    pub fn from_blob(ctx: &Context<B>, blob: &CiphertextBlob) -> Result<Self, WeError> {
        let el = |b: &EncodingBlob| ctx.element_from_blob(b).map_err(blob_error);
        let wire_encodings = blob
            .wire_encodings
            .iter()
            .map(|w| pair(w, el))
            .collect::<Result<Vec<_>, WeError>>()?;
        let gate_aux = blob
            .gate_aux
            .iter()
            .map(|g| g.to_aux(ctx).map_err(blob_error))
            .collect::<Result<Vec<_>, WeError>>()?;
        let m = &blob.output_mask;
        Ok(Self {
            wire_encodings,
            gate_aux,
            output_mask: OutputMask {
                secret: el(&m.secret)?,
                decoy: el(&m.decoy)?,
            },
            masked_key: blob.masked_key,
            sealed_message: blob.sealed_message.clone(),
        })
    }

    pub fn to_json(&self) -> Result<String, WeError> {
        serde_json::to_string_pretty(&self.to_blob()?)
            .map_err(|e| WeError::Serialization(e.to_string()))
    }

    pub fn from_json(ctx: &Context<B>, json: &str) -> Result<Self, WeError> {
        let blob: CiphertextBlob =
            serde_json::from_str(json).map_err(|e| WeError::Serialization(e.to_string()))?;
        Self::from_blob(ctx, &blob)
    }
}

fn blob_error(e: GesError) -> WeError {
    WeError::Serialization(e.to_string())
}

/// Persisted ciphertext layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiphertextBlob {
    /// `[wire][bit]`.
    pub wire_encodings: Vec<[EncodingBlob; 2]>,
    pub gate_aux: Vec<GateAuxBlob>,
    pub output_mask: OutputMaskBlob,
    #[serde(with = "hex::serde")]
    pub masked_key: [u8; 32],
    #[serde(with = "hex::serde")]
    pub sealed_message: Vec<u8>,
}

/// Persisted gate truth table, `rows[x]` or `rows[x][y]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GateAuxBlob {
    Input { rows: [EncodingBlob; 2] },
    And { rows: [[EncodingBlob; 2]; 2] },
    Or { rows: [[EncodingBlob; 2]; 2] },
    Not { rows: [EncodingBlob; 2] },
}

impl GateAuxBlob {
    fn from_aux<B: GradedEncoding>(aux: &GateAux<B>) -> Result<Self, GesError> {
        let unary = |rows: &[GradedElement<B>; 2]| pair(rows, GradedElement::to_blob);
        let binary =
            |rows: &[[GradedElement<B>; 2]; 2]| pair(rows, |r| pair(r, GradedElement::to_blob));
        Ok(match aux {
            GateAux::Input { rows } => GateAuxBlob::Input { rows: unary(rows)? },
            GateAux::And { rows } => GateAuxBlob::And { rows: binary(rows)? },
            GateAux::Or { rows } => GateAuxBlob::Or { rows: binary(rows)? },
            GateAux::Not { rows } => GateAuxBlob::Not { rows: unary(rows)? },
        })
    }

    fn to_aux<B: GradedEncoding>(&self, ctx: &Context<B>) -> Result<GateAux<B>, GesError> {
        let el = |b: &EncodingBlob| ctx.element_from_blob(b);
        let unary = |rows: &[EncodingBlob; 2]| pair(rows, el);
        let binary = |rows: &[[EncodingBlob; 2]; 2]| pair(rows, |r| pair(r, el));
        Ok(match self {
            GateAuxBlob::Input { rows } => GateAux::Input { rows: unary(rows)? },
            GateAuxBlob::And { rows } => GateAux::And { rows: binary(rows)? },
            GateAuxBlob::Or { rows } => GateAux::Or { rows: binary(rows)? },
            GateAuxBlob::Not { rows } => GateAux::Not { rows: unary(rows)? },
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMaskBlob {
    pub secret: EncodingBlob,
    pub decoy: EncodingBlob,
}
