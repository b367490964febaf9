//! Witness encryption over boolean circuits on a graded encoding scheme.
//!
//! A message is encrypted under a circuit `C`; anyone holding a witness `w`
//! with `C(w) = 1` can decrypt it, and nobody else learns anything beyond a
//! uniform `DecryptionFailed`.
//!
//! Layers:
//! - [`ges`]: index-disciplined front end over any [`GradedEncoding`] backend
//! - [`circuit`]: circuit model with plain and encoded evaluation sharing one traversal
//! - [`we`]: compile, encrypt, decrypt
//! - [`timelock`]: toy PoW chain and a time-lock built on it
//!
//! The bundled [`DefaultBackend`] is a field simulation of a graded encoding. It
//! has the right algebra and zero-test behavior but no hardness; swap in a real
//! multilinear-map backend for anything beyond experiments.

pub mod aead;
pub mod circuit;
pub mod error;
pub mod ges;
pub mod timelock;
pub mod we;

pub use ges_backend::{GesParams, GradedEncoding};

pub use circuit::{evaluate_encoded, evaluate_plain, Circuit, Gate, GateAux, GateKind};
pub use error::{AeadError, ChainError, CircuitError, GesError, TimeLockError, WeError};
pub use ges::{Context, EncodingBlob, GradedElement, Level};
pub use timelock::{
    decrypt_toy_timelock, encrypt_toy_timelock, genesis_from_str, mine_toy_chain,
    verify_toy_chain, TimeLockParams, ToyBlock, ToyChain,
};
pub use we::{compile, decrypt, encrypt, ges_params, Ciphertext, CiphertextBlob, Statement};

/// Backend used by the demos and tests.
pub type DefaultBackend = ges_fieldsim::Bls12FieldSim;
