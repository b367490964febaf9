// src/error.rs

use thiserror::Error;

use crate::ges::Level;

/// Graded-encoding algebra violations. Always caller bugs; never retried.
#[derive(Debug, Error)]
pub enum GesError {
    #[error("invalid graded encoding parameters: {0}")]
    ParameterError(String),
    #[error("invalid index {index} (top index {top})")]
    InvalidIndex { index: Level, top: Level },
    #[error("addition of elements at different levels: {left} vs {right}")]
    LevelMismatch { left: Level, right: Level },
    #[error("multiplication overflows the top level: {left} + {right} > {top}")]
    LevelOverflow { left: Level, right: Level, top: Level },
    #[error("zero test / extraction needs a top-level element, got level {0}")]
    NotTopLevel(Level),
    #[error("graded encoding context has been released")]
    UseAfterRelease,
    #[error("elements belong to different graded encoding contexts")]
    ContextMismatch,
    #[error("graded encoding backend: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Circuit structural and evaluation errors.
#[derive(Debug, Error)]
pub enum CircuitError {
    #[error("input length mismatch: got {got}, want {want}")]
    LengthMismatch { got: usize, want: usize },
    #[error("invalid output gate index {output} ({gates} gates)")]
    BadOutputGate { output: usize, gates: usize },
    #[error("gate {gate} references invalid wire {wire:?}")]
    BadWireReference { gate: usize, wire: Option<usize> },
    #[error("unknown gate type {code}")]
    UnknownGateType { code: u8 },
    #[error("gate {gate} has an input it must not have")]
    MalformedGate { gate: usize },
    #[error("gate {gate} auxiliary encodings do not match its type")]
    AuxMismatch { gate: usize },
    #[error("input wire {wire} was encoded under another context")]
    ForeignEncoding { wire: usize },
    #[error("input wire {wire} encoding failed: {source}")]
    InputEncoding {
        wire: usize,
        #[source]
        source: GesError,
    },
    #[error("gate {gate} evaluation failed: {source}")]
    CircuitEvalError {
        gate: usize,
        #[source]
        source: GesError,
    },
}

/// AEAD collaborator errors.
#[derive(Debug, Error)]
pub enum AeadError {
    #[error("aead encrypt failed")]
    Seal,
    #[error("aead authentication failed")]
    AuthenticationFailure,
}

/// Witness-encryption protocol errors.
#[derive(Debug, Error)]
pub enum WeError {
    #[error("malformed statement: {0}")]
    StatementError(#[source] CircuitError),
    #[error("encoding failed{}: {source}", gate_suffix(.gate))]
    EncodingError {
        gate: Option<usize>,
        #[source]
        source: GesError,
    },
    #[error("witness length mismatch: got {got}, want {want}")]
    WitnessLengthError { got: usize, want: usize },
    /// Covers both non-satisfying witnesses and corrupted ciphertexts.
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("sealing message: {0}")]
    Seal(#[source] AeadError),
    #[error("ciphertext serialization: {0}")]
    Serialization(String),
}

fn gate_suffix(gate: &Option<usize>) -> String {
    match gate {
        Some(g) => format!(" at gate {g}"),
        None => String::new(),
    }
}

/// Toy PoW chain rejections.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("target height must be > 0")]
    InvalidHeight,
    #[error("chain too short: have {have}, need at least {need}")]
    TooShort { have: usize, need: usize },
    #[error("empty chain")]
    EmptyChain,
    #[error("first block prev hash != genesis")]
    GenesisMismatch,
    #[error("block {block} prev hash mismatch")]
    LinkMismatch { block: usize },
    #[error("block {block} hash mismatch")]
    HashMismatch { block: usize },
    #[error("block {block} fails difficulty")]
    DifficultyFailure { block: usize },
    #[error("mining cancelled")]
    Cancelled,
}

/// Toy time-lock errors.
#[derive(Debug, Error)]
pub enum TimeLockError {
    #[error("chain verification: {0}")]
    Chain(#[from] ChainError),
    #[error("witness encryption: {0}")]
    We(#[from] WeError),
    #[error("time-lock parameters do not match the statement")]
    ParamsMismatch,
}
