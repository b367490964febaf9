//! Narrow backend contract for a graded encoding scheme (GES).
//!
//! A backend owns the secret algebraic state (CLT13 / GGH-style parameters) and
//! exposes raw operations over opaque encodings. It does **not** track levels:
//! index-vector bookkeeping, context identity and teardown are enforced by the
//! front end in `graded_we::ges`, so any conforming multilinear-map library can be
//! dropped in behind this trait.

use anyhow::Result;
use ark_ff::PrimeField;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// Algebraic parameters for a graded encoding instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GesParams {
    /// Security parameter.
    pub lambda: u32,
    /// Multilinearity degree; must equal the sum of `top_index`.
    pub kappa: u32,
    /// Number of index slots ("z" denominators).
    pub num_slots: usize,
    /// Top-level index vector (one positive component per slot).
    pub top_index: Vec<u32>,
}

impl GesParams {
    /// Single-slot parameters with top index `[3]`, enough for small demo circuits.
    pub fn toy() -> Self {
        Self::with_top(128, vec![3])
    }

    /// Parameters whose slot count and kappa are derived from `top_index`.
    /// A degree past `u32::MAX` saturates, so [`GesParams::check`] rejects it.
    pub fn with_top(lambda: u32, top_index: Vec<u32>) -> Self {
        let kappa = top_index.iter().fold(0u32, |acc, &c| acc.saturating_add(c));
        Self {
            lambda,
            kappa,
            num_slots: top_index.len(),
            top_index,
        }
    }

    /// Structural checks shared by every backend.
    pub fn check(&self) -> core::result::Result<(), String> {
        if self.lambda == 0 {
            return Err("lambda must be > 0".into());
        }
        if self.num_slots == 0 {
            return Err("num_slots must be > 0".into());
        }
        if self.top_index.len() != self.num_slots {
            return Err(format!(
                "top index has {} components, expected {}",
                self.top_index.len(),
                self.num_slots
            ));
        }
        if let Some(slot) = self.top_index.iter().position(|&c| c == 0) {
            return Err(format!("top index component {slot} must be positive"));
        }
        let degree: u64 = self.top_index.iter().map(|&c| u64::from(c)).sum();
        if degree != u64::from(self.kappa) {
            return Err(format!(
                "kappa {} does not match top index degree {degree}",
                self.kappa
            ));
        }
        Ok(())
    }
}

impl Default for GesParams {
    fn default() -> Self {
        Self::toy()
    }
}

/// Raw graded-encoding operations.
///
/// Implementations may assume the front end has already checked level
/// compatibility; they are responsible only for the algebra.
pub trait GradedEncoding: Sized {
    /// Plaintext ring the scheme encodes.
    type Scalar: PrimeField;
    /// Opaque encoded element.
    type Encoding: Clone + core::fmt::Debug;

    /// Generate fresh secret parameters.
    fn setup<R: RngCore + CryptoRng>(params: &GesParams, rng: &mut R) -> Result<Self>;

    /// Encode `value` at index vector `index` (already range-checked).
    fn encode(&self, value: &Self::Scalar, index: &[u32]) -> Result<Self::Encoding>;

    /// Sum of two encodings at the same level.
    fn add(&self, a: &Self::Encoding, b: &Self::Encoding) -> Result<Self::Encoding>;

    /// Product of two encodings; the result sits at the summed level.
    fn mul(&self, a: &Self::Encoding, b: &Self::Encoding) -> Result<Self::Encoding>;

    /// Zero test of a top-level encoding.
    fn is_zero(&self, top: &Self::Encoding) -> Result<bool>;

    /// Canonical bytes of a top-level encoding: equal for any two top-level
    /// encodings of the same value, regardless of how they were computed.
    fn extract(&self, top: &Self::Encoding) -> Result<Vec<u8>>;

    /// Serialize an encoding into an opaque blob.
    fn write_encoding(&self, e: &Self::Encoding, out: &mut Vec<u8>) -> Result<()>;

    /// Parse an opaque blob produced by [`GradedEncoding::write_encoding`].
    fn read_encoding(&self, bytes: &[u8]) -> Result<Self::Encoding>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toy_params_are_consistent() {
        let p = GesParams::toy();
        assert_eq!(p.num_slots, 1);
        assert_eq!(p.kappa, 3);
        assert!(p.check().is_ok());
    }

    #[test]
    fn rejects_degenerate_params() {
        let mut p = GesParams::with_top(128, vec![2, 0]);
        assert!(p.check().is_err());

        p = GesParams::with_top(128, vec![2, 2]);
        p.kappa = 3;
        assert!(p.check().is_err());

        p = GesParams::with_top(128, vec![]);
        assert!(p.check().is_err());

        p = GesParams::with_top(0, vec![1]);
        assert!(p.check().is_err());
    }

    #[test]
    fn oversized_degree_is_reported_not_panicked() {
        let p = GesParams::with_top(128, vec![u32::MAX, 1]);
        assert_eq!(p.kappa, u32::MAX);
        assert!(p.check().unwrap_err().contains("kappa"));
    }

    #[test]
    fn params_json_roundtrip() {
        let p = GesParams::with_top(80, vec![2, 3]);
        let json = serde_json::to_string(&p).unwrap();
        let back: GesParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
        assert_eq!(back.kappa, 5);
    }
}
