//! Prime-field simulation of a GGH/CLT-style graded encoding.
//!
//! WARNING: this backend is **not** one-way. It reproduces the algebraic shape of
//! a graded encoding (per-slot secret denominators, a zero-test parameter, and
//! randomized encodings) so the witness-encryption protocol can be exercised end
//! to end, but anyone who learns the field element layout can decode it. Swap in a
//! real multilinear-map backend for anything beyond testing.
//!
//! An encoding of `v` at index `I` is the pair
//! `(v · Π z_j^{-I_j}, r · Π z_j^{-I_j})` for a fresh random `r`. Pairs add and
//! multiply component-wise, so levels compose exactly as index vectors do. At the
//! top level the message component times `p_zt = Π z_j^{top_j}` is `v` itself,
//! which gives both the zero test and the canonical extraction.

use std::sync::Mutex;

use anyhow::{anyhow, ensure, Result};
use ark_ff::{PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::UniformRand;
use rand_chacha::ChaCha20Rng;
use rand_core::{CryptoRng, RngCore, SeedableRng};

use ges_backend::{GesParams, GradedEncoding};

/// Simulated backend over the BLS12-381 scalar field.
pub type Bls12FieldSim = FieldSimGes<ark_bls12_381::Fr>;

/// Opaque simulated encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimEncoding<F: PrimeField> {
    msg: F,
    rnd: F,
}

#[derive(Debug)]
pub struct FieldSimGes<F: PrimeField> {
    top: Vec<u32>,
    /// Inverses of the secret per-slot denominators.
    z_inv: Vec<F>,
    /// Zero-test parameter.
    p_zt: F,
    /// Randomness for the `rnd` component of fresh encodings.
    rng: Mutex<ChaCha20Rng>,
}

impl<F: PrimeField> FieldSimGes<F> {
    fn level_factor(&self, index: &[u32]) -> Result<F> {
        ensure!(
            index.len() == self.z_inv.len(),
            "index has {} components, expected {}",
            index.len(),
            self.z_inv.len()
        );
        let mut factor = F::ONE;
        for (z_inv, &e) in self.z_inv.iter().zip(index) {
            factor *= z_inv.pow([u64::from(e)]);
        }
        Ok(factor)
    }

    fn sample(&self) -> Result<F> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow!("fieldsim rng mutex poisoned"))?;
        Ok(F::rand(&mut *rng))
    }

    /// Top index the instance was set up with.
    pub fn top_index(&self) -> &[u32] {
        &self.top
    }
}

fn nonzero<F: PrimeField, R: RngCore>(rng: &mut R) -> F {
    loop {
        let z = F::rand(rng);
        if !z.is_zero() {
            return z;
        }
    }
}

impl<F: PrimeField> GradedEncoding for FieldSimGes<F> {
    type Scalar = F;
    type Encoding = SimEncoding<F>;

    fn setup<R: RngCore + CryptoRng>(params: &GesParams, rng: &mut R) -> Result<Self> {
        params.check().map_err(|e| anyhow!(e))?;

        let z: Vec<F> = (0..params.num_slots).map(|_| nonzero(rng)).collect();
        let mut z_inv = Vec::with_capacity(z.len());
        let mut p_zt = F::ONE;
        for (zj, &tj) in z.iter().zip(&params.top_index) {
            z_inv.push(zj.inverse().ok_or_else(|| anyhow!("zero denominator"))?);
            p_zt *= zj.pow([u64::from(tj)]);
        }

        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);

        tracing::debug!(
            lambda = params.lambda,
            slots = params.num_slots,
            "fieldsim graded encoding initialised"
        );
        Ok(Self {
            top: params.top_index.clone(),
            z_inv,
            p_zt,
            rng: Mutex::new(ChaCha20Rng::from_seed(seed)),
        })
    }

    fn encode(&self, value: &F, index: &[u32]) -> Result<SimEncoding<F>> {
        let factor = self.level_factor(index)?;
        let r = self.sample()?;
        Ok(SimEncoding {
            msg: *value * factor,
            rnd: r * factor,
        })
    }

    fn add(&self, a: &SimEncoding<F>, b: &SimEncoding<F>) -> Result<SimEncoding<F>> {
        Ok(SimEncoding {
            msg: a.msg + b.msg,
            rnd: a.rnd + b.rnd,
        })
    }

    fn mul(&self, a: &SimEncoding<F>, b: &SimEncoding<F>) -> Result<SimEncoding<F>> {
        Ok(SimEncoding {
            msg: a.msg * b.msg,
            rnd: a.rnd * b.rnd,
        })
    }

    fn is_zero(&self, top: &SimEncoding<F>) -> Result<bool> {
        Ok((top.msg * self.p_zt).is_zero())
    }

    fn extract(&self, top: &SimEncoding<F>) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        (top.msg * self.p_zt).serialize_compressed(&mut out)?;
        Ok(out)
    }

    fn write_encoding(&self, e: &SimEncoding<F>, out: &mut Vec<u8>) -> Result<()> {
        e.msg.serialize_compressed(&mut *out)?;
        e.rnd.serialize_compressed(&mut *out)?;
        Ok(())
    }

    fn read_encoding(&self, bytes: &[u8]) -> Result<SimEncoding<F>> {
        let mut reader = bytes;
        let msg = F::deserialize_compressed(&mut reader)?;
        let rnd = F::deserialize_compressed(&mut reader)?;
        ensure!(reader.is_empty(), "{} trailing bytes after encoding", reader.len());
        Ok(SimEncoding { msg, rnd })
    }
}
