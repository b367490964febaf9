//! Toy time-lock encryption over a PoW chain.
//!
//! The relation "a valid chain of at least `target_height` blocks extends
//! `genesis` at `difficulty_bits`" is checked natively; its outcome becomes the
//! single witness bit of a pass-through circuit that goes through witness
//! encryption. Chain validity itself is not part of the encoded circuit.

mod chain;
mod miner;

pub use chain::{
    check_difficulty, hash_header, mine_next_block, mine_next_block_from, mine_toy_chain,
    verify_toy_chain, BlockHash, ToyBlock, ToyChain, HASH_SIZE,
};
pub use miner::{mine_next_block_parallel, mine_toy_chain_parallel};

use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use ges_backend::{GesParams, GradedEncoding};

use crate::circuit::Circuit;
use crate::error::{ChainError, TimeLockError};
use crate::ges::Context;
use crate::we::{self, Ciphertext, Statement};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLockParams {
    pub target_height: usize,
    #[serde(with = "hex::serde")]
    pub genesis: BlockHash,
    pub difficulty_bits: u8,
}

impl TimeLockParams {
    pub fn new(genesis: BlockHash, target_height: usize, difficulty_bits: u8) -> Result<Self, ChainError> {
        if target_height == 0 {
            return Err(ChainError::InvalidHeight);
        }
        Ok(Self { target_height, genesis, difficulty_bits })
    }

    /// Canonical bytes carried in the statement as its public parameters.
    pub fn public_params(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16 + HASH_SIZE + 9);
        out.extend_from_slice(b"TOY_TIMELOCK_V1\0");
        out.extend_from_slice(&self.genesis);
        out.extend_from_slice(&(self.target_height as u64).to_be_bytes());
        out.push(self.difficulty_bits);
        out
    }

    pub fn statement(&self) -> Statement {
        Statement::with_public_params(Circuit::pass_through(), self.public_params())
    }

    /// Graded encoding parameters sized for the time-lock circuit.
    pub fn ges_params(&self, lambda: u32) -> Result<GesParams, TimeLockError> {
        Ok(we::ges_params(&Circuit::pass_through(), lambda)?)
    }
}

pub fn genesis_from_str(s: &str) -> BlockHash {
    Sha256::digest(s.as_bytes()).into()
}

pub fn random_genesis<R: RngCore + ?Sized>(rng: &mut R) -> BlockHash {
    let mut out = [0u8; HASH_SIZE];
    rng.fill_bytes(&mut out);
    out
}

/// `true` iff `chain` satisfies the time-lock relation.
pub fn witness_bit(params: &TimeLockParams, chain: &ToyChain) -> bool {
    verify_toy_chain(chain, &params.genesis, params.difficulty_bits, params.target_height).is_ok()
}

pub fn encrypt_toy_timelock<B: GradedEncoding, R: RngCore + CryptoRng>(
    ctx: &Context<B>,
    params: &TimeLockParams,
    message: &[u8],
    rng: &mut R,
) -> Result<(Statement, Ciphertext<B>), TimeLockError> {
    if params.target_height == 0 {
        return Err(ChainError::InvalidHeight.into());
    }
    let statement = params.statement();
    let ct = we::encrypt(&statement, ctx, message, rng)?;
    tracing::info!(
        height = params.target_height,
        bits = params.difficulty_bits,
        genesis = %hex::encode(params.genesis),
        "time-locked message"
    );
    Ok((statement, ct))
}

/// Verify `chain` natively, then decrypt with witness bit 1.
pub fn decrypt_toy_timelock<B: GradedEncoding>(
    ctx: &Context<B>,
    params: &TimeLockParams,
    chain: &ToyChain,
    statement: &Statement,
    ct: &Ciphertext<B>,
) -> Result<Vec<u8>, TimeLockError> {
    if statement.public_params() != params.public_params().as_slice()
        || statement.circuit() != &Circuit::pass_through()
    {
        return Err(TimeLockError::ParamsMismatch);
    }
    verify_toy_chain(chain, &params.genesis, params.difficulty_bits, params.target_height)?;
    Ok(we::decrypt(statement, ctx, &[true], ct)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WeError;
    use crate::DefaultBackend;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn setup(seed: u64) -> (Context<DefaultBackend>, ChaCha20Rng) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let params = TimeLockParams::new(genesis_from_str("unit"), 1, 0)
            .unwrap()
            .ges_params(128)
            .unwrap();
        let ctx = Context::setup(&params, &mut rng).unwrap();
        (ctx, rng)
    }

    #[test]
    fn genesis_from_string_is_sha256() {
        let g = genesis_from_str("toy-genesis");
        assert_eq!(g, <[u8; 32]>::from(Sha256::digest(b"toy-genesis")));
        assert_ne!(g, genesis_from_str("toy-genesis-2"));
    }

    #[test]
    fn random_genesis_is_seeded_and_minable() {
        let a = random_genesis(&mut ChaCha20Rng::seed_from_u64(7));
        assert_eq!(a, random_genesis(&mut ChaCha20Rng::seed_from_u64(7)));
        assert_ne!(a, random_genesis(&mut ChaCha20Rng::seed_from_u64(8)));

        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let params = TimeLockParams::new(a, 2, 4).unwrap();
        let chain = mine_toy_chain(&params.genesis, 2, 4, &mut rng).unwrap();
        assert!(witness_bit(&params, &chain));
        assert!(!witness_bit(&TimeLockParams { genesis: genesis_from_str("unit"), ..params }, &chain));
    }

    #[test]
    fn sized_for_pass_through() {
        let params = TimeLockParams::new(genesis_from_str("unit"), 1, 0).unwrap();
        let ges = params.ges_params(128).unwrap();
        assert_eq!(ges.num_slots, 6);
        assert!(ges.check().is_ok());
    }

    #[test]
    fn zero_height_rejected() {
        assert_eq!(
            TimeLockParams::new([0u8; 32], 0, 8).unwrap_err(),
            ChainError::InvalidHeight
        );
    }

    #[test]
    fn roundtrip_and_short_chain() {
        let (ctx, mut rng) = setup(1);
        let params = TimeLockParams::new(genesis_from_str("unit"), 2, 6).unwrap();
        let (statement, ct) = encrypt_toy_timelock(&ctx, &params, b"later", &mut rng).unwrap();

        let short = mine_toy_chain(&params.genesis, 1, 6, &mut rng).unwrap();
        assert!(!witness_bit(&params, &short));
        assert!(matches!(
            decrypt_toy_timelock(&ctx, &params, &short, &statement, &ct),
            Err(TimeLockError::Chain(ChainError::TooShort { have: 1, need: 2 }))
        ));

        let full = mine_toy_chain(&params.genesis, 2, 6, &mut rng).unwrap();
        assert!(witness_bit(&params, &full));
        assert_eq!(
            decrypt_toy_timelock(&ctx, &params, &full, &statement, &ct).unwrap(),
            b"later"
        );
    }

    #[test]
    fn params_must_match_statement() {
        let (ctx, mut rng) = setup(2);
        let params = TimeLockParams::new(genesis_from_str("unit"), 1, 4).unwrap();
        let (statement, ct) = encrypt_toy_timelock(&ctx, &params, b"m", &mut rng).unwrap();

        let easier = TimeLockParams { difficulty_bits: 0, ..params.clone() };
        let chain = mine_toy_chain(&params.genesis, 1, 0, &mut rng).unwrap();
        assert!(matches!(
            decrypt_toy_timelock(&ctx, &easier, &chain, &statement, &ct),
            Err(TimeLockError::ParamsMismatch)
        ));
    }

    #[test]
    fn false_witness_bit_does_not_open() {
        let (ctx, mut rng) = setup(3);
        let params = TimeLockParams::new(genesis_from_str("unit"), 1, 4).unwrap();
        let (statement, ct) = encrypt_toy_timelock(&ctx, &params, b"m", &mut rng).unwrap();
        assert!(matches!(
            we::decrypt(&statement, &ctx, &[false], &ct),
            Err(WeError::DecryptionFailed)
        ));
    }
}
