//! Minimal proof-of-work hash chain.

use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ChainError;

pub const HASH_SIZE: usize = 32;

pub type BlockHash = [u8; HASH_SIZE];

/// `hash = SHA256(prev_hash ‖ BE64(nonce))`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToyBlock {
    #[serde(with = "hex::serde")]
    pub prev_hash: BlockHash,
    pub nonce: u64,
    #[serde(with = "hex::serde")]
    pub hash: BlockHash,
}

/// Append-only sequence of blocks; the first extends a genesis hash that is not
/// itself stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToyChain {
    pub blocks: Vec<ToyBlock>,
}

impl ToyChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: ToyBlock) {
        self.blocks.push(block);
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[ToyBlock] {
        &self.blocks
    }

    /// Hash the next block must extend.
    pub fn tip_hash(&self, genesis: &BlockHash) -> BlockHash {
        self.blocks.last().map_or(*genesis, |b| b.hash)
    }
}

pub fn hash_header(prev: &BlockHash, nonce: u64) -> BlockHash {
    let mut h = Sha256::new();
    h.update(prev);
    h.update(nonce.to_be_bytes());
    h.finalize().into()
}

/// True iff the `bits` most significant bits of `hash` are zero.
pub fn check_difficulty(hash: &BlockHash, bits: u8) -> bool {
    let full = usize::from(bits / 8);
    let rem = bits % 8;
    if hash[..full].iter().any(|&b| b != 0) {
        return false;
    }
    if rem == 0 {
        return true;
    }
    let mask = 0xFFu8 << (8 - rem);
    hash[full] & mask == 0
}

/// Search upwards (wrapping) from `start` until a nonce meets `bits`.
pub fn mine_next_block_from(prev: &BlockHash, bits: u8, start: u64) -> ToyBlock {
    let mut nonce = start;
    loop {
        let hash = hash_header(prev, nonce);
        if check_difficulty(&hash, bits) {
            return ToyBlock { prev_hash: *prev, nonce, hash };
        }
        nonce = nonce.wrapping_add(1);
    }
}

/// Mine one block from a random starting nonce.
pub fn mine_next_block<R: RngCore + ?Sized>(prev: &BlockHash, bits: u8, rng: &mut R) -> ToyBlock {
    mine_next_block_from(prev, bits, rng.next_u64())
}

pub fn mine_toy_chain<R: RngCore + ?Sized>(
    genesis: &BlockHash,
    target_height: usize,
    bits: u8,
    rng: &mut R,
) -> Result<ToyChain, ChainError> {
    if target_height == 0 {
        return Err(ChainError::InvalidHeight);
    }
    let mut chain = ToyChain { blocks: Vec::with_capacity(target_height) };
    let mut prev = *genesis;
    for height in 1..=target_height {
        let block = mine_next_block(&prev, bits, rng);
        tracing::debug!(height, nonce = block.nonce, hash = %hex::encode(block.hash), "mined block");
        prev = block.hash;
        chain.push(block);
    }
    tracing::info!(height = target_height, bits, "toy chain mined");
    Ok(chain)
}

/// Checks run in chain order and stop at the first failure.
pub fn verify_toy_chain(
    chain: &ToyChain,
    genesis: &BlockHash,
    bits: u8,
    min_height: usize,
) -> Result<(), ChainError> {
    let result = verify_blocks(chain.blocks(), genesis, bits, min_height);
    match &result {
        Ok(()) => tracing::info!(height = chain.len(), "toy chain verified"),
        Err(e) => tracing::info!(error = %e, "toy chain rejected"),
    }
    result
}

fn verify_blocks(
    blocks: &[ToyBlock],
    genesis: &BlockHash,
    bits: u8,
    min_height: usize,
) -> Result<(), ChainError> {
    if blocks.len() < min_height {
        return Err(ChainError::TooShort { have: blocks.len(), need: min_height });
    }
    let first = blocks.first().ok_or(ChainError::EmptyChain)?;
    if first.prev_hash != *genesis {
        return Err(ChainError::GenesisMismatch);
    }

    let mut prev = *genesis;
    for (block, b) in blocks.iter().enumerate() {
        if b.prev_hash != prev {
            return Err(ChainError::LinkMismatch { block });
        }
        if b.hash != hash_header(&b.prev_hash, b.nonce) {
            return Err(ChainError::HashMismatch { block });
        }
        if !check_difficulty(&b.hash, bits) {
            return Err(ChainError::DifficultyFailure { block });
        }
        prev = b.hash;
    }
    Ok(())
}
