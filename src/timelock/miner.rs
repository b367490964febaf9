//! Parallel nonce search.
//!
//! Worker `w` of `n` tries nonces `start + w, start + w + n, ...`. The first
//! worker to hit the target wins the `found` flag and every other worker stops
//! at its next iteration. The caller's `cancel` flag stops all of them.

use std::sync::atomic::{AtomicBool, Ordering};

use rand_core::RngCore;
use rayon::prelude::*;

use super::chain::{check_difficulty, hash_header, BlockHash, ToyBlock, ToyChain};
use crate::error::ChainError;

fn search(
    prev: &BlockHash,
    bits: u8,
    first: u64,
    stride: u64,
    found: &AtomicBool,
    cancel: &AtomicBool,
) -> Option<ToyBlock> {
    let mut nonce = first;
    while !found.load(Ordering::Relaxed) && !cancel.load(Ordering::Relaxed) {
        let hash = hash_header(prev, nonce);
        if check_difficulty(&hash, bits) {
            return found
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
                .then_some(ToyBlock { prev_hash: *prev, nonce, hash });
        }
        nonce = nonce.wrapping_add(stride);
    }
    None
}

pub fn mine_next_block_parallel(
    prev: &BlockHash,
    bits: u8,
    start: u64,
    workers: usize,
    cancel: &AtomicBool,
) -> Result<ToyBlock, ChainError> {
    let workers = workers.max(1);
    let found = AtomicBool::new(false);
    (0..workers)
        .into_par_iter()
        .find_map_any(|w| {
            search(
                prev,
                bits,
                start.wrapping_add(w as u64),
                workers as u64,
                &found,
                cancel,
            )
        })
        .ok_or(ChainError::Cancelled)
}

pub fn mine_toy_chain_parallel<R: RngCore + ?Sized>(
    genesis: &BlockHash,
    target_height: usize,
    bits: u8,
    workers: usize,
    cancel: &AtomicBool,
    rng: &mut R,
) -> Result<ToyChain, ChainError> {
    if target_height == 0 {
        return Err(ChainError::InvalidHeight);
    }
    let mut chain = ToyChain { blocks: Vec::with_capacity(target_height) };
    let mut prev = *genesis;
    for height in 1..=target_height {
        let block = mine_next_block_parallel(&prev, bits, rng.next_u64(), workers, cancel)?;
        tracing::debug!(height, nonce = block.nonce, "mined block");
        prev = block.hash;
        chain.push(block);
    }
    tracing::info!(height = target_height, bits, workers, "toy chain mined");
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timelock::chain::{mine_next_block_from, verify_toy_chain};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn parallel_block_meets_difficulty() {
        let prev = [5u8; 32];
        let cancel = AtomicBool::new(false);
        let block = mine_next_block_parallel(&prev, 10, 0, 4, &cancel).unwrap();
        assert_eq!(block.prev_hash, prev);
        assert_eq!(block.hash, hash_header(&prev, block.nonce));
        assert!(check_difficulty(&block.hash, 10));
    }

    #[test]
    fn single_worker_matches_sequential() {
        let prev = [6u8; 32];
        let cancel = AtomicBool::new(false);
        let par = mine_next_block_parallel(&prev, 8, 42, 1, &cancel).unwrap();
        let seq = mine_next_block_from(&prev, 8, 42);
        assert_eq!(par, seq);
    }

    #[test]
    fn cancelled_before_start() {
        let cancel = AtomicBool::new(true);
        assert_eq!(
            mine_next_block_parallel(&[0u8; 32], 64, 0, 2, &cancel),
            Err(ChainError::Cancelled)
        );
    }

    #[test]
    fn parallel_chain_verifies() {
        let genesis = [8u8; 32];
        let cancel = AtomicBool::new(false);
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let chain = mine_toy_chain_parallel(&genesis, 3, 8, 3, &cancel, &mut rng).unwrap();
        verify_toy_chain(&chain, &genesis, 8, 3).unwrap();
        assert_eq!(
            mine_toy_chain_parallel(&genesis, 0, 8, 3, &cancel, &mut rng),
            Err(ChainError::InvalidHeight)
        );
    }
}
