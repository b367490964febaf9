#![no_main]

use libfuzzer_sys::fuzz_target;

use graded_we::timelock::{hash_header, verify_toy_chain, ToyBlock, ToyChain};

fn take_bytes<const N: usize>(data: &mut &[u8]) -> Option<[u8; N]> {
    if data.len() < N { return None; }
    let (take, rest) = data.split_at(N);
    *data = rest;
    let mut arr = [0u8; N];
    arr.copy_from_slice(take);
    Some(arr)
}

// Arbitrary blocks must never panic the verifier, and acceptance must imply
// every stored hash recomputes.
fuzz_target!(|data: &[u8]| {
    let mut data = data;
    let Some([bits, min_height]) = take_bytes::<2>(&mut data) else { return; };
    let bits = bits % 9;
    let Some(genesis) = take_bytes::<32>(&mut data) else { return; };

    let mut chain = ToyChain::new();
    while let (Some(prev_hash), Some(nonce), Some(hash)) = (
        take_bytes::<32>(&mut data),
        take_bytes::<8>(&mut data),
        take_bytes::<32>(&mut data),
    ) {
        chain.push(ToyBlock { prev_hash, nonce: u64::from_be_bytes(nonce), hash });
    }

    if verify_toy_chain(&chain, &genesis, bits, usize::from(min_height % 4)).is_ok() {
        for b in chain.blocks() {
            assert_eq!(b.hash, hash_header(&b.prev_hash, b.nonce));
        }
    }
});
