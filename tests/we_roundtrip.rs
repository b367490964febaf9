//! Encrypt/decrypt behavior through the public API.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use graded_we::{
    decrypt, encrypt, evaluate_plain, ges_params, Ciphertext, Circuit, Context, DefaultBackend,
    Gate, Statement, WeError,
};

type Ctx = Context<DefaultBackend>;

fn ctx(circuit: &Circuit, seed: u64) -> (Ctx, ChaCha20Rng) {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let ctx = Ctx::setup(&ges_params(circuit, 128).unwrap(), &mut rng).unwrap();
    (ctx, rng)
}

/// a & (b | !c)
fn three_input_circuit() -> Circuit {
    Circuit::new(3, vec![Gate::not(2), Gate::or(1, 3), Gate::and(0, 4)], 2).unwrap()
}

#[test]
fn and_scenario() {
    let (ctx, mut rng) = ctx(&Circuit::and2(), 1);
    let statement = Statement::new(Circuit::and2());
    let ct = encrypt(&statement, &ctx, b"secret", &mut rng).unwrap();

    assert_eq!(decrypt(&statement, &ctx, &[true, true], &ct).unwrap(), b"secret");
    for w in [[false, false], [false, true], [true, false]] {
        assert!(matches!(decrypt(&statement, &ctx, &w, &ct), Err(WeError::DecryptionFailed)));
    }
}

#[test]
fn malformed_statement_is_rejected_by_validation() {
    let json = r#"{"circuit":{"num_inputs":2,"gates":[],"output_gate":0},"public_params":""}"#;
    assert!(serde_json::from_str::<Statement>(json).is_err());
}

#[test]
fn persisted_ciphertext_tampering() {
    let (ctx, mut rng) = ctx(&Circuit::and2(), 2);
    let statement = Statement::new(Circuit::and2());
    let ct = encrypt(&statement, &ctx, b"secret", &mut rng).unwrap();
    let blob = ct.to_blob().unwrap();

    let mut bad = blob.clone();
    bad.masked_key[17] ^= 0x40;
    let bad = Ciphertext::from_blob(&ctx, &bad).unwrap();
    assert!(matches!(decrypt(&statement, &ctx, &[true, true], &bad), Err(WeError::DecryptionFailed)));

    let mut bad = blob.clone();
    bad.sealed_message[0] ^= 1;
    let bad = Ciphertext::from_blob(&ctx, &bad).unwrap();
    assert!(matches!(decrypt(&statement, &ctx, &[true, true], &bad), Err(WeError::DecryptionFailed)));

    // Swapping the bit encodings of one wire no longer matches the gate rows
    // that read it, so no witness opens.
    let mut bad = blob;
    bad.wire_encodings[0].swap(0, 1);
    let bad = Ciphertext::from_blob(&ctx, &bad).unwrap();
    for w in [[true, true], [false, true], [true, false], [false, false]] {
        assert!(matches!(decrypt(&statement, &ctx, &w, &bad), Err(WeError::DecryptionFailed)));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn satisfying_witnesses_recover_the_message(
        seed in any::<u64>(),
        message in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let (ctx, mut rng) = ctx(&three_input_circuit(), seed);
        let statement = Statement::new(three_input_circuit());
        let ct = encrypt(&statement, &ctx, &message, &mut rng).unwrap();
        for w in [[true, true, false], [true, true, true], [true, false, false]] {
            prop_assert_eq!(decrypt(&statement, &ctx, &w, &ct).unwrap(), message.clone());
        }
    }

    #[test]
    fn other_witnesses_always_fail(
        seed in any::<u64>(),
        message in prop::collection::vec(any::<u8>(), 1..32),
        witness in any::<u8>(),
    ) {
        let (ctx, mut rng) = ctx(&three_input_circuit(), seed);
        let statement = Statement::new(three_input_circuit());
        let ct = encrypt(&statement, &ctx, &message, &mut rng).unwrap();
        let w: Vec<bool> = (0..3).map(|i| witness >> i & 1 == 1).collect();
        let result = decrypt(&statement, &ctx, &w, &ct);
        if evaluate_plain(statement.circuit(), &w).unwrap() {
            prop_assert_eq!(result.unwrap(), message);
        } else {
            prop_assert!(matches!(result, Err(WeError::DecryptionFailed)));
        }
    }
}
