//! Plain and encoded evaluation agree on every circuit and input.

use ark_bls12_381::Fr;
use ark_ff::One;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use graded_we::we::CompiledCircuit;
use graded_we::{
    compile, evaluate_encoded, evaluate_plain, ges_params, Circuit, Context, DefaultBackend, Gate,
    GateKind, GradedElement,
};

type Ctx = Context<DefaultBackend>;

fn sized_ctx(circuit: &Circuit, seed: u64) -> (Ctx, ChaCha20Rng) {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let ctx = Ctx::setup(&ges_params(circuit, 128).unwrap(), &mut rng).unwrap();
    (ctx, rng)
}

/// Complete the output with a unit-valued lift for output 1; only an
/// evaluation whose output wire carries 1 lands on a nonzero top element.
fn extract_bit(
    ctx: &Ctx,
    compiled: &CompiledCircuit<DefaultBackend>,
    out: &GradedElement<DefaultBackend>,
) -> bool {
    let lift = ctx.encode(&Fr::one(), compiled.lift_level(true)).unwrap();
    match out.mul(&lift) {
        Ok(top) => top.is_top().unwrap() && !top.is_zero().unwrap(),
        Err(_) => false,
    }
}

fn encoded_bit(ctx: &Ctx, rng: &mut ChaCha20Rng, circuit: &Circuit, bits: &[bool]) -> bool {
    let compiled = compile(circuit, ctx, rng).unwrap();
    let out = evaluate_encoded(
        circuit,
        ctx,
        &compiled.wire_encodings,
        bits,
        &compiled.gate_aux,
    )
    .unwrap();
    let plain = evaluate_plain(circuit, bits).unwrap();
    let reached = out.index().checked_add(compiled.lift_level(plain));
    assert_eq!(reached.as_ref(), Some(ctx.top_index()));
    extract_bit(ctx, &compiled, &out)
}

/// Gates as `(kind, a, b)` seeds; wire references are reduced modulo the wires
/// available at that gate so every generated circuit is well formed.
fn build(num_inputs: usize, seeds: &[(u8, usize, usize)], output: usize) -> Circuit {
    let gates: Vec<Gate> = seeds
        .iter()
        .enumerate()
        .map(|(i, &(kind, a, b))| {
            let avail = num_inputs + i;
            let (a, b) = (a % avail, b % avail);
            match GateKind::try_from(kind % 4).unwrap() {
                GateKind::Input => Gate::input(a),
                GateKind::And => Gate::and(a, b),
                GateKind::Or => Gate::or(a, b),
                GateKind::Not => Gate::not(a),
            }
        })
        .collect();
    let output = output % gates.len();
    Circuit::new(num_inputs, gates, output).unwrap()
}

#[test]
fn and_truth_table() {
    let circuit = Circuit::and2();
    let (ctx, mut rng) = sized_ctx(&circuit, 1);
    for bits in [[false, false], [false, true], [true, false], [true, true]] {
        assert_eq!(encoded_bit(&ctx, &mut rng, &circuit, &bits), bits[0] && bits[1]);
    }
}

#[test]
fn fan_out_across_gate_kinds() {
    // (a & b) | !c as output; a dead gate reads `a` and the OR again.
    let circuit = Circuit::new(
        3,
        vec![Gate::and(0, 1), Gate::not(2), Gate::or(3, 4), Gate::and(0, 5)],
        2,
    )
    .unwrap();
    let (ctx, mut rng) = sized_ctx(&circuit, 2);
    for x in 0..8u8 {
        let bits = [x & 4 != 0, x & 2 != 0, x & 1 != 0];
        let want = evaluate_plain(&circuit, &bits).unwrap();
        assert_eq!(encoded_bit(&ctx, &mut rng, &circuit, &bits), want, "bits {bits:?}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn encoded_matches_plain(
        seed in any::<u64>(),
        num_inputs in 1usize..=3,
        seeds in prop::collection::vec((any::<u8>(), any::<usize>(), any::<usize>()), 1..=4),
        output in any::<usize>(),
        input_bits in any::<u8>(),
    ) {
        let circuit = build(num_inputs, &seeds, output);
        let (ctx, mut rng) = sized_ctx(&circuit, seed);
        let bits: Vec<bool> = (0..num_inputs).map(|i| input_bits >> i & 1 == 1).collect();

        let plain = evaluate_plain(&circuit, &bits).unwrap();
        prop_assert_eq!(encoded_bit(&ctx, &mut rng, &circuit, &bits), plain);
    }
}
