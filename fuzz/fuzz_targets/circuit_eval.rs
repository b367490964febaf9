#![no_main]

use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use graded_we::{
    compile, evaluate_encoded, evaluate_plain, ges_params, Circuit, Context, DefaultBackend, Gate,
};

fn take_bytes<const N: usize>(data: &mut &[u8]) -> Option<[u8; N]> {
    if data.len() < N { return None; }
    let (take, rest) = data.split_at(N);
    *data = rest;
    let mut arr = [0u8; N];
    arr.copy_from_slice(take);
    Some(arr)
}

// Raw gates: (code, in1, in2) with in1/in2 as signed bytes so -1 is reachable.
fuzz_target!(|data: &[u8]| {
    let mut data = data;
    let Some([num_inputs, num_gates, output, bits]) = take_bytes::<4>(&mut data) else { return; };
    let num_inputs = usize::from(num_inputs % 4);
    let num_gates = usize::from(num_gates % 6);

    let mut gates = Vec::with_capacity(num_gates);
    for i in 0..num_gates {
        let Some([code, a, b]) = take_bytes::<3>(&mut data) else { return; };
        match Gate::from_raw(i, code % 5, i64::from(a as i8), i64::from(b as i8)) {
            Ok(g) => gates.push(g),
            Err(_) => return,
        }
    }
    let Ok(circuit) = Circuit::new(num_inputs, gates, usize::from(output)) else { return; };
    let input: Vec<bool> = (0..num_inputs).map(|i| bits >> i & 1 == 1).collect();
    let Ok(plain) = evaluate_plain(&circuit, &input) else { return; };

    let mut rng = ChaCha20Rng::seed_from_u64(u64::from(bits));
    let params = ges_params(&circuit, 128).expect("valid circuit is sizable");
    let ctx = Context::<DefaultBackend>::setup(&params, &mut rng).expect("sized params set up");
    let compiled = compile(&circuit, &ctx, &mut rng).expect("sized context compiles");
    let out = evaluate_encoded(&circuit, &ctx, &compiled.wire_encodings, &input, &compiled.gate_aux)
        .expect("compiled circuit evaluates");
    // Only the lift for the plain output bit completes the product.
    for bit in [false, true] {
        let lift = ctx.encode(&one(), compiled.lift_level(bit)).expect("encode lift");
        let at_top = out.mul(&lift).map(|t| t.is_top().expect("live context")).unwrap_or(false);
        assert_eq!(at_top, bit == plain);
    }
});

fn one() -> <DefaultBackend as graded_we::GradedEncoding>::Scalar {
    1u64.into()
}
