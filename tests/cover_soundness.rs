//! Products of the published encodings, searched exhaustively.
//!
//! With a top index of one per slot no element can appear twice in a
//! top-level product, so every monomial an evaluator can form is a subset of
//! the public elements. Each subset that reaches the top is fed through key
//! recovery.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use graded_we::we::{derive_pad, CiphertextBlob, GateAuxBlob};
use graded_we::{
    aead, encrypt, ges_params, Circuit, Context, DefaultBackend, EncodingBlob, Gate, GradedElement,
    Statement,
};

type Ctx = Context<DefaultBackend>;
type Elem = GradedElement<DefaultBackend>;

/// Every public element with a label, the two lifts last.
fn public_elements(ctx: &Ctx, blob: &CiphertextBlob) -> Vec<(String, Elem)> {
    let mut out: Vec<(String, &EncodingBlob)> = Vec::new();
    for (w, pair) in blob.wire_encodings.iter().enumerate() {
        for (b, e) in pair.iter().enumerate() {
            out.push((format!("wire{w}[{b}]"), e));
        }
    }
    for (g, aux) in blob.gate_aux.iter().enumerate() {
        match aux {
            GateAuxBlob::Input { rows } | GateAuxBlob::Not { rows } => {
                for (x, e) in rows.iter().enumerate() {
                    out.push((format!("gate{g}[{x}]"), e));
                }
            }
            GateAuxBlob::And { rows } | GateAuxBlob::Or { rows } => {
                for (x, row) in rows.iter().enumerate() {
                    for (y, e) in row.iter().enumerate() {
                        out.push((format!("gate{g}[{x}][{y}]"), e));
                    }
                }
            }
        }
    }
    out.push(("secret".into(), &blob.output_mask.secret));
    out.push(("decoy".into(), &blob.output_mask.decoy));
    out.into_iter()
        .map(|(label, b)| (label, ctx.element_from_blob(b).unwrap()))
        .collect()
}

struct Search {
    /// Labels of every subset whose product sits at the top index.
    at_top: Vec<Vec<String>>,
    /// Labels of every subset whose product opens the sealed message.
    opening: Vec<Vec<String>>,
}

fn search(ctx: &Ctx, statement: &Statement, blob: &CiphertextBlob) -> Search {
    let elements = public_elements(ctx, blob);
    assert!(elements.len() <= 16);
    let digest = statement.digest();
    let mut found = Search { at_top: Vec::new(), opening: Vec::new() };

    for mask in 1u32..1 << elements.len() {
        let mut chosen = elements
            .iter()
            .enumerate()
            .filter(|(i, _)| mask >> i & 1 == 1)
            .map(|(_, e)| e);
        let Some((_, first)) = chosen.next() else { continue };
        let product = chosen.try_fold(first.clone(), |acc, (_, e)| acc.mul(e).ok());
        let Some(product) = product.filter(|p| p.is_top().unwrap()) else { continue };

        let labels: Vec<String> = elements
            .iter()
            .enumerate()
            .filter(|(i, _)| mask >> i & 1 == 1)
            .map(|(_, (l, _))| l.clone())
            .collect();
        let mut key = blob.masked_key;
        let pad = derive_pad(&digest, &product.extract().unwrap());
        for (k, p) in key.iter_mut().zip(pad) {
            *k ^= p;
        }
        if aead::open(&key, &blob.sealed_message, &digest).is_ok() {
            found.opening.push(labels.clone());
        }
        found.at_top.push(labels);
    }
    found
}

fn encrypted(circuit: Circuit, seed: u64) -> (Ctx, Statement, CiphertextBlob) {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let ctx = Ctx::setup(&ges_params(&circuit, 128).unwrap(), &mut rng).unwrap();
    let statement = Statement::new(circuit);
    let blob = encrypt(&statement, &ctx, b"locked", &mut rng)
        .unwrap()
        .to_blob()
        .unwrap();
    (ctx, statement, blob)
}

#[test]
fn contradiction_has_no_opening_product() {
    // a AND NOT a
    let circuit = Circuit::new(1, vec![Gate::not(0), Gate::and(0, 1)], 1).unwrap();
    let (ctx, statement, blob) = encrypted(circuit, 1);
    let found = search(&ctx, &statement, &blob);

    assert!(found.opening.is_empty(), "opened by {:?}", found.opening);
    assert!(
        found.at_top.iter().all(|s| !s.iter().any(|l| l == "secret")),
        "secret reached the top: {:?}",
        found.at_top
    );
    // One honest evaluation per value of `a`, each completed by the decoy.
    assert_eq!(found.at_top.len(), 2);
}

#[test]
fn and_gate_opens_only_through_the_honest_product() {
    let (ctx, statement, blob) = encrypted(Circuit::and2(), 2);
    let found = search(&ctx, &statement, &blob);

    assert_eq!(found.at_top.len(), 4);
    assert_eq!(
        found.opening,
        vec![vec![
            "wire0[1]".to_string(),
            "wire1[1]".to_string(),
            "gate0[1][1]".to_string(),
            "secret".to_string(),
        ]]
    );
}
