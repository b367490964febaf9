use std::{fs, path::PathBuf};

use anyhow::{Context as _, Result};
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::EnvFilter;

use graded_we::{
    decrypt, encrypt, ges_params, Circuit, Context, DefaultBackend, GesParams, Statement, WeError,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Witness encryption under AND(a, b)")]
struct Cli {
    /// Message to encrypt.
    #[arg(long, default_value = "secret")]
    message: String,
    /// JSON file with graded encoding parameters (defaults to the size AND(a, b) needs).
    #[arg(long)]
    params: Option<PathBuf>,
    /// Seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
    /// Write the ciphertext as JSON to this path.
    #[arg(long)]
    save_ciphertext: Option<PathBuf>,
}

fn load_params(path: Option<&PathBuf>) -> Result<GesParams> {
    match path {
        Some(p) => {
            let raw = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parse {}", p.display()))
        }
        None => ges_params(&Circuit::and2(), 128).context("size graded encoding parameters"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let params = load_params(cli.params.as_ref())?;
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let ctx = Context::<DefaultBackend>::setup(&params, &mut rng).context("graded encoding setup")?;

    let statement = Statement::new(Circuit::and2());
    let ct = encrypt(&statement, &ctx, cli.message.as_bytes(), &mut rng).context("encrypt")?;
    println!("ciphertext: {ct:?}");

    for witness in [[true, true], [false, false], [false, true], [true, false]] {
        let bits = witness.map(u8::from);
        match decrypt(&statement, &ctx, &witness, &ct) {
            Ok(m) => println!("witness {bits:?}: decrypted {:?}", String::from_utf8_lossy(&m)),
            Err(WeError::DecryptionFailed) => println!("witness {bits:?}: decryption failed"),
            Err(e) => return Err(e).context("decrypt"),
        }
    }

    if let Some(path) = cli.save_ciphertext {
        let json = ct.to_json().context("serialize ciphertext")?;
        fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
        println!("ciphertext written to {}", path.display());
    }

    ctx.release();
    Ok(())
}
