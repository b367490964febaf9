use std::{
    fs,
    path::PathBuf,
    sync::atomic::AtomicBool,
    time::Instant,
};

use anyhow::{Context as _, Result};
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::EnvFilter;

use graded_we::timelock::{
    decrypt_toy_timelock, encrypt_toy_timelock, genesis_from_str, mine_toy_chain,
    mine_toy_chain_parallel, random_genesis, TimeLockParams,
};
use graded_we::{Context, DefaultBackend, GesParams};

#[derive(Parser, Debug)]
#[command(author, version, about = "Toy time-lock encryption over a PoW chain")]
struct Cli {
    #[arg(long, default_value = "this is time-locked under a toy chain")]
    message: String,
    /// String hashed into the genesis block hash.
    #[arg(long, default_value = "toy-genesis")]
    genesis: String,
    /// Draw the genesis hash from the RNG instead of hashing `--genesis`.
    #[arg(long, conflicts_with = "genesis")]
    random_genesis: bool,
    #[arg(long, default_value_t = 3)]
    height: usize,
    #[arg(long, default_value_t = 12)]
    bits: u8,
    /// JSON file with time-lock parameters; overrides genesis/height/bits.
    #[arg(long)]
    timelock: Option<PathBuf>,
    /// JSON file with graded encoding parameters (defaults to the size the time-lock needs).
    #[arg(long)]
    params: Option<PathBuf>,
    /// Mine with this many parallel workers instead of one thread.
    #[arg(long)]
    workers: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let tle: TimeLockParams = match &cli.timelock {
        Some(p) => read_json(p)?,
        None => {
            let genesis = if cli.random_genesis {
                random_genesis(&mut rng)
            } else {
                genesis_from_str(&cli.genesis)
            };
            TimeLockParams::new(genesis, cli.height, cli.bits)?
        }
    };
    println!("genesis {}", hex::encode(tle.genesis));
    let ges_params: GesParams = match &cli.params {
        Some(p) => read_json(p)?,
        None => tle.ges_params(128).context("size graded encoding parameters")?,
    };
    let ctx = Context::<DefaultBackend>::setup(&ges_params, &mut rng).context("graded encoding setup")?;

    let (statement, ct) = encrypt_toy_timelock(&ctx, &tle, cli.message.as_bytes(), &mut rng)
        .context("encrypt time-lock")?;
    println!("toy time-lock ciphertext created");

    let short = mine_toy_chain(&tle.genesis, 1, tle.difficulty_bits, &mut rng)?;
    match decrypt_toy_timelock(&ctx, &tle, &short, &statement, &ct) {
        Ok(_) => anyhow::bail!("decryption succeeded with a one-block chain"),
        Err(e) => println!("short chain rejected as expected: {e}"),
    }

    let started = Instant::now();
    let full = match cli.workers {
        Some(workers) => {
            let cancel = AtomicBool::new(false);
            mine_toy_chain_parallel(&tle.genesis, tle.target_height, tle.difficulty_bits, workers, &cancel, &mut rng)?
        }
        None => mine_toy_chain(&tle.genesis, tle.target_height, tle.difficulty_bits, &mut rng)?,
    };
    println!("mined {} blocks in {:.2?}", full.len(), started.elapsed());

    let recovered = decrypt_toy_timelock(&ctx, &tle, &full, &statement, &ct)
        .context("decrypt with full chain")?;
    anyhow::ensure!(recovered == cli.message.as_bytes(), "recovered message differs");
    println!("decrypted: {:?}", String::from_utf8_lossy(&recovered));

    ctx.release();
    Ok(())
}
