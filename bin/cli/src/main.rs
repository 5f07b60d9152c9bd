use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use da_square_blob::{process_blob_tx, BlobTx, BlockData, Message, MsgPayForBlob, Registry, Tx};
use da_square_builder::{build, namespace_summary, summary::to_json, SquareConfig};
use da_square_erasure_commit::create_commitment;
use da_square_primitives::{Blob, Namespace};
use tracing::{debug, info_span};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        help = "Path to a JSON square configuration. Defaults to squares of width 1 to 128."
    )]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the share commitment of a blob
    Commitment(CommitmentArgs),
    /// Wrap a blob and its pay for blob message into a blob tx
    Wrap(WrapArgs),
    /// Bundle raw transactions into a block
    Block(BlockArgs),
    /// Check a blob tx the way the square builder does
    Validate(ValidateArgs),
    /// Build the square of a block and print its data root
    Build(BlockFileArgs),
    /// Count the shares of every namespace in the square of a block
    Summary(BlockFileArgs),
}

#[derive(Parser, Debug)]
struct CommitmentArgs {
    #[arg(short, long)]
    namespace: Namespace,
    blob: PathBuf,
}

#[derive(Parser, Debug)]
struct WrapArgs {
    #[arg(short, long)]
    namespace: Namespace,
    #[arg(short, long, default_value = "signer")]
    signer: String,
    #[arg(short, long)]
    output: PathBuf,
    blob: PathBuf,
}

#[derive(Parser, Debug)]
struct BlockArgs {
    #[arg(short, long)]
    output: PathBuf,
    txs: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    tx: PathBuf,
}

#[derive(Parser, Debug)]
struct BlockFileArgs {
    block: PathBuf,
}

fn read(path: &PathBuf) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SquareConfig> {
    match path {
        Some(path) => SquareConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(SquareConfig::default()),
    }
}

fn commitment(args: CommitmentArgs) -> anyhow::Result<()> {
    let data = read(&args.blob)?;
    args.namespace.validate_for_blob()?;
    let commitment = create_commitment(&args.namespace, &data)?;
    println!("{}", hex::encode(commitment));
    Ok(())
}

fn wrap(args: WrapArgs) -> anyhow::Result<()> {
    let blob = Blob::new(args.namespace, read(&args.blob)?);
    let msg = MsgPayForBlob::new(args.signer, &blob)?;
    debug!("commitment {}", hex::encode(&msg.share_commitment));
    let tx = Tx::new(vec![Message::PayForBlob(msg)])?;
    std::fs::write(&args.output, BlobTx::new(&tx, vec![blob])?.encode()?)?;
    Ok(())
}

fn block(args: BlockArgs) -> anyhow::Result<()> {
    let txs = args.txs.iter().map(read).collect::<anyhow::Result<Vec<_>>>()?;
    debug!("bundling {} txs", txs.len());
    std::fs::write(&args.output, borsh::to_vec(&BlockData { txs })?)?;
    Ok(())
}

fn validate(args: ValidateArgs, registry: &Registry) -> anyhow::Result<()> {
    let raw = read(&args.tx)?;
    let blob_tx = BlobTx::unmarshal(&raw)?.ok_or_else(|| anyhow!("not a blob tx"))?;
    let processed = process_blob_tx(registry, &blob_tx)?;
    for (msg, blob) in processed.pfbs.iter().zip(&processed.blobs) {
        println!(
            "{} {} bytes commitment {}",
            blob.namespace,
            msg.blob_size,
            hex::encode(&msg.share_commitment)
        );
    }
    Ok(())
}

fn build_block(args: BlockFileArgs, config: &SquareConfig, registry: &Registry) -> anyhow::Result<()> {
    let data: BlockData = borsh::from_slice(&read(&args.block)?)?;
    let total = data.txs.len();
    let built = build(data.txs, config, registry)?;
    let commitment = built
        .commit()
        .map_err(|e| anyhow!("failed to extend the square: {e}"))?;
    println!("square size: {}", built.size());
    println!("txs: {} of {total}", built.txs.len());
    println!("blobs: {}", built.blobs.len());
    println!("data root: {}", hex::encode(commitment.data_root()));
    Ok(())
}

fn summary(args: BlockFileArgs, config: &SquareConfig, registry: &Registry) -> anyhow::Result<()> {
    let summary = namespace_summary(&read(&args.block)?, config, registry)?;
    println!("{}", to_json(&summary)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .compact()
        .init();

    let config = load_config(args.config.as_ref())?;
    let registry = Registry::with_default_messages();

    let span = info_span!("command", command = ?args.command);
    let _guard = span.enter();
    match args.command {
        Commands::Commitment(args) => commitment(args),
        Commands::Wrap(args) => wrap(args),
        Commands::Block(args) => block(args),
        Commands::Validate(args) => validate(args, &registry),
        Commands::Build(args) => build_block(args, &config, &registry),
        Commands::Summary(args) => summary(args, &config, &registry),
    }
}
