#![forbid(unsafe_code)]
//! Command-line interface for sealing, opening and hashing files.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use seekvault::{HashAlg, SealOptions, hash_file, open_file, seal_file, to_hex_lower};

#[derive(Parser, Debug)]
#[command(
    name = "seekvault",
    version,
    about = "Seal/open files in the seekvault container format and compute hashes"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seal a file (output name is derived from the content salt)
    Seal(SealArgs),
    /// Open a sealed file
    Open(OpenArgs),
    /// Compute a file hash
    Hash(HashArgs),
}

#[derive(Args, Debug)]
struct SealArgs {
    /// Input file
    input: PathBuf,
    /// Output directory (defaults to the input's directory)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,
    /// Hex-encoded key
    #[arg(short, long, conflicts_with = "key_file")]
    key: Option<String>,
    /// File holding the raw key bytes
    #[arg(long)]
    key_file: Option<PathBuf>,
    /// Extra metadata fields as key=value, repeatable
    #[arg(short, long = "meta", value_name = "KEY=VALUE")]
    meta: Vec<String>,
    /// Also write the per-block tag stream for later verified opening
    #[arg(long)]
    tags: Option<PathBuf>,
    /// Overwrite existing outputs
    #[arg(short, long)]
    force: bool,
}

#[derive(Args, Debug)]
struct OpenArgs {
    /// Sealed input file (name must be the hex salt with .svlt)
    input: PathBuf,
    /// Output path (defaults to the original name from the trailer)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Hex-encoded key
    #[arg(short, long, conflicts_with = "key_file")]
    key: Option<String>,
    /// File holding the raw key bytes
    #[arg(long)]
    key_file: Option<PathBuf>,
    /// Tag stream captured at sealing; verifies every block
    #[arg(long)]
    tags: Option<PathBuf>,
    /// Overwrite existing outputs
    #[arg(short, long)]
    force: bool,
}

#[derive(Args, Debug)]
struct HashArgs {
    /// Input file
    input: PathBuf,
    /// Hash algorithm
    #[arg(short, long, value_enum, default_value = "blake3")]
    alg: HashAlgArg,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum HashAlgArg {
    Blake3,
    Sha256,
    Sha512,
    Sha3_256,
    Sha3_512,
}

impl From<HashAlgArg> for HashAlg {
    fn from(a: HashAlgArg) -> Self {
        match a {
            HashAlgArg::Blake3 => HashAlg::Blake3,
            HashAlgArg::Sha256 => HashAlg::Sha256,
            HashAlgArg::Sha512 => HashAlg::Sha512,
            HashAlgArg::Sha3_256 => HashAlg::Sha3_256,
            HashAlgArg::Sha3_512 => HashAlg::Sha3_512,
        }
    }
}

fn load_key(key: Option<&str>, key_file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match (key, key_file) {
        (Some(hex_key), None) => hex::decode(hex_key.trim()).context("key is not valid hex"),
        (None, Some(path)) => std::fs::read(path)
            .with_context(|| format!("reading key file {}", path.display())),
        _ => bail!("provide exactly one of --key or --key-file"),
    }
}

fn parse_meta(pairs: &[String]) -> Result<std::collections::BTreeMap<String, String>> {
    let mut fields = std::collections::BTreeMap::new();
    for pair in pairs {
        let (k, v) = pair
            .split_once('=')
            .with_context(|| format!("metadata `{pair}` is not key=value"))?;
        fields.insert(k.to_string(), v.to_string());
    }
    Ok(fields)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Seal(args) => {
            let key = load_key(args.key.as_deref(), args.key_file.as_ref())?;
            let opts = SealOptions {
                fields: parse_meta(&args.meta)?,
                force: args.force,
            };
            let out = seal_file(
                &args.input,
                args.out_dir.as_deref(),
                &key,
                &opts,
                args.tags.as_deref(),
            )
            .with_context(|| format!("sealing {}", args.input.display()))?;
            println!("{}", out.display());
        }
        Command::Open(args) => {
            let key = load_key(args.key.as_deref(), args.key_file.as_ref())?;
            let out = open_file(
                &args.input,
                args.output.as_deref(),
                &key,
                args.force,
                args.tags.as_deref(),
            )
            .with_context(|| format!("opening {}", args.input.display()))?;
            println!("{}", out.display());
        }
        Command::Hash(args) => {
            let digest = hash_file(&args.input, args.alg.into())
                .with_context(|| format!("hashing {}", args.input.display()))?;
            println!("{}", to_hex_lower(&digest));
        }
    }
    Ok(())
}
