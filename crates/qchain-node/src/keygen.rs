//! qchain-keygen — generate a validator signing keypair and write it to a
//! JSON keyfile consumable by `qchain-node --validator-key`.

use std::path::PathBuf;

use clap::Parser;
use qchain_core::types::SigAlg;
use qchain_crypto::KeyPair;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "qchain-keygen", about = "Generate a validator signing keypair")]
struct Args {
    #[arg(long, value_enum, default_value = "dilithium")]
    algorithm: AlgorithmArg,

    /// Where to write the keyfile. Prints to stdout if omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum AlgorithmArg {
    Dilithium,
    Hybrid,
}

#[derive(Serialize)]
struct KeyFile {
    algorithm: String,
    address: String,
    public_key: String,
    secret_key: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let algorithm = match args.algorithm {
        AlgorithmArg::Dilithium => SigAlg::Dilithium,
        AlgorithmArg::Hybrid => SigAlg::Hybrid,
    };
    let keypair = KeyPair::generate(algorithm);

    let keyfile = KeyFile {
        algorithm: format!("{algorithm:?}"),
        address: keypair.address().to_hex(),
        public_key: format!("0x{}", hex::encode(&keypair.public_key)),
        secret_key: format!("0x{}", hex::encode(keypair.secret_key_bytes())),
    };
    let json = serde_json::to_string_pretty(&keyfile)?;

    match args.out {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!("wrote validator keyfile to {}", path.display());
            println!("address: {}", keyfile.address);
        }
        None => println!("{json}"),
    }
    Ok(())
}
