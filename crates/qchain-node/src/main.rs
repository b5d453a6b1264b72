//! qchain-node — the full-node binary.
//!
//! Startup sequence:
//!   1. Open (or initialise) the state database
//!   2. Apply genesis if the database is fresh
//!   3. Start the JSON-RPC 2.0 server
//!   4. Run the block-production/ingestion loop: on each tick, if this
//!      node is the scheduled proposer, build, execute and broadcast a
//!      block; otherwise idle and apply inbound blocks from the network.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use qchain_chain::Chain;
use qchain_consensus::ValidatorSet;
use qchain_core::block::{Block, BlockHeader};
use qchain_core::constants::{BLOCK_INTERVAL_SECS, CHAIN_ID};
use qchain_core::types::SigAlg;
use qchain_crypto::KeyPair;
use qchain_executor::{BlockContext, NoopEvmExecutor, StateView};
use qchain_genesis::{apply_genesis, GenesisConfig};
use qchain_net::{LoopbackNetwork, NetMessage};
use qchain_pool::{PoolConfig, TxPool};
use qchain_rpc::{RpcServer, RpcServerState};
use qchain_state::{StateBuffer, StateStore};

#[derive(Parser, Debug)]
#[command(name = "qchain-node", version, about = "qchain full node")]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Path to the genesis configuration JSON (§6 schema).
    #[arg(long)]
    genesis: PathBuf,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8545")]
    rpc_addr: SocketAddr,

    /// Path to a validator keyfile (as produced by `qchain-keygen`). A
    /// node without one never proposes; it only ingests blocks and
    /// serves RPC.
    #[arg(long)]
    validator_key: Option<PathBuf>,
}

#[derive(serde::Deserialize)]
struct ValidatorKeyFile {
    algorithm: String,
    public_key: String,
    secret_key: String,
}

fn load_validator_keypair(path: &std::path::Path) -> anyhow::Result<KeyPair> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading validator keyfile {}", path.display()))?;
    let kf: ValidatorKeyFile = serde_json::from_str(&json).context("parsing validator keyfile")?;
    let algorithm = match kf.algorithm.to_ascii_lowercase().as_str() {
        "dilithium" => SigAlg::Dilithium,
        "hybrid" => SigAlg::Hybrid,
        other => anyhow::bail!("unrecognized validator key algorithm '{other}'"),
    };
    let public_key = qchain_genesis::hexutil::parse_hex_bytes(&kf.public_key)?;
    let secret_key = qchain_genesis::hexutil::parse_hex_bytes(&kf.secret_key)?;
    Ok(KeyPair::from_raw(algorithm, public_key, secret_key))
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before the epoch")
        .as_secs()
}

/// Dry-run candidate transactions against a scratch buffer so the header
/// can commit to the `gas_used`/`tx_root` it will actually produce, before
/// it is signed. Drops any candidate that fails preflight or execution —
/// those are left out of the block (and out of the pool, via the caller).
fn build_block(
    store: &StateStore,
    pool: &TxPool,
    keypair: &KeyPair,
    coinbase: qchain_core::types::Address,
    head: &Block,
    gas_limit: u64,
) -> anyhow::Result<(Block, Vec<qchain_core::types::Hash>)> {
    let number = head.header.number + 1;
    let candidates = pool.get_pending(512);

    let mut buffer = StateBuffer::new();
    let mut view = StateView::new(&mut buffer, store);
    let block_ctx = BlockContext {
        number,
        timestamp: now_unix(),
        coinbase,
    };

    let mut included = Vec::new();
    let mut dropped = Vec::new();
    let mut gas_used = 0u64;

    for tx in candidates {
        if gas_used + tx.gas > gas_limit {
            continue;
        }
        match qchain_executor::apply(&tx, &block_ctx, &mut view, &NoopEvmExecutor) {
            Ok(receipt) => {
                gas_used += receipt.gas_used;
                included.push(tx);
            }
            Err(e) => {
                warn!(tx_hash = %tx.hash(), error = %e, "dropping transaction from block template");
                dropped.push(tx.hash());
            }
        }
    }

    let tx_hashes: Vec<_> = included.iter().map(|t| t.hash()).collect();
    let tx_root = Block::merkle_root(&tx_hashes);

    let template = Block::unsigned_header(
        head.hash(),
        qchain_core::types::Hash::ZERO,
        tx_root,
        qchain_core::types::Hash::ZERO,
        coinbase,
        coinbase,
        number,
        gas_limit,
        gas_used,
        block_ctx.timestamp,
        Vec::new(),
        keypair.algorithm,
    );
    let header: BlockHeader = qchain_consensus::sign_header(keypair, template)?;
    Ok((
        Block {
            header,
            transactions: included,
        },
        dropped,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,qchain=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("qchain node starting");

    std::fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("creating data dir {}", args.data_dir.display()))?;
    let store = Arc::new(StateStore::open(&args.data_dir).context("opening state database")?);

    let genesis_json = std::fs::read_to_string(&args.genesis)
        .with_context(|| format!("reading genesis config {}", args.genesis.display()))?;
    let genesis_config: GenesisConfig =
        serde_json::from_str(&genesis_json).context("parsing genesis config")?;
    let (genesis_block, validators) =
        apply_genesis(&store, &genesis_config).context("applying genesis")?;
    let validators = Arc::new(tokio::sync::RwLock::new(validators));
    info!(hash = %genesis_block.hash(), chain_id = genesis_config.config.chain_id, "genesis ready");

    // `StateStore` clones share the same open sled handles rather than
    // reopening the path, which sled locks exclusively per process.
    let chain = Arc::new(Chain::new((*store).clone(), Box::new(NoopEvmExecutor)));

    let pool = Arc::new(TxPool::new(PoolConfig::new(CHAIN_ID)));
    let net = LoopbackNetwork::default();
    let mut inbound_handle = net.handle();
    let broadcast_handle = net.handle();

    let validator_keypair = match &args.validator_key {
        Some(path) => Some(load_validator_keypair(path).context("loading validator keyfile")?),
        None => {
            warn!("no --validator-key given; this node will never propose blocks");
            None
        }
    };

    // ── RPC server ───────────────────────────────────────────────────────────
    let rpc_state = Arc::new(RpcServerState {
        chain: Arc::clone(&chain),
        pool: Arc::clone(&pool),
        chain_id: genesis_config.config.chain_id,
        genesis_hash: genesis_block.hash(),
    });
    let _rpc_handle = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;

    // ── Inbound network messages: admit txs, append blocks from peers ────────
    let inbound_pool = Arc::clone(&pool);
    let inbound_chain = Arc::clone(&chain);
    let inbound_validators = Arc::clone(&validators);
    tokio::spawn(async move {
        while let Some(msg) = inbound_handle.recv().await {
            match msg {
                NetMessage::NewTx { payload } => match bincode::deserialize(&payload) {
                    Ok(tx) => {
                        if let Err(e) = inbound_pool.admit(tx) {
                            warn!(error = %e, "rejected inbound transaction");
                        }
                    }
                    Err(e) => warn!(error = %e, "failed to decode inbound transaction"),
                },
                NetMessage::NewBlock { payload } => match bincode::deserialize::<Block>(&payload) {
                    Ok(block) => {
                        let mut validator_set = inbound_validators.write().await;
                        if let Err(e) = inbound_chain.append(block, &mut validator_set) {
                            warn!(error = %e, "rejected inbound block");
                        }
                    }
                    Err(e) => warn!(error = %e, "failed to decode inbound block"),
                },
            }
        }
    });

    // ── Block production loop ────────────────────────────────────────────────
    info!("node ready");
    let mut ticker = tokio::time::interval(Duration::from_secs(BLOCK_INTERVAL_SECS));
    let mut downtime = qchain_consensus::DowntimeTracker::new();
    let mut last_head_number: Option<u64> = None;
    loop {
        ticker.tick().await;

        let head = match chain.current_head() {
            Ok(head) => head,
            Err(e) => {
                warn!(error = %e, "no chain head yet");
                continue;
            }
        };

        // The head didn't move since the previous tick: whoever was
        // scheduled to propose the next block missed its slot.
        if last_head_number == Some(head.header.number) {
            let expected_proposer = {
                let validator_set = validators.read().await;
                validator_set.proposer_for(head.header.number + 1)
            };
            if downtime.record_miss(expected_proposer) {
                let mut validator_set = validators.write().await;
                if let Some(validator) = validator_set.get_mut(&expected_proposer) {
                    qchain_consensus::slash(
                        validator,
                        qchain_consensus::SlashReason::Downtime,
                        head.header.number,
                    );
                    warn!(validator = %expected_proposer, "slashed validator for downtime");
                }
            }
        }
        last_head_number = Some(head.header.number);

        let Some(keypair) = validator_keypair.as_ref() else {
            continue;
        };
        let next_number = head.header.number + 1;

        let is_proposer = {
            let validator_set = validators.read().await;
            validator_set.proposer_for(next_number) == keypair.address()
                && validator_set
                    .get(&keypair.address())
                    .map(|v| v.is_active(next_number))
                    .unwrap_or(false)
        };
        if !is_proposer {
            continue;
        }

        let gas_limit = head.header.gas_limit;
        let (block, dropped) = match build_block(
            chain.store(),
            &pool,
            keypair,
            keypair.address(),
            &head,
            gas_limit,
        ) {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "failed to build block template");
                continue;
            }
        };
        for hash in dropped {
            pool.remove(&hash);
        }

        let included: Vec<_> = block.transactions.iter().map(|t| t.hash()).collect();
        let mut validator_set = validators.write().await;
        match chain.append(block.clone(), &mut validator_set) {
            Ok(receipts) => {
                drop(validator_set);
                downtime.record_success(keypair.address());
                for hash in &included {
                    pool.remove(hash);
                }
                broadcast_handle.broadcast_block(&block);
                info!(
                    number = block.header.number,
                    txs = receipts.len(),
                    "produced and appended block"
                );
            }
            Err(e) => warn!(error = %e, "failed to append self-produced block"),
        }
    }
}
