//! xcm-transfer - inspect chains and build transfer calls offline
//!
//! usage:
//!   xcm-transfer chains
//!   xcm-transfer direction --from polkadot --to polkadot-asset-hub
//!   xcm-transfer build --from polkadot-asset-hub --to hydration \
//!       --token USDT --recipient 5Grw... --amount 5000000

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use xcm_transfer::utils::logging;
use xcm_transfer::xcm::{xcm_transfer_extrinsic, XcmTransferParams};
use xcm_transfer::{establish_direction, AccountId, ChainRegistry, TokenRegistry};

#[derive(Parser)]
#[command(name = "xcm-transfer")]
#[command(about = "Inspect Substrate chains and build XCM transfer calls")]
#[command(version)]
struct Args {
    /// chain table (JSON array); built-in chains when omitted
    #[arg(long, global = true)]
    chains: Option<PathBuf>,

    /// token table (JSON array); built-in tokens when omitted
    #[arg(long, global = true)]
    tokens: Option<PathBuf>,

    /// accept ws:// endpoints on remote hosts
    #[arg(long, global = true)]
    allow_insecure: bool,

    /// debug logging to stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered chains
    Chains {
        #[arg(long)]
        json: bool,
    },
    /// List registered tokens
    Tokens,
    /// Classify a transfer between two chains
    Direction {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Print the token's location as seen from a chain
    Location {
        #[arg(long)]
        chain: String,
        #[arg(long)]
        token: String,
    },
    /// Build a cross-chain transfer call and print it as JSON
    Build {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        token: String,
        /// SS58 or 0x-hex account
        #[arg(long)]
        recipient: String,
        /// amount in plancks
        #[arg(long)]
        amount: u128,
    },
}

fn load_chains(args: &Args) -> Result<ChainRegistry> {
    match &args.chains {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading chain table {}", path.display()))?;
            Ok(ChainRegistry::from_json(&json, args.allow_insecure)?)
        }
        None => Ok(ChainRegistry::builtin()),
    }
}

fn load_tokens(args: &Args) -> Result<TokenRegistry> {
    match &args.tokens {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading token table {}", path.display()))?;
            Ok(TokenRegistry::from_json(&json)?)
        }
        None => Ok(TokenRegistry::builtin()),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.debug {
        logging::enable_debug();
    }

    let chains = load_chains(&args)?;

    match &args.command {
        Command::Chains { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(chains.all())?);
            } else {
                for chain in chains.all() {
                    let para = chain.numeric_id.map(|id| id.to_string()).unwrap_or_else(|| "-".into());
                    println!(
                        "{:<22} {:<10} {:<10} {:>5}  {}",
                        chain.id,
                        format!("{:?}", chain.chain_type).to_lowercase(),
                        chain.network(),
                        para,
                        chain.native_token
                    );
                }
            }
        }
        Command::Tokens => {
            for token in load_tokens(&args)?.all() {
                println!(
                    "{:<6} {:>2}  {:?}  {}",
                    token.symbol,
                    token.decimals,
                    token.kind,
                    token.network.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Direction { from, to } => {
            let direction = establish_direction(chains.get(from)?, chains.get(to)?)?;
            println!("{}", direction);
        }
        Command::Location { chain, token } => {
            let tokens = load_tokens(&args)?;
            let location = tokens.get(token)?.location_on(chains.get(chain)?)?;
            println!("{}", serde_json::to_string_pretty(&location)?);
        }
        Command::Build {
            from,
            to,
            token,
            recipient,
            amount,
        } => {
            if from == to {
                bail!("same-chain transfers need a live connection to inspect the chain's pallets");
            }
            let tokens = load_tokens(&args)?;
            let origin = chains.get(from)?;
            let destination = chains.get(to)?;
            let recipient = AccountId::parse(recipient)?;
            let direction = establish_direction(origin, destination)?;

            let call = xcm_transfer_extrinsic(&XcmTransferParams {
                direction,
                origin,
                destination,
                token: tokens.get(token)?,
                recipient: &recipient,
                plancks: *amount,
            })?;

            let output = json!({
                "direction": direction,
                "pallet": call.pallet,
                "call": call.call,
                "args": call.args,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
