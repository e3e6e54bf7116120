//! Read-only inspection of goal and stake accounts.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;
use tracing::info;
use tracing_subscriber::EnvFilter;

use habit_stake_client::{
    AccountReader, AddressDeriver, Clock, ClientConfig, Goal, GoalHash, RpcLedger, Stake,
    SystemClock,
};

#[derive(Parser, Debug)]
#[command(name = "stake-inspect", about = "Inspect habit-stake accounts")]
struct Args {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the configured RPC endpoint
    #[arg(long)]
    rpc_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print derived addresses without touching the network
    Derive {
        /// 64 hex chars, or an off-chain goal id that gets hashed
        goal: String,
        staker: Option<Pubkey>,
        /// Also derive token accounts for this mint
        #[arg(long)]
        mint: Option<Pubkey>,
    },
    /// Fetch and decode a goal account
    Goal { goal: String },
    /// Fetch a stake and list the actions its staker may take now
    Stake { goal: String, staker: Pubkey },
}

fn parse_goal(raw: &str) -> GoalHash {
    if raw.len() == 64 {
        if let Ok(hash) = GoalHash::from_str(raw) {
            return hash;
        }
    }
    GoalHash::from_goal_id(raw)
}

fn goal_json(goal: &Goal) -> Value {
    json!({
        "goal_hash": goal.goal_hash.to_string(),
        "authority": goal.authority.to_string(),
        "resolver": goal.resolver.to_string(),
        "group_vault": goal.group_vault.to_string(),
        "mint": goal.mint.to_string(),
        "starts_on": goal.starts_on,
        "ends_on": goal.ends_on,
    })
}

fn stake_json(stake: &Stake) -> Value {
    json!({
        "goal": stake.goal.to_string(),
        "staker": stake.staker.to_string(),
        "amount": stake.amount,
        "status": format!("{:?}", stake.status),
        "created_at": stake.created_at,
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = ClientConfig::load(args.config.as_deref()).context("loading config")?;
    if let Some(url) = args.rpc_url {
        config.rpc_url = url;
    }
    let deriver = AddressDeriver::new(config.program_id()?);

    let output = match args.command {
        Command::Derive { goal, staker, mint } => {
            let goal_hash = parse_goal(&goal);
            let (goal_address, goal_bump) = deriver.find_goal_pda(&goal_hash);
            let mut out = json!({
                "program_id": deriver.program_id.to_string(),
                "goal_hash": goal_hash.to_string(),
                "goal": goal_address.to_string(),
                "goal_bump": goal_bump,
            });
            if let Some(staker) = staker {
                let (stake_address, stake_bump) = deriver.find_stake_pda(&goal_address, &staker);
                out["stake"] = json!(stake_address.to_string());
                out["stake_bump"] = json!(stake_bump);
                if let Some(mint) = mint {
                    out["escrow"] = json!(deriver.find_stake_escrow(&stake_address, &mint).to_string());
                    out["staker_token_account"] =
                        json!(deriver.find_token_account(&staker, &mint).0.to_string());
                }
            }
            out
        }
        Command::Goal { goal } => {
            let reader = connect(&config, deriver)?;
            let goal_hash = parse_goal(&goal);
            info!(%goal_hash, rpc = %config.rpc_url, "fetching goal");
            match reader.fetch_goal(&goal_hash).await? {
                Some(goal) => goal_json(&goal),
                None => json!(null),
            }
        }
        Command::Stake { goal, staker } => {
            let reader = connect(&config, deriver)?;
            let goal_hash = parse_goal(&goal);
            let now = SystemClock.now();
            let view = reader.load_view(&goal_hash, &staker, now).await?;
            json!({
                "goal_address": view.goal_address.to_string(),
                "goal": goal_json(&view.goal),
                "stake_address": view.stake_address.to_string(),
                "stake": view.stake.as_ref().map(stake_json),
                "allowed_actions": view
                    .allowed_actions
                    .iter()
                    .map(|action| action.name())
                    .collect::<Vec<_>>(),
                "now": now,
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn connect(config: &ClientConfig, deriver: AddressDeriver) -> Result<AccountReader> {
    let ledger = RpcLedger::from_config(config).context("building rpc client")?;
    Ok(AccountReader::new(Arc::new(ledger), deriver))
}
