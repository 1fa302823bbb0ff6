//! producer-pay - block tracking and producer reward claims over a local state database

use anyhow::{bail, Context, Result};
use clap::Parser;
use producer_pay::{
    ActionContext, Asset, BlockHeader, BlockTimestamp, ChainState, Config, Genesis, MemoryToken, Name,
    NullSchedule, RexPool, Store, SystemContract, TimePoint,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "producer-pay")]
#[command(about = "Block production tracking and stake-weighted producer rewards")]
struct Cli {
    /// State database path
    #[arg(long, default_value = "producer-pay.db")]
    db: PathBuf,

    /// JSON config file (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Initialize the database from a genesis document
    Init {
        #[arg(long)]
        genesis: PathBuf,
    },

    /// Process one produced block
    Block {
        /// Producer account name
        #[arg(short, long)]
        producer: Name,

        /// Block timestamp in half-second slots since 2000-01-01
        #[arg(short, long)]
        slot: u32,

        /// Wall-clock time (RFC 3339); defaults to the slot's time
        #[arg(long)]
        now: Option<String>,
    },

    /// Claim rewards for a producer's stake holders
    Claim {
        #[arg(short, long)]
        owner: Name,

        /// Claim time (RFC 3339); defaults to the current time
        #[arg(long)]
        now: Option<String>,
    },

    /// Show producer records
    Show {
        #[arg(short, long)]
        producer: Option<Name>,
    },

    /// Show global state and token supply
    Info,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "producer_pay=info".into()))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let store = Store::open(&cli.db)?;

    match cli.command {
        Command::Init { genesis } => init(&store, &config, &genesis),
        Command::Block { producer, slot, now } => block(&store, config, producer, slot, now),
        Command::Claim { owner, now } => claim(&store, config, owner, now),
        Command::Show { producer } => show(&store, producer),
        Command::Info => show_info(&store, &config),
    }
}

fn load(store: &Store) -> Result<(ChainState, MemoryToken, RexPool)> {
    store
        .load()?
        .context("database is empty, run `producer-pay init` first")
}

fn parse_now(now: Option<String>) -> Result<Option<TimePoint>> {
    now.map(|s| TimePoint::parse_rfc3339(&s))
        .transpose()
        .context("invalid --now")
}

fn init(store: &Store, config: &Config, genesis: &Path) -> Result<()> {
    if !store.is_empty()? {
        bail!("database already initialized");
    }

    let genesis = Genesis::load(genesis)
        .with_context(|| format!("reading genesis {}", genesis.display()))?;
    let state = ChainState::from_genesis(genesis)?;
    let token = MemoryToken::new(config.system_account, config.reward_symbol);

    store.save(&state, &token, &RexPool::default())?;
    info!("initialized with {} producers", state.producers.len());
    Ok(())
}

fn block(store: &Store, config: Config, producer: Name, slot: u32, now: Option<String>) -> Result<()> {
    let timestamp = BlockTimestamp::new(slot);
    let now = parse_now(now)?.unwrap_or_else(|| timestamp.to_time_point());
    let (state, token, rex) = load(store)?;

    let ctx = ActionContext::system(now, config.system_account);
    let mut contract = SystemContract::with_collaborators(config, state, token, NullSchedule, rex);
    let outcome = contract.on_block(&ctx, &BlockHeader { timestamp, producer })?;

    let (state, token, _, rex) = contract.into_parts();
    store.save(&state, &token, &rex)?;

    println!(
        "block {} by {}: credited={} maintenance={}",
        slot, producer, outcome.credited, outcome.maintenance
    );
    if let Some(closed) = outcome.closed_bid {
        println!("closed name auction {} (bid {})", closed.name, closed.amount);
    }
    Ok(())
}

fn claim(store: &Store, config: Config, owner: Name, now: Option<String>) -> Result<()> {
    let now = parse_now(now)?.unwrap_or_else(TimePoint::now);
    let symbol = config.reward_symbol;
    let (state, token, rex) = load(store)?;

    let ctx = ActionContext::new(now).with_auth(owner);
    let mut contract = SystemContract::with_collaborators(config, state, token, NullSchedule, rex);
    let receipt = contract.claim_rewards(&ctx, owner)?;

    if receipt.is_empty() {
        println!(
            "{}: nothing to claim ({} slots in cooldown)",
            owner, receipt.skipped_slots
        );
        return Ok(());
    }

    let (state, token, _, rex) = contract.into_parts();
    store.save(&state, &token, &rex)?;

    println!("=== Claim by {} ({}) ===", owner, receipt.role);
    println!("issued: {}", Asset::new(receipt.issued, symbol));
    println!("fee:    {}", Asset::new(receipt.fee, symbol));
    for payout in &receipt.payouts {
        println!(
            "  {} <- {}",
            payout.stake_holder,
            Asset::new(payout.amount, symbol)
        );
    }
    if receipt.skipped_slots > 0 {
        println!("skipped {} slots in cooldown", receipt.skipped_slots);
    }
    Ok(())
}

fn show(store: &Store, producer: Option<Name>) -> Result<()> {
    let (state, ..) = load(store)?;

    let owners: Vec<Name> = match producer {
        Some(owner) => vec![state.producer(owner)?.owner],
        None => state.producers.iter().map(|p| p.owner).collect(),
    };

    for owner in owners {
        let record = state.producer(owner)?;
        println!("{}", serde_json::to_string_pretty(record)?);
        if let Some(extra) = state.extras.get(owner) {
            println!("{}", serde_json::to_string_pretty(extra)?);
        }
        if let Some(votepay) = state.votepay.get(owner) {
            println!("{}", serde_json::to_string_pretty(votepay)?);
        }
    }
    Ok(())
}

fn show_info(store: &Store, config: &Config) -> Result<()> {
    let (state, token, rex) = load(store)?;

    println!("=== producer-pay ===");
    println!("system account:     {}", config.system_account);
    println!("reward symbol:      {}", config.reward_symbol);
    println!("payment lockdown:   {}", config.payment_lockdown);
    println!("validator seats:    {}", config.validator_seats);
    println!("producers:          {}", state.producers.len());
    println!("stake records:      {}", state.extras.len());
    println!("open name bids:     {}", state.name_bids.iter().filter(|b| b.is_open()).count());
    println!("total unpaid blocks: {}", state.global.total_unpaid_blocks);
    println!("token supply:       {}", token.supply());
    println!("name bid proceeds:  {}", rex.namebid_proceeds);
    Ok(())
}
