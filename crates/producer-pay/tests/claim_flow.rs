//! End-to-end block processing and reward claims, including persistence.

use producer_pay::{
    ActionContext, BlockHeader, BlockTimestamp, ChainState, ClaimReceipt, Config, Error, Genesis,
    MemoryToken, Microseconds, Name, NullSchedule, Role, Store, SystemContract, TimePoint,
    SYSTEM_ACCOUNT,
};

const GENESIS: &str = r#"{
    "global": { "thresh_activated_stake_time": 1704067200000000 },
    "producers": [
        { "owner": "bp1", "active": true, "total_votes": 100.0 },
        { "owner": "bp2", "active": true },
        { "owner": "bp3", "active": false }
    ],
    "extras": [
        {
            "owner": "bp1",
            "fees": 0.1,
            "slots": [
                { "value": 1000000, "stake_holder": "bob", "last_pay": 1735689600000000 },
                { "value": 2000000, "stake_holder": "alice", "last_pay": 1735689600000000 }
            ]
        },
        {
            "owner": "bp2",
            "fees": 0.0,
            "slots": [
                { "value": 1000000, "stake_holder": "carol", "last_pay": 1735689600000000 }
            ]
        },
        {
            "owner": "bp3",
            "fees": 0.0,
            "slots": [
                { "value": 5000000, "stake_holder": "dave", "last_pay": 1735689600000000 }
            ]
        }
    ]
}"#;

fn name(s: &str) -> Name {
    s.parse().unwrap()
}

/// 30 days after every slot's last payment
fn claim_time() -> TimePoint {
    TimePoint::parse_rfc3339("2025-01-31T00:00:00Z").unwrap()
}

fn config() -> Config {
    // only the largest producer by stake is a validator
    Config {
        validator_seats: 1,
        ..Config::default()
    }
}

fn contract() -> SystemContract<MemoryToken> {
    let config = config();
    let genesis: Genesis = serde_json::from_str(GENESIS).unwrap();
    let state = ChainState::from_genesis(genesis).unwrap();
    let token = MemoryToken::new(config.system_account, config.reward_symbol);
    SystemContract::new(config, state, token)
}

fn claim(
    contract: &mut SystemContract<MemoryToken>,
    owner: &str,
    now: TimePoint,
) -> producer_pay::Result<ClaimReceipt> {
    let ctx = ActionContext::new(now).with_auth(name(owner));
    contract.claim_rewards(&ctx, name(owner))
}

fn assert_conserved(token: &MemoryToken) {
    let total: i64 = token.balances().map(|(_, amount)| amount).sum();
    assert_eq!(total, token.supply().amount);
    assert_eq!(token.balance(SYSTEM_ACCOUNT).amount, 0);
}

#[test]
fn test_validator_and_node_claims() {
    let mut contract = contract();

    // bp3 holds the most stake but is inactive; it still takes the only seat
    let err = claim(&mut contract, "bp3", claim_time()).unwrap_err();
    assert!(matches!(err, Error::InactiveProducer(_)));

    let receipt = claim(&mut contract, "bp1", claim_time()).unwrap();
    assert_eq!(receipt.role, Role::Node);
    assert_eq!(receipt.issued, 18_000_000);
    assert_eq!(receipt.fee, 1_800_000);

    let receipt = claim(&mut contract, "bp2", claim_time()).unwrap();
    assert_eq!(receipt.role, Role::Node);
    assert_eq!(receipt.issued, 6_000_000);
    assert_eq!(receipt.fee, 0);

    let token = contract.token();
    assert_eq!(token.balance(name("alice")).amount, 10_800_000);
    assert_eq!(token.balance(name("bob")).amount, 5_400_000);
    assert_eq!(token.balance(name("bp1")).amount, 1_800_000);
    assert_eq!(token.balance(name("carol")).amount, 6_000_000);
    assert_eq!(token.balance(name("bp2")).amount, 0);
    assert_eq!(token.balance(name("dave")).amount, 0);
    assert_conserved(token);
}

#[test]
fn test_top_seat_pays_validator_rate() {
    let mut contract = contract();
    let config = Config {
        validator_seats: 2,
        ..config()
    };
    let (state, token, ..) = contract.into_parts();
    contract = SystemContract::new(config, state, token);

    // seats: bp3 (5M), bp1 (3M)
    let receipt = claim(&mut contract, "bp1", claim_time()).unwrap();
    assert_eq!(receipt.role, Role::Validator);
    assert_eq!(receipt.issued, 21_000_000);
    assert_eq!(receipt.fee, 2_100_000);

    let payouts: Vec<_> = receipt
        .payouts
        .iter()
        .map(|p| (p.stake_holder, p.amount))
        .collect();
    assert_eq!(
        payouts,
        vec![(name("bob"), 6_300_000), (name("alice"), 12_600_000)]
    );
    assert_conserved(contract.token());
}

#[test]
fn test_slots_sorted_after_claim() {
    let mut contract = contract();
    claim(&mut contract, "bp1", claim_time()).unwrap();

    let extra = contract.state().extras.get(name("bp1")).unwrap();
    let holders: Vec<_> = extra.slots.iter().map(|s| s.stake_holder).collect();
    assert_eq!(holders, vec![name("alice"), name("bob")]);
    assert!(extra.slots.iter().all(|s| s.last_pay == claim_time()));
}

#[test]
fn test_repeat_claim_waits_for_cooldown() {
    let mut contract = contract();
    claim(&mut contract, "bp2", claim_time()).unwrap();
    let supply = contract.token().supply();

    let receipt = claim(&mut contract, "bp2", claim_time() + Microseconds::hours(2)).unwrap();
    assert!(receipt.is_empty());
    assert_eq!(contract.token().supply(), supply);

    // exactly three hours later the slot accrues again: 6 * 1M * 3h / 30d
    let receipt = claim(&mut contract, "bp2", claim_time() + Microseconds::hours(3)).unwrap();
    assert_eq!(receipt.issued, 25_000);
    assert_conserved(contract.token());
}

#[test]
fn test_blocks_then_claim_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path()).unwrap();

    let mut contract = contract();
    let start = BlockTimestamp::from_time_point(claim_time());
    for i in 0..5 {
        let header = BlockHeader {
            timestamp: BlockTimestamp::new(start.slot + i),
            producer: if i % 2 == 0 { name("bp1") } else { name("eosio.boot") },
        };
        let ctx = ActionContext::system(header.timestamp.to_time_point(), SYSTEM_ACCOUNT);
        contract.on_block(&ctx, &header).unwrap();
    }
    assert_eq!(contract.state().global.total_unpaid_blocks, 3);
    assert_eq!(contract.state().producers.get(name("bp1")).unwrap().unpaid_blocks, 3);

    claim(&mut contract, "bp1", claim_time()).unwrap();

    let (state, token, _, rex) = contract.into_parts();
    store.save(&state, &token, &rex).unwrap();
    drop(store);

    let store = Store::open(dir.path()).unwrap();
    let (state, token, rex) = store.load().unwrap().unwrap();
    assert_eq!(state.global.total_unpaid_blocks, 3);
    assert_eq!(token.supply().amount, 18_000_000);
    assert_conserved(&token);

    // reloaded state remembers the payment
    let mut contract = SystemContract::with_collaborators(config(), state, token, NullSchedule, rex);
    let receipt = claim(&mut contract, "bp1", claim_time() + Microseconds::hours(1)).unwrap();
    assert!(receipt.is_empty());
}

#[test]
fn test_maintenance_gate_through_contract() {
    let mut contract = contract();
    let start = BlockTimestamp::from_time_point(claim_time());
    let ctx = ActionContext::system(claim_time(), SYSTEM_ACCOUNT);

    let mut runs = 0;
    for offset in [0, 60, 119, 120, 121, 200, 240, 241] {
        let header = BlockHeader {
            timestamp: BlockTimestamp::new(start.slot + offset),
            producer: name("bp2"),
        };
        if contract.on_block(&ctx, &header).unwrap().maintenance {
            runs += 1;
        }
    }

    // first block opens the gate from genesis, then slots 120 and 240
    assert_eq!(runs, 3);
    assert_eq!(
        contract.state().global.last_producer_schedule_update,
        BlockTimestamp::new(start.slot + 240)
    );
}
