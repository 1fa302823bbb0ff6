//! Property tests for reward accrual and claims.

use producer_pay::claim::{accrue, plan_claim, RewardParams};
use producer_pay::{
    ActionContext, BlockHeader, BlockTimestamp, ChainState, Config, ContinuousVotePay, Error,
    MemoryToken, Microseconds, Name, ProducerExtraRecord, ProducerRecord, StakeSlot,
    SystemContract, TimePoint, SYSTEM_ACCOUNT,
};
use proptest::prelude::*;

const HOUR_US: i64 = 3_600_000_000;
const DAY_US: i64 = 24 * HOUR_US;

fn name(s: &str) -> Name {
    s.parse().unwrap()
}

fn now() -> TimePoint {
    TimePoint::parse_rfc3339("2025-02-01T00:00:00Z").unwrap()
}

/// One active producer with the given slots as `(value, micros since last pay)`
fn state(slots: &[(i64, i64)], fees: f64) -> ChainState {
    let mut state = ChainState::new();
    state
        .producers
        .emplace(ProducerRecord::new(name("bp"), true))
        .unwrap();

    let holders = ["alice", "bob", "carol", "dave", "erin", "frank"];
    let mut extra = ProducerExtraRecord::new(name("bp"));
    extra.set_fees(fees).unwrap();
    for (i, (value, age)) in slots.iter().enumerate() {
        let last_pay = now() + Microseconds::new(-age);
        extra
            .add_slot(StakeSlot::new(name(holders[i]), *value, last_pay))
            .unwrap();
    }
    state.extras.emplace(extra).unwrap();
    state
}

fn slots() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((1i64..1_000_000_000_000, 0i64..400 * DAY_US), 1..6)
}

#[derive(Debug, Clone)]
enum Step {
    Block { registered: bool },
    Claim,
}

/// Actions with a clock offset that may move backwards
fn steps() -> impl Strategy<Value = Vec<(Step, i64)>> {
    let step = prop_oneof![
        any::<bool>().prop_map(|registered| Step::Block { registered }),
        Just(Step::Claim),
    ];
    prop::collection::vec((step, -2 * DAY_US..4 * DAY_US), 1..40)
}

proptest! {
    #[test]
    fn cooldown_slots_are_untouched(
        value in 1i64..1_000_000_000_000,
        age in 0i64..3 * HOUR_US,
        fees in 0.0f64..=1.0,
    ) {
        let state = state(&[(value, age)], fees);
        let params = RewardParams::from(&Config::default());
        let plan = plan_claim(&state, &params, &ContinuousVotePay, name("bp"), now()).unwrap();

        prop_assert!(plan.is_noop());
        prop_assert!(plan.payouts().is_empty());
        prop_assert_eq!(plan.receipt().skipped_slots, 1);
    }

    #[test]
    fn issued_equals_fees_plus_payouts(slots in slots(), fees in 0.0f64..=1.0, seats in 0usize..2) {
        let state = state(&slots, fees);
        let params = RewardParams {
            validator_seats: seats,
            ..RewardParams::from(&Config::default())
        };
        let plan = plan_claim(&state, &params, &ContinuousVotePay, name("bp"), now()).unwrap();

        let paid: i64 = plan.payouts().iter().map(|p| p.amount).sum();
        prop_assert_eq!(plan.new_tokens(), plan.fee_total() + paid);
        prop_assert!(plan.payouts().iter().all(|p| p.amount > 0));
    }

    #[test]
    fn reward_grows_with_elapsed_time(
        value in 1i64..1_000_000_000_000,
        a in 0i64..400 * DAY_US,
        b in 0i64..400 * DAY_US,
        multiplier in 6i64..=7,
        fees in 0.0f64..=1.0,
    ) {
        let (short, long) = if a <= b { (a, b) } else { (b, a) };
        let short = accrue(value, Microseconds::new(short), multiplier, fees).unwrap();
        let long = accrue(value, Microseconds::new(long), multiplier, fees).unwrap();
        prop_assert!(short.reward <= long.reward);
    }

    #[test]
    fn claims_after_lockdown_fail(slots in slots(), after in 0i64..365 * DAY_US) {
        let config = Config::default();
        let token = MemoryToken::new(config.system_account, config.reward_symbol);
        let when = config.payment_lockdown + Microseconds::new(after);
        let mut contract = SystemContract::new(config, state(&slots, 0.05), token);

        let ctx = ActionContext::new(when).with_auth(name("bp"));
        let result = contract.claim_rewards(&ctx, name("bp"));

        prop_assert!(matches!(result, Err(Error::PaymentsLocked(_))));
        prop_assert_eq!(contract.token().supply().amount, 0);
        prop_assert!(contract.state().votepay.is_empty());
    }

    #[test]
    fn counters_and_claim_time_never_decrease(slots in slots(), steps in steps()) {
        let config = Config::default();
        let token = MemoryToken::new(config.system_account, config.reward_symbol);
        let mut contract = SystemContract::new(config, state(&slots, 0.05), token);

        let mut clock = now();
        let mut unpaid = 0;
        let mut total_unpaid = 0;
        let mut last_claim = TimePoint::default();

        for (step, offset) in steps {
            clock = clock + Microseconds::new(offset);
            match step {
                Step::Block { registered } => {
                    let header = BlockHeader {
                        timestamp: BlockTimestamp::from_time_point(clock),
                        producer: if registered { name("bp") } else { name("boot") },
                    };
                    let ctx = ActionContext::system(clock, SYSTEM_ACCOUNT);
                    contract.on_block(&ctx, &header).unwrap();
                }
                Step::Claim => {
                    let ctx = ActionContext::new(clock).with_auth(name("bp"));
                    let _ = contract.claim_rewards(&ctx, name("bp"));
                }
            }

            let state = contract.state();
            let producer = state.producers.get(name("bp")).unwrap();
            prop_assert!(producer.unpaid_blocks >= unpaid);
            prop_assert!(state.global.total_unpaid_blocks >= total_unpaid);
            prop_assert!(producer.last_claim_time >= last_claim);

            unpaid = producer.unpaid_blocks;
            total_unpaid = state.global.total_unpaid_blocks;
            last_claim = producer.last_claim_time;
        }
    }
}
