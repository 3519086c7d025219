//! Perpetual Ledger Core Simulation.
//!
//! Drives the state-transition engine end to end against in-memory mirror
//! ledgers: signed oracle ticks, proof-carrying updates, funding accrual,
//! and an insurance-backed liquidation.

use ed25519_dalek::SigningKey;
use perps_ledger::authz;
use perps_ledger::events::Event;
use perps_ledger::funding::{ema_next, instant_rate};
use perps_ledger::oracle::{clock_key, clock_leaf};
use perps_ledger::*;
use std::collections::HashMap;

fn main() {
    println!("Perpetual Ledger Core Engine Simulation");
    println!("Three Authenticated Ledgers, Proof-Carrying Transitions\n");

    scenario_1_position_lifecycle();
    scenario_2_funding_accrual();
    scenario_3_liquidation();

    println!("\nAll simulations completed successfully.");
}

// off-chain mirror: tracks the full ledgers and plain values so it can
// produce proofs and witnesses for every transition the engine commits
struct Harness {
    state: State,
    positions: LedgerStore,
    clocks: LedgerStore,
    funding: LedgerStore,
    last_tick: HashMap<AssetId, Timestamp>,
    funding_states: HashMap<AssetId, FundingState>,
    book: HashMap<(PublicKey, AssetId), Position>,
    oracle_sk: SigningKey,
    admin_sk: SigningKey,
    base_time: u64,
}

impl Harness {
    fn new() -> Self {
        let oracle_sk = SigningKey::from_bytes(&[11u8; 32]);
        let admin_sk = SigningKey::from_bytes(&[22u8; 32]);
        let state = State::genesis(
            Params::default(),
            authz::public_key(&oracle_sk),
            authz::public_key(&admin_sk),
        );
        Self {
            state,
            positions: LedgerStore::new(),
            clocks: LedgerStore::new(),
            funding: LedgerStore::new(),
            last_tick: HashMap::new(),
            funding_states: HashMap::new(),
            book: HashMap::new(),
            oracle_sk,
            admin_sk,
            base_time: chrono::Utc::now().timestamp() as u64,
        }
    }

    fn tick(&self, asset: AssetId, mark: Fixed, index: Fixed, offset_secs: u64) -> OracleSnapshot {
        let mut snap = OracleSnapshot {
            mark_price: mark,
            index_price: index,
            asset,
            timestamp: Timestamp::from_secs(self.base_time + offset_secs),
            authorization: Authorization([0u8; 64]),
        };
        snap.authorization = authz::sign(&self.oracle_sk, &snap.message());
        snap
    }

    fn witness(&self, asset: AssetId) -> TickWitness {
        TickWitness {
            prior_timestamp: self
                .last_tick
                .get(&asset)
                .copied()
                .unwrap_or(Timestamp::from_secs(0)),
            clock_proof: self.clocks.prove(&clock_key(asset)),
            prior_funding: self
                .funding_states
                .get(&asset)
                .copied()
                .unwrap_or_else(FundingState::flat),
            funding_proof: self.funding.prove(&FundingState::key(asset)),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn update(
        &self,
        action: Action,
        claimed: Position,
        asset: AssetId,
        delta_size: Fixed,
        fee: SignedBps,
        limit_price: Fixed,
        limit_is_min: bool,
        snapshot: &OracleSnapshot,
        signer: &SigningKey,
    ) -> Update {
        let key = claimed.key(asset);
        let prior_leaf = if action == Action::Open {
            EMPTY_LEAF
        } else {
            claimed.leaf()
        };
        let message = authz::user_action_message(
            action.domain_tag(),
            &claimed,
            delta_size,
            fee,
            limit_price,
            limit_is_min,
            snapshot.mark_price,
            snapshot.index_price,
            snapshot.asset,
            snapshot.timestamp,
        );
        Update {
            action,
            key,
            claimed,
            delta_size,
            fee,
            limit_price,
            limit_is_min,
            prior_leaf,
            proof: self.positions.prove(&key),
            authorization: authz::sign(signer, &message),
        }
    }

    // apply one transition, then replay the same mutation into the mirrors
    fn submit(&mut self, update: &Update, snapshot: &OracleSnapshot) -> Result<Event, EngineError> {
        let witness = self.witness(snapshot.asset);
        let transition = self.state.apply(update, snapshot, &witness)?;

        self.clocks
            .insert(&clock_key(snapshot.asset), clock_leaf(snapshot.timestamp));
        self.last_tick.insert(snapshot.asset, snapshot.timestamp);

        let instant = instant_rate(
            snapshot.mark_price,
            snapshot.index_price,
            self.state.params.funding_sensitivity,
            self.state.params.funding_cap_bps,
        );
        let next_funding = ema_next(
            &witness.prior_funding,
            instant,
            self.state.params.ema_alpha_num,
            self.state.params.ema_alpha_den,
        );
        self.funding
            .insert(&FundingState::key(snapshot.asset), next_funding.leaf());
        self.funding_states.insert(snapshot.asset, next_funding);

        let slot = (update.claimed.owner, snapshot.asset);
        match &transition.event {
            Event::PositionOpened(_) => {
                self.positions.insert(&update.key, update.claimed.leaf());
                self.book.insert(slot, update.claimed);
            }
            Event::PositionIncreased(e) => {
                let mut grown = update.claimed;
                grown.size = e.new_size;
                grown.entry_price = e.new_entry_price;
                self.positions.insert(&update.key, grown.leaf());
                self.book.insert(slot, grown);
            }
            Event::PositionReduced(e) => {
                if e.remaining_size.is_zero() {
                    self.positions.insert(&update.key, EMPTY_LEAF);
                    self.book.remove(&slot);
                } else {
                    let shrunk = update.claimed.reduced(e.closed_size, e.new_collateral);
                    self.positions.insert(&update.key, shrunk.leaf());
                    self.book.insert(slot, shrunk);
                }
            }
            Event::PositionClosed(_) | Event::PositionLiquidated(_) => {
                self.positions.insert(&update.key, EMPTY_LEAF);
                self.book.remove(&slot);
            }
            _ => {}
        }

        assert_eq!(self.positions.root(), transition.state.positions_root);
        assert_eq!(self.clocks.root(), transition.state.clock_root);
        assert_eq!(self.funding.root(), transition.state.funding_root);

        self.state = transition.state;
        Ok(transition.event)
    }
}

fn trader(seed: u8) -> (SigningKey, PublicKey) {
    let sk = SigningKey::from_bytes(&[seed; 32]);
    let pk = authz::public_key(&sk);
    (sk, pk)
}

/// Open, increase, reduce, close at an unmoving price.
fn scenario_1_position_lifecycle() {
    println!("Scenario 1: Position Lifecycle at a Flat Price\n");

    let mut harness = Harness::new();
    let (alice_sk, alice) = trader(31);
    let asset = AssetId(1);
    let price = Fixed::from_units(100);
    let fee = SignedBps::new(10, Sign::Positive);

    let snap = harness.tick(asset, price, price, 0);
    let open = Position::new(alice, Fixed::from_units(10), Fixed::from_units(1), Side::Long, price, 0);
    let update = harness.update(
        Action::Open, open, asset, Fixed::ZERO, SignedBps::zero(), Fixed::ZERO, true, &snap, &alice_sk,
    );
    harness.submit(&update, &snap).unwrap();
    println!("  Alice opens LONG 1 @ $100 with $10 collateral");

    let snap = harness.tick(asset, price, price, 60);
    let update = harness.update(
        Action::Increase,
        harness.book[&(alice, asset)],
        asset,
        Fixed::from_raw(500_000),
        SignedBps::zero(),
        Fixed::ZERO,
        true,
        &snap,
        &alice_sk,
    );
    harness.submit(&update, &snap).unwrap();
    let pos = harness.book[&(alice, asset)];
    println!("  Increase by 0.5: size {}, entry ${}", pos.size, pos.entry_price);

    let snap = harness.tick(asset, price, price, 120);
    let update = harness.update(
        Action::Reduce,
        pos,
        asset,
        Fixed::from_raw(750_000),
        fee,
        Fixed::from_units(99),
        true,
        &snap,
        &alice_sk,
    );
    let event = harness.submit(&update, &snap).unwrap();
    if let Event::PositionReduced(e) = &event {
        println!(
            "  Reduce 0.75 with 10bps fee: remaining {}, collateral ${}",
            e.remaining_size, e.new_collateral
        );
    }

    let snap = harness.tick(asset, price, price, 180);
    let update = harness.update(
        Action::Close,
        harness.book[&(alice, asset)],
        asset,
        Fixed::ZERO,
        fee,
        Fixed::from_units(99),
        true,
        &snap,
        &alice_sk,
    );
    let event = harness.submit(&update, &snap).unwrap();
    if let Event::PositionClosed(e) = &event {
        println!("  Close remaining 0.75: returned ${}", e.returned);
    }
    println!(
        "  Insurance fund after lifecycle: ${}\n",
        harness.state.insurance_fund
    );
}

/// A persistent mark premium charges longs and credits shorts.
fn scenario_2_funding_accrual() {
    println!("Scenario 2: Funding Accrual Under a Mark Premium\n");

    let mut harness = Harness::new();
    let (bob_sk, bob) = trader(32);
    let asset = AssetId(2);

    // admin installs a starting EMA before the first tick
    let seed = FundingState::new(50, Sign::Positive);
    let auth = authz::sign(
        &harness.admin_sk,
        &authz::admin_seed_funding_message(asset, seed.magnitude, seed.sign),
    );
    let proof = harness.funding.prove(&FundingState::key(asset));
    let transition = harness
        .state
        .seed_funding_state(asset, seed, &proof, &auth)
        .unwrap();
    harness.funding.insert(&FundingState::key(asset), seed.leaf());
    harness.funding_states.insert(asset, seed);
    harness.state = transition.state;
    println!("  Admin seeds funding EMA at +50bps/hour");

    let index = Fixed::from_units(100);
    let snap = harness.tick(asset, index, index, 0);
    let open = Position::new(bob, Fixed::from_units(10), Fixed::from_units(1), Side::Short, index, 0);
    let update = harness.update(
        Action::Open, open, asset, Fixed::ZERO, SignedBps::zero(), Fixed::ZERO, true, &snap, &bob_sk,
    );
    harness.submit(&update, &snap).unwrap();
    println!("  Bob opens SHORT 1 @ $100 with $10 collateral");
    println!("  EMA after flat open tick: {}", harness.funding_states[&asset]);

    // one hour later the mark trades 1% over index
    let mark = Fixed::from_units(101);
    let snap = harness.tick(asset, mark, index, 3600);
    let update = harness.update(
        Action::Close,
        harness.book[&(bob, asset)],
        asset,
        Fixed::ZERO,
        SignedBps::zero(),
        Fixed::from_units(102),
        false,
        &snap,
        &bob_sk,
    );
    let event = harness.submit(&update, &snap).unwrap();
    if let Event::PositionClosed(e) = &event {
        println!(
            "  Close after 1h at $101 mark: funding {}, returned ${}",
            e.funding, e.returned
        );
    }
    println!();
}

/// An underwater long is liquidated; the insurance fund absorbs the gap.
fn scenario_3_liquidation() {
    println!("Scenario 3: Liquidation Backed by the Insurance Fund\n");

    let mut harness = Harness::new();
    let (carol_sk, carol) = trader(33);
    let asset = AssetId(3);

    harness.state = harness.state.deposit_insurance(Fixed::from_units(10)).state;
    println!("  Insurance fund seeded with $10");

    let entry = Fixed::from_units(100);
    let snap = harness.tick(asset, entry, entry, 0);
    let open = Position::new(carol, Fixed::from_units(5), Fixed::from_units(1), Side::Long, entry, 0);
    let update = harness.update(
        Action::Open, open, asset, Fixed::ZERO, SignedBps::zero(), Fixed::ZERO, true, &snap, &carol_sk,
    );
    harness.submit(&update, &snap).unwrap();
    println!("  Carol opens LONG 1 @ $100 with $5 collateral");

    // mark drops through the bankruptcy price
    let mark = Fixed::from_units(93);
    let snap = harness.tick(asset, mark, mark, 600);
    let update = harness.update(
        Action::Liquidate,
        harness.book[&(carol, asset)],
        asset,
        Fixed::ZERO,
        SignedBps::zero(),
        Fixed::ZERO,
        true,
        &snap,
        &carol_sk,
    );
    let event = harness.submit(&update, &snap).unwrap();
    if let Event::PositionLiquidated(e) = &event {
        println!(
            "  Mark drops to $93: liquidated, shortfall ${} covered",
            e.shortfall
        );
    }
    println!(
        "  Insurance fund after liquidation: ${}",
        harness.state.insurance_fund
    );
}
