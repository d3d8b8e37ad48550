#![cfg(test)]

use soroban_sdk::testutils::{Address as _, Ledger, LedgerInfo};
use soroban_sdk::{
    symbol_short, token, vec, Address, Bytes, BytesN, Env, IntoVal, Symbol, TryFromVal, Val, Vec,
};

// Import all contract types and clients
use counter::{Counter, CounterClient};
use multicall::{Multicall, MulticallClient};
use scheduler::{ExecutionState, ScheduleRequest, Scheduler, SchedulerClient};

const PRICE: i128 = 15;
const WINDOW: u64 = 10_000;
const GAS_LIMIT: u64 = 1_000_000;
const START: u64 = 1_000_000;

fn set_time(env: &Env, timestamp: u64) {
    let proto = env.ledger().protocol_version();

    env.ledger().set(LedgerInfo {
        protocol_version: proto,
        sequence_number: 1,
        timestamp,
        network_id: [0; 32],
        base_reserve: 10,
        min_temp_entry_ttl: 1,
        min_persistent_entry_ttl: 1,
        max_entry_ttl: 100000,
    });
}

/// Integration test that simulates a complete user flow:
/// 1. Deploy the engine, the batching facade and a counter target
/// 2. The provider registers a plan
/// 3. The requestor purchases credit and schedules through the facade in
///    one logical unit
/// 4. Time passes and a third party submits the execution
/// 5. Verify the target ran, the payee was paid and the credit is spent
#[test]
fn test_multi_contract_user_flow() {
    // Setup test environment; auth happens below the facade's frame
    let env = Env::default();
    env.mock_all_auths_allowing_non_root_auth();
    set_time(&env, START);

    let provider = Address::generate(&env);
    let payee = Address::generate(&env);
    let requestor = Address::generate(&env);
    let token_admin = Address::generate(&env);

    let token_id = env.register_stellar_asset_contract(token_admin);
    token::StellarAssetClient::new(&env, &token_id).mint(&requestor, &100_000);
    let token_client = token::Client::new(&env, &token_id);

    // Deploy all contracts
    let scheduler_id = env.register_contract(None, Scheduler);
    let scheduler = SchedulerClient::new(&env, &scheduler_id);

    let multicall_id = env.register_contract(None, Multicall);
    let multicall = MulticallClient::new(&env, &multicall_id);

    let counter_id = env.register_contract(None, Counter);
    let counter = CounterClient::new(&env, &counter_id);

    // Step 1: Initialize the engine and register a plan
    scheduler.initialize(&provider, &payee, &token_id);
    let plan_id = scheduler.add_plan(&provider, &PRICE, &WINDOW, &GAS_LIMIT, &None);

    // Step 2: Purchase and schedule through the facade, atomically
    let request = ScheduleRequest {
        plan_id,
        target: counter_id.clone(),
        function: symbol_short!("inc"),
        payload: Bytes::new(&env),
        gas: 0,
        timestamp: START + 500,
        value: 0,
    };
    let functions = vec![
        &env,
        Symbol::new(&env, "purchase"),
        Symbol::new(&env, "schedule"),
    ];
    let args: Vec<Vec<Val>> = vec![
        &env,
        vec![
            &env,
            requestor.into_val(&env),
            plan_id.into_val(&env),
            1u64.into_val(&env),
        ],
        vec![&env, requestor.into_val(&env), request.into_val(&env)],
    ];
    let results = multicall.aggregate(&scheduler_id, &functions, &args);
    let id = BytesN::<32>::try_from_val(&env, &results.get_unchecked(1)).unwrap();

    assert_eq!(scheduler.get_state(&id), ExecutionState::Scheduled);
    assert_eq!(scheduler.remaining_executions(&requestor, &plan_id), 0);
    assert_eq!(token_client.balance(&scheduler_id), PRICE);

    // Step 3: The window opens and anyone may submit
    set_time(&env, START + 500);
    let state = scheduler.execute(&id);

    // Step 4: Verify the outcome across all three contracts
    assert_eq!(state, ExecutionState::ExecutionSuccessful);
    assert_eq!(counter.count(), 1);
    assert_eq!(token_client.balance(&payee), PRICE);
    assert_eq!(token_client.balance(&scheduler_id), 0);
}

/// Round trip over several executions: purchase n credits, schedule all of
/// them, cancel one before its window, execute the rest. The books must
/// balance at every step.
#[test]
fn test_prepaid_round_trip() {
    let env = Env::default();
    env.mock_all_auths();
    set_time(&env, START);

    let provider = Address::generate(&env);
    let payee = Address::generate(&env);
    let requestor = Address::generate(&env);
    let token_admin = Address::generate(&env);

    let token_id = env.register_stellar_asset_contract(token_admin);
    token::StellarAssetClient::new(&env, &token_id).mint(&requestor, &100_000);
    let token_client = token::Client::new(&env, &token_id);

    let scheduler_id = env.register_contract(None, Scheduler);
    let scheduler = SchedulerClient::new(&env, &scheduler_id);
    let counter_id = env.register_contract(None, Counter);
    let counter = CounterClient::new(&env, &counter_id);

    scheduler.initialize(&provider, &payee, &token_id);
    let plan_id = scheduler.add_plan(&provider, &PRICE, &WINDOW, &GAS_LIMIT, &None);

    let n = 5u64;
    scheduler.purchase(&requestor, &plan_id, &n);
    assert_eq!(token_client.balance(&scheduler_id), n as i128 * PRICE);

    let mut ids: soroban_sdk::Vec<BytesN<32>> = soroban_sdk::Vec::new(&env);
    for i in 0..n {
        let request = ScheduleRequest {
            plan_id,
            target: counter_id.clone(),
            function: symbol_short!("inc"),
            payload: Bytes::new(&env),
            gas: 0,
            timestamp: START + 100 + i,
            value: 0,
        };
        ids.push_back(scheduler.schedule(&requestor, &request));
    }
    assert_eq!(scheduler.remaining_executions(&requestor, &plan_id), 0);
    assert_eq!(scheduler.executions_by_requestor_count(&requestor), n as u32);

    // Cancel the last one; its credit comes back
    let cancelled = ids.get_unchecked(n as u32 - 1);
    scheduler.cancel_scheduling(&requestor, &cancelled);
    assert_eq!(scheduler.get_state(&cancelled), ExecutionState::Cancelled);
    assert_eq!(scheduler.remaining_executions(&requestor, &plan_id), 1);

    // Execute the rest once their windows open
    set_time(&env, START + 100 + n);
    for i in 0..(n as u32 - 1) {
        let id = ids.get_unchecked(i);
        assert_eq!(scheduler.execute(&id), ExecutionState::ExecutionSuccessful);
    }

    assert_eq!(counter.count(), n as u32 - 1);
    assert_eq!(token_client.balance(&payee), (n as i128 - 1) * PRICE);
    // one unspent credit's worth stays in custody
    assert_eq!(token_client.balance(&scheduler_id), PRICE);
}

/// Pause drains: purchases freeze, prepaid credit flows back out through
/// the plan refund, and normal operation resumes after unpause.
#[test]
fn test_pause_and_drain_flow() {
    let env = Env::default();
    env.mock_all_auths();
    set_time(&env, START);

    let provider = Address::generate(&env);
    let payee = Address::generate(&env);
    let requestor = Address::generate(&env);
    let token_admin = Address::generate(&env);

    let token_id = env.register_stellar_asset_contract(token_admin);
    token::StellarAssetClient::new(&env, &token_id).mint(&requestor, &100_000);
    let token_client = token::Client::new(&env, &token_id);

    let scheduler_id = env.register_contract(None, Scheduler);
    let scheduler = SchedulerClient::new(&env, &scheduler_id);

    scheduler.initialize(&provider, &payee, &token_id);
    let plan_id = scheduler.add_plan(&provider, &PRICE, &WINDOW, &GAS_LIMIT, &None);

    scheduler.purchase(&requestor, &plan_id, &4);
    let before_pause = token_client.balance(&requestor);

    scheduler.pause(&provider);
    assert!(scheduler.try_purchase(&requestor, &plan_id, &1).is_err());

    let refunded = scheduler.request_plan_refund(&requestor, &plan_id);
    assert_eq!(refunded, 4 * PRICE);
    assert_eq!(token_client.balance(&requestor), before_pause + 4 * PRICE);
    assert_eq!(scheduler.remaining_executions(&requestor, &plan_id), 0);

    scheduler.unpause(&provider);
    scheduler.purchase(&requestor, &plan_id, &1);
    assert_eq!(scheduler.remaining_executions(&requestor, &plan_id), 1);
}
