use soroban_sdk::{
    symbol_short, token, xdr::ToXdr, Address, BytesN, Env, IntoVal, Val, Vec,
};

use crate::admin;
use crate::credit;
use crate::plans;
use crate::types::{
    DataKey, Error, Execution, ExecutionEvent, ExecutionSeed, ExecutionState, ScheduleRequest,
};

/// Derive the execution id from its canonical field tuple. Pure: equal
/// seeds always hash to equal ids, across schedule and batch_schedule.
pub fn derive_id(env: &Env, seed: &ExecutionSeed) -> BytesN<32> {
    let encoded = seed.clone().to_xdr(env);
    env.crypto().sha256(&encoded).into()
}

/// Read an execution record by id.
pub fn get_execution(env: &Env, id: &BytesN<32>) -> Option<Execution> {
    env.storage().persistent().get(&DataKey::Execution(id.clone()))
}

/// Current state of an execution.
///
/// `Nonexistent` for ids never written. `Overdue` is derived: a `Scheduled`
/// execution whose window has closed reads as overdue without any
/// transaction having touched it.
pub fn get_state(env: &Env, id: &BytesN<32>) -> ExecutionState {
    match get_execution(env, id) {
        Some(exec) => derived_state(env, &exec),
        None => ExecutionState::Nonexistent,
    }
}

fn derived_state(env: &Env, exec: &Execution) -> ExecutionState {
    if exec.state == ExecutionState::Scheduled {
        let plan = plans::get_plan(env, exec.plan_id);
        if let Ok(plan) = plan {
            if env.ledger().timestamp() > window_end(exec.timestamp, plan.window) {
                return ExecutionState::Overdue;
            }
        }
    }
    exec.state
}

// Saturating: a window that runs past u64::MAX never closes.
fn window_end(timestamp: u64, window: u64) -> u64 {
    timestamp.saturating_add(window)
}

fn store_execution(env: &Env, id: &BytesN<32>, exec: &Execution) {
    let key = DataKey::Execution(id.clone());
    env.storage().persistent().set(&key, exec);
    admin::extend_persistent_ttl(env, &key);
}

fn requestor_index(env: &Env, requestor: &Address) -> Vec<BytesN<32>> {
    env.storage()
        .persistent()
        .get(&DataKey::RequestorExecs(requestor.clone()))
        .unwrap_or_else(|| Vec::new(env))
}

/// Schedule one execution, pulling the escrowed value alongside.
///
/// # Returns
/// The derived execution id.
///
/// # Errors
/// * `ContractPaused` - While the engine is paused
/// * `PlanNotFound` - Unknown plan (inactive plans stay schedulable)
/// * `GasLimitExceeded` - Declared gas above the plan ceiling
/// * `CannotScheduleInPast` - Requested timestamp before now
/// * `InvalidValue` - Negative escrow value
/// * `AlreadyScheduled` - An execution with the same field tuple is live
/// * `NoBalanceAvailable` - No prepaid credit under the plan
pub fn do_schedule(
    env: &Env,
    requestor: Address,
    request: ScheduleRequest,
) -> Result<BytesN<32>, Error> {
    admin::when_initialized(env)?;
    admin::when_not_paused(env)?;
    requestor.require_auth();
    admin::extend_instance_ttl(env);

    let value = request.value;
    let id = insert(env, &requestor, request)?;
    collect_value(env, &requestor, value)?;
    Ok(id)
}

/// Schedule a batch atomically. The declared `total_value` must equal the
/// sum of per-entry values; it is pulled once, then every entry goes
/// through the same insertion path as `do_schedule`. Any failing entry
/// aborts the whole call, leaving no credit consumed and nothing stored.
pub fn do_batch_schedule(
    env: &Env,
    requestor: Address,
    requests: Vec<ScheduleRequest>,
    total_value: i128,
) -> Result<Vec<BytesN<32>>, Error> {
    admin::when_initialized(env)?;
    admin::when_not_paused(env)?;
    requestor.require_auth();
    admin::extend_instance_ttl(env);

    let mut sum: i128 = 0;
    for request in requests.iter() {
        if request.value < 0 {
            return Err(Error::InvalidValue);
        }
        sum = sum.checked_add(request.value).ok_or(Error::AmountOverflow)?;
    }
    if sum != total_value {
        return Err(Error::ExecutionsTotalValueMismatch);
    }

    collect_value(env, &requestor, total_value)?;

    let mut ids = Vec::new(env);
    for request in requests.iter() {
        ids.push_back(insert(env, &requestor, request)?);
    }
    Ok(ids)
}

fn collect_value(env: &Env, requestor: &Address, value: i128) -> Result<(), Error> {
    if value > 0 {
        token::Client::new(env, &admin::value_token(env)?).transfer(
            requestor,
            &env.current_contract_address(),
            &value,
        );
    }
    Ok(())
}

// Validation, credit debit and storage for one entry. Value escrow is the
// caller's job.
fn insert(env: &Env, requestor: &Address, request: ScheduleRequest) -> Result<BytesN<32>, Error> {
    let plan = plans::get_plan(env, request.plan_id)?;
    if request.gas > plan.gas_limit {
        return Err(Error::GasLimitExceeded);
    }
    if request.timestamp < env.ledger().timestamp() {
        return Err(Error::CannotScheduleInPast);
    }
    if request.value < 0 {
        return Err(Error::InvalidValue);
    }

    let seed = ExecutionSeed {
        requestor: requestor.clone(),
        plan_id: request.plan_id,
        target: request.target.clone(),
        function: request.function.clone(),
        payload: request.payload.clone(),
        gas: request.gas,
        timestamp: request.timestamp,
        value: request.value,
    };
    let id = derive_id(env, &seed);

    // A live duplicate is rejected; ids whose previous run reached a
    // terminal state may be scheduled again.
    if let Some(existing) = get_execution(env, &id) {
        if existing.state == ExecutionState::Scheduled {
            return Err(Error::AlreadyScheduled);
        }
    }

    credit::debit_one(env, requestor, request.plan_id)?;

    let exec = Execution {
        requestor: requestor.clone(),
        plan_id: request.plan_id,
        target: request.target,
        function: request.function,
        payload: request.payload,
        gas: request.gas,
        timestamp: request.timestamp,
        value: request.value,
        state: ExecutionState::Scheduled,
    };
    store_execution(env, &id, &exec);

    let mut index = requestor_index(env, requestor);
    if index.first_index_of(id.clone()).is_none() {
        index.push_back(id.clone());
        let key = DataKey::RequestorExecs(requestor.clone());
        env.storage().persistent().set(&key, &index);
        admin::extend_persistent_ttl(env, &key);
    }

    env.events().publish(
        (symbol_short!("exec"), ExecutionEvent::Requested),
        (id.clone(), requestor.clone(), request.timestamp),
    );

    Ok(id)
}

/// Attempt a scheduled execution. Callable by anyone: a failed submission
/// leaves the record `Scheduled` and a third party may retry.
///
/// Inside the window the target is invoked with its payload; the plan price
/// goes to the payee whether or not the target itself succeeds, since the
/// scheduling service was rendered. Past the window the attempt turns into
/// a refund: value and credit return to the requestor and the target is
/// never invoked.
///
/// # Returns
/// The resulting state: `ExecutionSuccessful`, `ExecutionFailed` or
/// `Refunded`.
///
/// # Errors
/// * `NotScheduled` - Unknown id
/// * `AlreadyExecuted` - The record already reached a terminal state
/// * `TooSoon` - Before the requested timestamp
pub fn do_execute(env: &Env, id: BytesN<32>) -> Result<ExecutionState, Error> {
    admin::when_initialized(env)?;
    admin::when_not_paused(env)?;
    admin::extend_instance_ttl(env);

    let mut exec = get_execution(env, &id).ok_or(Error::NotScheduled)?;
    if exec.state != ExecutionState::Scheduled {
        return Err(Error::AlreadyExecuted);
    }

    let plan = plans::get_plan(env, exec.plan_id)?;
    let now = env.ledger().timestamp();
    if now < exec.timestamp {
        return Err(Error::TooSoon);
    }
    if now > window_end(exec.timestamp, plan.window) {
        refund(env, &id, &mut exec)?;
        return Ok(ExecutionState::Refunded);
    }

    // The record leaves `Scheduled` before the external call: a reentrant
    // execute on the same id sees a terminal state.
    exec.state = ExecutionState::ExecutionFailed;
    store_execution(env, &id, &exec);

    let mut args: Vec<Val> = Vec::new(env);
    if exec.payload.len() > 0 {
        args.push_back(exec.payload.into_val(env));
    }
    let success = env
        .try_invoke_contract::<Val, soroban_sdk::Error>(&exec.target, &exec.function, args)
        .is_ok();

    // Escrowed value follows the outcome; either way it leaves custody.
    if exec.value > 0 {
        let value_token = token::Client::new(env, &admin::value_token(env)?);
        let recipient = if success { &exec.target } else { &exec.requestor };
        value_token.transfer(&env.current_contract_address(), recipient, &exec.value);
    }

    if plan.price > 0 {
        let instrument = plans::instrument(env, &plan)?;
        token::Client::new(env, &instrument).transfer(
            &env.current_contract_address(),
            &admin::payee(env)?,
            &plan.price,
        );
    }

    if success {
        exec.state = ExecutionState::ExecutionSuccessful;
        store_execution(env, &id, &exec);
    }

    env.events().publish(
        (symbol_short!("exec"), ExecutionEvent::Executed),
        (id, success),
    );

    Ok(exec.state)
}

/// Cancel a scheduled execution before its window opens. Requestor only.
///
/// Overdue executions are past cancellation; they go through the refund
/// path instead.
///
/// # Errors
/// * `NotScheduled` - Unknown id, terminal state, or overdue
/// * `NotAuthorized` - Caller is not the requestor
pub fn do_cancel(env: &Env, requestor: Address, id: BytesN<32>) -> Result<(), Error> {
    admin::when_initialized(env)?;
    requestor.require_auth();
    admin::extend_instance_ttl(env);

    let mut exec = get_execution(env, &id).ok_or(Error::NotScheduled)?;
    if exec.requestor != requestor {
        return Err(Error::NotAuthorized);
    }
    if derived_state(env, &exec) != ExecutionState::Scheduled {
        return Err(Error::NotScheduled);
    }

    exec.state = ExecutionState::Cancelled;
    store_execution(env, &id, &exec);

    return_value(env, &exec)?;
    credit::credit_one(env, &exec.requestor, exec.plan_id);

    env.events()
        .publish((symbol_short!("exec"), ExecutionEvent::Cancelled), id);

    Ok(())
}

/// Reclaim an overdue execution explicitly. Requestor only.
///
/// # Errors
/// * `NotScheduled` - Unknown id
/// * `NotAuthorized` - Caller is not the requestor
/// * `NotOverdue` - The window has not closed yet, or the record already
///   reached a terminal state
pub fn do_request_refund(env: &Env, requestor: Address, id: BytesN<32>) -> Result<(), Error> {
    admin::when_initialized(env)?;
    requestor.require_auth();
    admin::extend_instance_ttl(env);

    let mut exec = get_execution(env, &id).ok_or(Error::NotScheduled)?;
    if exec.requestor != requestor {
        return Err(Error::NotAuthorized);
    }
    if derived_state(env, &exec) != ExecutionState::Overdue {
        return Err(Error::NotOverdue);
    }

    refund(env, &id, &mut exec)
}

// Shared terminal transition for both refund triggers: value back, credit
// back, state `Refunded`.
fn refund(env: &Env, id: &BytesN<32>, exec: &mut Execution) -> Result<(), Error> {
    exec.state = ExecutionState::Refunded;
    store_execution(env, id, exec);

    return_value(env, exec)?;
    credit::credit_one(env, &exec.requestor, exec.plan_id);

    env.events()
        .publish((symbol_short!("exec"), ExecutionEvent::Refunded), id.clone());

    Ok(())
}

fn return_value(env: &Env, exec: &Execution) -> Result<(), Error> {
    if exec.value > 0 {
        token::Client::new(env, &admin::value_token(env)?).transfer(
            &env.current_contract_address(),
            &exec.requestor,
            &exec.value,
        );
    }
    Ok(())
}

/// Paginated listing of a requestor's executions, oldest first.
///
/// # Errors
/// * `OutOfRange` - `offset` exceeds the requestor's execution count
pub fn by_requestor(
    env: &Env,
    requestor: Address,
    offset: u32,
    limit: u32,
) -> Result<Vec<Execution>, Error> {
    let index = requestor_index(env, &requestor);
    if offset > index.len() {
        return Err(Error::OutOfRange);
    }

    let mut page = Vec::new(env);
    let end = index.len().min(offset.saturating_add(limit));
    for i in offset..end {
        let id = index.get_unchecked(i);
        if let Some(exec) = get_execution(env, &id) {
            page.push_back(exec);
        }
    }
    Ok(page)
}

pub fn count_by_requestor(env: &Env, requestor: Address) -> u32 {
    requestor_index(env, &requestor).len()
}
