#![no_std]
//! One-shot scheduler: requestors prepay for a bounded number of future
//! executions under a plan, schedule them with a timestamp and escrowed
//! value, and anyone may trigger them once the window opens. Overdue or
//! cancelled executions return their value and credit to the requestor.

use soroban_sdk::{contract, contractimpl, Address, BytesN, Env, Vec};

mod admin;
mod credit;
mod executions;
mod plans;
mod types;

pub use types::{
    AdminEvent, CreditEvent, DataKey, Error, Execution, ExecutionEvent, ExecutionSeed,
    ExecutionState, Plan, PlanEvent, ScheduleRequest,
};

#[contract]
pub struct Scheduler;

#[contractimpl]
impl Scheduler {
    // ── Admin / config ───────────────────────────────────────────────────

    /// Initialize the engine: service provider, payee and the value token
    /// (the native-asset contract escrowed execution value settles in).
    /// Callable once.
    pub fn initialize(
        env: Env,
        service_provider: Address,
        payee: Address,
        value_token: Address,
    ) -> Result<(), Error> {
        admin::do_initialize(&env, service_provider, payee, value_token)
    }

    pub fn get_service_provider(env: Env) -> Result<Address, Error> {
        admin::service_provider(&env)
    }

    pub fn get_payee(env: Env) -> Result<Address, Error> {
        admin::payee(&env)
    }

    /// Change the receiver of plan-price payments. Provider only.
    pub fn set_payee(env: Env, caller: Address, new_payee: Address) -> Result<(), Error> {
        admin::do_set_payee(&env, caller, new_payee)
    }

    /// Freeze purchases, scheduling and execution. Provider only. While
    /// paused, `request_plan_refund` opens and requestors can drain unused
    /// credit.
    pub fn pause(env: Env, caller: Address) -> Result<(), Error> {
        admin::do_pause(&env, caller)
    }

    /// Resume normal operation. Provider only.
    pub fn unpause(env: Env, caller: Address) -> Result<(), Error> {
        admin::do_unpause(&env, caller)
    }

    pub fn is_paused(env: Env) -> bool {
        admin::is_paused(&env)
    }

    // ── Plans ────────────────────────────────────────────────────────────

    /// Create a plan. Provider only. `token: None` makes a native-value
    /// plan settling in the value token.
    ///
    /// # Returns
    /// The new plan id; ids are sequential and never reused.
    pub fn add_plan(
        env: Env,
        caller: Address,
        price: i128,
        window: u64,
        gas_limit: u64,
        token: Option<Address>,
    ) -> Result<u32, Error> {
        plans::do_add_plan(&env, caller, price, window, gas_limit, token)
    }

    /// Deactivate a plan. Provider only. Blocks new purchases; previously
    /// purchased credit stays usable for scheduling.
    pub fn remove_plan(env: Env, caller: Address, plan_id: u32) -> Result<(), Error> {
        plans::do_remove_plan(&env, caller, plan_id)
    }

    pub fn get_plan(env: Env, plan_id: u32) -> Result<Plan, Error> {
        plans::get_plan(&env, plan_id)
    }

    /// Total number of plans ever created.
    pub fn plans_count(env: Env) -> u32 {
        plans::plans_count(&env)
    }

    // ── Credit ───────────────────────────────────────────────────────────

    /// Buy `quantity` executions under a plan, pulling `price * quantity`
    /// from the requestor in the plan's instrument.
    pub fn purchase(
        env: Env,
        requestor: Address,
        plan_id: u32,
        quantity: u64,
    ) -> Result<(), Error> {
        credit::do_purchase(&env, requestor, plan_id, quantity)
    }

    /// Push-style purchase: the caller declares the token and total being
    /// transferred alongside the plan and quantity. Rejected with
    /// `BadToken` / `AmountMismatch` when the declaration does not match
    /// the plan; otherwise identical in effect to `purchase`.
    pub fn purchase_with_transfer(
        env: Env,
        requestor: Address,
        token: Address,
        total: i128,
        plan_id: u32,
        quantity: u64,
    ) -> Result<(), Error> {
        credit::do_purchase_with_transfer(&env, requestor, token, total, plan_id, quantity)
    }

    /// Unconsumed prepaid executions for `(requestor, plan_id)`.
    pub fn remaining_executions(env: Env, requestor: Address, plan_id: u32) -> u64 {
        credit::remaining(&env, &requestor, plan_id)
    }

    /// While paused, reclaim the full value of unconsumed credit under a
    /// plan and zero the balance.
    ///
    /// # Returns
    /// The refunded amount in the plan's instrument.
    pub fn request_plan_refund(
        env: Env,
        requestor: Address,
        plan_id: u32,
    ) -> Result<i128, Error> {
        credit::do_request_plan_refund(&env, requestor, plan_id)
    }

    // ── Scheduling / execution ───────────────────────────────────────────

    /// Schedule one execution, consuming one credit and escrowing
    /// `request.value` in the value token.
    ///
    /// # Returns
    /// The execution id, derived from the request's field tuple.
    pub fn schedule(
        env: Env,
        requestor: Address,
        request: ScheduleRequest,
    ) -> Result<BytesN<32>, Error> {
        executions::do_schedule(&env, requestor, request)
    }

    /// Schedule several executions atomically. `total_value` must equal the
    /// sum of per-entry values and is escrowed in one transfer. Any failing
    /// entry aborts the whole batch with nothing consumed or stored.
    pub fn batch_schedule(
        env: Env,
        requestor: Address,
        requests: Vec<ScheduleRequest>,
        total_value: i128,
    ) -> Result<Vec<BytesN<32>>, Error> {
        executions::do_batch_schedule(&env, requestor, requests, total_value)
    }

    /// Attempt a scheduled execution. Callable by anyone. Inside the window
    /// the target runs and the payee is paid whether or not the target
    /// succeeds; past the window the attempt refunds the requestor instead.
    ///
    /// # Returns
    /// `ExecutionSuccessful`, `ExecutionFailed` or `Refunded`.
    pub fn execute(env: Env, id: BytesN<32>) -> Result<ExecutionState, Error> {
        executions::do_execute(&env, id)
    }

    /// Cancel a scheduled execution before its window closes. Requestor
    /// only. Returns the escrowed value and restores one credit.
    pub fn cancel_scheduling(env: Env, requestor: Address, id: BytesN<32>) -> Result<(), Error> {
        executions::do_cancel(&env, requestor, id)
    }

    /// Reclaim an overdue execution: value back, one credit restored.
    /// Requestor only; fails `NotOverdue` while the window is still open.
    pub fn request_execution_refund(
        env: Env,
        requestor: Address,
        id: BytesN<32>,
    ) -> Result<(), Error> {
        executions::do_request_refund(&env, requestor, id)
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// State of an execution; `Nonexistent` for unknown ids, `Overdue`
    /// derived for scheduled executions whose window has closed.
    pub fn get_state(env: Env, id: BytesN<32>) -> ExecutionState {
        executions::get_state(&env, &id)
    }

    pub fn get_execution(env: Env, id: BytesN<32>) -> Option<Execution> {
        executions::get_execution(&env, &id)
    }

    /// Paginated listing of a requestor's executions, oldest first. Fails
    /// `OutOfRange` when `offset` exceeds the count.
    pub fn get_executions_by_requestor(
        env: Env,
        requestor: Address,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Execution>, Error> {
        executions::by_requestor(&env, requestor, offset, limit)
    }

    pub fn executions_by_requestor_count(env: Env, requestor: Address) -> u32 {
        executions::count_by_requestor(&env, requestor)
    }
}
