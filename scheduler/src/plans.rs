use soroban_sdk::{symbol_short, Address, Env};

use crate::admin;
use crate::types::{DataKey, Error, Plan, PlanEvent};

/// Create a new plan. Provider only.
///
/// # Arguments
/// * `price` - Amount charged per execution, in the plan's instrument
/// * `window` - Seconds after the requested timestamp during which execution
///   is valid (must be > 0)
/// * `gas_limit` - Ceiling on the gas budget a scheduled call may declare
/// * `token` - Payment instrument; `None` settles in the value token
///
/// # Returns
/// The id of the created plan. Ids are sequential and never reused.
///
/// # Errors
/// * `NotAuthorized` - If caller is not the service provider
/// * `InvalidPrice` - If price is negative
/// * `InvalidWindow` - If window is zero
pub fn do_add_plan(
    env: &Env,
    caller: Address,
    price: i128,
    window: u64,
    gas_limit: u64,
    token: Option<Address>,
) -> Result<u32, Error> {
    admin::require_provider(env, &caller)?;

    if price < 0 {
        return Err(Error::InvalidPrice);
    }
    if window == 0 {
        return Err(Error::InvalidWindow);
    }

    admin::extend_instance_ttl(env);
    let plan_id: u32 = env
        .storage()
        .instance()
        .get(&DataKey::NextPlanId)
        .ok_or(Error::NotInitialized)?;

    let plan = Plan {
        price,
        window,
        gas_limit,
        token: token.clone(),
        active: true,
    };
    let key = DataKey::Plan(plan_id);
    env.storage().persistent().set(&key, &plan);
    admin::extend_persistent_ttl(env, &key);
    env.storage()
        .instance()
        .set(&DataKey::NextPlanId, &(plan_id + 1));

    env.events().publish(
        (symbol_short!("plan"), PlanEvent::Added),
        (plan_id, price, window, gas_limit, token),
    );

    Ok(plan_id)
}

/// Deactivate a plan. Provider only.
///
/// Deactivation blocks new purchases but leaves previously purchased credit
/// and already scheduled executions untouched.
///
/// # Errors
/// * `NotAuthorized` - If caller is not the service provider
/// * `PlanNotFound` - If no plan exists under `plan_id`
/// * `PlanAlreadyInactive` - If the plan was already deactivated
pub fn do_remove_plan(env: &Env, caller: Address, plan_id: u32) -> Result<(), Error> {
    admin::require_provider(env, &caller)?;

    let key = DataKey::Plan(plan_id);
    let mut plan: Plan = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::PlanNotFound)?;
    if !plan.active {
        return Err(Error::PlanAlreadyInactive);
    }

    plan.active = false;
    env.storage().persistent().set(&key, &plan);

    env.events()
        .publish((symbol_short!("plan"), PlanEvent::Removed), plan_id);

    Ok(())
}

/// Read a plan, failing explicitly for unknown ids.
pub fn get_plan(env: &Env, plan_id: u32) -> Result<Plan, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::Plan(plan_id))
        .ok_or(Error::PlanNotFound)
}

/// Total number of plans ever created (active and inactive).
pub fn plans_count(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::NextPlanId)
        .unwrap_or(0u32)
}

/// Resolve the token a plan settles in. `None` means the value token.
pub fn instrument(env: &Env, plan: &Plan) -> Result<Address, Error> {
    match &plan.token {
        Some(token) => Ok(token.clone()),
        None => admin::value_token(env),
    }
}
