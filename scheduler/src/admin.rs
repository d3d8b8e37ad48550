use soroban_sdk::{symbol_short, Address, Env};

use crate::types::{AdminEvent, DataKey, Error};

// Storage TTL constants for active data
const INSTANCE_LIFETIME_THRESHOLD: u32 = 17280; // ~1 day
const INSTANCE_BUMP_AMOUNT: u32 = 518400; // ~30 days

// Persistent entries (plans, executions, balances) outlive instance data
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 17280; // ~1 day
const PERSISTENT_BUMP_AMOUNT: u32 = 2592000; // ~180 days (6 months)

/// Extend the TTL of instance storage
pub fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

/// Extend the TTL of a persistent entry
pub fn extend_persistent_ttl(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Store service provider, payee and the value token. Callable once.
///
/// The value token stands in for native value: escrowed execution `value`
/// and plans without an explicit token settle in it.
pub fn do_initialize(
    env: &Env,
    service_provider: Address,
    payee: Address,
    value_token: Address,
) -> Result<(), Error> {
    if env.storage().instance().has(&DataKey::ServiceProvider) {
        return Err(Error::AlreadyInitialized);
    }
    service_provider.require_auth();

    extend_instance_ttl(env);
    env.storage()
        .instance()
        .set(&DataKey::ServiceProvider, &service_provider);
    env.storage().instance().set(&DataKey::Payee, &payee);
    env.storage()
        .instance()
        .set(&DataKey::ValueToken, &value_token);
    env.storage().instance().set(&DataKey::Paused, &false);
    env.storage().instance().set(&DataKey::NextPlanId, &0u32);
    Ok(())
}

pub fn service_provider(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::ServiceProvider)
        .ok_or(Error::NotInitialized)
}

pub fn payee(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Payee)
        .ok_or(Error::NotInitialized)
}

pub fn value_token(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::ValueToken)
        .ok_or(Error::NotInitialized)
}

/// Require `caller` to authorize and to be the service provider.
pub fn require_provider(env: &Env, caller: &Address) -> Result<(), Error> {
    caller.require_auth();
    if *caller != service_provider(env)? {
        return Err(Error::NotAuthorized);
    }
    Ok(())
}

pub fn when_initialized(env: &Env) -> Result<(), Error> {
    if !env.storage().instance().has(&DataKey::ServiceProvider) {
        return Err(Error::NotInitialized);
    }
    Ok(())
}

pub fn is_paused(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Paused)
        .unwrap_or(false)
}

pub fn when_not_paused(env: &Env) -> Result<(), Error> {
    if is_paused(env) {
        return Err(Error::ContractPaused);
    }
    Ok(())
}

pub fn when_paused(env: &Env) -> Result<(), Error> {
    if !is_paused(env) {
        return Err(Error::ContractNotPaused);
    }
    Ok(())
}

/// Change the receiver of plan-price payments. Provider only.
pub fn do_set_payee(env: &Env, caller: Address, new_payee: Address) -> Result<(), Error> {
    require_provider(env, &caller)?;
    extend_instance_ttl(env);
    env.storage().instance().set(&DataKey::Payee, &new_payee);
    env.events().publish(
        (symbol_short!("admin"), AdminEvent::PayeeChanged),
        new_payee,
    );
    Ok(())
}

/// Freeze purchases, scheduling and execution. Provider only.
///
/// While paused, requestors may still drain their prepaid credit through
/// `request_plan_refund` and reclaim escrowed value through cancellation
/// and execution refunds.
pub fn do_pause(env: &Env, caller: Address) -> Result<(), Error> {
    require_provider(env, &caller)?;
    when_not_paused(env)?;
    env.storage().instance().set(&DataKey::Paused, &true);
    env.events()
        .publish((symbol_short!("admin"), AdminEvent::Paused), caller);
    Ok(())
}

/// Resume normal operation. Provider only.
pub fn do_unpause(env: &Env, caller: Address) -> Result<(), Error> {
    require_provider(env, &caller)?;
    when_paused(env)?;
    env.storage().instance().set(&DataKey::Paused, &false);
    env.events()
        .publish((symbol_short!("admin"), AdminEvent::Unpaused), caller);
    Ok(())
}
