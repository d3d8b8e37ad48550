use soroban_sdk::{symbol_short, token, Address, Env};

use crate::admin;
use crate::plans;
use crate::types::{CreditEvent, DataKey, Error};

/// Remaining prepaid executions for `(requestor, plan_id)`. Zero by default.
pub fn remaining(env: &Env, requestor: &Address, plan_id: u32) -> u64 {
    env.storage()
        .persistent()
        .get(&DataKey::Credit(requestor.clone(), plan_id))
        .unwrap_or(0u64)
}

fn set_remaining(env: &Env, requestor: &Address, plan_id: u32, value: u64) {
    let key = DataKey::Credit(requestor.clone(), plan_id);
    env.storage().persistent().set(&key, &value);
    admin::extend_persistent_ttl(env, &key);
}

/// Consume one credit. The check and the debit happen in one operation, so
/// no interleaving can observe an intermediate balance.
pub fn debit_one(env: &Env, requestor: &Address, plan_id: u32) -> Result<(), Error> {
    let balance = remaining(env, requestor, plan_id);
    if balance == 0 {
        return Err(Error::NoBalanceAvailable);
    }
    set_remaining(env, requestor, plan_id, balance - 1);
    Ok(())
}

/// Restore one credit after a cancellation or refund.
pub fn credit_one(env: &Env, requestor: &Address, plan_id: u32) {
    let balance = remaining(env, requestor, plan_id);
    set_remaining(env, requestor, plan_id, balance + 1);
}

/// Pull-based purchase: transfers `price * quantity` from the requestor in
/// the plan's instrument and credits `quantity` executions.
///
/// # Errors
/// * `ContractPaused` - While the engine is paused
/// * `PlanNotFound` / `InactivePlan` - Unknown or deactivated plan
/// * `InvalidQuantity` - Zero quantity
/// * `AmountOverflow` - `price * quantity` does not fit in i128
pub fn do_purchase(
    env: &Env,
    requestor: Address,
    plan_id: u32,
    quantity: u64,
) -> Result<(), Error> {
    purchase_checked(env, requestor, plan_id, quantity, None)
}

/// Push-based purchase: the caller declares the token and total it is
/// transferring alongside the encoded `(plan_id, quantity)`. The declared
/// token must be the plan's instrument and the total must match the price
/// exactly; the ledger effects are identical to `do_purchase`.
///
/// # Errors
/// In addition to the `do_purchase` errors:
/// * `BadToken` - Declared token is not the plan's instrument
/// * `AmountMismatch` - Declared total is not `price * quantity`
pub fn do_purchase_with_transfer(
    env: &Env,
    requestor: Address,
    token: Address,
    total: i128,
    plan_id: u32,
    quantity: u64,
) -> Result<(), Error> {
    purchase_checked(env, requestor, plan_id, quantity, Some((token, total)))
}

fn purchase_checked(
    env: &Env,
    requestor: Address,
    plan_id: u32,
    quantity: u64,
    declared: Option<(Address, i128)>,
) -> Result<(), Error> {
    admin::when_initialized(env)?;
    admin::when_not_paused(env)?;
    requestor.require_auth();
    admin::extend_instance_ttl(env);

    let plan = plans::get_plan(env, plan_id)?;
    if !plan.active {
        return Err(Error::InactivePlan);
    }
    if quantity == 0 {
        return Err(Error::InvalidQuantity);
    }

    let instrument = plans::instrument(env, &plan)?;
    let total = plan
        .price
        .checked_mul(quantity as i128)
        .ok_or(Error::AmountOverflow)?;

    if let Some((declared_token, declared_total)) = declared {
        if declared_token != instrument {
            return Err(Error::BadToken);
        }
        if declared_total != total {
            return Err(Error::AmountMismatch);
        }
    }

    if total > 0 {
        token::Client::new(env, &instrument).transfer(
            &requestor,
            &env.current_contract_address(),
            &total,
        );
    }

    let balance = remaining(env, &requestor, plan_id);
    set_remaining(env, &requestor, plan_id, balance + quantity);

    env.events().publish(
        (symbol_short!("credit"), CreditEvent::Purchased),
        (requestor, plan_id, quantity, total),
    );

    Ok(())
}

/// Emergency drain: while the engine is paused, a requestor reclaims the
/// full value of their unconsumed credit and the balance drops to zero.
///
/// # Returns
/// The refunded amount in the plan's instrument.
///
/// # Errors
/// * `ContractNotPaused` - Refunds are only open while paused
/// * `NoBalanceToRefund` - Nothing left to refund
pub fn do_request_plan_refund(
    env: &Env,
    requestor: Address,
    plan_id: u32,
) -> Result<i128, Error> {
    admin::when_initialized(env)?;
    admin::when_paused(env)?;
    requestor.require_auth();

    let balance = remaining(env, &requestor, plan_id);
    if balance == 0 {
        return Err(Error::NoBalanceToRefund);
    }

    let plan = plans::get_plan(env, plan_id)?;
    let instrument = plans::instrument(env, &plan)?;
    let total = plan
        .price
        .checked_mul(balance as i128)
        .ok_or(Error::AmountOverflow)?;

    set_remaining(env, &requestor, plan_id, 0);
    if total > 0 {
        token::Client::new(env, &instrument).transfer(
            &env.current_contract_address(),
            &requestor,
            &total,
        );
    }

    env.events().publish(
        (symbol_short!("credit"), CreditEvent::PlanRefunded),
        (requestor, plan_id, total),
    );

    Ok(total)
}
