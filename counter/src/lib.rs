#![no_std]
//! Demo scheduling target: a counter the scheduler can bump, plus an entry
//! point that always traps, for exercising captured target failures.

use soroban_sdk::{contract, contractimpl, symbol_short, Env};

#[contract]
pub struct Counter;

#[contractimpl]
impl Counter {
    /// Increment and return the counter.
    pub fn inc(env: Env) -> u32 {
        let count: u32 = env
            .storage()
            .instance()
            .get(&symbol_short!("COUNT"))
            .unwrap_or(0u32)
            + 1;
        env.storage().instance().set(&symbol_short!("COUNT"), &count);
        count
    }

    /// Always traps. Lets callers exercise a failing target.
    pub fn fail(_env: Env) {
        panic!("Boom");
    }

    pub fn count(env: Env) -> u32 {
        env.storage()
            .instance()
            .get(&symbol_short!("COUNT"))
            .unwrap_or(0u32)
    }
}

mod test;
