#![no_std]
//! Batching facade for the scheduler engine. Composes independent engine
//! calls (say, purchase followed by schedule) into one logical unit, either
//! all-or-nothing (`aggregate`) or failure-tolerant (`soft_aggregate`).
//!
//! The facade is its own contract because the Soroban host forbids a
//! contract from reentering itself; batching over the engine has to happen
//! one call frame above it.

use soroban_sdk::{contract, contracterror, contractimpl, Address, Env, Symbol, Val, Vec};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    /// `functions` and `args` disagree in length.
    ArgsLengthMismatch = 1,
    /// Strict mode: a step failed, aborting the whole batch. The failing
    /// step is identified in the host diagnostics; contract error codes
    /// cannot carry an index.
    StepFailed = 2,
}

#[contract]
pub struct Multicall;

#[contractimpl]
impl Multicall {
    /// Invoke `functions[i](args[i]...)` on `engine` in order, strictly:
    /// the first failing step aborts the whole batch and every earlier
    /// step's effects are rolled back with it.
    ///
    /// # Returns
    /// The per-step results, in call order.
    pub fn aggregate(
        env: Env,
        engine: Address,
        functions: Vec<Symbol>,
        args: Vec<Vec<Val>>,
    ) -> Result<Vec<Val>, Error> {
        if functions.len() != args.len() {
            return Err(Error::ArgsLengthMismatch);
        }

        let mut results = Vec::new(&env);
        for i in 0..functions.len() {
            let function = functions.get_unchecked(i);
            let step_args = args.get_unchecked(i);
            match env.try_invoke_contract::<Val, soroban_sdk::Error>(&engine, &function, step_args)
            {
                Ok(Ok(value)) => results.push_back(value),
                _ => return Err(Error::StepFailed),
            }
        }
        Ok(results)
    }

    /// Lenient variant: failures are tolerated. A failed step's effects are
    /// rolled back individually and the batch continues.
    ///
    /// # Returns
    /// Per-step success flags and results; failed steps yield `Val::VOID`.
    pub fn soft_aggregate(
        env: Env,
        engine: Address,
        functions: Vec<Symbol>,
        args: Vec<Vec<Val>>,
    ) -> Result<(Vec<bool>, Vec<Val>), Error> {
        if functions.len() != args.len() {
            return Err(Error::ArgsLengthMismatch);
        }

        let mut successes = Vec::new(&env);
        let mut results = Vec::new(&env);
        for i in 0..functions.len() {
            let function = functions.get_unchecked(i);
            let step_args = args.get_unchecked(i);
            match env.try_invoke_contract::<Val, soroban_sdk::Error>(&engine, &function, step_args)
            {
                Ok(Ok(value)) => {
                    successes.push_back(true);
                    results.push_back(value);
                }
                _ => {
                    successes.push_back(false);
                    results.push_back(Val::VOID.into());
                }
            }
        }
        Ok((successes, results))
    }
}
