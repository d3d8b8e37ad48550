#[cfg(test)]
mod testsuit {
    use crate::{Counter, CounterClient};
    use soroban_sdk::Env;

    #[test]
    fn test_inc_and_count() {
        let env = Env::default();
        let contract_id = env.register_contract(None, Counter);
        let client = CounterClient::new(&env, &contract_id);

        assert_eq!(client.count(), 0);
        assert_eq!(client.inc(), 1);
        assert_eq!(client.inc(), 2);
        assert_eq!(client.count(), 2);
    }

    #[test]
    fn test_fail_traps() {
        let env = Env::default();
        let contract_id = env.register_contract(None, Counter);
        let client = CounterClient::new(&env, &contract_id);

        assert!(client.try_fail().is_err());
        assert_eq!(client.count(), 0);
    }
}
