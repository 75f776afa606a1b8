//! Substate pre-processing, run once per transaction before any relation
//! driver executes: tops up gas-affordability balances and classifies
//! addresses as local users or local contracts.

use std::collections::HashSet;
use std::str::FromStr;

use alloy_primitives::{Address, U256};

use crate::context::Context;
use crate::error::MrError;
use crate::fuzz::seed::ALWAYS_VISIBLE;
use crate::substate::{addr_lower, clone_alloc, Substate};

/// 10 ether, added to every address present in both the input and output
/// alloc so replay branches never fail purely on gas affordability.
fn ten_ether() -> U256 {
    U256::from(10u64) * U256::from(10u64).pow(U256::from(18u64))
}

/// The outcome of pre-processing one substate: topped-up clones, plus the
/// address classification the drivers and the fuzzer need.
pub struct PreparedSubstate {
    pub substate: Substate,
    pub local_users: Vec<String>,
    pub local_contracts: Vec<String>,
    pub inner_set: HashSet<Address>,
}

pub fn preprocess(ctx: &Context, substate: &Substate, block: u64) -> Result<PreparedSubstate, MrError> {
    let mut input_alloc = clone_alloc(&substate.input_alloc);
    let mut output_alloc = clone_alloc(&substate.output_alloc);

    let mut local_users = Vec::new();
    let mut local_contracts = Vec::new();

    let shared: Vec<Address> =
        input_alloc.keys().filter(|a| output_alloc.contains_key(*a)).copied().collect();

    let inner_set = inner_addresses(ctx);
    let outer_strings: HashSet<String> =
        ctx.seeds.outer_seed.visible_at(ALWAYS_VISIBLE + 1).into_iter().collect();

    for addr in &shared {
        if let Some(acc) = input_alloc.get_mut(addr) {
            acc.balance += ten_ether();
        }
        if let Some(acc) = output_alloc.get_mut(addr) {
            acc.balance += ten_ether();
        }

        let has_code = input_alloc.get(addr).map(|a| a.has_code()).unwrap_or(false)
            || output_alloc.get(addr).map(|a| a.has_code()).unwrap_or(false);
        let addr_str = addr_lower(addr);

        if !has_code {
            if !ctx.seeds.user_seed.contains_value(&addr_str) {
                ctx.seeds.user_seed.push(addr_str.clone(), block);
            }
            local_users.push(addr_str);
        } else {
            if !outer_strings.contains(&addr_str) {
                ctx.seeds.outer_seed.push(addr_str.clone(), block);
            }
            if !inner_set.contains(addr) && !outer_strings.contains(&addr_str) {
                local_contracts.push(addr_str);
            }
        }
    }

    let substate =
        Substate { input_alloc, output_alloc, env: substate.env.clone(), message: substate.message.clone() };

    if substate.message.to.map(|to| !inner_set.contains(&to)).unwrap_or(true) {
        return Err(MrError::NotInner);
    }

    Ok(PreparedSubstate { substate, local_users, local_contracts, inner_set })
}

fn inner_addresses(ctx: &Context) -> HashSet<Address> {
    ctx.seeds
        .inner_seed
        .visible_at(ALWAYS_VISIBLE + 1)
        .into_iter()
        .filter_map(|s| Address::from_str(&s).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substate::{Account, Env, Message};
    use alloy_primitives::address;
    use std::collections::HashMap;

    fn env() -> Env {
        Env {
            coinbase: address!("0000000000000000000000000000000000000000"),
            difficulty: U256::ZERO,
            gas_limit: 1_000_000,
            number: 1,
            timestamp: 0,
            block_hashes: HashMap::new(),
            base_fee: None,
        }
    }

    #[test]
    fn non_inner_target_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::bootstrap(dir.path()).unwrap();

        let to = address!("2222222222222222222222222222222222222222");
        let substate = Substate {
            input_alloc: Default::default(),
            output_alloc: Default::default(),
            env: env(),
            message: Message {
                from: address!("1111111111111111111111111111111111111111"),
                to: Some(to),
                nonce: 0,
                value: U256::ZERO,
                gas: 21_000,
                gas_price: U256::ZERO,
                gas_fee_cap: None,
                gas_tip_cap: None,
                data: Default::default(),
            },
        };

        let err = preprocess(&ctx, &substate, 1).unwrap_err();
        assert!(matches!(err, MrError::NotInner));
    }

    #[test]
    fn shared_addresses_are_topped_up_with_ten_ether() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::bootstrap(dir.path()).unwrap();

        let inner = address!("3333333333333333333333333333333333333333");
        ctx.seeds.inner_seed.push(addr_lower(&inner), ALWAYS_VISIBLE);

        let mut input_alloc = HashMap::new();
        input_alloc.insert(inner, Account::default());
        let mut output_alloc = HashMap::new();
        output_alloc.insert(inner, Account::default());

        let substate = Substate {
            input_alloc,
            output_alloc,
            env: env(),
            message: Message {
                from: address!("1111111111111111111111111111111111111111"),
                to: Some(inner),
                nonce: 0,
                value: U256::ZERO,
                gas: 21_000,
                gas_price: U256::ZERO,
                gas_fee_cap: None,
                gas_tip_cap: None,
                data: Default::default(),
            },
        };

        let prepared = preprocess(&ctx, &substate, 1).unwrap();
        assert_eq!(prepared.substate.input_alloc[&inner].balance, ten_ether());
    }
}
