//! TOD (transaction-ordering dependence) relation: executes the original
//! message plus one fuzzer-generated message in both orders and compares
//! inner-contract storage.

use alloy_primitives::{Address, U256};

use crate::context::Context;
use crate::error::MrError;
use crate::evm::EvmKernel;
use crate::fuzz::encoder::AbiEncoder;
use crate::fuzz::random;
use crate::mr::preprocess::PreparedSubstate;
use crate::mr::state_eq::inner_state_equal;
use crate::mr::{candidate_messages, Driver};
use crate::report::{BugRecord, BugType};
use crate::substate::{addr_lower, Account, Alloc, Message};

pub struct TodDriver;

impl Driver for TodDriver {
    fn run(
        &self,
        ctx: &Context,
        kernel: &dyn EvmKernel,
        encoder: &dyn AbiEncoder,
        block: u64,
        prepared: &PreparedSubstate,
    ) -> Result<Option<BugRecord>, MrError> {
        let substate = &prepared.substate;
        let targets: Vec<String> = prepared.inner_set.iter().map(addr_lower).collect();

        let candidates = candidate_messages(
            ctx,
            encoder,
            &targets,
            block,
            &prepared.local_users,
            &prepared.local_contracts,
        );

        for (to, data) in candidates {
            let from = pick_from(ctx, prepared, block)?;

            let mut base_alloc = substate.input_alloc.clone();
            ensure_funded(&mut base_alloc, from);

            let gas = substate.env.gas_limit.saturating_sub(substate.message.gas);
            let build_extra = |nonce: u64| Message {
                from,
                to: Some(to),
                nonce,
                value: U256::ZERO,
                gas,
                gas_price: substate.message.gas_price,
                gas_fee_cap: substate.message.gas_fee_cap,
                gas_tip_cap: substate.message.gas_tip_cap,
                data: data.clone().into(),
            };

            let base_nonce = base_alloc.get(&from).map(|a| a.nonce).unwrap_or(0);
            let extra = build_extra(base_nonce);

            let alone = kernel.apply_message(&base_alloc, &substate.env, &extra)?;
            if alone.alloc == base_alloc {
                continue;
            }

            // The second-position message's nonce must be read from the
            // intermediate alloc produced by whichever message ran first,
            // not the pre-execution alloc.
            let orig_first = kernel.apply_message(&base_alloc, &substate.env, &substate.message)?;
            let nonce_after_orig = orig_first.alloc.get(&from).map(|a| a.nonce).unwrap_or(base_nonce);
            let obverse = kernel.apply_message(&orig_first.alloc, &substate.env, &build_extra(nonce_after_orig))?;

            let extra_first = kernel.apply_message(&base_alloc, &substate.env, &extra)?;
            let reverse = kernel.apply_message(&extra_first.alloc, &substate.env, &substate.message)?;

            let (diff_addr, equal) = inner_state_equal(&obverse.alloc, &reverse.alloc, &prepared.inner_set);
            if equal {
                continue;
            }

            return Ok(Some(BugRecord {
                bug_type: BugType::Tod,
                contract_addr: diff_addr.map(addr_lower).unwrap_or_else(|| addr_lower(&to)),
                block_number: block,
                input_alloc: substate.input_alloc.clone(),
                output_alloc: substate.output_alloc.clone(),
                input_message: substate.message.clone(),
                addit_from: Some(addr_lower(&from)),
                addit_to: Some(addr_lower(&to)),
                addit_data: Some(format!("0x{}", hex::encode(&data))),
                ori_alloc: obverse.alloc,
                mut_alloc: reverse.alloc,
            }));
        }

        Ok(None)
    }
}

/// If at least two local users are known for this substate, sample among
/// them; otherwise sample from the global `UserSeed` pool.
pub(crate) fn pick_from(ctx: &Context, prepared: &PreparedSubstate, block: u64) -> Result<Address, MrError> {
    use std::str::FromStr;

    let candidates = if prepared.local_users.len() >= 2 {
        prepared.local_users.clone()
    } else {
        ctx.seeds.user_seed.visible_at(block)
    };

    let chosen = random::select_address(&candidates).map_err(|_| MrError::MsgBuilder)?;
    Address::from_str(&chosen).map_err(|_| MrError::MsgBuilder)
}

/// Ensures `addr` is present in `alloc`, creating it with a near-maximum
/// balance if absent so the replay never fails purely on funds.
pub(crate) fn ensure_funded(alloc: &mut Alloc, addr: Address) {
    alloc.entry(addr).or_insert_with(|| Account {
        nonce: 0,
        balance: U256::from(u64::MAX),
        code: None,
        storage: Default::default(),
    });
}
