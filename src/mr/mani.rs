//! MANI (manipulation via outer contracts) relation: like TOD but targets
//! outer contracts and fixes `from` to the original sender.

use alloy_primitives::U256;

use crate::context::Context;
use crate::error::MrError;
use crate::evm::EvmKernel;
use crate::fuzz::encoder::AbiEncoder;
use crate::mr::preprocess::PreparedSubstate;
use crate::mr::state_eq::inner_state_equal;
use crate::mr::tod::ensure_funded;
use crate::mr::{candidate_messages, Driver};
use crate::report::{BugRecord, BugType};
use crate::substate::{addr_lower, Message};

pub struct ManiDriver;

impl Driver for ManiDriver {
    fn run(
        &self,
        ctx: &Context,
        kernel: &dyn EvmKernel,
        encoder: &dyn AbiEncoder,
        block: u64,
        prepared: &PreparedSubstate,
    ) -> Result<Option<BugRecord>, MrError> {
        let substate = &prepared.substate;

        let targets: Vec<String> = if !prepared.local_contracts.is_empty() {
            prepared.local_contracts.clone()
        } else {
            ctx.seeds.outer_seed.visible_at(block)
        };

        let candidates = candidate_messages(
            ctx,
            encoder,
            &targets,
            block,
            &prepared.local_users,
            &prepared.local_contracts,
        );

        let from = substate.message.from;

        for (to, data) in candidates {
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

            // `from` is the original sender here, so the original message
            // itself bumps its nonce — the second-position message must
            // read that bumped value from the intermediate alloc.
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
                bug_type: BugType::Mani,
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
