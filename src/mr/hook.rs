//! HOOK relation: compares regular two-step execution against the hooked
//! execution mode.

use crate::context::Context;
use crate::error::MrError;
use crate::evm::EvmKernel;
use crate::fuzz::encoder::AbiEncoder;
use crate::mr::preprocess::PreparedSubstate;
use crate::mr::state_eq::inner_state_equal;
use crate::mr::{candidate_messages, Driver};
use crate::report::{BugRecord, BugType};
use crate::substate::{addr_lower, Message};

pub struct HookDriver;

impl Driver for HookDriver {
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

        let Some((to, data)) = candidates.into_iter().next() else {
            return Ok(None);
        };

        let extra = Message {
            from: substate.message.from,
            to: Some(to),
            nonce: substate.message.nonce + 1,
            value: alloy_primitives::U256::ZERO,
            gas: substate.env.gas_limit.saturating_sub(substate.message.gas),
            gas_price: substate.message.gas_price,
            gas_fee_cap: substate.message.gas_fee_cap,
            gas_tip_cap: substate.message.gas_tip_cap,
            data: data.clone().into(),
        };

        let stepped = kernel.apply_message(&substate.input_alloc, &substate.env, &substate.message)?;
        let regular = kernel.apply_message(&stepped.alloc, &substate.env, &extra)?;

        let mut full_gas_msg = substate.message.clone();
        full_gas_msg.gas = substate.env.gas_limit;
        let hooked = kernel.apply_message_with_hook(
            &substate.input_alloc,
            &substate.env,
            &full_gas_msg,
            to,
            &data,
        )?;

        let (diff_addr, equal) = inner_state_equal(&regular.alloc, &hooked.alloc, &prepared.inner_set);
        if equal {
            return Ok(None);
        }

        Ok(Some(BugRecord {
            bug_type: BugType::Hook,
            contract_addr: diff_addr.map(addr_lower).unwrap_or_else(|| addr_lower(&to)),
            block_number: block,
            input_alloc: substate.input_alloc.clone(),
            output_alloc: substate.output_alloc.clone(),
            input_message: substate.message.clone(),
            addit_from: Some(addr_lower(&substate.message.from)),
            addit_to: Some(addr_lower(&to)),
            addit_data: Some(format!("0x{}", hex::encode(&data))),
            ori_alloc: regular.alloc,
            mut_alloc: hooked.alloc,
        }))
    }
}
