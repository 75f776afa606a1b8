//! ENV relation: perturb the block environment and compare the original
//! message's effect under both.

use rand::Rng;

use crate::context::Context;
use crate::error::MrError;
use crate::evm::EvmKernel;
use crate::fuzz::encoder::AbiEncoder;
use crate::mr::preprocess::PreparedSubstate;
use crate::mr::state_eq::inner_state_equal;
use crate::mr::Driver;
use crate::report::{BugRecord, BugType};

/// Whether the mutated block crosses a hard-fork boundary is left
/// undefined; this driver never special-cases any block number.
pub struct EnvDriver;

impl Driver for EnvDriver {
    fn run(
        &self,
        _ctx: &Context,
        kernel: &dyn EvmKernel,
        _encoder: &dyn AbiEncoder,
        block: u64,
        prepared: &PreparedSubstate,
    ) -> Result<Option<BugRecord>, MrError> {
        let substate = &prepared.substate;

        let mut mutated_env = substate.env.clone();
        let mut rng = rand::thread_rng();
        mutated_env.difficulty += alloy_primitives::U256::from(rng.gen_range(0..100u64));
        mutated_env.timestamp += rng.gen_range(0..100u64);

        let original =
            kernel.apply_message(&substate.input_alloc, &substate.env, &substate.message)?;
        let mutated =
            kernel.apply_message(&substate.input_alloc, &mutated_env, &substate.message)?;

        let (diff_addr, equal) =
            inner_state_equal(&original.alloc, &mutated.alloc, &prepared.inner_set);

        if equal {
            return Ok(None);
        }

        Ok(Some(BugRecord {
            bug_type: BugType::Env,
            contract_addr: diff_addr.map(crate::substate::addr_lower).unwrap_or_default(),
            block_number: block,
            input_alloc: substate.input_alloc.clone(),
            output_alloc: substate.output_alloc.clone(),
            input_message: substate.message.clone(),
            addit_from: None,
            addit_to: None,
            addit_data: None,
            ori_alloc: original.alloc,
            mut_alloc: mutated.alloc,
        }))
    }
}
