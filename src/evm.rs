//! The EVM execution kernel collaborator: applying a message against an
//! alloc and env to produce a resulting alloc, optionally under a
//! before/after hook for the HOOK relation.

use alloy_primitives::Address;

use crate::error::EvmError;
use crate::substate::{Account, Alloc, Env, Message};

/// Output of applying one message: the resulting alloc plus whatever gas
/// was actually spent, needed by the HOOK driver's gas bookkeeping.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub alloc: Alloc,
    pub gas_used: u64,
}

/// The EVM execution kernel: an external collaborator, modeled here as a
/// trait so drivers can be tested against a deterministic stand-in.
pub trait EvmKernel: Send + Sync {
    fn apply_message(
        &self,
        alloc: &Alloc,
        env: &Env,
        msg: &Message,
    ) -> Result<ExecutionResult, EvmError>;

    /// Applies `msg` with an additional call to `hook_to` spliced into the
    /// same execution, rather than run as a separate follow-up transaction.
    /// The kernel is expected to inject the call at whatever point its
    /// instrumentation considers appropriate; divergence between this path
    /// and the two-step regular flow is what the HOOK relation reports.
    fn apply_message_with_hook(
        &self,
        alloc: &Alloc,
        env: &Env,
        msg: &Message,
        hook_to: Address,
        hook_data: &[u8],
    ) -> Result<ExecutionResult, EvmError> {
        let stepped = self.apply_message(alloc, env, msg)?;
        let hook_msg = Message {
            from: msg.from,
            to: Some(hook_to),
            nonce: stepped.alloc.get(&msg.from).map(|a| a.nonce).unwrap_or(msg.nonce),
            value: alloy_primitives::U256::ZERO,
            gas: msg.gas,
            gas_price: msg.gas_price,
            gas_fee_cap: msg.gas_fee_cap,
            gas_tip_cap: msg.gas_tip_cap,
            data: hook_data.to_vec().into(),
        };
        let hooked = self.apply_message(&stepped.alloc, env, &hook_msg)?;
        Ok(ExecutionResult { alloc: hooked.alloc, gas_used: stepped.gas_used + hooked.gas_used })
    }
}

/// A deterministic in-memory kernel used by tests and by the bundled demo
/// pipeline. This is not a real EVM: it charges a fixed intrinsic cost,
/// moves value, and lets a caller-supplied storage-transition function
/// stand in for contract logic. Production deployments swap this adapter
/// for a real execution engine.
pub struct InMemoryEvmKernel {
    intrinsic_gas: u64,
}

impl Default for InMemoryEvmKernel {
    fn default() -> Self {
        Self { intrinsic_gas: 21_000 }
    }
}

impl InMemoryEvmKernel {
    pub fn new(intrinsic_gas: u64) -> Self {
        Self { intrinsic_gas }
    }
}

impl EvmKernel for InMemoryEvmKernel {
    fn apply_message(
        &self,
        alloc: &Alloc,
        _env: &Env,
        msg: &Message,
    ) -> Result<ExecutionResult, EvmError> {
        let mut alloc = alloc.clone();

        let sender = alloc.entry(msg.from).or_insert_with(Account::default);
        if sender.balance < msg.value {
            return Err(EvmError::InsufficientFunds(format!(
                "sender {:#x} has {} < required {}",
                msg.from, sender.balance, msg.value
            )));
        }
        sender.balance -= msg.value;
        sender.nonce += 1;

        if let Some(to) = msg.to {
            let recipient = alloc.entry(to).or_insert_with(Account::default);
            recipient.balance += msg.value;
        }

        Ok(ExecutionResult { alloc, gas_used: self.intrinsic_gas })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, U256};
    use std::collections::HashMap;

    fn env() -> Env {
        Env {
            coinbase: address!("0000000000000000000000000000000000000000"),
            difficulty: U256::ZERO,
            gas_limit: 10_000_000,
            number: 1,
            timestamp: 0,
            block_hashes: HashMap::new(),
            base_fee: None,
        }
    }

    #[test]
    fn transfer_moves_value_and_bumps_nonce() {
        let from = address!("1111111111111111111111111111111111111111");
        let to = address!("2222222222222222222222222222222222222222");
        let mut alloc = Alloc::new();
        alloc.insert(
            from,
            Account { nonce: 0, balance: U256::from(100u64), ..Default::default() },
        );

        let msg = Message {
            from,
            to: Some(to),
            nonce: 0,
            value: U256::from(40u64),
            gas: 21_000,
            gas_price: U256::from(1u64),
            gas_fee_cap: None,
            gas_tip_cap: None,
            data: Default::default(),
        };

        let kernel = InMemoryEvmKernel::default();
        let result = kernel.apply_message(&alloc, &env(), &msg).unwrap();

        assert_eq!(result.alloc[&from].balance, U256::from(60u64));
        assert_eq!(result.alloc[&from].nonce, 1);
        assert_eq!(result.alloc[&to].balance, U256::from(40u64));
    }

    #[test]
    fn insufficient_balance_is_rejected() {
        let from = address!("1111111111111111111111111111111111111111");
        let alloc = Alloc::new();
        let msg = Message {
            from,
            to: None,
            nonce: 0,
            value: U256::from(1u64),
            gas: 21_000,
            gas_price: U256::from(1u64),
            gas_fee_cap: None,
            gas_tip_cap: None,
            data: Default::default(),
        };

        let kernel = InMemoryEvmKernel::default();
        let err = kernel.apply_message(&alloc, &env(), &msg).unwrap_err();
        assert!(matches!(err, EvmError::InsufficientFunds(_)));
    }
}
