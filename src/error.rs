//! Crate-wide error types, one enum per failure domain.

use thiserror::Error;

/// Failures raised while selecting or synthesizing fuzzed values.
#[derive(Error, Debug)]
pub enum FuzzError {
    #[error("zero-sized candidate slice")]
    ZeroSizedInput,
    #[error("exceeded random-selection retry budget")]
    OverRandomLimit,
    #[error("unknown complex type: {0}")]
    UnknownComplexType(String),
    #[error("type not found: {0}")]
    TypeNotFound(String),
}

/// Failures raised while loading or encoding against a contract ABI.
#[derive(Error, Debug)]
pub enum AbiError {
    #[error("json unmarshal error: {0}")]
    JsonUnmarshal(#[from] serde_json::Error),
    #[error("abi encode error: {0}")]
    Encode(String),
}

/// Failures raised by a metamorphic relation driver.
#[derive(Error, Debug)]
pub enum MrError {
    #[error("not inner")]
    NotInner,
    #[error("error in generating msgs")]
    MsgBuilder,
    #[error(transparent)]
    Evm(#[from] EvmError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl MrError {
    /// String-matches expected EVM outcomes so they're silently dropped
    /// rather than logged as real errors.
    pub fn is_expected_evm_outcome(&self) -> bool {
        let msg = self.to_string();
        msg.contains("inconsistent output") || msg.contains("insufficient funds")
    }
}

/// Failures raised by the EVM execution kernel (external collaborator).
#[derive(Error, Debug)]
pub enum EvmError {
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("inconsistent output: {0}")]
    InconsistentOutput(String),
    #[error("missing block hash for block {0}")]
    MissingBlockHash(u64),
    #[error("evm execution failed: {0}")]
    Other(String),
}

/// Failures raised by the block-processing dispatcher.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("worker task failed: {0}")]
    Task(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
