//! The ABI calldata encoder collaborator: converts a function signature
//! plus stringified argument list into hex-encoded calldata.

use alloy_dyn_abi::DynSolType;
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::keccak256;

use crate::error::AbiError;
use crate::fuzz::value::Value;

/// `parse_gen_msg(sig_with_args) -> hex`, modeled as a trait so the message
/// builder can be tested without a real ABI encoder.
pub trait AbiEncoder: Send + Sync {
    /// Encodes a call to `signature` (`name(type1,type2,…)`) against the
    /// stringified `args`, one per input parameter, in order. Returns the
    /// hex-encoded calldata (selector plus ABI-encoded parameters).
    fn encode_call(&self, signature: &str, arg_types: &[String], args: &[Value]) -> Result<String, AbiError>;
}

/// Encodes calldata for real using `alloy-dyn-abi`'s string-coercion path:
/// each argument type parses to a `DynSolType`, which can coerce our
/// already-stringified `Value` directly into a `DynSolValue`.
pub struct AlloyAbiEncoder;

impl AbiEncoder for AlloyAbiEncoder {
    fn encode_call(&self, signature: &str, arg_types: &[String], args: &[Value]) -> Result<String, AbiError> {
        if arg_types.len() != args.len() {
            return Err(AbiError::Encode(format!(
                "arity mismatch: {} types vs {} args",
                arg_types.len(),
                args.len()
            )));
        }

        let mut values = Vec::with_capacity(args.len());
        for (ty, value) in arg_types.iter().zip(args) {
            let sol_ty = DynSolType::parse(ty).map_err(|e| AbiError::Encode(e.to_string()))?;
            let sol_value =
                sol_ty.coerce_str(&value.to_string()).map_err(|e| AbiError::Encode(e.to_string()))?;
            values.push(sol_value);
        }

        let selector = &keccak256(signature.as_bytes())[..4];
        let mut calldata = selector.to_vec();
        calldata.extend(DynSolValue::Tuple(values).abi_encode_params());

        Ok(format!("0x{}", hex::encode(calldata)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_signature_has_only_a_selector() {
        let encoder = AlloyAbiEncoder;
        let hex = encoder.encode_call("totalSupply()", &[], &[]).unwrap();
        assert_eq!(hex.len(), 2 + 8); // "0x" + 4 bytes
    }

    #[test]
    fn arity_mismatch_is_an_encode_error() {
        let encoder = AlloyAbiEncoder;
        let err = encoder
            .encode_call("transfer(address,uint256)", &["address".to_string()], &[])
            .unwrap_err();
        assert!(matches!(err, AbiError::Encode(_)));
    }
}
