//! Contract ABI loading. The loader does not validate parameter type
//! strings; unknown types surface lazily during fuzzing.

use serde::{Deserialize, Serialize};

use crate::error::AbiError;
use crate::fuzz::value::Value;

/// One ABI parameter. `out` holds values generated during fuzzing and is
/// not part of the on-disk JSON shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(skip, default)]
    pub out: Vec<Value>,
}

fn default_true() -> bool {
    true
}

/// One function descriptor from a contract's JSON ABI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(rename = "type", default = "default_function_type")]
    pub kind: String,
    #[serde(default)]
    pub inputs: Vec<Element>,
    #[serde(default)]
    pub outputs: Vec<Element>,
    #[serde(default)]
    pub payable: bool,
    /// Always read/written under the canonical `stateMutability` key.
    #[serde(rename = "stateMutability", default = "default_mutability")]
    pub state_mutability: String,
    #[serde(default)]
    pub constant: bool,
}

fn default_function_type() -> String {
    "function".to_string()
}

fn default_mutability() -> String {
    "nonpayable".to_string()
}

impl Function {
    /// `true` for functions the message builder should target: regular
    /// functions that mutate state.
    pub fn is_state_mutating(&self) -> bool {
        self.kind == "function"
            && !self.constant
            && self.state_mutability != "pure"
            && self.state_mutability != "view"
    }

    /// `name(type1,type2,…)`.
    pub fn signature(&self) -> String {
        let params = self.inputs.iter().map(|e| e.ty.clone()).collect::<Vec<_>>().join(",");
        format!("{}({params})", self.name)
    }
}

/// An ordered list of function descriptors, immutable after load.
#[derive(Debug, Clone)]
pub struct Abi {
    pub functions: Vec<Function>,
}

impl Abi {
    pub fn from_json(data: &str) -> Result<Self, AbiError> {
        let functions: Vec<Function> = serde_json::from_str(data)?;
        Ok(Self { functions })
    }

    pub fn state_mutating_functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter().filter(|f| f.is_state_mutating())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_formats_as_name_and_parens() {
        let f = Function {
            name: "transfer".to_string(),
            kind: "function".to_string(),
            inputs: vec![
                Element { name: "to".to_string(), ty: "address".to_string(), out: vec![] },
                Element { name: "amount".to_string(), ty: "uint256".to_string(), out: vec![] },
            ],
            outputs: vec![],
            payable: false,
            state_mutability: "nonpayable".to_string(),
            constant: false,
        };
        assert_eq!(f.signature(), "transfer(address,uint256)");
    }

    #[test]
    fn parses_json_with_unusual_field_order() {
        let json = r#"[{
            "name": "approve",
            "type": "function",
            "inputs": [{"name": "spender", "type": "address"}, {"name": "value", "type": "uint256"}],
            "outputs": [{"name": "", "type": "bool"}],
            "stateMutability": "nonpayable",
            "constant": false
        }]"#;
        let abi = Abi::from_json(json).unwrap();
        assert_eq!(abi.functions.len(), 1);
        assert!(abi.functions[0].is_state_mutating());
    }

    #[test]
    fn view_functions_are_excluded_from_mutating_set() {
        let json = r#"[{
            "name": "balanceOf",
            "type": "function",
            "inputs": [{"name": "who", "type": "address"}],
            "outputs": [{"name": "", "type": "uint256"}],
            "stateMutability": "view",
            "constant": true
        }]"#;
        let abi = Abi::from_json(json).unwrap();
        assert_eq!(abi.state_mutating_functions().count(), 0);
    }

    #[test]
    fn malformed_json_surfaces_unmarshal_error() {
        let err = Abi::from_json("not json").unwrap_err();
        assert!(matches!(err, AbiError::JsonUnmarshal(_)));
    }
}
