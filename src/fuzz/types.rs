//! The Solidity type registry: fundamentals plus fixed/dynamic array
//! containers, each dispatching to its own fuzz strategy.

use crate::error::FuzzError;

/// A parsed Solidity parameter type. Array variants recurse through the
/// same `fuzz` capability as their element type (see `fuzz::value`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int(u8),
    Uint(u8),
    Bool,
    Address,
    Bytes(u8),
    DynBytes,
    String,
    FixedArray(Box<Type>, u32),
    DynArray(Box<Type>),
}

impl Type {
    /// Parses a Solidity type string such as `uint256`, `address[3]`, or
    /// `bytes32[][2]`. Array suffixes are stripped right-to-left: a bare
    /// `[]` suffix means a dynamic array, a `[N]` suffix means a fixed
    /// array of size N.
    pub fn parse(raw: &str) -> Result<Self, FuzzError> {
        let raw = raw.trim();

        if let Some(prefix) = raw.strip_suffix("[]") {
            return Ok(Type::DynArray(Box::new(Type::parse(prefix)?)));
        }

        if raw.ends_with(']') {
            if let Some(open) = raw.rfind('[') {
                let size_str = &raw[open + 1..raw.len() - 1];
                if let Ok(size) = size_str.parse::<u32>() {
                    let prefix = &raw[..open];
                    return Ok(Type::FixedArray(Box::new(Type::parse(prefix)?), size));
                }
            }
        }

        Self::parse_fundamental(raw)
    }

    fn parse_fundamental(raw: &str) -> Result<Self, FuzzError> {
        match raw {
            "bool" => return Ok(Type::Bool),
            "address" => return Ok(Type::Address),
            "string" => return Ok(Type::String),
            "bytes" => return Ok(Type::DynBytes),
            "int" => return Ok(Type::Int(32)),
            "uint" => return Ok(Type::Uint(32)),
            _ => {}
        }

        if let Some(n) = raw.strip_prefix("uint") {
            let bits: u32 = n.parse().map_err(|_| FuzzError::TypeNotFound(raw.to_string()))?;
            if bits == 0 || bits % 8 != 0 || bits > 256 {
                return Err(FuzzError::TypeNotFound(raw.to_string()));
            }
            return Ok(Type::Uint((bits / 8) as u8));
        }

        if let Some(n) = raw.strip_prefix("int") {
            let bits: u32 = n.parse().map_err(|_| FuzzError::TypeNotFound(raw.to_string()))?;
            if bits == 0 || bits % 8 != 0 || bits > 256 {
                return Err(FuzzError::TypeNotFound(raw.to_string()));
            }
            return Ok(Type::Int((bits / 8) as u8));
        }

        if let Some(n) = raw.strip_prefix("bytes") {
            let width: u32 = n.parse().map_err(|_| FuzzError::TypeNotFound(raw.to_string()))?;
            if width == 0 || width > 32 {
                return Err(FuzzError::TypeNotFound(raw.to_string()));
            }
            return Ok(Type::Bytes(width as u8));
        }

        Err(FuzzError::UnknownComplexType(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fundamentals() {
        assert_eq!(Type::parse("bool").unwrap(), Type::Bool);
        assert_eq!(Type::parse("address").unwrap(), Type::Address);
        assert_eq!(Type::parse("uint256").unwrap(), Type::Uint(32));
        assert_eq!(Type::parse("int8").unwrap(), Type::Int(1));
        assert_eq!(Type::parse("bytes32").unwrap(), Type::Bytes(32));
        assert_eq!(Type::parse("bytes").unwrap(), Type::DynBytes);
        assert_eq!(Type::parse("string").unwrap(), Type::String);
    }

    #[test]
    fn parses_fixed_array() {
        assert_eq!(Type::parse("uint256[3]").unwrap(), Type::FixedArray(Box::new(Type::Uint(32)), 3));
    }

    #[test]
    fn parses_dynamic_array() {
        assert_eq!(Type::parse("address[]").unwrap(), Type::DynArray(Box::new(Type::Address)));
    }

    #[test]
    fn parses_nested_arrays() {
        assert_eq!(
            Type::parse("uint8[2][]").unwrap(),
            Type::DynArray(Box::new(Type::FixedArray(Box::new(Type::Uint(1)), 2)))
        );
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(matches!(Type::parse("foo"), Err(FuzzError::UnknownComplexType(_))));
    }

    #[test]
    fn rejects_bad_width() {
        assert!(matches!(Type::parse("uint7"), Err(FuzzError::TypeNotFound(_))));
    }
}
