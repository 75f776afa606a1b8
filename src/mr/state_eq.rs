//! Inner-restricted state-equality check. Balances and nonces are not
//! compared — only storage.

use std::collections::HashSet;

use alloy_primitives::Address;

use crate::substate::Alloc;

/// Compares the storage of every address in `inner` across two allocs. On
/// the first differing address, returns `(Some(addr), false)`. If every
/// inner address agrees, returns `(None, true)`.
pub fn inner_state_equal(a: &Alloc, b: &Alloc, inner: &HashSet<Address>) -> (Option<Address>, bool) {
    for addr in inner {
        let storage_a = a.get(addr).map(|acc| &acc.storage);
        let storage_b = b.get(addr).map(|acc| &acc.storage);
        let equal = match (storage_a, storage_b) {
            (None, None) => true,
            (Some(sa), Some(sb)) => sa == sb,
            _ => false,
        };
        if !equal {
            return (Some(*addr), false);
        }
    }
    (None, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substate::Account;
    use alloy_primitives::{address, b256, U256};

    #[test]
    fn reports_first_differing_inner_address() {
        let addr = address!("1111111111111111111111111111111111111111");
        let mut inner = HashSet::new();
        inner.insert(addr);

        let mut a = Alloc::new();
        let mut storage_a = std::collections::HashMap::new();
        storage_a.insert(b256!("0000000000000000000000000000000000000000000000000000000000000001"), b256!("0000000000000000000000000000000000000000000000000000000000000002"));
        a.insert(addr, Account { nonce: 0, balance: U256::ZERO, code: None, storage: storage_a });

        let mut b = Alloc::new();
        let mut storage_b = std::collections::HashMap::new();
        storage_b.insert(b256!("0000000000000000000000000000000000000000000000000000000000000001"), b256!("0000000000000000000000000000000000000000000000000000000000000003"));
        b.insert(addr, Account { nonce: 0, balance: U256::ZERO, code: None, storage: storage_b });

        let (diff_addr, equal) = inner_state_equal(&a, &b, &inner);
        assert!(!equal);
        assert_eq!(diff_addr, Some(addr));
    }

    #[test]
    fn equal_storage_reports_no_divergence() {
        let addr = address!("1111111111111111111111111111111111111111");
        let mut inner = HashSet::new();
        inner.insert(addr);

        let acc = Account { nonce: 5, balance: U256::from(999u64), code: None, storage: Default::default() };
        let mut a = Alloc::new();
        a.insert(addr, acc.clone());
        let mut b = Alloc::new();
        b.insert(addr, Account { nonce: 0, balance: U256::ZERO, ..acc });

        let (diff_addr, equal) = inner_state_equal(&a, &b, &inner);
        assert!(equal);
        assert_eq!(diff_addr, None);
    }
}
