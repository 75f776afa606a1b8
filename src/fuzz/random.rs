//! Bounded-retry random selection with short-term no-repeat memory.

use std::cell::RefCell;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::FuzzError;

const MAX_RETRY: u32 = 10;

/// Selects uniformly at random among a candidate slice, retrying (up to
/// [`MAX_RETRY`] times) to avoid picking the same index as the previous
/// call. Each instance is consumer-local: no cross-task sharing of
/// last-choice memory or RNG state.
pub struct RandomSelector {
    rng: StdRng,
    last_choice: Option<usize>,
}

impl Default for RandomSelector {
    fn default() -> Self {
        Self { rng: StdRng::from_rng(rand::thread_rng()).expect("os rng available"), last_choice: None }
    }
}

impl RandomSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects one element from `candidates` by value.
    pub fn select<T: Clone>(&mut self, candidates: &[T]) -> Result<T, FuzzError> {
        let idx = self.select_index(candidates.len())?;
        Ok(candidates[idx].clone())
    }

    /// Selects an index in `0..len`, applying the no-immediate-repeat retry
    /// policy. After [`MAX_RETRY`] failed attempts to avoid a repeat, fails
    /// with `OverRandomLimit` and resets `last_choice`.
    pub fn select_index(&mut self, len: usize) -> Result<usize, FuzzError> {
        if len == 0 {
            return Err(FuzzError::ZeroSizedInput);
        }
        if len == 1 {
            self.last_choice = Some(0);
            return Ok(0);
        }

        for _ in 0..MAX_RETRY {
            let idx = self.rng.gen_range(0..len);
            if Some(idx) != self.last_choice {
                self.last_choice = Some(idx);
                return Ok(idx);
            }
        }

        self.last_choice = None;
        Err(FuzzError::OverRandomLimit)
    }
}

macro_rules! thread_local_selector {
    ($name:ident, $cell:ident) => {
        thread_local! {
            static $cell: RefCell<RandomSelector> = RefCell::new(RandomSelector::new());
        }

        pub fn $name<T: Clone>(candidates: &[T]) -> Result<T, FuzzError> {
            $cell.with(|s| s.borrow_mut().select(candidates))
        }
    };
}

thread_local_selector!(select_int, INT_SELECTOR);
thread_local_selector!(select_uint, UINT_SELECTOR);
thread_local_selector!(select_byte, BYTE_SELECTOR);
thread_local_selector!(select_bytes, BYTES_SELECTOR);
thread_local_selector!(select_string, STRING_SELECTOR);
thread_local_selector!(select_address, ADDRESS_SELECTOR);
thread_local_selector!(select_bool, BOOL_SELECTOR);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_candidates_fails() {
        let mut sel = RandomSelector::new();
        let err = sel.select_index(0).unwrap_err();
        assert!(matches!(err, FuzzError::ZeroSizedInput));
    }

    #[test]
    fn two_candidates_rarely_repeat_back_to_back() {
        let mut sel = RandomSelector::new();
        let first = sel.select_index(2).unwrap();
        let mut repeats = 0;
        let mut last = first;
        for _ in 0..10 {
            match sel.select_index(2) {
                Ok(idx) => {
                    if idx == last {
                        repeats += 1;
                    }
                    last = idx;
                }
                Err(FuzzError::OverRandomLimit) => repeats += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert!(repeats <= 1, "selector repeated back-to-back more than once: {repeats}");
    }

    #[test]
    fn single_candidate_always_selects_it() {
        let mut sel = RandomSelector::new();
        for _ in 0..5 {
            assert_eq!(sel.select(&["only"]).unwrap(), "only");
        }
    }
}
