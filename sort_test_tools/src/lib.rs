//! Shared harness for testing sort implementations.
//!
//! Implement [`Sort`] for the sort under test and stamp out the full test
//! battery with `instantiate_sort_tests!`. Input generation is seeded;
//! every test prints the seed it ran with and honors the `OVERRIDE_SEED`
//! environment variable so failures reproduce.

use std::cmp::Ordering;

pub mod patterns;
pub mod types;

pub trait Sort {
    fn name() -> String;

    fn sort<T>(v: &mut [T])
    where
        T: Ord;

    fn sort_by<T, F>(v: &mut [T], compare: F)
    where
        F: FnMut(&T, &T) -> Ordering;
}
