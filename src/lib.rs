#![cfg_attr(feature = "strict", deny(warnings))]
pub mod hash_to_state;
pub mod multiset;
pub mod primitives;
pub mod setsum;

pub use hash_to_state::{hash_to_state, ItemHasher};
pub use multiset::MultiSet;
pub use primitives::{
    Group, State, SETSUM_BYTES, SETSUM_BYTES_PER_COLUMN, SETSUM_COLUMNS, SETSUM_PRIMES,
};
pub use setsum::{DigestError, Setsum};
