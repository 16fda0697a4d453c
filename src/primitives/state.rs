//! The column vector underlying every setsum.
//!
//! Column `i` is an element of ℤ/Pᵢℤ where Pᵢ is [`SETSUM_PRIMES`]`[i]`; the
//! vector as a whole is an element of the product group, which is what makes
//! accumulation order-independent and invertible.
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub, SubAssign};
use thiserror::Error;

use super::{Group, SETSUM_BYTES, SETSUM_BYTES_PER_COLUMN, SETSUM_COLUMNS, SETSUM_PRIMES};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("column {column} holds {value}, which is not below its modulus {prime}")]
pub struct ColumnError {
    pub column: usize,
    pub value: u32,
    pub prime: u32,
}

/// A vector of [`SETSUM_COLUMNS`] residues, each in `[0, P)` for its column's
/// prime `P`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "[u32; SETSUM_COLUMNS]", into = "[u32; SETSUM_COLUMNS]")]
pub struct State {
    columns: [u32; SETSUM_COLUMNS],
}

/// The additive inverse of a [`State`], `P - x` in every column.
///
/// A zero column inverts to `P` itself, one past the valid range. The only
/// consumer is [`State::add_inverse`], whose single conditional subtraction
/// accepts operands in `[0, P]` and brings the column back into `[0, P)`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Inverse {
    columns: [u32; SETSUM_COLUMNS],
}

/// Column-wise `lhs + rhs mod P`.
///
/// Both operands must lie in `[0, P]` so that at most one subtraction is
/// needed.
fn add_columns(
    lhs: &[u32; SETSUM_COLUMNS],
    rhs: &[u32; SETSUM_COLUMNS],
) -> [u32; SETSUM_COLUMNS] {
    let mut result = [0u32; SETSUM_COLUMNS];
    for i in 0..SETSUM_COLUMNS {
        let prime = u64::from(SETSUM_PRIMES[i]);
        let mut sum = u64::from(lhs[i]) + u64::from(rhs[i]);
        if sum >= prime {
            sum -= prime;
        }
        debug_assert!(sum < prime);
        // sum < P < 2^32
        result[i] = sum as u32;
    }
    result
}

impl State {
    /// The identity: the state of an empty setsum.
    pub const ZERO: Self = Self {
        columns: [0u32; SETSUM_COLUMNS],
    };

    /// Reduce arbitrary 32-bit words into their columns.
    ///
    /// Every prime is within 2^8 of 2^32, so any `u32` is below `2P` and one
    /// conditional subtraction suffices.
    pub fn from_words(words: [u32; SETSUM_COLUMNS]) -> Self {
        let mut columns = words;
        for (column, prime) in columns.iter_mut().zip(SETSUM_PRIMES) {
            if *column >= prime {
                *column -= prime;
            }
        }
        Self { columns }
    }

    /// Read little-endian words out of `bytes` and reduce them.
    pub fn from_le_bytes(bytes: &[u8; SETSUM_BYTES]) -> Self {
        Self::from_words(read_words(bytes))
    }

    /// Read little-endian words out of `bytes`, rejecting any that are out of
    /// range rather than reducing them.
    pub fn try_from_le_bytes(bytes: &[u8; SETSUM_BYTES]) -> Result<Self, ColumnError> {
        Self::try_from(read_words(bytes))
    }

    pub fn to_le_bytes(&self) -> [u8; SETSUM_BYTES] {
        let mut bytes = [0u8; SETSUM_BYTES];
        for (chunk, column) in bytes
            .chunks_exact_mut(SETSUM_BYTES_PER_COLUMN)
            .zip(self.columns)
        {
            chunk.copy_from_slice(&column.to_le_bytes());
        }
        bytes
    }

    pub fn columns(&self) -> &[u32; SETSUM_COLUMNS] {
        &self.columns
    }

    pub(crate) fn inverse(&self) -> Inverse {
        let mut columns = [0u32; SETSUM_COLUMNS];
        for i in 0..SETSUM_COLUMNS {
            columns[i] = SETSUM_PRIMES[i] - self.columns[i];
        }
        Inverse { columns }
    }

    pub(crate) fn add_inverse(&mut self, rhs: Inverse) {
        self.columns = add_columns(&self.columns, &rhs.columns);
        debug_assert!(self.check_value().is_ok());
    }

    /// Check that this is a valid group element.
    fn check_value(&self) -> Result<(), ColumnError> {
        for (column, (&value, prime)) in self.columns.iter().zip(SETSUM_PRIMES).enumerate() {
            if value >= prime {
                return Err(ColumnError {
                    column,
                    value,
                    prime,
                });
            }
        }
        Ok(())
    }
}

fn read_words(bytes: &[u8; SETSUM_BYTES]) -> [u32; SETSUM_COLUMNS] {
    let mut words = [0u32; SETSUM_COLUMNS];
    for (word, chunk) in words
        .iter_mut()
        .zip(bytes.chunks_exact(SETSUM_BYTES_PER_COLUMN))
    {
        let mut le = [0u8; SETSUM_BYTES_PER_COLUMN];
        le.copy_from_slice(chunk);
        *word = u32::from_le_bytes(le);
    }
    words
}

impl TryFrom<[u32; SETSUM_COLUMNS]> for State {
    type Error = ColumnError;

    fn try_from(columns: [u32; SETSUM_COLUMNS]) -> Result<Self, Self::Error> {
        let state = Self { columns };
        state.check_value()?;
        Ok(state)
    }
}

impl From<State> for [u32; SETSUM_COLUMNS] {
    fn from(state: State) -> Self {
        state.columns
    }
}

impl Add<Self> for State {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign<Self> for State {
    fn add_assign(&mut self, rhs: Self) {
        self.columns = add_columns(&self.columns, &rhs.columns);
    }
}

impl Sub<Self> for State {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self::Output {
        self -= rhs;
        self
    }
}

impl SubAssign<Self> for State {
    fn sub_assign(&mut self, rhs: Self) {
        self.add_inverse(rhs.inverse());
    }
}

impl Group for State {
    fn zero() -> &'static Self {
        &Self::ZERO
    }
}

#[cfg(test)]
use proptest::prelude::*;

#[cfg(test)]
impl Arbitrary for State {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        // Bias toward the edges of each column, where the reduction happens.
        let column = prop_oneof![
            Just(0u32),
            (1u32..=8).prop_map(|offset| offset.wrapping_neg()),
            any::<u32>(),
        ];
        prop::array::uniform8(column)
            .prop_map(State::from_words)
            .boxed()
    }
}
