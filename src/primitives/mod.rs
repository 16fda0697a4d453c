mod group;
pub mod state;

pub use group::Group;
pub use state::{ColumnError, State};

/// Number of bytes in a digest.
pub const SETSUM_BYTES: usize = 32;
/// Number of bytes used to encode a single column.
pub const SETSUM_BYTES_PER_COLUMN: usize = 4;
/// Number of columns in a [`State`].
pub const SETSUM_COLUMNS: usize = SETSUM_BYTES / SETSUM_BYTES_PER_COLUMN;

/// The modulus of each column: the eight largest primes below 2^32, in
/// descending order.
///
/// Changing any of these changes every digest ever produced.
pub const SETSUM_PRIMES: [u32; SETSUM_COLUMNS] = [
    4294967291, 4294967279, 4294967231, 4294967197, 4294967189, 4294967161, 4294967143,
    4294967111,
];

#[cfg(test)]
pub(crate) use group::check_laws;
