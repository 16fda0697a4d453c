use digest::Digest;
use sha3::Sha3_256;

use crate::primitives::{State, SETSUM_BYTES};

/// Incrementally hash one item, possibly delivered in several pieces, down to a
/// [`State`].
///
/// Only the concatenation of the pieces matters: `update(b"ab")` and
/// `update(b"a"); update(b"b")` finalize to the same state.
#[derive(Clone, Default)]
pub struct ItemHasher {
    hasher: Sha3_256,
}

impl ItemHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, piece: impl AsRef<[u8]>) {
        self.hasher.update(piece.as_ref());
    }

    pub fn finalize(self) -> State {
        let mut hash = [0u8; SETSUM_BYTES];
        hash.copy_from_slice(&self.hasher.finalize());
        State::from_le_bytes(&hash)
    }
}

/// Hash the concatenation of `pieces` to a group element.
///
/// SHA3-256 output is split into little-endian words, one per column, each
/// reduced into its column's range.
pub fn hash_to_state<I>(pieces: I) -> State
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut hasher = ItemHasher::new();
    for piece in pieces {
        hasher.update(piece);
    }
    hasher.finalize()
}
