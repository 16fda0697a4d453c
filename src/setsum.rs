//! An order-independent, invertible digest over a multiset of byte strings.
//!
//! Each item hashes to an element of a product of eight prime-order cyclic
//! groups, and the accumulator is the sum of those elements. Addition
//! commutes, so two replicas that saw the same items in different orders (or
//! in different batches) agree on the digest; every element has an inverse, so
//! removing an item undoes inserting it.
//!
//! ```
//! use setsum::Setsum;
//!
//! let mut lhs = Setsum::default();
//! lhs.insert(b"hello");
//! lhs.insert(b"world");
//!
//! let mut rhs = Setsum::default();
//! rhs.insert(b"world");
//! rhs.insert(b"hello");
//!
//! assert_eq!(lhs.digest(), rhs.digest());
//! ```
//!
//! Nothing stops a caller from removing an item that was never inserted. The
//! result is still a well-formed setsum, it just doesn't correspond to the set
//! the caller had in mind.
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

use log::{debug, trace};
use rayon::iter::{FromParallelIterator, IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hash_to_state::hash_to_state;
use crate::primitives::{ColumnError, Group, State, SETSUM_BYTES};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DigestError {
    #[error("invalid hex digest: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error(transparent)]
    Column(#[from] ColumnError),
}

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Setsum {
    state: State,
}

/// Hash one item split across `pieces`, also returning its total length.
fn hash_item<I>(pieces: I) -> (State, usize)
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut len = 0;
    let item = hash_to_state(
        pieces
            .into_iter()
            .inspect(|piece| len += piece.as_ref().len()),
    );
    (item, len)
}

impl Setsum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one item.
    pub fn insert(&mut self, item: impl AsRef<[u8]>) {
        self.insert_many([item]);
    }

    /// Add one item whose bytes are split across `pieces`.
    ///
    /// This is *not* the same as inserting each piece: the pieces are
    /// concatenated and hashed as a single item.
    pub fn insert_many<I>(&mut self, pieces: I)
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let (item, len) = hash_item(pieces);
        trace!("setsum insert item of {} bytes", len);
        self.state += item;
    }

    /// Take away one item.
    pub fn remove(&mut self, item: impl AsRef<[u8]>) {
        self.remove_many([item]);
    }

    /// Take away one item whose bytes are split across `pieces`; see
    /// [`Setsum::insert_many`].
    pub fn remove_many<I>(&mut self, pieces: I)
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let (item, len) = hash_item(pieces);
        trace!("setsum remove item of {} bytes", len);
        self.state -= item;
    }

    /// Fold every item of `other` into `self`.
    pub fn merge(&mut self, other: &Setsum) {
        trace!("setsum merge {}", other);
        self.state += other.state;
    }

    /// Take every item of `other` out of `self`.
    pub fn subtract(&mut self, other: &Setsum) {
        trace!("setsum subtract {}", other);
        self.state -= other.state;
    }

    /// Whether this is the setsum of the empty multiset (or of a multiset whose
    /// insertions and removals cancel out).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        &self.state == State::zero()
    }

    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Eight little-endian `u32` columns, in column order.
    #[must_use]
    pub fn digest(&self) -> [u8; SETSUM_BYTES] {
        self.state.to_le_bytes()
    }

    /// Lowercase hex of [`Setsum::digest`].
    #[must_use]
    pub fn hexdigest(&self) -> String {
        hex::encode(self.digest())
    }

    /// Recover a setsum from its digest.
    ///
    /// Fails if any column is not below its modulus, as no setsum produces
    /// such a digest.
    pub fn from_digest(digest: [u8; SETSUM_BYTES]) -> Result<Self, DigestError> {
        let state = State::try_from_le_bytes(&digest).map_err(|err| {
            debug!("rejecting digest: {}", err);
            err
        })?;
        Ok(Self { state })
    }

    /// Recover a setsum from its hex digest (either case).
    pub fn from_hexdigest(hexdigest: &str) -> Result<Self, DigestError> {
        let mut digest = [0u8; SETSUM_BYTES];
        hex::decode_to_slice(hexdigest, &mut digest).map_err(|err| {
            debug!("rejecting hex digest of length {}: {}", hexdigest.len(), err);
            err
        })?;
        Self::from_digest(digest)
    }
}

impl From<State> for Setsum {
    fn from(state: State) -> Self {
        Self { state }
    }
}

impl fmt::Display for Setsum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hexdigest())
    }
}

impl FromStr for Setsum {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hexdigest(s)
    }
}

impl TryFrom<String> for Setsum {
    type Error = DigestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hexdigest(&value)
    }
}

impl From<Setsum> for String {
    fn from(setsum: Setsum) -> String {
        setsum.hexdigest()
    }
}

impl Add<Self> for Setsum {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign<Self> for Setsum {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}

impl Sub<Self> for Setsum {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self::Output {
        self -= rhs;
        self
    }
}

impl SubAssign<Self> for Setsum {
    fn sub_assign(&mut self, rhs: Self) {
        self.subtract(&rhs);
    }
}

static EMPTY: Setsum = Setsum {
    state: State::ZERO,
};

impl Group for Setsum {
    fn zero() -> &'static Self {
        &EMPTY
    }
}

/// Each item is inserted separately.
impl<T: AsRef<[u8]>> Extend<T> for Setsum {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl<T: AsRef<[u8]>> FromIterator<T> for Setsum {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut setsum = Self::default();
        setsum.extend(iter);
        setsum
    }
}

/// Hashes items on the rayon pool; equal to the sequential [`FromIterator`].
impl<T: AsRef<[u8]> + Send> FromParallelIterator<T> for Setsum {
    fn from_par_iter<I>(par_iter: I) -> Self
    where
        I: IntoParallelIterator<Item = T>,
    {
        par_iter
            .into_par_iter()
            .map(|item| Setsum::from(hash_to_state([item])))
            .reduce(Setsum::default, Add::add)
    }
}

#[cfg(test)]
use proptest::prelude::*;

#[cfg(test)]
impl Arbitrary for Setsum {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        any::<State>().prop_map(Setsum::from).boxed()
    }
}

/// One step of a random insert/remove workload.
#[cfg(test)]
#[derive(proptest_derive::Arbitrary, Debug, Clone)]
enum Op {
    Insert(Vec<u8>),
    Remove(Vec<u8>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiset::MultiSet;
    use crate::primitives::{self, SETSUM_PRIMES};
    use itertools::Itertools;
    use rayon::prelude::*;

    primitives::check_laws!(Setsum);

    const SEVEN_VALUES: [&str; 7] = [
        "this is the first value",
        "this is the second value",
        "this is the third value",
        "this is the fourth value",
        "this is the fifth value",
        "this is the sixth value",
        "this is the seventh value",
    ];

    const SEVEN_VALUES_DIGEST: [u8; SETSUM_BYTES] = [
        197, 179, 253, 77, 1, 242, 184, 4, 15, 84, 171, 116, 18, 202, 83, 187, 252, 153, 14, 39,
        42, 64, 173, 209, 196, 206, 186, 107, 47, 228, 114, 213,
    ];

    fn setsum_of(items: &[&str]) -> Setsum {
        let mut setsum = Setsum::default();
        for item in items {
            setsum.insert(item);
        }
        setsum
    }

    #[test]
    fn test_empty_digest() {
        let empty = Setsum::default();
        assert!(empty.is_empty());
        assert_eq!(empty.digest(), [0u8; SETSUM_BYTES]);
        assert_eq!(empty.hexdigest(), "0".repeat(2 * SETSUM_BYTES));
    }

    #[test]
    fn test_seven_values_sorted() {
        assert_eq!(setsum_of(&SEVEN_VALUES).digest(), SEVEN_VALUES_DIGEST);
    }

    #[test]
    fn test_seven_values_reversed() {
        let mut values = SEVEN_VALUES;
        values.reverse();
        assert_eq!(setsum_of(&values).digest(), SEVEN_VALUES_DIGEST);
    }

    #[test]
    fn test_seven_values_shuffled() {
        let values = [
            SEVEN_VALUES[4],
            SEVEN_VALUES[3],
            SEVEN_VALUES[2],
            SEVEN_VALUES[5],
            SEVEN_VALUES[6],
            SEVEN_VALUES[1],
            SEVEN_VALUES[0],
        ];
        assert_eq!(setsum_of(&values).digest(), SEVEN_VALUES_DIGEST);
    }

    #[test]
    fn test_seven_values_every_order() {
        // 7! = 5040 orders; cheap enough to check them all.
        for order in SEVEN_VALUES.iter().copied().permutations(SEVEN_VALUES.len()) {
            assert_eq!(setsum_of(&order).digest(), SEVEN_VALUES_DIGEST);
        }
    }

    #[test]
    fn test_insert_then_remove_all() {
        let mut setsum = setsum_of(&SEVEN_VALUES);
        for value in SEVEN_VALUES.iter().rev() {
            setsum.remove(value);
        }
        assert!(setsum.is_empty());
        assert_eq!(setsum.digest(), Setsum::default().digest());
    }

    #[test]
    fn test_remove_duplicate() {
        let mut setsum = Setsum::default();
        setsum.insert(b"hello");
        setsum.insert(b"hello");
        setsum.remove(b"hello");
        assert_eq!(setsum, setsum_of(&["hello"]));
        assert_ne!(setsum, setsum_of(&["hello", "hello"]));
    }

    #[test]
    fn test_merge_two_sets() {
        let mut lhs = setsum_of(&SEVEN_VALUES[..4]);
        let rhs = setsum_of(&SEVEN_VALUES[4..]);
        lhs.merge(&rhs);
        assert_eq!(lhs.digest(), SEVEN_VALUES_DIGEST);
    }

    #[test]
    fn test_subtract_two_sets() {
        let mut all = setsum_of(&SEVEN_VALUES);
        all.subtract(&setsum_of(&SEVEN_VALUES[..4]));
        all.subtract(&setsum_of(&SEVEN_VALUES[4..]));
        assert!(all.is_empty());
    }

    #[test]
    fn test_insert_many_is_one_item() {
        let mut pieces = Setsum::default();
        pieces.insert_many([b"hello ".as_slice(), b"world".as_slice()]);
        assert_eq!(pieces, setsum_of(&["hello world"]));
        assert_ne!(pieces, setsum_of(&["hello ", "world"]));

        pieces.remove_many(["hel", "lo wor", "ld"]);
        assert!(pieces.is_empty());
    }

    #[test]
    fn test_insert_many_empty_is_empty_item() {
        let mut setsum = Setsum::default();
        setsum.insert_many(std::iter::empty::<&[u8]>());
        assert_eq!(setsum, setsum_of(&[""]));
        assert!(!setsum.is_empty());
    }

    #[test]
    fn test_hash_item_length() {
        let (item, len) = hash_item(["hel", "lo wor", "ld"]);
        assert_eq!(len, "hello world".len());
        assert_eq!(item, hash_to_state(["hello world"]));

        let (item, len) = hash_item(std::iter::empty::<&[u8]>());
        assert_eq!(len, 0);
        assert_eq!(item, hash_to_state([b""]));
    }

    #[test]
    fn test_remove_absent_item_is_silent() {
        let mut setsum = setsum_of(&["hello"]);
        setsum.remove(b"world");
        assert!(!setsum.is_empty());
        setsum.insert(b"world");
        assert_eq!(setsum, setsum_of(&["hello"]));
    }

    #[test]
    fn test_hexdigest_known() {
        assert_eq!(
            setsum_of(&SEVEN_VALUES).hexdigest(),
            hex::encode(SEVEN_VALUES_DIGEST)
        );
    }

    #[test]
    fn test_from_hexdigest_errors() {
        assert!(matches!(
            Setsum::from_hexdigest("abc"),
            Err(DigestError::Hex(_))
        ));
        assert!(matches!(
            Setsum::from_hexdigest(&"zz".repeat(SETSUM_BYTES)),
            Err(DigestError::Hex(_))
        ));
        assert!(matches!(
            Setsum::from_hexdigest(&"00".repeat(SETSUM_BYTES + 1)),
            Err(DigestError::Hex(_))
        ));
        assert!(matches!(
            Setsum::from_hexdigest(&"ff".repeat(SETSUM_BYTES)),
            Err(DigestError::Column(ColumnError { column: 0, .. }))
        ));
    }

    #[test]
    fn test_from_digest_boundary() {
        let mut digest = [0u8; SETSUM_BYTES];
        digest[28..].copy_from_slice(&(SETSUM_PRIMES[7] - 1).to_le_bytes());
        assert!(Setsum::from_digest(digest).is_ok());
        digest[28..].copy_from_slice(&SETSUM_PRIMES[7].to_le_bytes());
        assert_eq!(
            Setsum::from_digest(digest),
            Err(DigestError::Column(ColumnError {
                column: 7,
                value: SETSUM_PRIMES[7],
                prime: SETSUM_PRIMES[7],
            }))
        );
    }

    #[test]
    fn test_from_hexdigest_uppercase() {
        let setsum = setsum_of(&SEVEN_VALUES);
        let upper = setsum.hexdigest().to_uppercase();
        assert_eq!(Setsum::from_hexdigest(&upper), Ok(setsum));
    }

    #[test]
    fn test_serde_as_hexdigest() {
        let setsum = setsum_of(&SEVEN_VALUES);
        let json = serde_json::to_string(&setsum).unwrap();
        assert_eq!(json, format!("\"{}\"", hex::encode(SEVEN_VALUES_DIGEST)));
        assert_eq!(serde_json::from_str::<Setsum>(&json).unwrap(), setsum);
        assert!(serde_json::from_str::<Setsum>("\"00\"").is_err());
    }

    #[test]
    fn test_from_iter() {
        let sequential: Setsum = SEVEN_VALUES.iter().collect();
        assert_eq!(sequential.digest(), SEVEN_VALUES_DIGEST);
        let parallel: Setsum = SEVEN_VALUES[..].par_iter().collect();
        assert_eq!(parallel, sequential);
    }

    proptest! {
        #[test]
        fn test_order_independent(items: Vec<Vec<u8>>, seed: prop::sample::Index) {
            let forward: Setsum = items.iter().collect();
            let mut shuffled = items.clone();
            let len = shuffled.len();
            if len > 1 {
                shuffled.rotate_left(seed.index(len));
                shuffled.swap(0, len - 1);
            }
            let backward: Setsum = shuffled.iter().rev().collect();
            prop_assert_eq!(forward.digest(), backward.digest());
        }

        #[test]
        fn test_cancellation(setsum: Setsum, item: Vec<u8>) {
            let mut updated = setsum;
            updated.insert(&item);
            updated.remove(&item);
            prop_assert_eq!(updated.digest(), setsum.digest());

            updated.remove(&item);
            updated.insert(&item);
            prop_assert_eq!(updated.digest(), setsum.digest());
        }

        #[test]
        fn test_merge_split(items: Vec<Vec<u8>>, split: prop::sample::Index) {
            let at = split.index(items.len() + 1);
            let (head, tail) = items.split_at(at);
            let whole: Setsum = items.iter().collect();
            let head: Setsum = head.iter().collect();
            let tail: Setsum = tail.iter().collect();

            let mut merged = head;
            merged.merge(&tail);
            prop_assert_eq!(merged, whole);

            merged.subtract(&tail);
            prop_assert_eq!(merged, head);
        }

        #[test]
        fn test_remove_all_in_any_order(items: Vec<Vec<u8>>, rotate: prop::sample::Index) {
            let mut setsum: Setsum = items.iter().collect();
            let mut order = items;
            if !order.is_empty() {
                let len = order.len();
                order.rotate_right(rotate.index(len));
            }
            for item in &order {
                setsum.remove(item);
            }
            prop_assert!(setsum.is_empty());
        }

        #[test]
        fn test_matches_multiset(ops: Vec<Op>) {
            let mut setsum = Setsum::default();
            let mut model = MultiSet::default();
            let mut removed = MultiSet::default();
            for op in ops {
                match op {
                    Op::Insert(item) => {
                        setsum.insert(&item);
                        model.insert(item);
                    }
                    Op::Remove(item) => {
                        setsum.remove(&item);
                        if !model.remove(&item) {
                            removed.insert(item);
                        }
                    }
                }
            }
            // Over-removals stay in the state as negative contributions.
            prop_assert_eq!(setsum, model.setsum() - removed.setsum());
        }

        #[test]
        fn test_hexdigest_roundtrip(setsum: Setsum) {
            let hexdigest = setsum.hexdigest();
            prop_assert_eq!(&hexdigest, &hex::encode(setsum.digest()));
            prop_assert!(hexdigest.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
            prop_assert_eq!(hex::decode(&hexdigest).unwrap(), setsum.digest().to_vec());
            prop_assert_eq!(hexdigest.parse::<Setsum>(), Ok(setsum));
            prop_assert_eq!(Setsum::from_digest(setsum.digest()), Ok(setsum));
        }

        #[test]
        fn test_par_iter_matches(items: Vec<Vec<u8>>) {
            let sequential: Setsum = items.iter().collect();
            let parallel: Setsum = items.par_iter().collect();
            prop_assert_eq!(parallel, sequential);
        }
    }
}
