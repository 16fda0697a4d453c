//! Multiset
//!
//! Counts occurrences explicitly, which is what a [`Setsum`] summarizes. Handy
//! for checking a setsum against the items it claims to cover, or for working
//! out which items two replicas disagree on once their digests differ.

use std::{collections::HashMap, hash::Hash};

use serde::Serialize;

use crate::Setsum;

#[derive(Debug, Clone, Serialize)]
pub struct MultiSet<T: Hash + Eq> {
    inner: HashMap<T, u32>,
}

impl<T: Hash + Eq> Default for MultiSet<T> {
    fn default() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }
}

impl<T: Hash + Eq> MultiSet<T> {
    pub fn insert(&mut self, member: T) {
        *self.inner.entry(member).or_insert(0) += 1;
    }

    /// Remove one occurrence of `member`; returns `false` if there was none.
    pub fn remove(&mut self, member: &T) -> bool {
        match self.inner.get_mut(member) {
            None => false,
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.inner.remove(member);
                true
            }
        }
    }

    pub fn get(&self, member: &T) -> u32 {
        *self.inner.get(member).unwrap_or(&0)
    }

    /// Total number of occurrences.
    pub fn len(&self) -> usize {
        self.inner.values().map(|&count| count as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, &u32)> {
        self.inner.iter()
    }

    pub fn is_superset(&self, other: &Self) -> bool {
        other
            .inner
            .iter()
            .all(|(key, count)| self.get(key) >= *count)
    }

    /// Occurrences in `self` beyond those in `other`.
    pub fn difference<'a>(&'a self, other: &'a Self) -> impl Iterator<Item = (&'a T, u32)> + 'a {
        self.inner.iter().filter_map(|(key, count)| {
            let diff = count.saturating_sub(other.get(key));
            (diff > 0).then_some((key, diff))
        })
    }
}

impl<T: Hash + Eq + AsRef<[u8]>> MultiSet<T> {
    /// The setsum of every occurrence.
    pub fn setsum(&self) -> Setsum {
        let mut setsum = Setsum::default();
        for (member, &count) in self.inner.iter() {
            for _ in 0..count {
                setsum.insert(member);
            }
        }
        setsum
    }
}

impl<T: Hash + Eq> FromIterator<T> for MultiSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut multiset = Self::default();
        for member in iter {
            multiset.insert(member);
        }
        multiset
    }
}
