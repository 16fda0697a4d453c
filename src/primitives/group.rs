use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// An abelian group, written additively.
pub trait Group:
    Clone
    + Debug
    + Default
    + Eq
    + Hash
    + AddAssign<Self>
    + Add<Self, Output = Self>
    + SubAssign<Self>
    + Sub<Self, Output = Self>
    + Sync
    + Send
    + Serialize
{
    fn zero() -> &'static Self;
}

#[cfg(test)]
macro_rules! check_laws {
    ($type:ty) => {
        mod group_laws {
            #![allow(unused_imports)]
            use super::*;
            use crate::primitives::Group;
            use proptest::prelude::*;

            fn check_commutative<G: Group>(a: G, b: G) -> Result<(), TestCaseError> {
                let lhs = {
                    let (a, b) = (a.clone(), b.clone());
                    a + b
                };
                let rhs = b + a;
                prop_assert_eq!(&lhs, &rhs);
                Ok(())
            }

            fn check_associative<G: Group>(a: G, b: G, c: G) -> Result<(), TestCaseError> {
                let lhs = {
                    let (a, b, c) = (a.clone(), b.clone(), c.clone());
                    (a + b) + c
                };
                let rhs = a + (b + c);
                prop_assert_eq!(&lhs, &rhs);
                Ok(())
            }

            fn check_identity<G: Group + 'static>(a: G) -> Result<(), TestCaseError> {
                let zero = G::zero().clone();
                let lhs = {
                    let (a, zero) = (a.clone(), zero.clone());
                    a + zero
                };
                let rhs = zero.clone() + a.clone();
                prop_assert_eq!(&lhs, &a);
                prop_assert_eq!(&a, &rhs);
                prop_assert_eq!(&(a.clone() - zero), &a);
                Ok(())
            }

            fn check_inverse<G: Group + 'static>(a: G, b: G) -> Result<(), TestCaseError> {
                prop_assert_eq!(&(a.clone() - a.clone()), G::zero());
                let roundtrip = (a.clone() + b.clone()) - b;
                prop_assert_eq!(&roundtrip, &a);
                Ok(())
            }

            fn check_assign<G: Group>(a: G, b: G) -> Result<(), TestCaseError> {
                let lhs = a.clone() + b.clone();
                let mut rhs = a.clone();
                rhs += b.clone();
                prop_assert_eq!(&lhs, &rhs);

                let lhs = a.clone() - b.clone();
                let mut rhs = a;
                rhs -= b;
                prop_assert_eq!(&lhs, &rhs);
                Ok(())
            }

            proptest! {
                #[test]
                fn test_commutative(a: $type, b: $type) {
                    check_commutative(a, b)?;
                }

                #[test]
                fn test_associative(a: $type, b: $type, c: $type) {
                    check_associative(a, b, c)?;
                }

                #[test]
                fn test_identity(a: $type) {
                    check_identity(a)?;
                }

                #[test]
                fn test_inverse(a: $type, b: $type) {
                    check_inverse(a, b)?;
                }

                #[test]
                fn test_assign(a: $type, b: $type) {
                    check_assign(a, b)?;
                }
            }
        }
    };
}

#[cfg(test)]
pub(crate) use check_laws;
