//! Top-lifted non-negative polynomials, used by `PureMemory::range` (spec
//! §4.2) to bound loop trip counts from the product of per-location interval
//! ranges. A full symbolic-polynomial library is out of scope (spec §1); this
//! crate keeps just enough structure — a monoid under multiplication with an
//! absorbing top — for that one query to be meaningful.

use num_bigint::BigUint;
use num_traits::One;

/// A non-negative polynomial, top-lifted: `Top` stands for "unbounded",
/// produced as soon as any factor going into the product is itself
/// unbounded (an interval with no finite range).
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum NonNegativePolynomial {
    Top,
    Val(BigUint),
}

impl NonNegativePolynomial {
    pub fn one() -> Self {
        NonNegativePolynomial::Val(BigUint::one())
    }

    pub fn top() -> Self {
        NonNegativePolynomial::Top
    }

    /// Lift a finite interval range (`None` meaning unbounded) into the
    /// polynomial lattice.
    pub fn to_top_lifted_polynomial(range: Option<BigUint>) -> Self {
        match range {
            Some(n) => NonNegativePolynomial::Val(n),
            None => NonNegativePolynomial::Top,
        }
    }

    pub fn mult(&self, other: &Self) -> Self {
        match (self, other) {
            (NonNegativePolynomial::Val(a), NonNegativePolynomial::Val(b)) => {
                NonNegativePolynomial::Val(a * b)
            }
            _ => NonNegativePolynomial::Top,
        }
    }

    pub fn is_top(&self) -> bool {
        matches!(self, NonNegativePolynomial::Top)
    }
}

impl std::fmt::Display for NonNegativePolynomial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonNegativePolynomial::Top => write!(f, "top"),
            NonNegativePolynomial::Val(n) => write!(f, "{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_is_multiplicative_identity() {
        let v = NonNegativePolynomial::Val(BigUint::from(7u32));
        assert_eq!(v.mult(&NonNegativePolynomial::one()), v);
    }

    #[test]
    fn top_absorbs_multiplication() {
        let v = NonNegativePolynomial::Val(BigUint::from(7u32));
        assert_eq!(v.mult(&NonNegativePolynomial::top()), NonNegativePolynomial::Top);
    }
}
