//! Pauli products over named qubits.
//!
//! [`PauliMap`] is the operator value that flows are declared over. It maps
//! qubits to a non-identity [`Pauli`], and carries a [`Sign`] and an optional
//! disambiguating key. Equality and hashing are structural.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use derive_more::{Display, Error, From, Into};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use strum::{EnumIter, EnumString};

/// A qubit identifier.
///
/// Inside a chunk this is the name used by the chunk's instructions and
/// flows. In a compiled circuit it is the global qubit index.
#[repr(transparent)]
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct Qubit(pub u32);

impl Qubit {
    /// The identifier as a `usize` index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Serialize,
    Deserialize,
    EnumIter,
    strum::Display,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumString,
)]
#[allow(missing_docs)]
/// Simple enum representation of Pauli matrices.
pub enum Pauli {
    I,
    X,
    Y,
    Z,
}

impl Pauli {
    /// Check if this pauli commutes with another.
    pub fn commutes_with(&self, other: Self) -> bool {
        *self == Pauli::I || other == Pauli::I || *self == other
    }

    /// The `(x, z)` bits of the symplectic representation.
    #[inline]
    pub fn xz_bits(self) -> (bool, bool) {
        match self {
            Pauli::I => (false, false),
            Pauli::X => (true, false),
            Pauli::Y => (true, true),
            Pauli::Z => (false, true),
        }
    }

    /// The inverse of [`Pauli::xz_bits`].
    #[inline]
    pub fn from_xz_bits(x: bool, z: bool) -> Self {
        match (x, z) {
            (false, false) => Pauli::I,
            (true, false) => Pauli::X,
            (true, true) => Pauli::Y,
            (false, true) => Pauli::Z,
        }
    }

    /// Multiply two single-qubit paulis.
    ///
    /// Returns the product and the phase as a power of `i`.
    pub fn mul_with_phase(self, rhs: Self) -> (Self, u8) {
        use Pauli::*;
        match (self, rhs) {
            (I, p) | (p, I) => (p, 0),
            (a, b) if a == b => (I, 0),
            (X, Y) => (Z, 1),
            (Y, Z) => (X, 1),
            (Z, X) => (Y, 1),
            (Y, X) => (Z, 3),
            (Z, Y) => (X, 3),
            (X, Z) => (Y, 3),
            _ => unreachable!(),
        }
    }
}

/// The sign of a [`PauliMap`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Sign {
    /// `+1`.
    #[default]
    Plus,
    /// `-1`.
    Minus,
}

impl Sign {
    /// The opposite sign.
    #[inline]
    pub fn negated(self) -> Self {
        match self {
            Sign::Plus => Sign::Minus,
            Sign::Minus => Sign::Plus,
        }
    }

    /// The product of two signs.
    #[inline]
    pub fn times(self, other: Self) -> Self {
        if self == other {
            Sign::Plus
        } else {
            Sign::Minus
        }
    }
}

/// A signed product of Pauli operators on named qubits.
///
/// Identity factors are never stored, so the empty map is the identity
/// operator.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PauliMap {
    paulis: BTreeMap<Qubit, Pauli>,
    #[serde(default)]
    sign: Sign,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<SmolStr>,
}

impl PauliMap {
    /// Create a positive, unkeyed pauli product.
    ///
    /// Identity entries are dropped. Later entries for the same qubit
    /// overwrite earlier ones.
    pub fn new(paulis: impl IntoIterator<Item = (impl Into<Qubit>, Pauli)>) -> Self {
        let paulis = paulis
            .into_iter()
            .map(|(q, p)| (q.into(), p))
            .filter(|&(_, p)| p != Pauli::I)
            .collect();
        Self {
            paulis,
            sign: Sign::Plus,
            key: None,
        }
    }

    /// The identity operator.
    pub fn identity() -> Self {
        Self::default()
    }

    /// A product of the same pauli on every given qubit.
    pub fn from_basis(pauli: Pauli, qubits: impl IntoIterator<Item = impl Into<Qubit>>) -> Self {
        Self::new(qubits.into_iter().map(|q| (q.into(), pauli)))
    }

    /// Returns the map with the given sign.
    pub fn with_sign(mut self, sign: Sign) -> Self {
        self.sign = sign;
        self
    }

    /// Returns the map with the given disambiguating key.
    pub fn with_key(mut self, key: impl Into<SmolStr>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Returns the map with its sign flipped.
    pub fn negated(mut self) -> Self {
        self.sign = self.sign.negated();
        self
    }

    /// The sign of the product.
    #[inline]
    pub fn sign(&self) -> Sign {
        self.sign
    }

    /// The disambiguating key, if any.
    #[inline]
    pub fn key(&self) -> Option<&SmolStr> {
        self.key.as_ref()
    }

    /// The pauli acting on `qubit`.
    pub fn get(&self, qubit: impl Into<Qubit>) -> Pauli {
        self.paulis
            .get(&qubit.into())
            .copied()
            .unwrap_or(Pauli::I)
    }

    /// The qubits with a non-identity factor, in increasing order.
    pub fn qubits(&self) -> impl Iterator<Item = Qubit> + '_ {
        self.paulis.keys().copied()
    }

    /// The non-identity factors, in increasing qubit order.
    pub fn iter(&self) -> impl Iterator<Item = (Qubit, Pauli)> + '_ {
        self.paulis.iter().map(|(&q, &p)| (q, p))
    }

    /// The number of non-identity factors.
    #[inline]
    pub fn weight(&self) -> usize {
        self.paulis.len()
    }

    /// Whether the operator is the (signed) identity.
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.paulis.is_empty()
    }

    /// Whether the two products commute.
    pub fn commutes_with(&self, other: &PauliMap) -> bool {
        let anticommuting = self
            .iter()
            .filter(|&(q, p)| !p.commutes_with(other.get(q)))
            .count();
        anticommuting % 2 == 0
    }

    /// The same operator with the qubits renamed.
    pub fn relabelled(&self, mut f: impl FnMut(Qubit) -> Qubit) -> Self {
        Self {
            paulis: self.iter().map(|(q, p)| (f(q), p)).collect(),
            sign: self.sign,
            key: self.key.clone(),
        }
    }

    /// The same operator, ignoring sign and key.
    pub fn unsigned(&self) -> Self {
        Self {
            paulis: self.paulis.clone(),
            sign: Sign::Plus,
            key: None,
        }
    }

    /// Multiply two products, tracking the sign.
    ///
    /// # Errors
    ///
    /// Fails if the keys differ, or if the operators anticommute (the product
    /// would carry an imaginary phase).
    pub fn try_mul(&self, rhs: &PauliMap) -> Result<PauliMap, PauliMapError> {
        if self.key != rhs.key {
            return Err(PauliMapError::KeyMismatch {
                left: self.key.clone(),
                right: rhs.key.clone(),
            });
        }
        let mut phase = 0u8;
        let mut paulis = self.paulis.clone();
        for (q, p) in rhs.iter() {
            let lhs = paulis.remove(&q).unwrap_or(Pauli::I);
            let (prod, ph) = lhs.mul_with_phase(p);
            phase = (phase + ph) % 4;
            if prod != Pauli::I {
                paulis.insert(q, prod);
            }
        }
        let sign = match phase {
            0 => Sign::Plus,
            2 => Sign::Minus,
            _ => {
                return Err(PauliMapError::ImaginaryPhase {
                    left: self.clone(),
                    right: rhs.clone(),
                })
            }
        };
        Ok(PauliMap {
            paulis,
            sign: sign.times(self.sign).times(rhs.sign),
            key: self.key.clone(),
        })
    }

    /// The product of a sequence of operators, starting from the identity
    /// with the given key.
    pub fn try_product<'a>(
        key: Option<SmolStr>,
        factors: impl IntoIterator<Item = &'a PauliMap>,
    ) -> Result<PauliMap, PauliMapError> {
        let start = PauliMap {
            key,
            ..Default::default()
        };
        factors
            .into_iter()
            .try_fold(start, |acc, factor| acc.try_mul(factor))
    }

    /// The unsigned product, as used by parity arithmetic.
    ///
    /// Ignores signs, keys and phases.
    pub fn xor(&self, rhs: &PauliMap) -> PauliMap {
        let mut paulis = self.paulis.clone();
        for (q, p) in rhs.iter() {
            let lhs = paulis.remove(&q).unwrap_or(Pauli::I);
            let (prod, _) = lhs.mul_with_phase(p);
            if prod != Pauli::I {
                paulis.insert(q, prod);
            }
        }
        PauliMap {
            paulis,
            sign: Sign::Plus,
            key: None,
        }
    }
}

impl fmt::Display for PauliMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sign == Sign::Minus {
            write!(f, "-")?;
        }
        if self.is_identity() {
            write!(f, "I")?;
        } else {
            let terms = self.iter().map(|(q, p)| format!("{p}{q}")).join("*");
            write!(f, "{terms}")?;
        }
        if let Some(key) = &self.key {
            write!(f, ":{key}")?;
        }
        Ok(())
    }
}

impl FromStr for PauliMap {
    type Err = PauliMapError;

    /// Parse products like `X2*X3`, `-Z0*Z1`, `I` or `X0:key`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PauliMapError::InvalidString {
            string: s.to_string(),
        };
        let (body, key) = match s.split_once(':') {
            Some((body, key)) if !key.is_empty() => (body, Some(SmolStr::new(key))),
            Some(_) => return Err(invalid()),
            None => (s, None),
        };
        let body = body.trim();
        let (sign, body) = match body.strip_prefix('-') {
            Some(rest) => (Sign::Minus, rest),
            None => (Sign::Plus, body.strip_prefix('+').unwrap_or(body)),
        };
        let mut paulis = BTreeMap::new();
        if body != "I" {
            for term in body.split('*') {
                let term = term.trim();
                let mut chars = term.chars();
                let pauli: Pauli = chars
                    .next()
                    .and_then(|c| c.to_string().parse().ok())
                    .ok_or_else(invalid)?;
                let qubit: u32 = chars.as_str().parse().map_err(|_| invalid())?;
                if pauli == Pauli::I || paulis.insert(Qubit(qubit), pauli).is_some() {
                    return Err(invalid());
                }
            }
        }
        Ok(PauliMap { paulis, sign, key })
    }
}

/// Errors in pauli product arithmetic.
#[derive(Debug, Display, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PauliMapError {
    /// Products are only defined between operators with the same key.
    #[display("cannot multiply pauli products with keys {left:?} and {right:?}")]
    KeyMismatch {
        /// The key of the left operand.
        left: Option<SmolStr>,
        /// The key of the right operand.
        right: Option<SmolStr>,
    },
    /// The operands anticommute.
    #[display("the product of {left} and {right} has an imaginary phase")]
    ImaginaryPhase {
        /// The left operand.
        left: PauliMap,
        /// The right operand.
        right: PauliMap,
    },
    /// The string does not describe a pauli product.
    #[display("invalid pauli product string '{string}'")]
    InvalidString {
        /// The offending string.
        string: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use cool_asserts::assert_matches;
    use rstest::rstest;

    fn pm(s: &str) -> PauliMap {
        s.parse().unwrap()
    }

    #[rstest]
    #[case::cancel("X0*X1", "X0*X1", "I")]
    #[case::disjoint("X0", "Z1", "X0*Z1")]
    #[case::third_basis("X0*X1", "Z0*Z1", "-Y0*Y1")]
    #[case::signed("-X0", "X0*Z3", "-Z3")]
    fn product(#[case] a: &str, #[case] b: &str, #[case] expected: &str) {
        assert_eq!(pm(a).try_mul(&pm(b)).unwrap(), pm(expected));
    }

    #[test]
    fn product_errors() {
        assert_matches!(
            pm("X0").try_mul(&pm("Z0")),
            Err(PauliMapError::ImaginaryPhase { .. })
        );
        assert_matches!(
            pm("X0:a").try_mul(&pm("X1:b")),
            Err(PauliMapError::KeyMismatch { .. })
        );
        assert_eq!(pm("X0:a").try_mul(&pm("X1:a")).unwrap(), pm("X0*X1:a"));
    }

    #[test]
    fn identity_annihilates() {
        let p = pm("-X2*Y5");
        assert_eq!(PauliMap::identity().try_mul(&p).unwrap(), p);
        assert!(p.try_mul(&p).unwrap().is_identity());
    }

    #[rstest]
    #[case("X2*X3")]
    #[case("-Z0*Y1")]
    #[case("I")]
    #[case("X0:obs")]
    fn display_parses_back(#[case] s: &str) {
        assert_eq!(pm(s).to_string(), s);
    }

    #[rstest]
    #[case("")]
    #[case("X0*X0")]
    #[case("Q1")]
    #[case("X")]
    #[case("X1:")]
    fn invalid_strings(#[case] s: &str) {
        assert_matches!(s.parse::<PauliMap>(), Err(PauliMapError::InvalidString { .. }));
    }

    #[test]
    fn structural_equality() {
        assert_ne!(pm("X0"), pm("-X0"));
        assert_ne!(pm("X0"), pm("X0:k"));
        assert_eq!(PauliMap::from_basis(Pauli::X, [2u32, 3]), pm("X2*X3"));
        assert!(pm("X0*X1").commutes_with(&pm("Z0*Z1")));
        assert!(!pm("X0").commutes_with(&pm("Z0*Z1")));
    }
}
