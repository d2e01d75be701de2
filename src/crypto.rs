#[macro_use]
mod helpers;
pub mod birkhoff;
pub mod commitment;
pub mod polynomial;
pub mod proofs;
pub mod secp256k1;

use generic_array::{typenum::Unsigned, ArrayLength, GenericArray};
use num_bigint::BigUint;
use zeroize::{DefaultIsZeroes, ZeroizeOnDrop};

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// Upper bound on the size of a point and scalar in bytes, which are useful
/// for estimating size of serialized data. We have tests that (indirectly)
/// check that these are correct.
pub const MAX_POINT_SIZE: usize = 33;
pub const MAX_SCALAR_SIZE: usize = 32;

// Ideally, we want to use a concrete implementation (like ChaCha20) instead of StdRng
// to prevent it from potentially changing from under us
pub type Rng = rand::rngs::StdRng;

pub trait ECPoint:
	Clone
	+ Copy
	+ Debug
	+ Default
	+ DefaultIsZeroes
	+ 'static
	+ Serialize
	+ for<'de> Deserialize<'de>
	+ std::ops::Mul<Self::Scalar, Output = Self>
	+ for<'a> std::ops::Mul<&'a Self::Scalar, Output = Self>
	+ std::ops::Sub<Output = Self>
	+ std::ops::Add<Output = Self>
	+ std::iter::Sum
	+ PartialEq
	+ Ord
	+ Sync
	+ Send
{
	type Scalar: ECScalar;

	type CompressedPointLength: ArrayLength + Unsigned;

	fn from_scalar(scalar: &Self::Scalar) -> Self;

	fn as_bytes(&self) -> GenericArray<u8, Self::CompressedPointLength>;

	fn point_at_infinity() -> Self;

	fn is_point_at_infinity(&self) -> bool {
		self == &Self::point_at_infinity()
	}

	/// The affine x-coordinate reduced into the scalar field
	/// (`r = R.x mod N` in ECDSA). `None` for the identity.
	fn x_as_scalar(&self) -> Option<Self::Scalar>;
}

pub trait ECScalar:
	Clone
	+ Debug
	+ Sized
	+ Default
	+ Serialize
	+ for<'de> Deserialize<'de>
	+ for<'a> std::ops::Mul<&'a Self, Output = Self>
	+ for<'a> std::ops::Add<&'a Self, Output = Self>
	+ for<'a> std::ops::Sub<&'a Self, Output = Self>
	+ std::ops::Mul<Output = Self>
	+ std::ops::Add<Output = Self>
	+ std::ops::Sub<Output = Self>
	+ std::iter::Sum
	+ zeroize::Zeroize
	+ PartialEq
	+ Ord
	+ Sync
	+ Send
	+ ZeroizeOnDrop
	+ std::convert::From<u32>
{
	fn random(rng: &mut Rng) -> Self;

	fn from_bytes_mod_order(x: &[u8; 32]) -> Self;

	fn zero() -> Self;

	fn invert(&self) -> Option<Self>;

	/// The order of the scalar field (`N` for secp256k1), used by the
	/// homomorphic cipher layer which works over big integers.
	fn group_order() -> &'static BigUint;

	fn to_biguint(&self) -> BigUint;

	/// Reduce an arbitrary non-negative integer into the field.
	fn from_biguint_mod_order(x: &BigUint) -> Self;
}
