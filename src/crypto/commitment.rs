//! Commitments used by both protocols: a simple hash commit/reveal over
//! any serializable value, and Feldman commitments to the coefficients of
//! a sharing polynomial, which let every recipient verify its secret
//! share without learning the polynomial.

use rand::Rng as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{
	birkhoff::BkParameter,
	polynomial::{evaluate_polynomial_derivative, Polynomial},
	ECPoint, Rng,
};

pub type CommitmentSalt = [u8; 32];

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashCommitment(pub [u8; 32]);

pub fn generate_commitment_salt(rng: &mut Rng) -> CommitmentSalt {
	rng.gen()
}

/// `SHA-256(bincode(value) || salt)`. The salt keeps low-entropy values
/// (e.g. curve points that an adversary could grind) hiding.
pub fn generate_hash_commitment<T: Serialize>(
	value: &T,
	salt: &CommitmentSalt,
) -> HashCommitment {
	let mut hasher = Sha256::new();
	hasher.update(bincode::serialize(value).expect("serialization can't fail"));
	hasher.update(salt);

	let hash: [u8; 32] = hasher.finalize().as_slice().try_into().expect("Invalid hash size");
	HashCommitment(hash)
}

pub fn is_valid_hash_commitment<T: Serialize>(
	value: &T,
	salt: &CommitmentSalt,
	commitment: &HashCommitment,
) -> bool {
	&generate_hash_commitment(value, salt) == commitment
}

/// Commitments to the sharing polynomial coefficients
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoefficientCommitments<P: ECPoint>(#[serde(bound = "")] pub Vec<P>);

pub fn commit_to_coefficients<P: ECPoint>(
	polynomial: &Polynomial<P::Scalar>,
) -> CoefficientCommitments<P> {
	CoefficientCommitments(polynomial.coefficients().iter().map(P::from_scalar).collect())
}

/// Check a secret share against the sender's coefficient commitments by
/// evaluating the commitment polynomial "in the exponent" at the
/// receiver's evaluation point (adjusted for its derivative rank):
/// `share * G == sum_k k!/(k-rank)! * x^(k-rank) * (a_k * G)`
pub fn verify_share<P: ECPoint>(
	share: &P::Scalar,
	commitments: &CoefficientCommitments<P>,
	bk: &BkParameter<P::Scalar>,
) -> bool {
	P::from_scalar(share) == evaluate_polynomial_derivative(&commitments.0, &bk.x, bk.rank)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::crypto::{secp256k1::Point, ECScalar};
	use rand::SeedableRng;

	#[test]
	fn hash_commitment_round_trip() {
		let mut rng = Rng::from_seed([3; 32]);

		let point = Point::random(&mut rng);
		let salt = generate_commitment_salt(&mut rng);
		let commitment = generate_hash_commitment(&point, &salt);

		assert!(is_valid_hash_commitment(&point, &salt, &commitment));

		// Tampering with the salt or the value must invalidate the opening
		let mut bad_salt = salt;
		bad_salt[0] ^= 1;
		assert!(!is_valid_hash_commitment(&point, &bad_salt, &commitment));
		assert!(!is_valid_hash_commitment(&Point::random(&mut rng), &salt, &commitment));
	}

	#[test]
	fn shares_verify_against_coefficient_commitments() {
		type Scalar = <Point as ECPoint>::Scalar;

		let mut rng = Rng::from_seed([4; 32]);

		let poly = Polynomial::<Scalar>::random(&mut rng, 2);
		let commitments = commit_to_coefficients::<Point>(&poly);

		for bk in [
			BkParameter::new(Scalar::from(5), 0),
			BkParameter::new(Scalar::from(12), 1),
			BkParameter::new(Scalar::from(7), 2),
		] {
			let share = poly.evaluate_derivative(&bk.x, bk.rank);
			assert!(verify_share(&share, &commitments, &bk));

			let tampered = share + Scalar::from(1);
			assert!(!verify_share(&tampered, &commitments, &bk));
		}
	}
}
