//! Schnorr-style zero-knowledge proofs of discrete log knowledge, with
//! Fiat-Shamir challenges bound to a protocol context tag and the
//! prover's identity (to prevent proof replay across parties/rounds).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{ECPoint, ECScalar, Rng};

fn generate_challenge<P: ECPoint>(
	context: &'static [u8],
	party_id: &str,
	points: &[&P],
) -> P::Scalar {
	let mut hasher = Sha256::new();

	hasher.update(context);
	hasher.update((party_id.len() as u64).to_be_bytes());
	hasher.update(party_id.as_bytes());

	for point in points {
		hasher.update(point.as_bytes());
	}

	let x: [u8; 32] = hasher.finalize().as_slice().try_into().expect("Invalid hash size");

	P::Scalar::from_bytes_mod_order(&x)
}

/// Proof of knowledge of `w` such that `public = w * G`
/// (in the form of a Schnorr signature)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchnorrProof<P: ECPoint> {
	#[serde(bound = "")]
	r: P,
	z: P::Scalar,
}

impl<P: ECPoint> SchnorrProof<P> {
	pub fn prove(rng: &mut Rng, context: &'static [u8], party_id: &str, secret: &P::Scalar) -> Self {
		let nonce = P::Scalar::random(rng);
		let nonce_commitment = P::from_scalar(&nonce);

		let public = P::from_scalar(secret);
		let challenge = generate_challenge(context, party_id, &[&public, &nonce_commitment]);

		let z = nonce + secret.clone() * challenge;

		SchnorrProof { r: nonce_commitment, z }
	}

	pub fn verify(&self, context: &'static [u8], party_id: &str, public: &P) -> bool {
		let challenge = generate_challenge(context, party_id, &[public, &self.r]);

		self.r + *public * challenge == P::from_scalar(&self.z)
	}
}

/// Proof of knowledge of `(s, l)` such that `public = s * base + l * G`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dlog2Proof<P: ECPoint> {
	#[serde(bound = "")]
	t: P,
	z1: P::Scalar,
	z2: P::Scalar,
}

impl<P: ECPoint> Dlog2Proof<P> {
	pub fn prove(
		rng: &mut Rng,
		context: &'static [u8],
		party_id: &str,
		base: &P,
		s: &P::Scalar,
		l: &P::Scalar,
	) -> Self {
		let a = P::Scalar::random(rng);
		let b = P::Scalar::random(rng);

		let t = *base * &a + P::from_scalar(&b);
		let public = *base * s + P::from_scalar(l);
		let challenge = generate_challenge(context, party_id, &[base, &public, &t]);

		let z1 = a + s.clone() * &challenge;
		let z2 = b + l.clone() * &challenge;

		Dlog2Proof { t, z1, z2 }
	}

	pub fn verify(&self, context: &'static [u8], party_id: &str, base: &P, public: &P) -> bool {
		let challenge = generate_challenge(context, party_id, &[base, public, &self.t]);

		*base * &self.z1 + P::from_scalar(&self.z2) == self.t + *public * challenge
	}
}
