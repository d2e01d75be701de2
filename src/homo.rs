//! Additively homomorphic cipher abstraction used by the signer for MtA
//! share conversion. Two implementations sit behind a sum type (static
//! dispatch): Paillier and Castagnos-Laguillaumie. Every party encrypts
//! under its own key, so parties running different schemes interoperate.

pub mod cl;
pub mod paillier;
mod primes;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::{
	crypto::{ECPoint, ECScalar, Rng},
	Error,
};

#[derive(Debug)]
pub enum HomoKeypair {
	Paillier(paillier::Keypair),
	Cl(cl::Keypair),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum HomoPublicKey {
	Paillier(paillier::PublicKey),
	Cl(cl::PublicKey),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum HomoCiphertext {
	Paillier(paillier::Ciphertext),
	Cl(cl::Ciphertext),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum CiphertextProof {
	Paillier(paillier::CiphertextProof),
	Cl(cl::CiphertextProof),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MtaProof<P: ECPoint> {
	Paillier(#[serde(bound = "")] paillier::MtaProof<P>),
	Cl(#[serde(bound = "")] cl::MtaProof<P>),
}

impl HomoKeypair {
	/// Paillier keypair with a modulus of at least 2048 bits
	pub fn paillier(rng: &mut Rng, modulus_bits: usize) -> Result<Self, Error> {
		Ok(HomoKeypair::Paillier(paillier::Keypair::generate(rng, modulus_bits)?))
	}

	/// CL keypair over the scalar field of the given curve, with the
	/// standard (1348, 40) discriminant parameters
	pub fn cl<S: ECScalar>(rng: &mut Rng) -> Self {
		Self::cl_with_parameters::<S>(
			rng,
			cl::DEFAULT_SAFE_PARAMETER,
			cl::DEFAULT_DISTRIBUTION_DISTANCE,
		)
	}

	pub fn cl_with_parameters<S: ECScalar>(
		rng: &mut Rng,
		safe_parameter: usize,
		distribution_distance: usize,
	) -> Self {
		HomoKeypair::Cl(cl::Keypair::generate(
			rng,
			S::group_order().clone(),
			safe_parameter,
			distribution_distance,
		))
	}

	pub fn public_key(&self) -> HomoPublicKey {
		match self {
			HomoKeypair::Paillier(keypair) => HomoPublicKey::Paillier(keypair.public_key().clone()),
			HomoKeypair::Cl(keypair) => HomoPublicKey::Cl(keypair.public_key().clone()),
		}
	}

	/// Decrypt an MtA response addressed to us. The result is reduced
	/// modulo the group order by the caller.
	pub fn decrypt(&self, ciphertext: &HomoCiphertext) -> Result<BigUint, Error> {
		match (self, ciphertext) {
			(HomoKeypair::Paillier(keypair), HomoCiphertext::Paillier(c)) =>
				Ok(keypair.decrypt(c)),
			(HomoKeypair::Cl(keypair), HomoCiphertext::Cl(c)) => keypair
				.decrypt(c)
				.ok_or_else(|| Error::HomoCipher("ciphertext outside plaintext subgroup".into())),
			_ => Err(Error::HomoSchemeMismatch),
		}
	}
}

impl HomoPublicKey {
	/// Check that a peer-supplied key is sound for signing over a group
	/// of order `q`: a full-size Paillier modulus, or a CL group built
	/// for the right message space.
	pub fn validate(&self, q: &BigUint) -> Result<(), Error> {
		match self {
			HomoPublicKey::Paillier(pk) => {
				let bits = pk.modulus().bits() as usize;
				if bits < paillier::MIN_MODULUS_BITS {
					return Err(Error::PaillierModulusTooSmall {
						min: paillier::MIN_MODULUS_BITS,
						got: bits,
					})
				}
				Ok(())
			},
			HomoPublicKey::Cl(pk) =>
				if pk.group().q() == q {
					Ok(())
				} else {
					Err(Error::HomoCipher("CL group order mismatch".into()))
				},
		}
	}

	/// Whether this key can carry plaintexts for a signing group of
	/// order `q`. Unlike [`validate`](Self::validate) this does not
	/// police the modulus size, which is a keygen-time concern.
	pub fn is_for_group(&self, q: &BigUint) -> bool {
		match self {
			HomoPublicKey::Paillier(_) => true,
			HomoPublicKey::Cl(pk) => pk.group().q() == q,
		}
	}

	/// Encrypt a plaintext below `q` together with a proof of plaintext
	/// knowledge (range-bounded)
	pub fn encrypt_with_proof(
		&self,
		rng: &mut Rng,
		party_id: &str,
		m: &BigUint,
		q: &BigUint,
	) -> (HomoCiphertext, CiphertextProof) {
		match self {
			HomoPublicKey::Paillier(pk) => {
				let (c, r) = pk.encrypt(rng, m);
				let proof = pk.prove_ciphertext(rng, party_id, m, &r, &c, q);
				(HomoCiphertext::Paillier(c), CiphertextProof::Paillier(proof))
			},
			HomoPublicKey::Cl(pk) => {
				let (c, rho) = pk.encrypt(rng, m);
				let proof = pk.prove_ciphertext(rng, party_id, m, &rho, &c);
				(HomoCiphertext::Cl(c), CiphertextProof::Cl(proof))
			},
		}
	}

	pub fn verify_ciphertext_proof(
		&self,
		party_id: &str,
		ciphertext: &HomoCiphertext,
		proof: &CiphertextProof,
		q: &BigUint,
	) -> Result<(), Error> {
		let valid = match (self, ciphertext, proof) {
			(
				HomoPublicKey::Paillier(pk),
				HomoCiphertext::Paillier(c),
				CiphertextProof::Paillier(proof),
			) => pk.verify_ciphertext(party_id, c, proof, q),
			(HomoPublicKey::Cl(pk), HomoCiphertext::Cl(c), CiphertextProof::Cl(proof)) =>
				pk.verify_ciphertext(party_id, c, proof),
			_ => return Err(Error::HomoSchemeMismatch),
		};

		if valid {
			Ok(())
		} else {
			Err(Error::HomoCipher("invalid ciphertext proof".into()))
		}
	}

	/// The responder side of an MtA conversion: turn `Enc(k)` (under this
	/// key, which belongs to the *initiator*) into `Enc(k * x + beta)`,
	/// returning the ciphertext, our additive mask `beta` and a proof.
	/// With `bind_to_point` the proof additionally shows that `x` is the
	/// discrete log of a point the verifier already knows.
	pub fn mta_response<P: ECPoint>(
		&self,
		rng: &mut Rng,
		party_id: &str,
		c_a: &HomoCiphertext,
		x: &P::Scalar,
		bind_to_point: bool,
	) -> Result<(HomoCiphertext, P::Scalar, MtaProof<P>), Error> {
		let q = P::Scalar::group_order();
		let x_int = x.to_biguint();

		match (self, c_a) {
			(HomoPublicKey::Paillier(pk), HomoCiphertext::Paillier(c_a)) => {
				let (c_b, beta, proof) =
					pk.mta_response::<P>(rng, party_id, c_a, &x_int, bind_to_point, q);
				Ok((
					HomoCiphertext::Paillier(c_b),
					P::Scalar::from_biguint_mod_order(&beta),
					MtaProof::Paillier(proof),
				))
			},
			(HomoPublicKey::Cl(pk), HomoCiphertext::Cl(c_a)) => {
				let (c_b, beta, proof) =
					pk.mta_response::<P>(rng, party_id, c_a, &x_int, bind_to_point);
				Ok((
					HomoCiphertext::Cl(c_b),
					P::Scalar::from_biguint_mod_order(&beta),
					MtaProof::Cl(proof),
				))
			},
			_ => Err(Error::HomoSchemeMismatch),
		}
	}

	pub fn verify_mta_response<P: ECPoint>(
		&self,
		party_id: &str,
		c_a: &HomoCiphertext,
		c_b: &HomoCiphertext,
		proof: &MtaProof<P>,
		binding: Option<&P>,
	) -> Result<(), Error> {
		let q = P::Scalar::group_order();

		let valid = match (self, c_a, c_b, proof) {
			(
				HomoPublicKey::Paillier(pk),
				HomoCiphertext::Paillier(c_a),
				HomoCiphertext::Paillier(c_b),
				MtaProof::Paillier(proof),
			) => pk.verify_mta_response(party_id, c_a, c_b, proof, binding, q),
			(
				HomoPublicKey::Cl(pk),
				HomoCiphertext::Cl(c_a),
				HomoCiphertext::Cl(c_b),
				MtaProof::Cl(proof),
			) => pk.verify_mta_response(party_id, c_a, c_b, proof, binding),
			_ => return Err(Error::HomoSchemeMismatch),
		};

		if valid {
			Ok(())
		} else {
			Err(Error::HomoCipher("invalid MtA proof".into()))
		}
	}
}
