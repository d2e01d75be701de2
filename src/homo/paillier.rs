//! Paillier additively homomorphic cipher with the zero-knowledge proofs
//! the signing protocol needs: plaintext knowledge (with a range bound
//! preventing modulus-wraparound attacks) and correctness of an MtA
//! response, optionally binding the multiplier to a public curve point.

use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::One;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::primes::generate_prime;
use crate::{
	crypto::{ECPoint, ECScalar, Rng},
	Error,
};

/// Minimum modulus size accepted by the keypair generator
pub const MIN_MODULUS_BITS: usize = 2048;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicKey {
	n: BigUint,
}

#[derive(Debug)]
pub struct Keypair {
	public: PublicKey,
	/// lcm(p - 1, q - 1)
	lambda: BigUint,
	/// lambda^-1 mod n
	mu: BigUint,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ciphertext(BigUint);

impl Keypair {
	pub fn generate(rng: &mut Rng, modulus_bits: usize) -> Result<Self, Error> {
		if modulus_bits < MIN_MODULUS_BITS {
			return Err(Error::PaillierModulusTooSmall {
				min: MIN_MODULUS_BITS,
				got: modulus_bits,
			})
		}

		Ok(Self::generate_unchecked(rng, modulus_bits))
	}

	/// No minimum size check; tests use this to keep key generation cheap
	pub(crate) fn generate_unchecked(rng: &mut Rng, modulus_bits: usize) -> Self {
		let prime_bits = (modulus_bits / 2) as u64;

		let p = generate_prime(rng, prime_bits);
		let q = loop {
			let q = generate_prime(rng, prime_bits);
			if q != p {
				break q
			}
		};

		let n = &p * &q;
		let lambda = (&p - 1u32).lcm(&(&q - 1u32));
		// With g = n + 1, L(g^lambda mod n^2) = lambda mod n
		let mu = (&lambda % &n).modinv(&n).expect("lambda is coprime to n");

		Keypair { public: PublicKey { n }, lambda, mu }
	}

	pub fn public_key(&self) -> &PublicKey {
		&self.public
	}

	/// The plaintext in [0, n)
	pub fn decrypt(&self, ciphertext: &Ciphertext) -> BigUint {
		let n = &self.public.n;
		let nn = self.public.nn();

		let x = ciphertext.0.modpow(&self.lambda, &nn);
		let l = (x - 1u32) / n;

		(l * &self.mu) % n
	}
}

impl PublicKey {
	fn nn(&self) -> BigUint {
		&self.n * &self.n
	}

	pub fn modulus(&self) -> &BigUint {
		&self.n
	}

	/// Random unit mod n (coprimality failure only happens if we stumble
	/// on a factor of n, which is as hard as breaking the key)
	fn sample_unit(&self, rng: &mut Rng) -> BigUint {
		loop {
			let r = rng.gen_biguint_below(&self.n);
			if !r.is_one() && r.gcd(&self.n).is_one() {
				return r
			}
		}
	}

	pub fn encrypt_with_randomness(&self, m: &BigUint, r: &BigUint) -> Ciphertext {
		let nn = self.nn();

		// (1 + n)^m = 1 + m*n (mod n^2)
		let g_m = (BigUint::one() + m * &self.n) % &nn;

		Ciphertext((g_m * r.modpow(&self.n, &nn)) % &nn)
	}

	pub fn encrypt(&self, rng: &mut Rng, m: &BigUint) -> (Ciphertext, BigUint) {
		let r = self.sample_unit(rng);
		(self.encrypt_with_randomness(m, &r), r)
	}

	/// Dec(add(c1, c2)) = Dec(c1) + Dec(c2) mod n
	pub fn add(&self, c1: &Ciphertext, c2: &Ciphertext) -> Ciphertext {
		Ciphertext((&c1.0 * &c2.0) % self.nn())
	}

	/// Dec(scalar_mul(c, k)) = k * Dec(c) mod n
	pub fn scalar_mul(&self, c: &Ciphertext, k: &BigUint) -> Ciphertext {
		Ciphertext(c.0.modpow(k, &self.nn()))
	}

	fn is_valid_ciphertext(&self, c: &Ciphertext) -> bool {
		c.0 > BigUint::one() && c.0 < self.nn()
	}
}

fn hash_to_challenge(context: &'static [u8], party_id: &str, parts: &[&BigUint], q: &BigUint) -> BigUint {
	let mut hasher = Sha256::new();

	hasher.update(context);
	hasher.update((party_id.len() as u64).to_be_bytes());
	hasher.update(party_id.as_bytes());
	for part in parts {
		let bytes = part.to_bytes_be();
		hasher.update((bytes.len() as u64).to_be_bytes());
		hasher.update(&bytes);
	}

	BigUint::from_bytes_be(&hasher.finalize()) % q
}

const CIPHERTEXT_PROOF_CONTEXT: &[u8] = b"paillier-ciphertext-proof";
const MTA_PROOF_CONTEXT: &[u8] = b"paillier-mta-proof";

/// Sigma-protocol proof of knowledge of the plaintext of a ciphertext,
/// sound for plaintexts below q^3 (which is all the protocol needs: it
/// rules out plaintexts engineered to wrap mod n during MtA).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CiphertextProof {
	t: BigUint,
	z: BigUint,
	w: BigUint,
}

impl PublicKey {
	pub fn prove_ciphertext(
		&self,
		rng: &mut Rng,
		party_id: &str,
		m: &BigUint,
		r: &BigUint,
		c: &Ciphertext,
		q: &BigUint,
	) -> CiphertextProof {
		let a = rng.gen_biguint_below(&q.pow(3));
		let s = self.sample_unit(rng);
		let t = self.encrypt_with_randomness(&a, &s);

		let e = hash_to_challenge(CIPHERTEXT_PROOF_CONTEXT, party_id, &[&self.n, &c.0, &t.0], q);

		let z = a + &e * m;
		let w = (s * r.modpow(&e, &self.nn())) % &self.n;

		CiphertextProof { t: t.0, z, w }
	}

	pub fn verify_ciphertext(
		&self,
		party_id: &str,
		c: &Ciphertext,
		proof: &CiphertextProof,
		q: &BigUint,
	) -> bool {
		if !self.is_valid_ciphertext(c) {
			return false
		}

		// Range-bounded soundness: an accepted z bounds the plaintext
		// far below n
		if proof.z >= q.pow(3) + q.pow(2) {
			return false
		}

		let e = hash_to_challenge(CIPHERTEXT_PROOF_CONTEXT, party_id, &[&self.n, &c.0, &proof.t], q);

		let lhs = self.encrypt_with_randomness(&proof.z, &proof.w);
		let rhs = self.add(&Ciphertext(proof.t.clone()), &self.scalar_mul(c, &e));

		lhs == rhs
	}
}

/// Proof that an MtA response was computed as `c_b = c_a^x * Enc(beta)`
/// for some `x < q^3` (and, when `binding` is used, that `x` is the
/// discrete log of a known public point).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MtaProof<P: ECPoint> {
	t_c: BigUint,
	#[serde(bound = "")]
	t_g: Option<P>,
	z: BigUint,
	w_b: BigUint,
	w_s: BigUint,
}

/// How much masking noise the MtA responder adds on top of `x * k`.
/// The honest product is below q^2, so q^3 hides it statistically while
/// keeping the encrypted total below any supported modulus.
fn beta_bound(q: &BigUint) -> BigUint {
	q.pow(3)
}

impl PublicKey {
	/// The responder side of MtA: given `c_a = Enc(k)` under *this* key
	/// (the initiator's), produce `c_b = Enc(k * x + beta)` and our
	/// additive share `-beta mod q`. Returns `(c_b, beta, proof)`.
	pub fn mta_response<P: ECPoint>(
		&self,
		rng: &mut Rng,
		party_id: &str,
		c_a: &Ciphertext,
		x: &BigUint,
		bind_to_point: bool,
		q: &BigUint,
	) -> (Ciphertext, BigUint, MtaProof<P>) {
		let beta = rng.gen_biguint_below(&beta_bound(q));
		let (enc_beta, r) = self.encrypt(rng, &beta);
		let c_b = self.add(&self.scalar_mul(c_a, x), &enc_beta);

		let alpha = rng.gen_biguint_below(&q.pow(3));
		let beta_mask = rng.gen_biguint_below(&q.pow(5));
		let s = self.sample_unit(rng);

		let t_c = self.add(
			&self.scalar_mul(c_a, &alpha),
			&self.encrypt_with_randomness(&beta_mask, &s),
		);
		let t_g = bind_to_point
			.then(|| P::from_scalar(&<P::Scalar as ECScalar>::from_biguint_mod_order(&alpha)));

		let e = mta_challenge::<P>(self, party_id, c_a, &c_b, &t_c, t_g.as_ref(), x, bind_to_point, q);

		let z = alpha + &e * x;
		let w_b = beta_mask + &e * &beta;
		let w_s = (s * r.modpow(&e, &self.nn())) % &self.n;

		(c_b, beta, MtaProof { t_c: t_c.0, t_g, z, w_b, w_s })
	}

	pub fn verify_mta_response<P: ECPoint>(
		&self,
		party_id: &str,
		c_a: &Ciphertext,
		c_b: &Ciphertext,
		proof: &MtaProof<P>,
		binding: Option<&P>,
		q: &BigUint,
	) -> bool {
		if !self.is_valid_ciphertext(c_a) || !self.is_valid_ciphertext(c_b) {
			return false
		}

		if proof.z >= q.pow(3) + q.pow(2) {
			return false
		}

		let e = match (binding, &proof.t_g) {
			(Some(public), Some(t_g)) => {
				let e = verify_challenge::<P>(self, party_id, c_a, c_b, &proof.t_c, Some(t_g), Some(public), q);

				// z * G == t_g + e * X binds the multiplier to `public`
				let e_scalar = <P::Scalar as ECScalar>::from_biguint_mod_order(&e);
				let z_scalar = <P::Scalar as ECScalar>::from_biguint_mod_order(&proof.z);
				if P::from_scalar(&z_scalar) != *t_g + *public * e_scalar {
					return false
				}
				e
			},
			(None, None) =>
				verify_challenge::<P>(self, party_id, c_a, c_b, &proof.t_c, None, None, q),
			_ => return false,
		};

		let lhs = self.add(
			&self.scalar_mul(c_a, &proof.z),
			&self.encrypt_with_randomness(&proof.w_b, &proof.w_s),
		);
		let rhs = self.add(&Ciphertext(proof.t_c.clone()), &self.scalar_mul(c_b, &e));

		lhs == rhs
	}
}

#[allow(clippy::too_many_arguments)]
fn mta_challenge<P: ECPoint>(
	pk: &PublicKey,
	party_id: &str,
	c_a: &Ciphertext,
	c_b: &Ciphertext,
	t_c: &Ciphertext,
	t_g: Option<&P>,
	x: &BigUint,
	bind: bool,
	q: &BigUint,
) -> BigUint {
	let public = bind.then(|| P::from_scalar(&<P::Scalar as ECScalar>::from_biguint_mod_order(x)));
	verify_challenge::<P>(pk, party_id, c_a, c_b, &t_c.0, t_g, public.as_ref(), q)
}

#[allow(clippy::too_many_arguments)]
fn verify_challenge<P: ECPoint>(
	pk: &PublicKey,
	party_id: &str,
	c_a: &Ciphertext,
	c_b: &Ciphertext,
	t_c: &BigUint,
	t_g: Option<&P>,
	public: Option<&P>,
	q: &BigUint,
) -> BigUint {
	let mut point_bytes = Vec::new();
	if let Some(t_g) = t_g {
		point_bytes.extend_from_slice(t_g.as_bytes().as_slice());
	}
	if let Some(public) = public {
		point_bytes.extend_from_slice(public.as_bytes().as_slice());
	}
	let points = BigUint::from_bytes_be(&[&[1u8][..], &point_bytes[..]].concat());

	hash_to_challenge(MTA_PROOF_CONTEXT, party_id, &[&pk.n, &c_a.0, &c_b.0, t_c, &points], q)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::crypto::secp256k1::{Point, Scalar};
	use rand::SeedableRng;

	// Full-size keys are slow to generate in debug builds
	const TEST_MODULUS_BITS: usize = 1024;

	fn test_keypair(seed: u8) -> (Keypair, Rng) {
		let mut rng = Rng::from_seed([seed; 32]);
		let keypair = Keypair::generate_unchecked(&mut rng, TEST_MODULUS_BITS);
		(keypair, rng)
	}

	#[test]
	fn rejects_undersized_modulus() {
		let mut rng = Rng::from_seed([0; 32]);
		assert_eq!(
			Keypair::generate(&mut rng, 1024).err(),
			Some(Error::PaillierModulusTooSmall { min: MIN_MODULUS_BITS, got: 1024 })
		);
	}

	#[test]
	fn encrypt_decrypt_and_homomorphisms() {
		let (keypair, mut rng) = test_keypair(10);
		let pk = keypair.public_key();

		let m1 = BigUint::from(123456u32);
		let m2 = BigUint::from(999u32);

		let (c1, _) = pk.encrypt(&mut rng, &m1);
		let (c2, _) = pk.encrypt(&mut rng, &m2);

		assert_eq!(keypair.decrypt(&c1), m1);

		assert_eq!(keypair.decrypt(&pk.add(&c1, &c2)), &m1 + &m2);

		let k = BigUint::from(77u32);
		assert_eq!(keypair.decrypt(&pk.scalar_mul(&c1, &k)), &m1 * &k);
	}

	#[test]
	fn ciphertext_proof_round_trip() {
		let (keypair, mut rng) = test_keypair(11);
		let pk = keypair.public_key();
		let q = Scalar::group_order();

		let m = rng.gen_biguint_below(q);
		let (c, r) = pk.encrypt(&mut rng, &m);

		let proof = pk.prove_ciphertext(&mut rng, "id-0", &m, &r, &c, q);
		assert!(pk.verify_ciphertext("id-0", &c, &proof, q));

		// Wrong identity or wrong ciphertext must not verify
		assert!(!pk.verify_ciphertext("id-1", &c, &proof, q));
		let (other, _) = pk.encrypt(&mut rng, &m);
		assert!(!pk.verify_ciphertext("id-0", &other, &proof, q));
	}

	#[test]
	fn mta_round_trip_produces_additive_shares() {
		let (keypair, mut rng) = test_keypair(12);
		let pk = keypair.public_key();
		let q = Scalar::group_order();

		let k = rng.gen_biguint_below(q);
		let x = rng.gen_biguint_below(q);

		let (c_a, _) = pk.encrypt(&mut rng, &k);

		let (c_b, beta, proof) =
			pk.mta_response::<Point>(&mut rng, "id-1", &c_a, &x, false, q);
		assert!(pk.verify_mta_response::<Point>("id-1", &c_a, &c_b, &proof, None, q));

		let alpha = keypair.decrypt(&c_b) % q;

		// alpha + (-beta) = k * x (mod q)
		let lhs = (alpha + (q - (&beta % q))) % q;
		assert_eq!(lhs, (&k * &x) % q);
	}

	#[test]
	fn mta_proof_binds_multiplier_to_public_point() {
		let (keypair, mut rng) = test_keypair(13);
		let pk = keypair.public_key();
		let q = Scalar::group_order();

		let k = rng.gen_biguint_below(q);
		let x = rng.gen_biguint_below(q);
		let x_pub = Point::from_scalar(&Scalar::from_biguint_mod_order(&x));

		let (c_a, _) = pk.encrypt(&mut rng, &k);

		let (c_b, _beta, proof) = pk.mta_response::<Point>(&mut rng, "id-1", &c_a, &x, true, q);
		assert!(pk.verify_mta_response("id-1", &c_a, &c_b, &proof, Some(&x_pub), q));

		// A different public point must be rejected
		let other = Point::from_scalar(&Scalar::from(5));
		assert!(!pk.verify_mta_response("id-1", &c_a, &c_b, &proof, Some(&other), q));

		// A proof without the binding leg is rejected when binding is expected
		let (c_b2, _beta2, unbound) =
			pk.mta_response::<Point>(&mut rng, "id-1", &c_a, &x, false, q);
		assert!(!pk.verify_mta_response("id-1", &c_a, &c_b2, &unbound, Some(&x_pub), q));
	}
}
