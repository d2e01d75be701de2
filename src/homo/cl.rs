//! Castagnos-Laguillaumie additively homomorphic cipher over ideal class
//! groups of imaginary quadratic orders. Unlike Paillier, the message
//! space is exactly Z_q (q the curve order): the class group of
//! discriminant q^2 * delta_k contains a subgroup of order q generated by
//! `f` in which discrete logarithms are easy, so decryption needs no
//! modular reduction tricks and MtA conversions never wrap.
//!
//! Forms (a, b, c) represent positive definite binary quadratic forms
//! `ax^2 + bxy + cy^2`; the group law is Gauss composition of reduced
//! forms (Cohen, "A Course in Computational Algebraic Number Theory",
//! algorithms 5.4.2-5.4.9).

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::{Integer, Roots};
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::primes::{generate_prime_with_residue, is_probable_prime};
use crate::crypto::{ECPoint, ECScalar, Rng};

/// Discriminant size used by production keypairs (112-bit security)
pub const DEFAULT_SAFE_PARAMETER: usize = 1348;
/// Statistical distance (bits) of sampled exponents from uniform
pub const DEFAULT_DISTRIBUTION_DISTANCE: usize = 40;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BinaryQf {
	a: BigInt,
	b: BigInt,
	c: BigInt,
}

impl BinaryQf {
	fn discriminant(&self) -> BigInt {
		&self.b * &self.b - BigInt::from(4) * &self.a * &self.c
	}

	/// The principal form (1, 1, (1 - D) / 4); discriminants here are
	/// always 1 mod 4
	fn identity(discriminant: &BigInt) -> Self {
		BinaryQf {
			a: BigInt::one(),
			b: BigInt::one(),
			c: (BigInt::one() - discriminant) / 4,
		}
	}

	/// Bring b into (-a, a], recomputing c to preserve the discriminant
	fn normalized(&self) -> Self {
		let d = self.discriminant();
		let two_a = &self.a * 2;

		let mut b = self.b.mod_floor(&two_a);
		if b > self.a {
			b -= &two_a;
		}

		let c = (&b * &b - &d) / (&two_a * 2);
		BinaryQf { a: self.a.clone(), b, c }
	}

	fn reduced(&self) -> Self {
		let mut f = self.normalized();
		while f.a > f.c {
			f = BinaryQf { a: f.c.clone(), b: -&f.b, c: f.a.clone() }.normalized();
		}
		if f.a == f.c && f.b.is_negative() {
			f.b = -f.b;
		}
		f
	}

	fn inverse(&self) -> Self {
		BinaryQf { a: self.a.clone(), b: -&self.b, c: self.c.clone() }.reduced()
	}

	/// Gauss composition (Cohen, algorithm 5.4.7), followed by reduction
	fn compose(&self, other: &Self) -> Self {
		let (f1, f2) = if self.a > other.a { (other, self) } else { (self, other) };

		let s: BigInt = (&f1.b + &f2.b) / 2;
		let n = &f2.b - &s;

		let (y1, d) = if (&f2.a % &f1.a).is_zero() {
			(BigInt::zero(), f1.a.clone())
		} else {
			let e = f2.a.extended_gcd(&f1.a);
			(e.x, e.gcd)
		};

		let (x2, y2, d1) = if (&s % &d).is_zero() {
			(BigInt::zero(), -BigInt::one(), d)
		} else {
			let e = s.extended_gcd(&d);
			(e.x, -e.y, e.gcd)
		};

		let v1 = &f1.a / &d1;
		let v2 = &f2.a / &d1;
		let r = (&y1 * &y2 * &n - &x2 * &f2.c).mod_floor(&v1);

		let a3 = &v1 * &v2;
		let b3 = &f2.b + 2 * &v2 * &r;
		let c3 = (&f2.c * &d1 + &r * (&f2.b + &v2 * &r)) / &v1;

		let composed = BinaryQf { a: a3, b: b3, c: c3 }.reduced();
		debug_assert_eq!(composed.discriminant(), self.discriminant());
		composed
	}

	fn pow(&self, e: &BigUint) -> Self {
		let mut result = Self::identity(&self.discriminant());
		for i in (0..e.bits()).rev() {
			result = result.compose(&result);
			if e.bit(i) {
				result = result.compose(self);
			}
		}
		result
	}

	/// The reduced form (r, b, c) of discriminant `d` with `b^2 = d mod 4r`,
	/// for an odd prime r over which d is a quadratic residue
	fn primeform(d: &BigInt, r: &BigUint) -> Self {
		let d_mod_r = d.mod_floor(&BigInt::from(r.clone()));
		let y = sqrt_mod_prime(d_mod_r.magnitude(), r).expect("d is a residue mod r");

		// d is odd, so b must be odd; exactly one of y, r - y is
		let b = if y.is_odd() { y } else { r - &y };
		let b = BigInt::from(b);

		let a = BigInt::from(r.clone());
		let c = (&b * &b - d) / (&a * 4);

		BinaryQf { a, b, c }.reduced()
	}

	/// Lift a form of discriminant d into the non-maximal order of
	/// discriminant q^2 * d (the inverse of the map dropping the
	/// conductor), assuming gcd(a, q) = 1
	fn lift(&self, q: &BigInt, lifted_discriminant: &BigInt) -> Self {
		let two_a = &self.a * 2;
		let b = (&self.b * q).mod_floor(&two_a);
		let c = (&b * &b - lifted_discriminant) / (&two_a * 2);

		BinaryQf { a: self.a.clone(), b, c }.reduced()
	}
}

/// Jacobi symbol (a / n) for odd positive n
fn jacobi(a: &BigInt, n: &BigUint) -> i32 {
	let mut a = a.mod_floor(&BigInt::from(n.clone())).magnitude().clone();
	let mut n = n.clone();
	let mut result = 1;

	while !a.is_zero() {
		while a.is_even() {
			a >>= 1;
			let r = (&n % 8u32).to_u32_digits().first().copied().unwrap_or(0);
			if r == 3 || r == 5 {
				result = -result;
			}
		}

		std::mem::swap(&mut a, &mut n);

		if (&a % 4u32) == BigUint::from(3u32) && (&n % 4u32) == BigUint::from(3u32) {
			result = -result;
		}
		a %= &n;
	}

	if n.is_one() {
		result
	} else {
		0
	}
}

/// Tonelli-Shanks square root modulo an odd prime
fn sqrt_mod_prime(a: &BigUint, p: &BigUint) -> Option<BigUint> {
	let a = a % p;
	if a.is_zero() {
		return Some(BigUint::zero())
	}

	let one = BigUint::one();
	let p_minus_one = p - &one;
	let legendre_exponent = &p_minus_one >> 1;

	if a.modpow(&legendre_exponent, p) != one {
		return None
	}

	if (p % 4u32) == BigUint::from(3u32) {
		return Some(a.modpow(&((p + &one) >> 2), p))
	}

	// General case: p - 1 = q * 2^s with q odd
	let s = p_minus_one.trailing_zeros().expect("p > 1");
	let q = &p_minus_one >> s;

	// Find a quadratic non-residue
	let mut z = BigUint::from(2u32);
	while z.modpow(&legendre_exponent, p) == one {
		z += 1u32;
	}

	let mut m = s;
	let mut c = z.modpow(&q, p);
	let mut t = a.modpow(&q, p);
	let mut r = a.modpow(&((&q + &one) >> 1), p);

	loop {
		if t.is_one() {
			return Some(r)
		}

		let mut i = 0;
		let mut t2i = t.clone();
		while !t2i.is_one() {
			t2i = (&t2i * &t2i) % p;
			i += 1;
		}

		let mut b = c.clone();
		for _ in 0..m - i - 1 {
			b = (&b * &b) % p;
		}

		m = i;
		c = (&b * &b) % p;
		t = (&t * &c) % p;
		r = (&r * &b) % p;
	}
}

/// The public class group description: shared by a keypair and by every
/// party verifying proofs against it
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClGroup {
	q: BigUint,
	delta_q: BigInt,
	g: BinaryQf,
	exponent_bound: BigUint,
}

impl ClGroup {
	pub fn new(
		rng: &mut Rng,
		q: BigUint,
		safe_parameter: usize,
		distribution_distance: usize,
	) -> Self {
		let q_bits = q.bits();
		// Below this the order-q subgroup forms (a = q^2) would not be
		// reduced and the easy discrete log breaks down
		assert!((safe_parameter as u64) > 2 * q_bits + 2, "discriminant too small for q");

		// delta_k = -q * qtilde must be a fundamental discriminant
		// (1 mod 4) with q splitting in its field
		let residue = if (&q % 4u32) == BigUint::from(1u32) { 3 } else { 1 };
		let qtilde = loop {
			let candidate =
				generate_prime_with_residue(rng, safe_parameter as u64 - q_bits, residue);
			if jacobi(&BigInt::from(q.clone()), &candidate) == 1 {
				break candidate
			}
		};

		let delta_k = -BigInt::from(&q * &qtilde);
		let delta_q = &delta_k * BigInt::from(&q * &q);

		// Generator of the squares: a prime form over the smallest odd
		// prime that splits, squared, lifted to the non-maximal order
		// and raised to the q-th power
		let mut r = 3u32;
		loop {
			let r_big = BigUint::from(r);
			if is_probable_prime(&r_big, rng) && jacobi(&delta_k, &r_big) == 1 {
				break
			}
			r += 2;
		}

		let prime_form = BinaryQf::primeform(&delta_k, &BigUint::from(r));
		let g = prime_form
			.compose(&prime_form)
			.lift(&BigInt::from(q.clone()), &delta_q)
			.pow(&q);

		// Upper bound on the class number of delta_k, stretched by the
		// distribution distance so sampled exponents are statistically
		// close to uniform over the subgroup
		let class_number_bound = delta_k.magnitude().sqrt() * BigUint::from(delta_k.bits());
		let exponent_bound = class_number_bound << distribution_distance;

		ClGroup { q, delta_q, g, exponent_bound }
	}

	pub fn q(&self) -> &BigUint {
		&self.q
	}

	fn sample_exponent(&self, rng: &mut Rng) -> BigUint {
		rng.gen_biguint_below(&self.exponent_bound)
	}

	/// f^m computed directly: f^m is the reduced form
	/// (q^2, L(m) * q, .) with L(m) the odd representative of 1/m mod q
	fn expo_f(&self, m: &BigUint) -> BinaryQf {
		let m = m % &self.q;
		if m.is_zero() {
			return BinaryQf::identity(&self.delta_q)
		}

		let q_int = BigInt::from(self.q.clone());

		let mut l = BigInt::from(m.modinv(&self.q).expect("q is prime, m is non-zero"));
		if l.is_even() {
			l -= &q_int;
		}

		let b = &l * &q_int;
		let a = &q_int * &q_int;
		let c = (&b * &b - &self.delta_q) / (&a * 4);

		BinaryQf { a, b, c }
	}

	/// Discrete log in the subgroup generated by f; `None` when the form
	/// is not a power of f
	fn discrete_log_f(&self, form: &BinaryQf) -> Option<BigUint> {
		if *form == BinaryQf::identity(&self.delta_q) {
			return Some(BigUint::zero())
		}

		let q_int = BigInt::from(self.q.clone());
		if form.a != &q_int * &q_int || !(&form.b % &q_int).is_zero() {
			return None
		}

		let l = (&form.b / &q_int).mod_floor(&q_int);
		l.magnitude().modinv(&self.q)
	}
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicKey {
	group: ClGroup,
	h: BinaryQf,
}

#[derive(Debug)]
pub struct Keypair {
	public: PublicKey,
	x: BigUint,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ciphertext {
	c1: BinaryQf,
	c2: BinaryQf,
}

impl Keypair {
	pub fn generate(
		rng: &mut Rng,
		q: BigUint,
		safe_parameter: usize,
		distribution_distance: usize,
	) -> Self {
		let group = ClGroup::new(rng, q, safe_parameter, distribution_distance);

		let x = group.sample_exponent(rng);
		let h = group.g.pow(&x);

		Keypair { public: PublicKey { group, h }, x }
	}

	pub fn public_key(&self) -> &PublicKey {
		&self.public
	}

	/// The plaintext in [0, q); `None` for ciphertexts outside the
	/// plaintext subgroup (which honest parties never produce)
	pub fn decrypt(&self, ciphertext: &Ciphertext) -> Option<BigUint> {
		let masked = ciphertext.c2.compose(&ciphertext.c1.pow(&self.x).inverse());
		self.public.group.discrete_log_f(&masked)
	}
}

impl PublicKey {
	pub fn group(&self) -> &ClGroup {
		&self.group
	}

	pub fn encrypt_with_randomness(&self, m: &BigUint, rho: &BigUint) -> Ciphertext {
		Ciphertext {
			c1: self.group.g.pow(rho),
			c2: self.group.expo_f(m).compose(&self.h.pow(rho)),
		}
	}

	pub fn encrypt(&self, rng: &mut Rng, m: &BigUint) -> (Ciphertext, BigUint) {
		let rho = self.group.sample_exponent(rng);
		(self.encrypt_with_randomness(m, &rho), rho)
	}

	pub fn add(&self, c1: &Ciphertext, c2: &Ciphertext) -> Ciphertext {
		Ciphertext { c1: c1.c1.compose(&c2.c1), c2: c1.c2.compose(&c2.c2) }
	}

	pub fn scalar_mul(&self, c: &Ciphertext, k: &BigUint) -> Ciphertext {
		Ciphertext { c1: c.c1.pow(k), c2: c.c2.pow(k) }
	}

	fn is_valid_ciphertext(&self, c: &Ciphertext) -> bool {
		c.c1.a.is_positive() &&
			c.c2.a.is_positive() &&
			c.c1.discriminant() == self.group.delta_q &&
			c.c2.discriminant() == self.group.delta_q
	}
}

fn hash_forms_to_challenge(
	context: &'static [u8],
	party_id: &str,
	forms: &[&BinaryQf],
	extra: &[u8],
	q: &BigUint,
) -> BigUint {
	let mut hasher = Sha256::new();

	hasher.update(context);
	hasher.update((party_id.len() as u64).to_be_bytes());
	hasher.update(party_id.as_bytes());
	for form in forms {
		hasher.update(bincode::serialize(form).expect("serialization can't fail"));
	}
	hasher.update(extra);

	BigUint::from_bytes_be(&hasher.finalize()) % q
}

const CIPHERTEXT_PROOF_CONTEXT: &[u8] = b"cl-ciphertext-proof";
const MTA_PROOF_CONTEXT: &[u8] = b"cl-mta-proof";

/// Proof of knowledge of `(m, rho)` with `c = (g^rho, f^m * h^rho)`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CiphertextProof {
	t1: BinaryQf,
	t2: BinaryQf,
	u_m: BigUint,
	u_rho: BigUint,
}

impl PublicKey {
	fn rho_mask_bound(&self) -> BigUint {
		// must statistically mask e * rho (e < q)
		&self.group.exponent_bound << (self.group.q.bits() + 40)
	}

	pub fn prove_ciphertext(
		&self,
		rng: &mut Rng,
		party_id: &str,
		m: &BigUint,
		rho: &BigUint,
		c: &Ciphertext,
	) -> CiphertextProof {
		let q = &self.group.q;

		let s_m = rng.gen_biguint_below(&q.pow(3));
		let s_rho = rng.gen_biguint_below(&self.rho_mask_bound());

		let t1 = self.group.g.pow(&s_rho);
		let t2 = self.group.expo_f(&s_m).compose(&self.h.pow(&s_rho));

		let e = hash_forms_to_challenge(
			CIPHERTEXT_PROOF_CONTEXT,
			party_id,
			&[&self.h, &c.c1, &c.c2, &t1, &t2],
			&[],
			q,
		);

		let u_m = s_m + &e * m;
		let u_rho = s_rho + &e * rho;

		CiphertextProof { t1, t2, u_m, u_rho }
	}

	pub fn verify_ciphertext(
		&self,
		party_id: &str,
		c: &Ciphertext,
		proof: &CiphertextProof,
	) -> bool {
		let q = &self.group.q;

		if !self.is_valid_ciphertext(c) {
			return false
		}

		if proof.u_m >= q.pow(3) + q.pow(2) {
			return false
		}

		let e = hash_forms_to_challenge(
			CIPHERTEXT_PROOF_CONTEXT,
			party_id,
			&[&self.h, &c.c1, &c.c2, &proof.t1, &proof.t2],
			&[],
			q,
		);

		self.group.g.pow(&proof.u_rho) == proof.t1.compose(&c.c1.pow(&e)) &&
			self.group.expo_f(&proof.u_m).compose(&self.h.pow(&proof.u_rho)) ==
				proof.t2.compose(&c.c2.pow(&e))
	}
}

/// Proof that an MtA response is `c_b = c_a^x * Enc(beta)`, optionally
/// binding `x` to a public curve point
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MtaProof<P: ECPoint> {
	t1: BinaryQf,
	t2: BinaryQf,
	#[serde(bound = "")]
	t_g: Option<P>,
	z: BigUint,
	w_b: BigUint,
	w_rho: BigUint,
}

impl PublicKey {
	pub fn mta_response<P: ECPoint>(
		&self,
		rng: &mut Rng,
		party_id: &str,
		c_a: &Ciphertext,
		x: &BigUint,
		bind_to_point: bool,
	) -> (Ciphertext, BigUint, MtaProof<P>) {
		let q = &self.group.q;

		// The message space is exactly Z_q, so a uniform mask cannot wrap
		let beta = rng.gen_biguint_below(q);
		let rho = self.group.sample_exponent(rng);
		let enc_beta = self.encrypt_with_randomness(&beta, &rho);
		let c_b = self.add(&self.scalar_mul(c_a, x), &enc_beta);

		let alpha = rng.gen_biguint_below(&q.pow(3));
		let s_b = rng.gen_biguint_below(&q.pow(3));
		let s_rho = rng.gen_biguint_below(&self.rho_mask_bound());

		let t1 = c_a.c1.pow(&alpha).compose(&self.group.g.pow(&s_rho));
		let t2 = c_a
			.c2
			.pow(&alpha)
			.compose(&self.group.expo_f(&s_b))
			.compose(&self.h.pow(&s_rho));
		let t_g = bind_to_point
			.then(|| P::from_scalar(&<P::Scalar as ECScalar>::from_biguint_mod_order(&alpha)));

		let x_pub = bind_to_point
			.then(|| P::from_scalar(&<P::Scalar as ECScalar>::from_biguint_mod_order(x)));
		let e = mta_challenge::<P>(self, party_id, c_a, &c_b, &t1, &t2, t_g.as_ref(), x_pub.as_ref());

		let z = alpha + &e * x;
		let w_b = s_b + &e * &beta;
		let w_rho = s_rho + &e * &rho;

		(c_b, beta, MtaProof { t1, t2, t_g, z, w_b, w_rho })
	}

	pub fn verify_mta_response<P: ECPoint>(
		&self,
		party_id: &str,
		c_a: &Ciphertext,
		c_b: &Ciphertext,
		proof: &MtaProof<P>,
		binding: Option<&P>,
	) -> bool {
		let q = &self.group.q;

		if !self.is_valid_ciphertext(c_a) || !self.is_valid_ciphertext(c_b) {
			return false
		}

		if proof.z >= q.pow(3) + q.pow(2) {
			return false
		}

		let e = match (binding, &proof.t_g) {
			(Some(public), Some(t_g)) => {
				let e = mta_challenge::<P>(
					self, party_id, c_a, c_b, &proof.t1, &proof.t2, Some(t_g), Some(public),
				);

				let e_scalar = <P::Scalar as ECScalar>::from_biguint_mod_order(&e);
				let z_scalar = <P::Scalar as ECScalar>::from_biguint_mod_order(&proof.z);
				if P::from_scalar(&z_scalar) != *t_g + *public * e_scalar {
					return false
				}
				e
			},
			(None, None) =>
				mta_challenge::<P>(self, party_id, c_a, c_b, &proof.t1, &proof.t2, None, None),
			_ => return false,
		};

		c_a.c1.pow(&proof.z).compose(&self.group.g.pow(&proof.w_rho)) ==
			proof.t1.compose(&c_b.c1.pow(&e)) &&
			c_a.c2
				.pow(&proof.z)
				.compose(&self.group.expo_f(&proof.w_b))
				.compose(&self.h.pow(&proof.w_rho)) ==
				proof.t2.compose(&c_b.c2.pow(&e))
	}
}

#[allow(clippy::too_many_arguments)]
fn mta_challenge<P: ECPoint>(
	pk: &PublicKey,
	party_id: &str,
	c_a: &Ciphertext,
	c_b: &Ciphertext,
	t1: &BinaryQf,
	t2: &BinaryQf,
	t_g: Option<&P>,
	x_pub: Option<&P>,
) -> BigUint {
	let mut extra = Vec::new();
	if let Some(t_g) = t_g {
		extra.extend_from_slice(t_g.as_bytes().as_slice());
	}
	if let Some(x_pub) = x_pub {
		extra.extend_from_slice(x_pub.as_bytes().as_slice());
	}

	hash_forms_to_challenge(
		MTA_PROOF_CONTEXT,
		party_id,
		&[&pk.h, &c_a.c1, &c_a.c2, &c_b.c1, &c_b.c2, t1, t2],
		&extra,
		&pk.group.q,
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::crypto::secp256k1::{Point, Scalar};
	use rand::SeedableRng;

	// Small discriminant keeps debug-mode exponentiation affordable;
	// the arithmetic is the same at every size
	const TEST_SAFE_PARAMETER: usize = 516;

	fn test_keypair(seed: u8) -> (Keypair, Rng) {
		let mut rng = Rng::from_seed([seed; 32]);
		let keypair = Keypair::generate(
			&mut rng,
			Scalar::group_order().clone(),
			TEST_SAFE_PARAMETER,
			DEFAULT_DISTRIBUTION_DISTANCE,
		);
		(keypair, rng)
	}

	#[test]
	fn group_law_sanity() {
		let (keypair, mut rng) = test_keypair(20);
		let group = &keypair.public.group;
		let g = &group.g;

		let identity = BinaryQf::identity(&group.delta_q);

		assert_eq!(g.compose(&identity), g.reduced());
		assert_eq!(g.compose(&g.inverse()), identity);

		// compose is commutative and pow is a homomorphism
		let a = rng.gen_biguint_below(&group.exponent_bound);
		let b = rng.gen_biguint_below(&group.exponent_bound);
		let ga = g.pow(&a);
		let gb = g.pow(&b);
		assert_eq!(ga.compose(&gb), gb.compose(&ga));
		assert_eq!(ga.compose(&gb), g.pow(&(&a + &b)));
	}

	#[test]
	fn f_exponentiation_and_discrete_log() {
		let (keypair, mut rng) = test_keypair(21);
		let group = &keypair.public.group;

		assert_eq!(group.discrete_log_f(&group.expo_f(&BigUint::zero())), Some(BigUint::zero()));

		for _ in 0..4 {
			let m = rng.gen_biguint_below(&group.q);
			assert_eq!(group.discrete_log_f(&group.expo_f(&m)), Some(m));
		}

		// f^a * f^b = f^(a + b mod q)
		let a = rng.gen_biguint_below(&group.q);
		let b = rng.gen_biguint_below(&group.q);
		let sum = group.expo_f(&a).compose(&group.expo_f(&b));
		assert_eq!(group.discrete_log_f(&sum), Some((&a + &b) % &group.q));
	}

	#[test]
	fn encrypt_decrypt_and_homomorphisms() {
		let (keypair, mut rng) = test_keypair(22);
		let pk = keypair.public_key();
		let q = pk.group().q();

		let m1 = rng.gen_biguint_below(q);
		let m2 = rng.gen_biguint_below(q);

		let (c1, _) = pk.encrypt(&mut rng, &m1);
		let (c2, _) = pk.encrypt(&mut rng, &m2);

		assert_eq!(keypair.decrypt(&c1), Some(m1.clone()));

		assert_eq!(keypair.decrypt(&pk.add(&c1, &c2)), Some((&m1 + &m2) % q));

		let k = rng.gen_biguint_below(q);
		assert_eq!(keypair.decrypt(&pk.scalar_mul(&c1, &k)), Some((&m1 * &k) % q));
	}

	#[test]
	fn ciphertext_proof_round_trip() {
		let (keypair, mut rng) = test_keypair(23);
		let pk = keypair.public_key();
		let q = pk.group().q().clone();

		let m = rng.gen_biguint_below(&q);
		let (c, rho) = pk.encrypt(&mut rng, &m);

		let proof = pk.prove_ciphertext(&mut rng, "id-0", &m, &rho, &c);
		assert!(pk.verify_ciphertext("id-0", &c, &proof));
		assert!(!pk.verify_ciphertext("id-1", &c, &proof));
	}

	#[test]
	fn mta_round_trip_produces_additive_shares() {
		let (keypair, mut rng) = test_keypair(24);
		let pk = keypair.public_key();
		let q = pk.group().q().clone();

		let k = rng.gen_biguint_below(&q);
		let x = rng.gen_biguint_below(&q);
		let x_pub = Point::from_scalar(&Scalar::from_biguint_mod_order(&x));

		let (c_a, _) = pk.encrypt(&mut rng, &k);

		let (c_b, beta, proof) = pk.mta_response::<Point>(&mut rng, "id-1", &c_a, &x, true);
		assert!(pk.verify_mta_response("id-1", &c_a, &c_b, &proof, Some(&x_pub)));
		assert!(!pk.verify_mta_response(
			"id-1",
			&c_a,
			&c_b,
			&proof,
			Some(&Point::from_scalar(&Scalar::from(3)))
		));

		let alpha = keypair.decrypt(&c_b).unwrap();
		let lhs = (alpha + (&q - &beta)) % &q;
		assert_eq!(lhs, (&k * &x) % &q);
	}
}
