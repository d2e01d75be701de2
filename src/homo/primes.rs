//! Probable-prime generation over `num-bigint` (which ships no prime
//! utilities of its own). Used for Paillier moduli and the CL fundamental
//! discriminant.

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};

use crate::crypto::Rng;

/// Enough rounds for a < 2^-80 error probability on random candidates
const MILLER_RABIN_ROUNDS: usize = 40;

const SMALL_PRIMES: [u32; 46] = [
	3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
	101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
	197, 199, 211,
];

pub fn is_probable_prime(n: &BigUint, rng: &mut Rng) -> bool {
	let two = BigUint::from(2u32);

	if n < &two {
		return false
	}
	if n == &two {
		return true
	}
	if (n % &two).is_zero() {
		return false
	}

	for p in SMALL_PRIMES {
		let p = BigUint::from(p);
		if n == &p {
			return true
		}
		if (n % &p).is_zero() {
			return false
		}
	}

	// Miller-Rabin: n - 1 = d * 2^s with d odd
	let n_minus_one = n - 1u32;
	let s = n_minus_one.trailing_zeros().expect("n - 1 is non-zero");
	let d = &n_minus_one >> s;

	'witness: for _ in 0..MILLER_RABIN_ROUNDS {
		let a = rng.gen_biguint_range(&two, &n_minus_one);
		let mut x = a.modpow(&d, n);

		if x.is_one() || x == n_minus_one {
			continue
		}

		for _ in 0..s - 1 {
			x = x.modpow(&two, n);
			if x == n_minus_one {
				continue 'witness
			}
		}

		return false
	}

	true
}

/// A random probable prime of exactly `bits` bits. The top two bits are
/// set so that a product of two such primes is a full 2*bits modulus.
pub fn generate_prime(rng: &mut Rng, bits: u64) -> BigUint {
	assert!(bits >= 16);

	loop {
		let mut candidate = rng.gen_biguint(bits);
		candidate.set_bit(bits - 1, true);
		candidate.set_bit(bits - 2, true);
		candidate.set_bit(0, true);

		if is_probable_prime(&candidate, rng) {
			return candidate
		}
	}
}

/// A random probable prime of `bits` bits congruent to `residue` mod 4
pub fn generate_prime_with_residue(rng: &mut Rng, bits: u64, residue: u32) -> BigUint {
	assert!(residue == 1 || residue == 3);

	loop {
		let candidate = generate_prime(rng, bits);
		if (&candidate % 4u32) == BigUint::from(residue) {
			return candidate
		}
	}
}
