use num_bigint::BigUint;

use crate::{
	crypto::{ECPoint, ECScalar},
	homo::HomoKeypair,
};

// Fiat-Shamir domain tags for the proofs exchanged while signing
pub const PUBKEY_PROOF_CONTEXT: &[u8] = b"signing-pubkey-share";
pub const GAMMA_PROOF_CONTEXT: &[u8] = b"signing-gamma";
pub const AI_PROOF_CONTEXT: &[u8] = b"signing-check-a";
pub const VI_PROOF_CONTEXT: &[u8] = b"signing-check-v";

/// State shared by every signing stage: the expected key, the message
/// hash as a field element, our homomorphic keypair, and our weighted
/// share `w_i` (the weighted shares of the signing set sum to the
/// private key).
pub struct SigningContext<P: ECPoint> {
	pub public_key: P,
	pub msg_scalar: P::Scalar,
	pub homo: HomoKeypair,
	pub w_i: P::Scalar,
}

impl<P: ECPoint> SigningContext<P> {
	pub fn new(public_key: P, homo: HomoKeypair, w_i: P::Scalar, message: &[u8]) -> Self {
		SigningContext { public_key, msg_scalar: message_to_scalar::<P>(message), homo, w_i }
	}
}

/// Interpret a message hash as a field element the way standard ECDSA
/// verifiers do: use the leftmost curve-order-sized bits
pub fn message_to_scalar<P: ECPoint>(message: &[u8]) -> P::Scalar {
	let truncated = if message.len() > 32 { &message[..32] } else { message };
	P::Scalar::from_biguint_mod_order(&BigUint::from_bytes_be(truncated))
}

/// `s` values above N/2 are replaced by their negation so the signature
/// is canonical (many chains reject the malleable twin)
pub fn normalize_s<P: ECPoint>(s: P::Scalar) -> P::Scalar {
	let order = P::Scalar::group_order();
	let half_order = order >> 1;

	if s.to_biguint() > half_order {
		P::Scalar::from_biguint_mod_order(&(order - s.to_biguint()))
	} else {
		s
	}
}

/// Standard ECDSA verification: `r == x(m/s * G + r/s * Y) mod N`
pub fn verify_ecdsa<P: ECPoint>(
	public_key: &P,
	msg_scalar: &P::Scalar,
	r: &P::Scalar,
	s: &P::Scalar,
) -> bool {
	if *r == P::Scalar::zero() || *s == P::Scalar::zero() {
		return false
	}

	let s_inv = match s.invert() {
		Some(s_inv) => s_inv,
		None => return false,
	};

	let u1 = msg_scalar.clone() * &s_inv;
	let u2 = r.clone() * &s_inv;

	let nonce_point = P::from_scalar(&u1) + *public_key * u2;

	match nonce_point.x_as_scalar() {
		Some(x) => &x == r,
		None => false,
	}
}
