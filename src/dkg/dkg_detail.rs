use std::collections::BTreeMap;

use crate::{
	crypto::{
		birkhoff::BkParameter,
		commitment::{
			commit_to_coefficients, generate_commitment_salt, CoefficientCommitments,
			CommitmentSalt,
		},
		polynomial::Polynomial,
		ECPoint, ECScalar, Rng,
	},
	p2p::PartyId,
};

use super::dkg_data::SecretShare;

/// Everything a party samples at construction time: its sharing
/// polynomial, evaluation point, and the commitment material for its key
/// contribution `u0 = f(0)`
pub struct DkgContext<P: ECPoint> {
	pub threshold: u32,
	pub own_bk: BkParameter<P::Scalar>,
	pub polynomial: Polynomial<P::Scalar>,
	pub u0_pub: P,
	pub salt: CommitmentSalt,
	pub feldman: CoefficientCommitments<P>,
}

impl<P: ECPoint> DkgContext<P> {
	pub fn generate(rng: &mut Rng, threshold: u32, rank: u32) -> Self {
		let polynomial = Polynomial::random(rng, threshold - 1);

		// Random scalars are sampled from [1, N), so x is never zero
		let own_bk = BkParameter::new(P::Scalar::random(rng), rank);

		let u0_pub = P::from_scalar(polynomial.constant_term());
		let salt = generate_commitment_salt(rng);
		let feldman = commit_to_coefficients(&polynomial);

		DkgContext { threshold, own_bk, polynomial, u0_pub, salt, feldman }
	}

	/// The private share destined for each party: our polynomial
	/// evaluated at their point, derivative-adjusted for their rank
	pub fn outgoing_shares(
		&self,
		bks: &BTreeMap<PartyId, BkParameter<P::Scalar>>,
	) -> BTreeMap<PartyId, SecretShare<P>> {
		bks.iter()
			.map(|(id, bk)| {
				(
					id.clone(),
					SecretShare { value: self.polynomial.evaluate_derivative(&bk.x, bk.rank) },
				)
			})
			.collect()
	}
}

/// A party's long-term share is the sum of the (verified) shares it
/// received from everyone, itself included
pub fn compute_secret_key_share<P: ECPoint>(
	shares: &BTreeMap<PartyId, SecretShare<P>>,
) -> P::Scalar {
	shares.values().map(|share| share.value.clone()).sum()
}

/// The joint public key is the sum of all key contributions
pub fn derive_aggregate_pubkey<P: ECPoint>(u0_pubs: &BTreeMap<PartyId, P>) -> P {
	u0_pubs.values().copied().sum()
}
