use serde::{Deserialize, Serialize};

use crate::crypto::{
	birkhoff::BkParameter,
	commitment::{CoefficientCommitments, CommitmentSalt, HashCommitment},
	ECPoint,
};

/// Data sent between parties over p2p during a DKG ceremony
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum DkgData<P: ECPoint> {
	#[serde(bound = "")]
	Peer(PeerInfo<P>),
	#[serde(bound = "")]
	Decommit(Decommit<P>),
	#[serde(bound = "")]
	Share(SecretShare<P>),
}

impl<P: ECPoint> std::fmt::Display for DkgData<P> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let inner = match self {
			DkgData::Peer(inner) => inner.to_string(),
			DkgData::Decommit(inner) => inner.to_string(),
			DkgData::Share(inner) => inner.to_string(),
		};
		write!(f, "DkgData({inner})")
	}
}

/// Round 1: our evaluation point and a hash commitment to our key
/// contribution `U0 = f(0) * G`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeerInfo<P: ECPoint> {
	#[serde(bound = "")]
	pub bk: BkParameter<P::Scalar>,
	pub commitment: HashCommitment,
}

/// Round 2: the opening of the round-1 commitment together with the
/// Feldman commitments to all sharing polynomial coefficients (the first
/// of which is `U0` again)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Decommit<P: ECPoint> {
	#[serde(bound = "")]
	pub u0_pub: P,
	pub salt: CommitmentSalt,
	#[serde(bound = "")]
	pub feldman: CoefficientCommitments<P>,
}

/// Round 3 (private): the evaluation of our sharing polynomial at the
/// recipient's evaluation point, derivative-adjusted for its rank
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecretShare<P: ECPoint> {
	#[serde(bound = "")]
	pub value: P::Scalar,
}

derive_impls_for_enum_variants!(impl<P: ECPoint> for PeerInfo<P>, DkgData::Peer, DkgData<P>);
derive_impls_for_enum_variants!(impl<P: ECPoint> for Decommit<P>, DkgData::Decommit, DkgData<P>);
derive_impls_for_enum_variants!(impl<P: ECPoint> for SecretShare<P>, DkgData::Share, DkgData<P>);

derive_display_as_type_name!(PeerInfo<P: ECPoint>);
derive_display_as_type_name!(Decommit<P: ECPoint>);
derive_display_as_type_name!(SecretShare<P: ECPoint>);
