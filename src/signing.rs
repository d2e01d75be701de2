//! Threshold ECDSA signing over a `t`-party signing set (GG18-style).
//! Every party holds a DKG share and the birkhoff parameters of the
//! signing set; the ten-stage handler chain converts the multiplicative
//! nonce/key products into additive shares via homomorphic MtA,
//! assembles the nonce point behind commit-reveal rounds, runs an
//! aggregate consistency check, and finally combines the signature
//! shares and verifies the result as a standard ECDSA signature.

mod signing_data;
mod signing_detail;
mod signing_stages;

#[cfg(test)]
mod tests;

pub use signing_data::{
	CommitUiTiData, CommitViAiData, DecommitUiTiData, DecommitViAiData, DeltaData, EncKData,
	MtaData, ProofAiData, PubkeyData, SiData, SigningData,
};

#[cfg(test)]
pub use signing_detail::{message_to_scalar, verify_ecdsa};

use std::{collections::BTreeMap, marker::PhantomData, sync::Arc};

use thiserror::Error as ThisError;
use tracing::warn;

use crate::{
	crypto::{
		birkhoff::{self, BkParameter},
		ECPoint, Rng,
	},
	homo::HomoKeypair,
	p2p::{PartyId, PeerManager, StateChangedListener, TssData, TssMessage},
	protocol::{BroadcastStage, Protocol, ProtocolRunner, ProtocolState, StageCommon},
	Error,
};

use signing_detail::SigningContext;
use signing_stages::PubkeyStage1;

#[derive(ThisError, Debug, PartialEq, Eq, Clone, Copy)]
pub enum SigningStageName {
	#[error("Public Key Shares [1]")]
	Pubkey1,
	#[error("Nonce Encryption [2]")]
	EncK2,
	#[error("MtA Responses [3]")]
	Mta3,
	#[error("Delta Shares [4]")]
	Delta4,
	#[error("Nonce Decommitments [5]")]
	ProofAi5,
	#[error("Check Value Commitments [6]")]
	CommitViAi6,
	#[error("Check Value Decommitments [7]")]
	DecommitViAi7,
	#[error("Consistency Commitments [8]")]
	CommitUiTi8,
	#[error("Consistency Decommitments [9]")]
	DecommitUiTi9,
	#[error("Signature Shares [10]")]
	Si10,
}

#[derive(ThisError, Debug, PartialEq, Eq)]
pub enum SigningFailureReason {
	#[error("Invalid public key share")]
	InvalidPubkey,
	#[error("Invalid ciphertext proof")]
	InvalidCiphertextProof,
	#[error("Invalid MtA response")]
	InvalidMtaResponse,
	#[error("Aggregate nonce is not usable")]
	InvalidNonce,
	#[error("Invalid commitment")]
	InvalidCommitment,
	#[error("Invalid proof")]
	InvalidProof,
	#[error("Failed consistency check")]
	FailedConsistencyCheck,
	#[error("Invalid signature")]
	InvalidSignature,
}

/// A complete ECDSA signature over the input message hash, identical
/// across all participants. `s` is normalized to the lower half of the
/// scalar field, as required by chains that reject malleable signatures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature<P: ECPoint> {
	pub r: P::Scalar,
	pub s: P::Scalar,
}

pub struct SigningProtocol<P: ECPoint>(PhantomData<P>);

impl<P: ECPoint> Protocol for SigningProtocol<P> {
	type Point = P;
	type Data = SigningData<P>;
	type Output = Signature<P>;
	type FailureReason = SigningFailureReason;
	type StageName = SigningStageName;

	fn wrap_data(data: Self::Data) -> TssData<P> {
		TssData::Signing(data)
	}

	fn should_delay(stage: SigningStageName, data: &Self::Data) -> bool {
		match stage {
			SigningStageName::Pubkey1 => matches!(data, SigningData::EncK(_)),
			SigningStageName::EncK2 => matches!(data, SigningData::Mta(_)),
			SigningStageName::Mta3 => matches!(data, SigningData::Delta(_)),
			SigningStageName::Delta4 => matches!(data, SigningData::ProofAi(_)),
			SigningStageName::ProofAi5 => matches!(data, SigningData::CommitViAi(_)),
			SigningStageName::CommitViAi6 => matches!(data, SigningData::DecommitViAi(_)),
			SigningStageName::DecommitViAi7 => matches!(data, SigningData::CommitUiTi(_)),
			SigningStageName::CommitUiTi8 => matches!(data, SigningData::DecommitUiTi(_)),
			SigningStageName::DecommitUiTi9 => matches!(data, SigningData::Si(_)),
			// Last stage, nothing to delay
			SigningStageName::Si10 => false,
		}
	}
}

/// A single party's signing instance over one message hash. The signing
/// set is implied by the peer manager; `bks` must hold a birkhoff
/// parameter for every participant (self included) and the set must be
/// able to interpolate at the signing threshold.
pub struct Signer<P: ECPoint> {
	runner: ProtocolRunner<SigningProtocol<P>>,
}

impl<P: ECPoint> Signer<P> {
	#[allow(clippy::too_many_arguments)]
	pub fn new(
		peer_manager: Arc<dyn PeerManager>,
		expected_pubkey: P,
		homo: HomoKeypair,
		secret_share: P::Scalar,
		bks: BTreeMap<PartyId, BkParameter<P::Scalar>>,
		message: &[u8],
		listener: Box<dyn StateChangedListener>,
		mut rng: Rng,
	) -> Result<Self, Error> {
		let threshold = peer_manager.num_peers() + 1;
		if threshold < 2 {
			return Err(Error::InvalidThreshold { threshold, share_count: threshold })
		}

		let own_id = peer_manager.self_id();
		let mut all_ids = peer_manager.peer_ids();
		if all_ids.len() as u32 != threshold - 1 || !all_ids.insert(own_id.clone()) {
			return Err(Error::InconsistentPeers)
		}

		// The signing set and the parameter map must match exactly
		for id in &all_ids {
			if !bks.contains_key(id) {
				return Err(Error::MissingBk(id.clone()))
			}
		}
		if bks.len() != all_ids.len() {
			return Err(Error::InconsistentPeers)
		}

		let ordered_bks: Vec<BkParameter<P::Scalar>> = bks.values().cloned().collect();
		birkhoff::check_valid(&ordered_bks, threshold)?;

		// Weight our share so that the weighted shares of the signing
		// set sum to the private key
		let bk_refs: Vec<&BkParameter<P::Scalar>> = bks.values().collect();
		let coefficients = birkhoff::compute_coefficients(&bk_refs, threshold)?;
		let own_coefficient = bks
			.keys()
			.zip(coefficients)
			.find_map(|(id, c)| (id == &own_id).then_some(c))
			.expect("own id is in the signing set");

		let context = SigningContext::new(
			expected_pubkey,
			homo,
			own_coefficient * secret_share,
			message,
		);

		let stage_one = PubkeyStage1::new(&mut rng, &own_id, context);

		let common = StageCommon { own_id, all_ids, peer_manager, rng };
		let stage = BroadcastStage::new(stage_one, common);

		Ok(Signer { runner: ProtocolRunner::new(Box::new(stage), listener) })
	}

	/// Broadcast our public key share and start accepting messages
	pub fn start(&mut self) {
		self.runner.start()
	}

	pub fn add_message(&mut self, message: TssMessage<P>) -> Result<(), Error> {
		match message.data {
			TssData::Signing(data) => self.runner.add_message(message.id, data),
			other => {
				warn!(from_id = message.id.as_str(), "Ignoring non-signing message {other}");
				Ok(())
			},
		}
	}

	pub fn stop(&mut self) {
		self.runner.stop()
	}

	pub fn get_state(&self) -> ProtocolState {
		self.runner.get_state()
	}

	pub fn current_stage(&self) -> Option<SigningStageName> {
		self.runner.current_stage()
	}

	pub fn get_result(&self) -> Result<Signature<P>, Error> {
		self.runner.get_result()
	}

	pub fn failure_reason(&self) -> Option<&SigningFailureReason> {
		self.runner.failure_reason()
	}
}
