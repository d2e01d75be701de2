//! Distributed key generation: `n` parties with distinct evaluation
//! points produce additive shares of a secret polynomial whose constant
//! term is the joint private key, together with the joint public key and
//! everyone's birkhoff parameters.
//!
//! The handler chain is peer info -> decommitments -> secret shares:
//! parties first commit to their key contribution and exchange
//! evaluation points, then open the commitments together with Feldman
//! coefficient commitments, and finally exchange private polynomial
//! evaluations which each recipient verifies before summing into its
//! long-term share.

mod dkg_data;
mod dkg_detail;
mod dkg_stages;

#[cfg(test)]
mod tests;

pub use dkg_data::{Decommit, DkgData, PeerInfo, SecretShare};

use std::{collections::BTreeMap, marker::PhantomData, sync::Arc};

use thiserror::Error as ThisError;
use tracing::warn;

use crate::{
	crypto::{
		birkhoff::{BkError, BkParameter},
		ECPoint, Rng,
	},
	p2p::{PartyId, PeerManager, StateChangedListener, TssData, TssMessage},
	protocol::{BroadcastStage, Protocol, ProtocolRunner, ProtocolState, StageCommon},
	Error,
};

use dkg_detail::DkgContext;
use dkg_stages::PeerInfoStage1;

#[derive(ThisError, Debug, PartialEq, Eq, Clone, Copy)]
pub enum DkgStageName {
	#[error("Peer Info [1]")]
	PeerInfo1,
	#[error("Decommitments [2]")]
	Decommitments2,
	#[error("Secret Shares [3]")]
	SecretShares3,
}

#[derive(ThisError, Debug, PartialEq, Eq)]
pub enum DkgFailureReason {
	#[error("Invalid birkhoff parameters: {0}")]
	InvalidBks(#[from] BkError),
	#[error("Invalid commitment")]
	InvalidCommitment,
	#[error("Invalid secret share")]
	InvalidSecretShare,
}

/// The terminal output held by every party after a successful run.
/// `public_key` and `bks` are identical across parties; `share` is not.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DkgResult<P: ECPoint> {
	pub public_key: P,
	pub share: P::Scalar,
	pub bks: BTreeMap<PartyId, BkParameter<P::Scalar>>,
}

pub struct DkgProtocol<P: ECPoint>(PhantomData<P>);

impl<P: ECPoint> Protocol for DkgProtocol<P> {
	type Point = P;
	type Data = DkgData<P>;
	type Output = DkgResult<P>;
	type FailureReason = DkgFailureReason;
	type StageName = DkgStageName;

	fn wrap_data(data: Self::Data) -> TssData<P> {
		TssData::Dkg(data)
	}

	fn should_delay(stage: DkgStageName, data: &Self::Data) -> bool {
		match stage {
			DkgStageName::PeerInfo1 => matches!(data, DkgData::Decommit(_)),
			DkgStageName::Decommitments2 => matches!(data, DkgData::Share(_)),
			// Last stage, nothing to delay
			DkgStageName::SecretShares3 => false,
		}
	}
}

/// A single party's DKG instance. Construct one per party, `start` it,
/// and feed it every inbound message; the listener fires when the
/// instance completes and `get_result` returns the key material.
pub struct Dkg<P: ECPoint> {
	runner: ProtocolRunner<DkgProtocol<P>>,
}

impl<P: ECPoint> Dkg<P> {
	pub fn new(
		peer_manager: Arc<dyn PeerManager>,
		threshold: u32,
		rank: u32,
		listener: Box<dyn StateChangedListener>,
		mut rng: Rng,
	) -> Result<Self, Error> {
		let share_count = peer_manager.num_peers() + 1;
		if threshold < 2 || threshold > share_count {
			return Err(Error::InvalidThreshold { threshold, share_count })
		}

		let own_id = peer_manager.self_id();
		let mut all_ids = peer_manager.peer_ids();
		if all_ids.len() as u32 != share_count - 1 || !all_ids.insert(own_id.clone()) {
			return Err(Error::InconsistentPeers)
		}

		let context = DkgContext::generate(&mut rng, threshold, rank);

		let common = StageCommon { own_id, all_ids, peer_manager, rng };
		let stage = BroadcastStage::new(PeerInfoStage1::new(context), common);

		Ok(Dkg { runner: ProtocolRunner::new(Box::new(stage), listener) })
	}

	/// Broadcast our peer info and start accepting messages
	pub fn start(&mut self) {
		self.runner.start()
	}

	pub fn add_message(&mut self, message: TssMessage<P>) -> Result<(), Error> {
		match message.data {
			TssData::Dkg(data) => self.runner.add_message(message.id, data),
			other => {
				warn!(from_id = message.id.as_str(), "Ignoring non-DKG message {other}");
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

	pub fn current_stage(&self) -> Option<DkgStageName> {
		self.runner.current_stage()
	}

	pub fn get_result(&self) -> Result<DkgResult<P>, Error> {
		self.runner.get_result()
	}

	pub fn failure_reason(&self) -> Option<&DkgFailureReason> {
		self.runner.failure_reason()
	}
}
