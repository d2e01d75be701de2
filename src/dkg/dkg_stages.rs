use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::{
	crypto::{
		birkhoff::{self, BkParameter},
		commitment::{
			generate_hash_commitment, is_valid_hash_commitment, CoefficientCommitments,
			HashCommitment,
		},
		ECPoint,
	},
	p2p::PartyId,
	protocol::{
		BroadcastStage, BroadcastStageProcessor, DataToSend, StageCommon, StageResult,
	},
};

use super::{
	dkg_data::{Decommit, PeerInfo, SecretShare},
	dkg_detail::{compute_secret_key_share, derive_aggregate_pubkey, DkgContext},
	DkgFailureReason, DkgProtocol, DkgResult, DkgStageName,
};

type DkgStageResult<P> = StageResult<DkgProtocol<P>>;

/// Stage 1: broadcast our evaluation point and the hash commitment to
/// our key contribution; collect everyone else's
pub struct PeerInfoStage1<P: ECPoint> {
	context: DkgContext<P>,
}

impl<P: ECPoint> PeerInfoStage1<P> {
	pub fn new(context: DkgContext<P>) -> Self {
		PeerInfoStage1 { context }
	}
}

derive_display_as_type_name!(PeerInfoStage1<P: ECPoint>);

impl<P: ECPoint> BroadcastStageProcessor<DkgProtocol<P>> for PeerInfoStage1<P> {
	type Message = PeerInfo<P>;
	const NAME: DkgStageName = DkgStageName::PeerInfo1;

	fn init(&mut self, _common: &mut StageCommon) -> DataToSend<Self::Message> {
		DataToSend::Broadcast(PeerInfo {
			bk: self.context.own_bk.clone(),
			commitment: generate_hash_commitment(&self.context.u0_pub, &self.context.salt),
		})
	}

	/// Check that the assembled evaluation points can support the
	/// threshold before anything secret is revealed
	fn process(
		self,
		common: StageCommon,
		messages: BTreeMap<PartyId, Self::Message>,
	) -> DkgStageResult<P> {
		let bks: Vec<BkParameter<P::Scalar>> =
			messages.values().map(|info| info.bk.clone()).collect();

		if let Err(reason) = birkhoff::check_valid(&bks, self.context.threshold) {
			warn!("Failed to check birkhoff parameters: {reason}");
			return StageResult::Error(DkgFailureReason::InvalidBks(reason))
		}

		debug!("{} is successful", Self::NAME);

		let (bks, commitments) = messages
			.into_iter()
			.map(|(id, info)| ((id.clone(), info.bk), (id, info.commitment)))
			.unzip();

		let processor = DecommitStage2 { context: self.context, bks, commitments };
		let stage = BroadcastStage::new(processor, common);

		StageResult::NextStage(Box::new(stage))
	}
}

/// Stage 2: open the key contribution commitments and publish Feldman
/// coefficient commitments
struct DecommitStage2<P: ECPoint> {
	context: DkgContext<P>,
	bks: BTreeMap<PartyId, BkParameter<P::Scalar>>,
	/// Hash commitments collected in the previous stage
	commitments: BTreeMap<PartyId, HashCommitment>,
}

derive_display_as_type_name!(DecommitStage2<P: ECPoint>);

impl<P: ECPoint> BroadcastStageProcessor<DkgProtocol<P>> for DecommitStage2<P> {
	type Message = Decommit<P>;
	const NAME: DkgStageName = DkgStageName::Decommitments2;

	fn init(&mut self, _common: &mut StageCommon) -> DataToSend<Self::Message> {
		DataToSend::Broadcast(Decommit {
			u0_pub: self.context.u0_pub,
			salt: self.context.salt,
			feldman: self.context.feldman.clone(),
		})
	}

	fn process(
		self,
		common: StageCommon,
		messages: BTreeMap<PartyId, Self::Message>,
	) -> DkgStageResult<P> {
		for (id, decommit) in &messages {
			let commitment =
				self.commitments.get(id).expect("commitment present for every participant");

			let valid = is_valid_hash_commitment(&decommit.u0_pub, &decommit.salt, commitment) &&
				decommit.feldman.0.len() == self.context.threshold as usize &&
				decommit.feldman.0.first() == Some(&decommit.u0_pub);

			if !valid {
				warn!(from_id = id.as_str(), "Invalid decommitment");
				return StageResult::Error(DkgFailureReason::InvalidCommitment)
			}
		}

		debug!("{} is successful", Self::NAME);

		let (u0_pubs, feldman) = messages
			.into_iter()
			.map(|(id, decommit)| ((id.clone(), decommit.u0_pub), (id, decommit.feldman)))
			.unzip();

		let processor = SecretSharesStage3 {
			context: self.context,
			bks: self.bks,
			u0_pubs,
			feldman,
		};
		let stage = BroadcastStage::new(processor, common);

		StageResult::NextStage(Box::new(stage))
	}
}

/// Stage 3 (terminal): exchange private polynomial evaluations, verify
/// each against the sender's coefficient commitments, and assemble the
/// result
struct SecretSharesStage3<P: ECPoint> {
	context: DkgContext<P>,
	bks: BTreeMap<PartyId, BkParameter<P::Scalar>>,
	u0_pubs: BTreeMap<PartyId, P>,
	/// Everyone's (verified) coefficient commitments
	feldman: BTreeMap<PartyId, CoefficientCommitments<P>>,
}

derive_display_as_type_name!(SecretSharesStage3<P: ECPoint>);

impl<P: ECPoint> BroadcastStageProcessor<DkgProtocol<P>> for SecretSharesStage3<P> {
	type Message = SecretShare<P>;
	const NAME: DkgStageName = DkgStageName::SecretShares3;

	fn init(&mut self, _common: &mut StageCommon) -> DataToSend<Self::Message> {
		DataToSend::Private(self.context.outgoing_shares(&self.bks))
	}

	fn process(
		self,
		_common: StageCommon,
		messages: BTreeMap<PartyId, Self::Message>,
	) -> DkgStageResult<P> {
		let own_bk = &self.context.own_bk;

		for (id, share) in &messages {
			let commitments =
				self.feldman.get(id).expect("commitments present for every participant");

			if !crate::crypto::commitment::verify_share(&share.value, commitments, own_bk) {
				warn!(from_id = id.as_str(), "Invalid secret share");
				return StageResult::Error(DkgFailureReason::InvalidSecretShare)
			}
		}

		debug!("{} is successful", Self::NAME);

		StageResult::Done(DkgResult {
			public_key: derive_aggregate_pubkey(&self.u0_pubs),
			share: compute_secret_key_share(&messages),
			bks: self.bks,
		})
	}
}
