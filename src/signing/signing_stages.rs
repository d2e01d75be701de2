use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::{
	crypto::{
		commitment::{
			generate_commitment_salt, generate_hash_commitment, is_valid_hash_commitment,
			CommitmentSalt, HashCommitment,
		},
		proofs::{Dlog2Proof, SchnorrProof},
		ECPoint, ECScalar, Rng,
	},
	homo::{HomoCiphertext, HomoPublicKey},
	p2p::PartyId,
	protocol::{
		BroadcastStage, BroadcastStageProcessor, DataToSend, StageCommon, StageResult,
	},
};

use super::{
	signing_data::{
		CommitUiTiData, CommitViAiData, DecommitUiTiData, DecommitViAiData, DeltaData, EncKData,
		MtaData, ProofAiData, PubkeyData, SiData,
	},
	signing_detail::{
		self, SigningContext, AI_PROOF_CONTEXT, GAMMA_PROOF_CONTEXT, PUBKEY_PROOF_CONTEXT,
		VI_PROOF_CONTEXT,
	},
	Signature, SigningFailureReason, SigningProtocol, SigningStageName,
};

type SigningStageResult<P> = StageResult<SigningProtocol<P>>;

/// Stage 1: exchange homomorphic keys and weighted public key shares,
/// and check that the shares assemble into the expected public key
pub struct PubkeyStage1<P: ECPoint> {
	context: SigningContext<P>,
	own_message: PubkeyData<P>,
}

impl<P: ECPoint> PubkeyStage1<P> {
	pub fn new(rng: &mut Rng, own_id: &PartyId, context: SigningContext<P>) -> Self {
		let own_message = PubkeyData {
			homo_pk: context.homo.public_key(),
			share_pub: P::from_scalar(&context.w_i),
			proof: SchnorrProof::prove(rng, PUBKEY_PROOF_CONTEXT, own_id, &context.w_i),
		};

		PubkeyStage1 { context, own_message }
	}
}

derive_display_as_type_name!(PubkeyStage1<P: ECPoint>);

impl<P: ECPoint> BroadcastStageProcessor<SigningProtocol<P>> for PubkeyStage1<P> {
	type Message = PubkeyData<P>;
	const NAME: SigningStageName = SigningStageName::Pubkey1;

	fn init(&mut self, _common: &mut StageCommon) -> DataToSend<Self::Message> {
		DataToSend::Broadcast(self.own_message.clone())
	}

	fn process(
		self,
		mut common: StageCommon,
		messages: BTreeMap<PartyId, Self::Message>,
	) -> SigningStageResult<P> {
		let q = P::Scalar::group_order();

		for (id, message) in &messages {
			if !message.homo_pk.is_for_group(q) ||
				!message.proof.verify(PUBKEY_PROOF_CONTEXT, id, &message.share_pub)
			{
				warn!(from_id = id.as_str(), "Invalid public key share");
				return StageResult::Error(SigningFailureReason::InvalidPubkey)
			}
		}

		// The weighted shares must assemble into the key we are asked
		// to sign under
		let aggregate: P = messages.values().map(|message| message.share_pub).sum();
		if aggregate != self.context.public_key {
			warn!("Public key shares do not match the expected key");
			return StageResult::Error(SigningFailureReason::InvalidPubkey)
		}

		debug!("{} is successful", Self::NAME);

		let (homo_pks, share_pubs) = messages
			.into_iter()
			.map(|(id, message)| ((id.clone(), message.homo_pk), (id, message.share_pub)))
			.unzip();

		let processor = EncKStage2::new(&mut common, self.context, homo_pks, share_pubs);
		let stage = BroadcastStage::new(processor, common);

		StageResult::NextStage(Box::new(stage))
	}
}

/// Stage 2: broadcast our encrypted nonce share and commit to
/// `Gamma_i = gamma_i * G`
struct EncKStage2<P: ECPoint> {
	context: SigningContext<P>,
	homo_pks: BTreeMap<PartyId, HomoPublicKey>,
	share_pubs: BTreeMap<PartyId, P>,
	k_i: P::Scalar,
	gamma_i: P::Scalar,
	gamma_salt: CommitmentSalt,
	own_message: EncKData,
}

impl<P: ECPoint> EncKStage2<P> {
	fn new(
		common: &mut StageCommon,
		context: SigningContext<P>,
		homo_pks: BTreeMap<PartyId, HomoPublicKey>,
		share_pubs: BTreeMap<PartyId, P>,
	) -> Self {
		let k_i = P::Scalar::random(&mut common.rng);
		let gamma_i = P::Scalar::random(&mut common.rng);

		let gamma_salt = generate_commitment_salt(&mut common.rng);
		let gamma_commitment =
			generate_hash_commitment(&P::from_scalar(&gamma_i), &gamma_salt);

		let own_pk = context.homo.public_key();
		let (k_cipher, proof) = own_pk.encrypt_with_proof(
			&mut common.rng,
			&common.own_id,
			&k_i.to_biguint(),
			P::Scalar::group_order(),
		);

		let own_message = EncKData { k_cipher, proof, gamma_commitment };

		EncKStage2 { context, homo_pks, share_pubs, k_i, gamma_i, gamma_salt, own_message }
	}
}

derive_display_as_type_name!(EncKStage2<P: ECPoint>);

impl<P: ECPoint> BroadcastStageProcessor<SigningProtocol<P>> for EncKStage2<P> {
	type Message = EncKData;
	const NAME: SigningStageName = SigningStageName::EncK2;

	fn init(&mut self, _common: &mut StageCommon) -> DataToSend<Self::Message> {
		DataToSend::Broadcast(self.own_message.clone())
	}

	fn process(
		self,
		mut common: StageCommon,
		messages: BTreeMap<PartyId, Self::Message>,
	) -> SigningStageResult<P> {
		let q = P::Scalar::group_order();

		for (id, message) in &messages {
			let sender_pk = self.homo_pks.get(id).expect("homo key present for every participant");

			if sender_pk
				.verify_ciphertext_proof(id, &message.k_cipher, &message.proof, q)
				.is_err()
			{
				warn!(from_id = id.as_str(), "Invalid nonce ciphertext proof");
				return StageResult::Error(SigningFailureReason::InvalidCiphertextProof)
			}
		}

		debug!("{} is successful", Self::NAME);

		let (k_ciphers, gamma_commitments) = messages
			.into_iter()
			.map(|(id, message)| ((id.clone(), message.k_cipher), (id, message.gamma_commitment)))
			.unzip();

		let processor = MtaStage3::new(
			&mut common,
			self.context,
			&self.homo_pks,
			self.share_pubs,
			self.k_i,
			self.gamma_i,
			self.gamma_salt,
			gamma_commitments,
			k_ciphers,
		);
		let stage = BroadcastStage::new(processor, common);

		StageResult::NextStage(Box::new(stage))
	}
}

/// Stage 3: respond to every party's encrypted nonce with the two MtA
/// conversions (`k_j * gamma_i` and `k_j * w_i`), then turn the
/// responses we receive into our additive shares `delta_i`, `sigma_i`
struct MtaStage3<P: ECPoint> {
	context: SigningContext<P>,
	share_pubs: BTreeMap<PartyId, P>,
	k_i: P::Scalar,
	gamma_i: P::Scalar,
	gamma_salt: CommitmentSalt,
	gamma_commitments: BTreeMap<PartyId, HashCommitment>,
	k_ciphers: BTreeMap<PartyId, HomoCiphertext>,
	/// Masks we added when responding (negated into our share sums)
	beta_gamma: BTreeMap<PartyId, P::Scalar>,
	beta_w: BTreeMap<PartyId, P::Scalar>,
	outgoing: BTreeMap<PartyId, MtaData<P>>,
}

impl<P: ECPoint> MtaStage3<P> {
	#[allow(clippy::too_many_arguments)]
	fn new(
		common: &mut StageCommon,
		context: SigningContext<P>,
		homo_pks: &BTreeMap<PartyId, HomoPublicKey>,
		share_pubs: BTreeMap<PartyId, P>,
		k_i: P::Scalar,
		gamma_i: P::Scalar,
		gamma_salt: CommitmentSalt,
		gamma_commitments: BTreeMap<PartyId, HashCommitment>,
		k_ciphers: BTreeMap<PartyId, HomoCiphertext>,
	) -> Self {
		let mut beta_gamma = BTreeMap::new();
		let mut beta_w = BTreeMap::new();
		let mut outgoing = BTreeMap::new();

		for (id, k_cipher) in &k_ciphers {
			let recipient_pk = homo_pks.get(id).expect("homo key present for every participant");

			// The ciphertext was verified against this key in the
			// previous stage, so the schemes cannot mismatch
			let (gamma_cipher, gamma_mask, gamma_proof) = recipient_pk
				.mta_response::<P>(&mut common.rng, &common.own_id, k_cipher, &gamma_i, false)
				.expect("scheme verified in the previous stage");

			let (w_cipher, w_mask, w_proof) = recipient_pk
				.mta_response::<P>(&mut common.rng, &common.own_id, k_cipher, &context.w_i, true)
				.expect("scheme verified in the previous stage");

			beta_gamma.insert(id.clone(), gamma_mask);
			beta_w.insert(id.clone(), w_mask);
			outgoing
				.insert(id.clone(), MtaData { gamma_cipher, gamma_proof, w_cipher, w_proof });
		}

		MtaStage3 {
			context,
			share_pubs,
			k_i,
			gamma_i,
			gamma_salt,
			gamma_commitments,
			k_ciphers,
			beta_gamma,
			beta_w,
			outgoing,
		}
	}
}

derive_display_as_type_name!(MtaStage3<P: ECPoint>);

impl<P: ECPoint> BroadcastStageProcessor<SigningProtocol<P>> for MtaStage3<P> {
	type Message = MtaData<P>;
	const NAME: SigningStageName = SigningStageName::Mta3;

	fn init(&mut self, _common: &mut StageCommon) -> DataToSend<Self::Message> {
		DataToSend::Private(self.outgoing.clone())
	}

	fn process(
		self,
		common: StageCommon,
		messages: BTreeMap<PartyId, Self::Message>,
	) -> SigningStageResult<P> {
		let own_pk = self.context.homo.public_key();
		let own_k_cipher =
			self.k_ciphers.get(&common.own_id).expect("own ciphertext present");

		// Responses to our ciphertext decrypt to `k_i * gamma_j + beta`
		// and `k_i * w_j + nu`; subtracting the masks we handed out
		// leaves the additive shares
		let mut delta_i = P::Scalar::zero();
		let mut sigma_i = P::Scalar::zero();

		for (id, message) in &messages {
			let share_pub =
				self.share_pubs.get(id).expect("share pub present for every participant");

			if own_pk
				.verify_mta_response::<P>(
					id,
					own_k_cipher,
					&message.gamma_cipher,
					&message.gamma_proof,
					None,
				)
				.is_err() || own_pk
				.verify_mta_response::<P>(
					id,
					own_k_cipher,
					&message.w_cipher,
					&message.w_proof,
					Some(share_pub),
				)
				.is_err()
			{
				warn!(from_id = id.as_str(), "Invalid MtA response proof");
				return StageResult::Error(SigningFailureReason::InvalidMtaResponse)
			}

			let (alpha, mu) = match (
				self.context.homo.decrypt(&message.gamma_cipher),
				self.context.homo.decrypt(&message.w_cipher),
			) {
				(Ok(alpha), Ok(mu)) => (
					P::Scalar::from_biguint_mod_order(&alpha),
					P::Scalar::from_biguint_mod_order(&mu),
				),
				_ => {
					warn!(from_id = id.as_str(), "Undecryptable MtA response");
					return StageResult::Error(SigningFailureReason::InvalidMtaResponse)
				},
			};

			delta_i = delta_i + alpha;
			sigma_i = sigma_i + mu;
		}

		for mask in self.beta_gamma.values() {
			delta_i = delta_i - mask;
		}
		for mask in self.beta_w.values() {
			sigma_i = sigma_i - mask;
		}

		debug!("{} is successful", Self::NAME);

		let processor = DeltaStage4 {
			context: self.context,
			k_i: self.k_i,
			gamma_i: self.gamma_i,
			gamma_salt: self.gamma_salt,
			gamma_commitments: self.gamma_commitments,
			sigma_i,
			own_message: DeltaData { delta: delta_i },
		};
		let stage = BroadcastStage::new(processor, common);

		StageResult::NextStage(Box::new(stage))
	}
}

/// Stage 4: broadcast `delta_i` and invert the aggregate
struct DeltaStage4<P: ECPoint> {
	context: SigningContext<P>,
	k_i: P::Scalar,
	gamma_i: P::Scalar,
	gamma_salt: CommitmentSalt,
	gamma_commitments: BTreeMap<PartyId, HashCommitment>,
	sigma_i: P::Scalar,
	own_message: DeltaData<P>,
}

derive_display_as_type_name!(DeltaStage4<P: ECPoint>);

impl<P: ECPoint> BroadcastStageProcessor<SigningProtocol<P>> for DeltaStage4<P> {
	type Message = DeltaData<P>;
	const NAME: SigningStageName = SigningStageName::Delta4;

	fn init(&mut self, _common: &mut StageCommon) -> DataToSend<Self::Message> {
		DataToSend::Broadcast(self.own_message.clone())
	}

	fn process(
		self,
		mut common: StageCommon,
		messages: BTreeMap<PartyId, Self::Message>,
	) -> SigningStageResult<P> {
		let delta: P::Scalar = messages.values().map(|message| message.delta.clone()).sum();

		let delta_inv = match delta.invert() {
			Some(delta_inv) => delta_inv,
			None => {
				warn!("Aggregate delta is zero");
				return StageResult::Error(SigningFailureReason::InvalidNonce)
			},
		};

		debug!("{} is successful", Self::NAME);

		let own_message = ProofAiData {
			gamma_pub: P::from_scalar(&self.gamma_i),
			salt: self.gamma_salt,
			proof: SchnorrProof::prove(
				&mut common.rng,
				GAMMA_PROOF_CONTEXT,
				&common.own_id,
				&self.gamma_i,
			),
		};

		let processor = ProofAiStage5 {
			context: self.context,
			k_i: self.k_i,
			sigma_i: self.sigma_i,
			gamma_commitments: self.gamma_commitments,
			delta_inv,
			own_message,
		};
		let stage = BroadcastStage::new(processor, common);

		StageResult::NextStage(Box::new(stage))
	}
}

/// Stage 5: open the `Gamma_i` commitments, assemble the nonce point
/// `R = delta^-1 * sum(Gamma_j)` and derive `r` and our signature share
struct ProofAiStage5<P: ECPoint> {
	context: SigningContext<P>,
	k_i: P::Scalar,
	sigma_i: P::Scalar,
	gamma_commitments: BTreeMap<PartyId, HashCommitment>,
	delta_inv: P::Scalar,
	own_message: ProofAiData<P>,
}

derive_display_as_type_name!(ProofAiStage5<P: ECPoint>);

impl<P: ECPoint> BroadcastStageProcessor<SigningProtocol<P>> for ProofAiStage5<P> {
	type Message = ProofAiData<P>;
	const NAME: SigningStageName = SigningStageName::ProofAi5;

	fn init(&mut self, _common: &mut StageCommon) -> DataToSend<Self::Message> {
		DataToSend::Broadcast(self.own_message.clone())
	}

	fn process(
		self,
		mut common: StageCommon,
		messages: BTreeMap<PartyId, Self::Message>,
	) -> SigningStageResult<P> {
		for (id, message) in &messages {
			let commitment =
				self.gamma_commitments.get(id).expect("commitment present for every participant");

			if !is_valid_hash_commitment(&message.gamma_pub, &message.salt, commitment) {
				warn!(from_id = id.as_str(), "Invalid gamma decommitment");
				return StageResult::Error(SigningFailureReason::InvalidCommitment)
			}

			if !message.proof.verify(GAMMA_PROOF_CONTEXT, id, &message.gamma_pub) {
				warn!(from_id = id.as_str(), "Invalid gamma proof");
				return StageResult::Error(SigningFailureReason::InvalidProof)
			}
		}

		let gamma_aggregate: P = messages.values().map(|message| message.gamma_pub).sum();
		let big_r = gamma_aggregate * &self.delta_inv;

		let r = match big_r.x_as_scalar() {
			Some(r) if r != P::Scalar::zero() => r,
			_ => {
				warn!("Nonce point is unusable");
				return StageResult::Error(SigningFailureReason::InvalidNonce)
			},
		};

		debug!("{} is successful", Self::NAME);

		let s_i = self.context.msg_scalar.clone() * &self.k_i + r.clone() * &self.sigma_i;

		let processor = CommitViAiStage6::new(&mut common, self.context, big_r, r, s_i);
		let stage = BroadcastStage::new(processor, common);

		StageResult::NextStage(Box::new(stage))
	}
}

/// Stage 6: commit to the check values binding our signature share to
/// the nonce
struct CommitViAiStage6<P: ECPoint> {
	context: SigningContext<P>,
	big_r: P,
	r: P::Scalar,
	s_i: P::Scalar,
	l_i: P::Scalar,
	rho_i: P::Scalar,
	v_i: P,
	a_i: P,
	salt: CommitmentSalt,
	own_message: CommitViAiData,
}

impl<P: ECPoint> CommitViAiStage6<P> {
	fn new(
		common: &mut StageCommon,
		context: SigningContext<P>,
		big_r: P,
		r: P::Scalar,
		s_i: P::Scalar,
	) -> Self {
		let l_i = P::Scalar::random(&mut common.rng);
		let rho_i = P::Scalar::random(&mut common.rng);

		let v_i = big_r * &s_i + P::from_scalar(&l_i);
		let a_i = P::from_scalar(&rho_i);

		let salt = generate_commitment_salt(&mut common.rng);
		let own_message =
			CommitViAiData { commitment: generate_hash_commitment(&(v_i, a_i), &salt) };

		CommitViAiStage6 { context, big_r, r, s_i, l_i, rho_i, v_i, a_i, salt, own_message }
	}
}

derive_display_as_type_name!(CommitViAiStage6<P: ECPoint>);

impl<P: ECPoint> BroadcastStageProcessor<SigningProtocol<P>> for CommitViAiStage6<P> {
	type Message = CommitViAiData;
	const NAME: SigningStageName = SigningStageName::CommitViAi6;

	fn init(&mut self, _common: &mut StageCommon) -> DataToSend<Self::Message> {
		DataToSend::Broadcast(self.own_message.clone())
	}

	fn process(
		self,
		mut common: StageCommon,
		messages: BTreeMap<PartyId, Self::Message>,
	) -> SigningStageResult<P> {
		let commitments =
			messages.into_iter().map(|(id, message)| (id, message.commitment)).collect();

		let own_message = DecommitViAiData {
			v: self.v_i,
			a: self.a_i,
			salt: self.salt,
			proof_a: SchnorrProof::prove(
				&mut common.rng,
				AI_PROOF_CONTEXT,
				&common.own_id,
				&self.rho_i,
			),
			proof_v: Dlog2Proof::prove(
				&mut common.rng,
				VI_PROOF_CONTEXT,
				&common.own_id,
				&self.big_r,
				&self.s_i,
				&self.l_i,
			),
		};

		let processor = DecommitViAiStage7 {
			context: self.context,
			big_r: self.big_r,
			r: self.r,
			s_i: self.s_i,
			l_i: self.l_i,
			rho_i: self.rho_i,
			commitments,
			own_message,
		};
		let stage = BroadcastStage::new(processor, common);

		StageResult::NextStage(Box::new(stage))
	}
}

/// Stage 7: open the check value commitments and aggregate them into
/// `V = sum(V_j) - m*G - r*Y` and `A = sum(A_j)`
struct DecommitViAiStage7<P: ECPoint> {
	context: SigningContext<P>,
	big_r: P,
	r: P::Scalar,
	s_i: P::Scalar,
	l_i: P::Scalar,
	rho_i: P::Scalar,
	commitments: BTreeMap<PartyId, HashCommitment>,
	own_message: DecommitViAiData<P>,
}

derive_display_as_type_name!(DecommitViAiStage7<P: ECPoint>);

impl<P: ECPoint> BroadcastStageProcessor<SigningProtocol<P>> for DecommitViAiStage7<P> {
	type Message = DecommitViAiData<P>;
	const NAME: SigningStageName = SigningStageName::DecommitViAi7;

	fn init(&mut self, _common: &mut StageCommon) -> DataToSend<Self::Message> {
		DataToSend::Broadcast(self.own_message.clone())
	}

	fn process(
		self,
		mut common: StageCommon,
		messages: BTreeMap<PartyId, Self::Message>,
	) -> SigningStageResult<P> {
		for (id, message) in &messages {
			let commitment =
				self.commitments.get(id).expect("commitment present for every participant");

			if !is_valid_hash_commitment(&(message.v, message.a), &message.salt, commitment) {
				warn!(from_id = id.as_str(), "Invalid check value decommitment");
				return StageResult::Error(SigningFailureReason::InvalidCommitment)
			}

			if !message.proof_a.verify(AI_PROOF_CONTEXT, id, &message.a) ||
				!message.proof_v.verify(VI_PROOF_CONTEXT, id, &self.big_r, &message.v)
			{
				warn!(from_id = id.as_str(), "Invalid check value proof");
				return StageResult::Error(SigningFailureReason::InvalidProof)
			}
		}

		// If everyone is honest, V is l * G for l the sum of the
		// parties' blinding values (the signature equation cancels out)
		let v_aggregate: P = messages.values().map(|message| message.v).sum();
		let a_aggregate: P = messages.values().map(|message| message.a).sum();

		let v = v_aggregate -
			P::from_scalar(&self.context.msg_scalar) -
			self.context.public_key * &self.r;

		debug!("{} is successful", Self::NAME);

		let processor = CommitUiTiStage8::new(
			&mut common,
			self.context,
			self.r,
			self.s_i,
			self.l_i,
			self.rho_i,
			v,
			a_aggregate,
		);
		let stage = BroadcastStage::new(processor, common);

		StageResult::NextStage(Box::new(stage))
	}
}

/// Stage 8: commit to `(U_i = rho_i * V, T_i = l_i * A)`
struct CommitUiTiStage8<P: ECPoint> {
	context: SigningContext<P>,
	r: P::Scalar,
	s_i: P::Scalar,
	u_i: P,
	t_i: P,
	salt: CommitmentSalt,
	own_message: CommitUiTiData,
}

impl<P: ECPoint> CommitUiTiStage8<P> {
	#[allow(clippy::too_many_arguments)]
	fn new(
		common: &mut StageCommon,
		context: SigningContext<P>,
		r: P::Scalar,
		s_i: P::Scalar,
		l_i: P::Scalar,
		rho_i: P::Scalar,
		v: P,
		a: P,
	) -> Self {
		let u_i = v * &rho_i;
		let t_i = a * &l_i;

		let salt = generate_commitment_salt(&mut common.rng);
		let own_message =
			CommitUiTiData { commitment: generate_hash_commitment(&(u_i, t_i), &salt) };

		CommitUiTiStage8 { context, r, s_i, u_i, t_i, salt, own_message }
	}
}

derive_display_as_type_name!(CommitUiTiStage8<P: ECPoint>);

impl<P: ECPoint> BroadcastStageProcessor<SigningProtocol<P>> for CommitUiTiStage8<P> {
	type Message = CommitUiTiData;
	const NAME: SigningStageName = SigningStageName::CommitUiTi8;

	fn init(&mut self, _common: &mut StageCommon) -> DataToSend<Self::Message> {
		DataToSend::Broadcast(self.own_message.clone())
	}

	fn process(
		self,
		common: StageCommon,
		messages: BTreeMap<PartyId, Self::Message>,
	) -> SigningStageResult<P> {
		let commitments =
			messages.into_iter().map(|(id, message)| (id, message.commitment)).collect();

		let processor = DecommitUiTiStage9 {
			context: self.context,
			r: self.r,
			s_i: self.s_i,
			commitments,
			own_message: DecommitUiTiData { u: self.u_i, t: self.t_i, salt: self.salt },
		};
		let stage = BroadcastStage::new(processor, common);

		StageResult::NextStage(Box::new(stage))
	}
}

/// Stage 9: open and verify the consistency values; abort unless the
/// `U_i` and `T_i` aggregate to the same point
struct DecommitUiTiStage9<P: ECPoint> {
	context: SigningContext<P>,
	r: P::Scalar,
	s_i: P::Scalar,
	commitments: BTreeMap<PartyId, HashCommitment>,
	own_message: DecommitUiTiData<P>,
}

derive_display_as_type_name!(DecommitUiTiStage9<P: ECPoint>);

impl<P: ECPoint> BroadcastStageProcessor<SigningProtocol<P>> for DecommitUiTiStage9<P> {
	type Message = DecommitUiTiData<P>;
	const NAME: SigningStageName = SigningStageName::DecommitUiTi9;

	fn init(&mut self, _common: &mut StageCommon) -> DataToSend<Self::Message> {
		DataToSend::Broadcast(self.own_message.clone())
	}

	fn process(
		self,
		common: StageCommon,
		messages: BTreeMap<PartyId, Self::Message>,
	) -> SigningStageResult<P> {
		for (id, message) in &messages {
			let commitment =
				self.commitments.get(id).expect("commitment present for every participant");

			if !is_valid_hash_commitment(&(message.u, message.t), &message.salt, commitment) {
				warn!(from_id = id.as_str(), "Invalid consistency decommitment");
				return StageResult::Error(SigningFailureReason::InvalidCommitment)
			}
		}

		let u_aggregate: P = messages.values().map(|message| message.u).sum();
		let t_aggregate: P = messages.values().map(|message| message.t).sum();

		// Equality here means the signature shares are consistent with
		// the nonce and key shares everyone committed to
		if u_aggregate != t_aggregate {
			warn!("Consistency check failed");
			return StageResult::Error(SigningFailureReason::FailedConsistencyCheck)
		}

		debug!("{} is successful", Self::NAME);

		let processor = SiStage10 {
			context: self.context,
			r: self.r,
			own_message: SiData { s: self.s_i },
		};
		let stage = BroadcastStage::new(processor, common);

		StageResult::NextStage(Box::new(stage))
	}
}

/// Stage 10 (terminal): combine the signature shares, normalize to
/// low-s and verify the result as a standard ECDSA signature
struct SiStage10<P: ECPoint> {
	context: SigningContext<P>,
	r: P::Scalar,
	own_message: SiData<P>,
}

derive_display_as_type_name!(SiStage10<P: ECPoint>);

impl<P: ECPoint> BroadcastStageProcessor<SigningProtocol<P>> for SiStage10<P> {
	type Message = SiData<P>;
	const NAME: SigningStageName = SigningStageName::Si10;

	fn init(&mut self, _common: &mut StageCommon) -> DataToSend<Self::Message> {
		DataToSend::Broadcast(self.own_message.clone())
	}

	fn process(
		self,
		_common: StageCommon,
		messages: BTreeMap<PartyId, Self::Message>,
	) -> SigningStageResult<P> {
		let s: P::Scalar = messages.values().map(|message| message.s.clone()).sum();
		let s = signing_detail::normalize_s::<P>(s);

		if !signing_detail::verify_ecdsa(
			&self.context.public_key,
			&self.context.msg_scalar,
			&self.r,
			&s,
		) {
			warn!("Aggregate signature failed verification");
			return StageResult::Error(SigningFailureReason::InvalidSignature)
		}

		debug!("{} is successful", Self::NAME);

		StageResult::Done(Signature { r: self.r, s })
	}
}
