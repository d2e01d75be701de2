use serde::{Deserialize, Serialize};

use crate::{
	crypto::{
		commitment::{CommitmentSalt, HashCommitment},
		proofs::{Dlog2Proof, SchnorrProof},
		ECPoint,
	},
	homo::{CiphertextProof, HomoCiphertext, HomoPublicKey, MtaProof},
};

/// Data sent between parties over p2p for a signing ceremony. The ten
/// variants correspond one-to-one to the ten stages of the protocol.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SigningData<P: ECPoint> {
	#[serde(bound = "")]
	Pubkey(PubkeyData<P>),
	EncK(EncKData),
	#[serde(bound = "")]
	Mta(MtaData<P>),
	#[serde(bound = "")]
	Delta(DeltaData<P>),
	#[serde(bound = "")]
	ProofAi(ProofAiData<P>),
	CommitViAi(CommitViAiData),
	#[serde(bound = "")]
	DecommitViAi(DecommitViAiData<P>),
	CommitUiTi(CommitUiTiData),
	#[serde(bound = "")]
	DecommitUiTi(DecommitUiTiData<P>),
	#[serde(bound = "")]
	Si(SiData<P>),
}

impl<P: ECPoint> std::fmt::Display for SigningData<P> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let inner = match self {
			SigningData::Pubkey(inner) => inner.to_string(),
			SigningData::EncK(inner) => inner.to_string(),
			SigningData::Mta(inner) => inner.to_string(),
			SigningData::Delta(inner) => inner.to_string(),
			SigningData::ProofAi(inner) => inner.to_string(),
			SigningData::CommitViAi(inner) => inner.to_string(),
			SigningData::DecommitViAi(inner) => inner.to_string(),
			SigningData::CommitUiTi(inner) => inner.to_string(),
			SigningData::DecommitUiTi(inner) => inner.to_string(),
			SigningData::Si(inner) => inner.to_string(),
		};
		write!(f, "SigningData({inner})")
	}
}

/// Stage 1: our homomorphic encryption key and weighted public key
/// share `W_i = w_i * G` with a proof of knowledge of `w_i`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PubkeyData<P: ECPoint> {
	pub homo_pk: HomoPublicKey,
	#[serde(bound = "")]
	pub share_pub: P,
	#[serde(bound = "")]
	pub proof: SchnorrProof<P>,
}

/// Stage 2: our nonce share encrypted under our own key (with a
/// plaintext knowledge proof) and a hash commitment to
/// `Gamma_i = gamma_i * G`, opened in stage 5
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncKData {
	pub k_cipher: HomoCiphertext,
	pub proof: CiphertextProof,
	pub gamma_commitment: HashCommitment,
}

/// Stage 3 (private): MtA responses converting the sender's `k` times
/// our `gamma` and our `w` into additive shares. The `w` response proof
/// is bound to our public key share from stage 1.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MtaData<P: ECPoint> {
	pub gamma_cipher: HomoCiphertext,
	#[serde(bound = "")]
	pub gamma_proof: MtaProof<P>,
	pub w_cipher: HomoCiphertext,
	#[serde(bound = "")]
	pub w_proof: MtaProof<P>,
}

/// Stage 4: our additive share of `k * gamma`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeltaData<P: ECPoint> {
	#[serde(bound = "")]
	pub delta: P::Scalar,
}

/// Stage 5: opening of the stage-2 commitment to `Gamma_i`, with a
/// proof of knowledge of `gamma_i`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProofAiData<P: ECPoint> {
	#[serde(bound = "")]
	pub gamma_pub: P,
	pub salt: CommitmentSalt,
	#[serde(bound = "")]
	pub proof: SchnorrProof<P>,
}

/// Stage 6: hash commitment to the check values
/// `(V_i = s_i * R + l_i * G, A_i = rho_i * G)`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitViAiData {
	pub commitment: HashCommitment,
}

/// Stage 7: opening of the stage-6 commitment, with proofs of knowledge
/// of `rho_i` (for `A_i`) and of `(s_i, l_i)` (for `V_i` over bases
/// `(R, G)`)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecommitViAiData<P: ECPoint> {
	#[serde(bound = "")]
	pub v: P,
	#[serde(bound = "")]
	pub a: P,
	pub salt: CommitmentSalt,
	#[serde(bound = "")]
	pub proof_a: SchnorrProof<P>,
	#[serde(bound = "")]
	pub proof_v: Dlog2Proof<P>,
}

/// Stage 8: hash commitment to `(U_i = rho_i * V, T_i = l_i * A)`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitUiTiData {
	pub commitment: HashCommitment,
}

/// Stage 9: opening of the stage-8 commitment; the protocol aborts
/// unless the `U_i` and `T_i` sum to the same point
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecommitUiTiData<P: ECPoint> {
	#[serde(bound = "")]
	pub u: P,
	#[serde(bound = "")]
	pub t: P,
	pub salt: CommitmentSalt,
}

/// Stage 10: our additive signature share `s_i = m * k_i + r * sigma_i`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiData<P: ECPoint> {
	#[serde(bound = "")]
	pub s: P::Scalar,
}

derive_impls_for_enum_variants!(impl<P: ECPoint> for PubkeyData<P>, SigningData::Pubkey, SigningData<P>);
derive_impls_for_enum_variants!(impl<P: ECPoint> for EncKData, SigningData::EncK, SigningData<P>);
derive_impls_for_enum_variants!(impl<P: ECPoint> for MtaData<P>, SigningData::Mta, SigningData<P>);
derive_impls_for_enum_variants!(impl<P: ECPoint> for DeltaData<P>, SigningData::Delta, SigningData<P>);
derive_impls_for_enum_variants!(impl<P: ECPoint> for ProofAiData<P>, SigningData::ProofAi, SigningData<P>);
derive_impls_for_enum_variants!(impl<P: ECPoint> for CommitViAiData, SigningData::CommitViAi, SigningData<P>);
derive_impls_for_enum_variants!(impl<P: ECPoint> for DecommitViAiData<P>, SigningData::DecommitViAi, SigningData<P>);
derive_impls_for_enum_variants!(impl<P: ECPoint> for CommitUiTiData, SigningData::CommitUiTi, SigningData<P>);
derive_impls_for_enum_variants!(impl<P: ECPoint> for DecommitUiTiData<P>, SigningData::DecommitUiTi, SigningData<P>);
derive_impls_for_enum_variants!(impl<P: ECPoint> for SiData<P>, SigningData::Si, SigningData<P>);

derive_display_as_type_name!(PubkeyData<P: ECPoint>);
derive_display_as_type_name!(EncKData);
derive_display_as_type_name!(MtaData<P: ECPoint>);
derive_display_as_type_name!(DeltaData<P: ECPoint>);
derive_display_as_type_name!(ProofAiData<P: ECPoint>);
derive_display_as_type_name!(CommitViAiData);
derive_display_as_type_name!(DecommitViAiData<P: ECPoint>);
derive_display_as_type_name!(CommitUiTiData);
derive_display_as_type_name!(DecommitUiTiData<P: ECPoint>);
derive_display_as_type_name!(SiData<P: ECPoint>);
