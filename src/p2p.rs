use serde::{Deserialize, Serialize};

use crate::{
	crypto::ECPoint,
	dkg::DkgData,
	protocol::ProtocolState,
	signing::SigningData,
};

/// Stable identifier of a party, as reported by the embedder's peer
/// manager
pub type PartyId = String;

pub type ProtocolVersion = u16;

/// Currently active wire protocol version
pub const CURRENT_PROTOCOL_VERSION: ProtocolVersion = 1;

/// Data sent between parties over p2p. The enum variant order of
/// [`TssData`] and its inner message enums is a stable wire constant:
/// never reorder or renumber variants.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TssMessage<P: ECPoint> {
	pub id: PartyId,
	#[serde(bound = "")]
	pub data: TssData<P>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TssData<P: ECPoint> {
	#[serde(bound = "")]
	Dkg(DkgData<P>),
	#[serde(bound = "")]
	Signing(SigningData<P>),
}

impl<P: ECPoint> std::fmt::Display for TssData<P> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			TssData::Dkg(inner) => write!(f, "{inner}"),
			TssData::Signing(inner) => write!(f, "{inner}"),
		}
	}
}

pub fn serialize_for_version<P: ECPoint>(
	message: &TssMessage<P>,
	version: ProtocolVersion,
) -> Vec<u8> {
	match version {
		1 => bincode::serialize(message).expect("serialization can't fail"),
		_ => panic!("Unsupported protocol version"),
	}
}

pub fn deserialize_message<P: ECPoint>(bytes: &[u8]) -> anyhow::Result<TssMessage<P>> {
	Ok(bincode::deserialize(bytes)?)
}

/// The transport collaborator provided by the embedder.
///
/// `must_send` is best-effort: the core never retries, and protocol
/// liveness on a lossy transport is the embedder's concern. It must be
/// safe to call concurrently from independent protocol instances and
/// must not deliver messages back into `add_message` synchronously from
/// within the call (instances are driven sequentially).
pub trait PeerManager: Send + Sync {
	/// Count of remote peers (not including self)
	fn num_peers(&self) -> u32;

	fn self_id(&self) -> PartyId;

	/// Ids of all remote peers (not including self); must be consistent
	/// with `num_peers`
	fn peer_ids(&self) -> std::collections::BTreeSet<PartyId>;

	/// Deliver a serialized [`TssMessage`] to the named peer
	fn must_send(&self, id: &PartyId, message: Vec<u8>);
}

/// Notified exactly once per protocol instance, on the Init -> Done or
/// Init -> Failed transition
pub trait StateChangedListener: Send {
	fn on_state_changed(&self, from: ProtocolState, to: ProtocolState);
}
