//! Threshold ECDSA key generation and signing.
//!
//! A group of `n` mutually distrusting parties jointly generates an ECDSA
//! keypair ([`dkg::Dkg`]) such that no party ever learns the full private
//! key, and any `t` of them can later produce a standard ECDSA signature
//! ([`signing::Signer`]) using homomorphic MtA share conversion.
//!
//! Both protocols run on the same message-driven stage machine: the
//! embedder delivers inbound messages via `add_message` and provides a
//! [`p2p::PeerManager`] for outbound delivery; each stage collects one
//! message per counterparty and, once complete, verifies the round and
//! hands over to its successor.

#[macro_use]
pub mod crypto;
#[macro_use]
pub mod protocol;

pub mod dkg;
pub mod homo;
pub mod p2p;
pub mod signing;

#[cfg(test)]
mod helpers;
#[cfg(test)]
mod integration_tests;

pub use crypto::Rng;
pub use p2p::{PartyId, PeerManager, StateChangedListener, TssData, TssMessage};
pub use protocol::ProtocolState;

use thiserror::Error;

/// Errors reported by protocol constructors and accessors. Verification
/// failures during a run are not reported here: they transition the
/// instance to [`ProtocolState::Failed`] with a protocol-specific
/// failure reason instead.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
	/// The protocol has not (successfully) completed
	#[error("result is not ready")]
	NotReady,
	#[error("invalid threshold {threshold} for {share_count} parties")]
	InvalidThreshold { threshold: u32, share_count: u32 },
	#[error("invalid birkhoff parameters: {0}")]
	InvalidBks(#[from] crypto::birkhoff::BkError),
	/// The signer requires a birkhoff parameter for every participant,
	/// including our own
	#[error("missing birkhoff parameter for party {0}")]
	MissingBk(PartyId),
	#[error("peer manager reported an inconsistent peer set")]
	InconsistentPeers,
	#[error("paillier modulus must be at least {min} bits, got {got}")]
	PaillierModulusTooSmall { min: usize, got: usize },
	#[error("homomorphic scheme mismatch")]
	HomoSchemeMismatch,
	#[error("homomorphic cipher error: {0}")]
	HomoCipher(String),
}
