//! The generic message-driven runtime shared by DKG and signing: a
//! protocol instance owns the current stage of a handler chain, feeds it
//! inbound messages, and advances to the stage it returns once a round
//! is complete.

#[macro_use]
mod utils;

pub mod broadcast;
mod runner;
mod stage;

pub use broadcast::{BroadcastStage, BroadcastStageProcessor, DataToSend};
pub use runner::ProtocolRunner;
pub use stage::{ProcessMessageResult, Protocol, ProtocolStage, StageCommon, StageResult};

/// Lifecycle of a protocol instance. Transitions are one-way: once an
/// instance is `Done` or `Failed` it is immutable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolState {
	Init,
	Done,
	Failed,
}

impl std::fmt::Display for ProtocolState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ProtocolState::Init => write!(f, "Init"),
			ProtocolState::Done => write!(f, "Done"),
			ProtocolState::Failed => write!(f, "Failed"),
		}
	}
}
