use std::{collections::BTreeSet, fmt::Debug, fmt::Display, sync::Arc};

use crate::{
	crypto::{ECPoint, Rng},
	p2p::{PartyId, PeerManager, TssData},
};

/// Static description of a protocol (DKG or signing): its wire data,
/// terminal output, failure reasons and stage names
pub trait Protocol: 'static {
	type Point: ECPoint;
	type Data: Clone + Display + Send + Sync;
	type Output: Clone + Send;
	type FailureReason: Display + Debug + PartialEq + Send;
	type StageName: Display + PartialEq + Eq + Copy + Send;

	/// Wrap protocol data into the wire envelope variant
	fn wrap_data(data: Self::Data) -> TssData<Self::Point>;

	/// Whether a message that is not expected by the given stage should
	/// be buffered for the next stage (as opposed to dropped)
	fn should_delay(stage: Self::StageName, data: &Self::Data) -> bool;
}

/// Outcome of a protocol stage
pub enum StageResult<P: Protocol> {
	/// Protocol proceeds to the next stage
	NextStage(Box<dyn ProtocolStage<P>>),
	/// Protocol aborted; any verification failure is fatal for the
	/// whole instance
	Error(P::FailureReason),
	/// Protocol finished successfully
	Done(P::Output),
}

/// The result of processing a message for a stage from a single party
/// (indicates whether we are ready to finalize the stage)
pub enum ProcessMessageResult {
	/// No further messages are expected for the current stage
	Ready,
	/// Should wait for more messages
	NotReady,
}

/// Defines actions that any given stage of a protocol should be able to
/// perform
pub trait ProtocolStage<P: Protocol>: Send {
	/// Perform initial computation for this stage (and initiate
	/// communication with other parties)
	fn init(&mut self) -> ProcessMessageResult;

	/// Process a message from the given party. Precondition: the sender
	/// is a participant of this protocol instance.
	fn process_message(&mut self, sender_id: &PartyId, data: P::Data) -> ProcessMessageResult;

	/// Verify the data collected for this stage; either abort, finish,
	/// or hand over to the next stage
	fn finalize(self: Box<Self>) -> StageResult<P>;

	/// Parties we haven't heard from for the current stage
	fn awaited_parties(&self) -> BTreeSet<PartyId>;

	fn get_stage_name(&self) -> P::StageName;

	fn common(&self) -> &StageCommon;
}

/// Data useful during any stage of a protocol instance. Moved (not
/// cloned) from stage to stage so that e.g. the RNG never forks.
pub struct StageCommon {
	/// Our own party id
	pub own_id: PartyId,
	/// Ids of all parties participating in the protocol (including us)
	pub all_ids: BTreeSet<PartyId>,
	pub peer_manager: Arc<dyn PeerManager>,
	pub rng: Rng,
}

impl StageCommon {
	pub fn is_participant(&self, id: &PartyId) -> bool {
		self.all_ids.contains(id)
	}
}
