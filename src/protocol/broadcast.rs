use std::{
	collections::{btree_map, BTreeMap, BTreeSet},
	fmt::Display,
};

use tracing::warn;

use super::stage::{
	ProcessMessageResult, Protocol, ProtocolStage, StageCommon, StageResult,
};
use crate::p2p::{serialize_for_version, PartyId, TssMessage, CURRENT_PROTOCOL_VERSION};

/// Used by individual stages to distinguish between a public message
/// that should be broadcast to everyone and secret messages that should
/// be delivered to different parties in private
pub enum DataToSend<T> {
	Broadcast(T),
	Private(BTreeMap<PartyId, T>),
}

/// Abstracts away computations performed during every "broadcast" stage
/// of a protocol
pub trait BroadcastStageProcessor<P: Protocol>: Display + Send {
	/// The specific variant of P::Data shared between parties during
	/// this stage
	type Message: Clone + Into<P::Data> + TryFrom<P::Data, Error = P::Data> + Send;

	/// Unique stage name used for logging and delay routing
	const NAME: P::StageName;

	/// Init the stage, returning the data to send. A `Private` map must
	/// include the message to self.
	fn init(&mut self, common: &mut StageCommon) -> DataToSend<Self::Message>;

	/// Determines how the data for this stage should be processed once
	/// it has been received from all parties
	fn process(
		self,
		common: StageCommon,
		messages: BTreeMap<PartyId, Self::Message>,
	) -> StageResult<P>;
}

/// Responsible for sending/collecting of stage data, delegating the
/// actual processing to `Stage`
pub struct BroadcastStage<P: Protocol, Stage>
where
	Stage: BroadcastStageProcessor<P>,
{
	common: StageCommon,
	/// Messages collected so far
	messages: BTreeMap<PartyId, Stage::Message>,
	/// Determines the actual computations before/after the data is
	/// collected
	processor: Stage,
}

impl<P: Protocol, Stage> BroadcastStage<P, Stage>
where
	Stage: BroadcastStageProcessor<P>,
{
	pub fn new(processor: Stage, common: StageCommon) -> Self {
		BroadcastStage { common, messages: BTreeMap::new(), processor }
	}
}

impl<P: Protocol, Stage> Display for BroadcastStage<P, Stage>
where
	Stage: BroadcastStageProcessor<P>,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "BroadcastStage({})", &self.processor)
	}
}

impl<P: Protocol, Stage> ProtocolStage<P> for BroadcastStage<P, Stage>
where
	Stage: BroadcastStageProcessor<P> + Send,
{
	fn init(&mut self) -> ProcessMessageResult {
		let (own_message, outgoing_messages) = match self.processor.init(&mut self.common) {
			DataToSend::Broadcast(stage_data) => {
				let recipients: Vec<_> = self
					.common
					.all_ids
					.iter()
					.filter(|id| **id != self.common.own_id)
					.cloned()
					.collect();
				(
					stage_data.clone(),
					recipients
						.into_iter()
						.map(|id| (id, stage_data.clone()))
						.collect::<Vec<_>>(),
				)
			},
			DataToSend::Private(mut messages) => {
				let own_message =
					messages.remove(&self.common.own_id).expect("Must include message to self");
				(own_message, messages.into_iter().collect())
			},
		};

		for (id, stage_data) in outgoing_messages {
			let message = TssMessage {
				id: self.common.own_id.clone(),
				data: P::wrap_data(stage_data.into()),
			};
			self.common
				.peer_manager
				.must_send(&id, serialize_for_version(&message, CURRENT_PROTOCOL_VERSION));
		}

		// Save our own share
		let own_id = self.common.own_id.clone();
		self.process_message(&own_id, own_message.into())
	}

	fn process_message(&mut self, sender_id: &PartyId, data: P::Data) -> ProcessMessageResult {
		let message: Stage::Message = match data.try_into() {
			Ok(message) => message,
			Err(incorrect_type) => {
				warn!(
					from_id = sender_id.as_str(),
					"Ignoring unexpected message {incorrect_type} while in stage {self}",
				);
				return ProcessMessageResult::NotReady
			},
		};

		if !self.common.is_participant(sender_id) {
			warn!(
				from_id = sender_id.as_str(),
				"Ignoring a message from non-participant for stage {self}",
			);
			return ProcessMessageResult::NotReady
		}

		match self.messages.entry(sender_id.clone()) {
			btree_map::Entry::Occupied(_) => {
				warn!(
					from_id = sender_id.as_str(),
					"Ignoring a redundant message for stage {self}",
				);
				ProcessMessageResult::NotReady
			},
			btree_map::Entry::Vacant(entry) => {
				entry.insert(message);

				if self.messages.len() == self.common.all_ids.len() {
					ProcessMessageResult::Ready
				} else {
					ProcessMessageResult::NotReady
				}
			},
		}
	}

	fn finalize(self: Box<Self>) -> StageResult<P> {
		let stage = *self;
		stage.processor.process(stage.common, stage.messages)
	}

	fn awaited_parties(&self) -> BTreeSet<PartyId> {
		self.common
			.all_ids
			.iter()
			.filter(|id| !self.messages.contains_key(*id))
			.cloned()
			.collect()
	}

	fn get_stage_name(&self) -> P::StageName {
		Stage::NAME
	}

	fn common(&self) -> &StageCommon {
		&self.common
	}
}
