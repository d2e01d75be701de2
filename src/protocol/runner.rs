use std::collections::{btree_map, BTreeMap};

use tracing::{debug, warn};

use super::{
	stage::{ProcessMessageResult, Protocol, ProtocolStage, StageResult},
	ProtocolState,
};
use crate::{
	p2p::{PartyId, StateChangedListener},
	Error,
};

/// Owns the current stage of a protocol instance and drives it to
/// completion. All progress is made from sequential `add_message` calls;
/// the runner spawns no workers and never blocks.
pub struct ProtocolRunner<P: Protocol> {
	stage: Option<Box<dyn ProtocolStage<P>>>,
	// Note that because we use a map here, the number of messages
	// that can be delayed from any one party is limited to one per stage.
	delayed_messages: BTreeMap<PartyId, P::Data>,
	/// Messages are only processed once the embedder has called
	/// `start`; until then they are buffered
	started: bool,
	state: ProtocolState,
	result: Option<Result<P::Output, P::FailureReason>>,
	listener: Box<dyn StateChangedListener>,
}

impl<P: Protocol> ProtocolRunner<P> {
	pub fn new(
		initial_stage: Box<dyn ProtocolStage<P>>,
		listener: Box<dyn StateChangedListener>,
	) -> Self {
		ProtocolRunner {
			stage: Some(initial_stage),
			delayed_messages: Default::default(),
			started: false,
			state: ProtocolState::Init,
			result: None,
			listener,
		}
	}

	/// Run the first stage's broadcast and process any messages that
	/// arrived before we were ready. Idempotent.
	pub fn start(&mut self) {
		if self.started || self.state != ProtocolState::Init {
			return
		}
		self.started = true;

		let stage = self.stage.as_mut().expect("initial stage must be present");
		if let ProcessMessageResult::Ready = stage.init() {
			self.finalize_current_stage();
		} else {
			self.process_delayed();
		}
	}

	/// Feed an inbound message into the instance. Returns an error once
	/// the instance has completed (successfully or not); duplicate and
	/// unexpected messages are dropped with a warning instead.
	pub fn add_message(&mut self, sender_id: PartyId, data: P::Data) -> Result<(), Error> {
		if self.state != ProtocolState::Init {
			return Err(Error::NotReady)
		}

		if !self.started {
			self.add_delayed(sender_id, data);
			return Ok(())
		}

		self.deliver(sender_id, data);
		Ok(())
	}

	fn deliver(&mut self, sender_id: PartyId, data: P::Data) {
		if self.state != ProtocolState::Init {
			return
		}

		let stage = match self.stage.as_mut() {
			Some(stage) => stage,
			// Stopped instance
			None => return,
		};

		if !stage.common().is_participant(&sender_id) {
			warn!(from_id = sender_id.as_str(), "Ignoring a message from non-participant");
			return
		}

		// Check if we should delay this message for the next stage to use
		if P::should_delay(stage.get_stage_name(), &data) {
			self.add_delayed(sender_id, data);
			return
		}

		if let ProcessMessageResult::Ready = stage.process_message(&sender_id, data) {
			self.finalize_current_stage();
		}
	}

	fn finalize_current_stage(&mut self) {
		loop {
			let stage = self.stage.take().expect("must have stage to finalize");

			match stage.finalize() {
				StageResult::NextStage(mut next_stage) => {
					debug!("Protocol transitions to {}", next_stage.get_stage_name());

					let single_party_result = next_stage.init();
					self.stage = Some(next_stage);

					if let ProcessMessageResult::Ready = single_party_result {
						continue
					}

					// Process any messages that arrived one stage early
					self.process_delayed();
					return
				},
				StageResult::Error(reason) => {
					warn!("Protocol failed: {reason}");
					self.result = Some(Err(reason));
					self.transition(ProtocolState::Failed);
					return
				},
				StageResult::Done(output) => {
					debug!("Protocol reached the final stage!");
					self.result = Some(Ok(output));
					self.transition(ProtocolState::Done);
					return
				},
			}
		}
	}

	/// Process previously delayed messages (which arrived one stage too
	/// early)
	fn process_delayed(&mut self) {
		let messages = std::mem::take(&mut self.delayed_messages);

		for (id, message) in messages {
			if self.state != ProtocolState::Init {
				return
			}
			debug!(from_id = id.as_str(), "Processing delayed message {message}");
			self.deliver(id, message);
		}
	}

	/// Delay message to be processed in the next stage
	fn add_delayed(&mut self, id: PartyId, message: P::Data) {
		match self.delayed_messages.entry(id) {
			btree_map::Entry::Occupied(entry) => {
				warn!(
					from_id = entry.key().as_str(),
					"Ignoring a redundant delayed message",
				);
			},
			btree_map::Entry::Vacant(entry) => {
				debug!(from_id = entry.key().as_str(), "Delaying message {message}");
				entry.insert(message);
			},
		}
	}

	fn transition(&mut self, to: ProtocolState) {
		let from = self.state;
		self.state = to;
		self.stage = None;
		self.delayed_messages.clear();
		self.listener.on_state_changed(from, to);
	}

	/// Cancel any pending work and release stage state. Idempotent; the
	/// terminal state (and result, if any) is retained.
	pub fn stop(&mut self) {
		self.stage = None;
		self.delayed_messages.clear();
	}

	pub fn get_state(&self) -> ProtocolState {
		self.state
	}

	/// Name of the stage currently collecting messages (`None` once the
	/// instance has completed or was stopped)
	pub fn current_stage(&self) -> Option<P::StageName> {
		self.stage.as_ref().map(|stage| stage.get_stage_name())
	}

	/// The protocol output. `Error::NotReady` unless the instance is
	/// `Done`; repeated calls return the same value.
	pub fn get_result(&self) -> Result<P::Output, Error> {
		match (self.state, &self.result) {
			(ProtocolState::Done, Some(Ok(output))) => Ok(output.clone()),
			_ => Err(Error::NotReady),
		}
	}

	/// Why the instance failed, when it has
	pub fn failure_reason(&self) -> Option<&P::FailureReason> {
		match &self.result {
			Some(Err(reason)) => Some(reason),
			_ => None,
		}
	}
}
