//! In-memory test network: parties exchange serialized messages through
//! a shared queue, so sends never re-enter a runner and delivery order
//! follows real broadcast order.

use std::{
	collections::{BTreeMap, BTreeSet, VecDeque},
	sync::{Arc, Mutex},
};

use rand::SeedableRng;

use crate::{
	crypto::Rng,
	dkg::{Dkg, DkgResult},
	p2p::{deserialize_message, PartyId, PeerManager, StateChangedListener, TssMessage},
	protocol::ProtocolState,
};

pub type Point = crate::crypto::secp256k1::Point;
pub type Scalar = crate::crypto::secp256k1::Scalar;

type Outbox = Arc<Mutex<VecDeque<(PartyId, Vec<u8>)>>>;

pub fn get_id(index: usize) -> PartyId {
	format!("id-{index}")
}

pub struct Network {
	pub ids: Vec<PartyId>,
	outbox: Outbox,
}

impl Network {
	pub fn new(party_count: usize) -> Self {
		Self::with_ids((0..party_count).map(get_id).collect())
	}

	pub fn with_ids(ids: Vec<PartyId>) -> Self {
		Network { ids, outbox: Default::default() }
	}

	pub fn peer_manager(&self, own_id: &PartyId) -> Arc<dyn PeerManager> {
		Arc::new(QueuePeerManager {
			own_id: own_id.clone(),
			all_ids: self.ids.iter().cloned().collect(),
			outbox: self.outbox.clone(),
		})
	}

	/// Deliver queued messages (including any that get queued as a
	/// result) until the network is quiet
	pub fn pump(&self, mut deliver: impl FnMut(&PartyId, TssMessage<Point>)) {
		loop {
			let next = self.outbox.lock().unwrap().pop_front();
			match next {
				Some((to, bytes)) => {
					let message = deserialize_message(&bytes).expect("valid message");
					deliver(&to, message);
				},
				None => return,
			}
		}
	}
}

struct QueuePeerManager {
	own_id: PartyId,
	all_ids: BTreeSet<PartyId>,
	outbox: Outbox,
}

impl PeerManager for QueuePeerManager {
	fn num_peers(&self) -> u32 {
		(self.all_ids.len() - 1) as u32
	}

	fn self_id(&self) -> PartyId {
		self.own_id.clone()
	}

	fn peer_ids(&self) -> BTreeSet<PartyId> {
		self.all_ids.iter().filter(|id| **id != self.own_id).cloned().collect()
	}

	fn must_send(&self, id: &PartyId, message: Vec<u8>) {
		self.outbox.lock().unwrap().push_back((id.clone(), message));
	}
}

/// Records state transitions so tests can assert the listener contract
/// (exactly one Init -> Done or Init -> Failed notification)
#[derive(Clone, Default)]
pub struct RecordingListener {
	transitions: Arc<Mutex<Vec<(ProtocolState, ProtocolState)>>>,
}

impl RecordingListener {
	pub fn transitions(&self) -> Vec<(ProtocolState, ProtocolState)> {
		self.transitions.lock().unwrap().clone()
	}
}

impl StateChangedListener for RecordingListener {
	fn on_state_changed(&self, from: ProtocolState, to: ProtocolState) {
		self.transitions.lock().unwrap().push((from, to));
	}
}

pub fn seeded_rng(seed: u8) -> Rng {
	Rng::from_seed([seed; 32])
}

/// Run a full DKG among `ranks.len()` parties and return every party's
/// result
pub fn run_dkg(
	threshold: u32,
	ranks: &[u32],
	seed_offset: u8,
) -> BTreeMap<PartyId, DkgResult<Point>> {
	let network = Network::new(ranks.len());

	let mut parties: BTreeMap<PartyId, Dkg<Point>> = network
		.ids
		.iter()
		.zip(ranks)
		.enumerate()
		.map(|(index, (id, rank))| {
			let dkg = Dkg::new(
				network.peer_manager(id),
				threshold,
				*rank,
				Box::new(RecordingListener::default()),
				seeded_rng(seed_offset + index as u8),
			)
			.unwrap();
			(id.clone(), dkg)
		})
		.collect();

	for dkg in parties.values_mut() {
		dkg.start();
	}

	network.pump(|to, message| {
		// A party that finished early rejects further messages; that is
		// fine on a broadcast network
		let _ = parties.get_mut(to).unwrap().add_message(message);
	});

	parties
		.into_iter()
		.map(|(id, dkg)| {
			assert_eq!(dkg.get_state(), ProtocolState::Done, "DKG did not complete for {id}");
			let result = dkg.get_result().unwrap();
			(id, result)
		})
		.collect()
}
