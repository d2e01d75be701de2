use std::collections::BTreeMap;

use itertools::Itertools;

use super::*;
use crate::{
	crypto::{birkhoff, ECPoint},
	helpers::{get_id, run_dkg, seeded_rng, Network, Point, RecordingListener, Scalar},
	p2p::TssData,
};

/// Interpolate the secret from a subset of shares and check it against
/// the joint public key (no party can do this for real; the test is the
/// dealer)
fn assert_shares_interpolate(
	results: &BTreeMap<crate::PartyId, DkgResult<Point>>,
	subset: &[&crate::PartyId],
	threshold: u32,
) {
	let any = results.values().next().unwrap();

	let bks: Vec<_> = subset.iter().map(|id| &any.bks[*id]).collect();
	let coefficients = birkhoff::compute_coefficients(&bks, threshold).unwrap();

	let secret: Scalar = coefficients
		.into_iter()
		.zip(subset)
		.map(|(c, id)| c * &results[*id].share)
		.sum();

	assert_eq!(Point::from_scalar(&secret), any.public_key);
}

#[test]
fn basic_dkg_with_zero_ranks() {
	let threshold = 3;
	let results = run_dkg(threshold, &[0, 0, 0], 40);

	// Public key and bks must be deep-equal across parties
	let any = results.values().next().unwrap();
	for result in results.values() {
		assert_eq!(result.public_key, any.public_key);
		assert_eq!(result.bks, any.bks);
	}

	let ids: Vec<_> = results.keys().collect();
	assert_shares_interpolate(&results, &ids, threshold);
}

#[test]
fn dkg_with_mixed_ranks() {
	let threshold = 3;
	let results = run_dkg(threshold, &[0, 0, 0, 1, 1], 50);

	// Any threshold-sized subset of shares must reconstruct the key
	let ids: Vec<_> = results.keys().collect();
	for subset in ids.iter().copied().combinations(threshold as usize) {
		assert_shares_interpolate(&results, &subset, threshold);
	}
}

#[test]
fn dkg_is_deterministic_under_seeded_rng() {
	assert_eq!(run_dkg(2, &[0, 0], 60), run_dkg(2, &[0, 0], 60));
}

#[test]
fn rejects_invalid_threshold() {
	let network = Network::new(3);

	for threshold in [0, 1, 4] {
		assert_eq!(
			Dkg::<Point>::new(
				network.peer_manager(&get_id(0)),
				threshold,
				0,
				Box::new(RecordingListener::default()),
				seeded_rng(0),
			)
			.err(),
			Some(Error::InvalidThreshold { threshold, share_count: 3 })
		);
	}
}

#[test]
fn results_are_not_ready_until_done_and_listener_fires_once() {
	let network = Network::new(2);

	let listeners: Vec<RecordingListener> =
		(0..2).map(|_| RecordingListener::default()).collect();

	let mut parties: BTreeMap<_, _> = network
		.ids
		.iter()
		.enumerate()
		.map(|(index, id)| {
			let dkg = Dkg::<Point>::new(
				network.peer_manager(id),
				2,
				0,
				Box::new(listeners[index].clone()),
				seeded_rng(70 + index as u8),
			)
			.unwrap();
			(id.clone(), dkg)
		})
		.collect();

	for dkg in parties.values_mut() {
		assert_eq!(dkg.get_result().err(), Some(Error::NotReady));
		dkg.start();
	}

	network.pump(|to, message| {
		let _ = parties.get_mut(to).unwrap().add_message(message);
	});

	for (dkg, listener) in parties.values().zip(&listeners) {
		assert_eq!(dkg.get_state(), ProtocolState::Done);
		// Results are idempotent once the instance is done
		assert_eq!(dkg.get_result().unwrap(), dkg.get_result().unwrap());
		assert_eq!(
			listener.transitions(),
			vec![(ProtocolState::Init, ProtocolState::Done)]
		);
	}
}

#[test]
fn all_honest_parties_fail_on_tampered_decommitment() {
	let network = Network::new(3);
	let corrupt_id = get_id(0);

	let mut parties: BTreeMap<_, _> = network
		.ids
		.iter()
		.enumerate()
		.map(|(index, id)| {
			let dkg = Dkg::<Point>::new(
				network.peer_manager(id),
				3,
				0,
				Box::new(RecordingListener::default()),
				seeded_rng(80 + index as u8),
			)
			.unwrap();
			(id.clone(), dkg)
		})
		.collect();

	for dkg in parties.values_mut() {
		dkg.start();
	}

	network.pump(|to, mut message| {
		// The corrupt party opens its hash commitment with a bad salt
		if message.id == corrupt_id {
			if let TssData::Dkg(DkgData::Decommit(decommit)) = &mut message.data {
				decommit.salt[0] ^= 1;
			}
		}
		let _ = parties.get_mut(to).unwrap().add_message(message);
	});

	for (id, dkg) in &parties {
		if id == &corrupt_id {
			// The cheater itself never completes (everyone else aborted)
			assert_eq!(dkg.get_state(), ProtocolState::Init);
		} else {
			assert_eq!(dkg.get_state(), ProtocolState::Failed);
			assert_eq!(dkg.failure_reason(), Some(&DkgFailureReason::InvalidCommitment));
		}
		assert_eq!(dkg.get_result().err(), Some(Error::NotReady));
	}
}

#[test]
fn duplicate_and_unexpected_messages_are_dropped() {
	let network = Network::new(2);

	let mut parties: BTreeMap<_, _> = network
		.ids
		.iter()
		.enumerate()
		.map(|(index, id)| {
			let dkg = Dkg::<Point>::new(
				network.peer_manager(id),
				2,
				0,
				Box::new(RecordingListener::default()),
				seeded_rng(90 + index as u8),
			)
			.unwrap();
			(id.clone(), dkg)
		})
		.collect();

	for dkg in parties.values_mut() {
		dkg.start();
	}

	// Deliver every message twice, and also a message from a stranger;
	// the redundant copies must all be ignored
	network.pump(|to, message| {
		let party = parties.get_mut(to).unwrap();

		let mut from_stranger = message.clone();
		from_stranger.id = "id-1000".to_string();
		let _ = party.add_message(from_stranger);

		let _ = party.add_message(message.clone());
		let _ = party.add_message(message);
	});

	for dkg in parties.values() {
		assert_eq!(dkg.get_state(), ProtocolState::Done);
	}
}
