//! End-to-end flows: a full DKG followed by threshold signing over the
//! resulting shares, for different rank profiles, signing subsets and
//! homomorphic ciphers.

use std::collections::BTreeMap;

use crate::{
	crypto::ECScalar,
	dkg::DkgResult,
	helpers::{get_id, seeded_rng, Network, Point, RecordingListener, Scalar},
	homo::{paillier, HomoKeypair},
	p2p::PartyId,
	protocol::ProtocolState,
	signing::{Signature, Signer},
	Error,
};

const MESSAGE: &[u8] = &[1, 2, 3];

#[derive(Clone, Copy)]
enum HomoKind {
	Paillier,
	Cl,
}

/// Sign with the given subset of DKG share holders and return the
/// (identical) signature after verifying every party completed
fn sign_with_subset(
	dkg_results: &BTreeMap<PartyId, DkgResult<Point>>,
	subset: &[PartyId],
	homo_kind: HomoKind,
	seed_offset: u8,
) -> Signature<Point> {
	let network = Network::with_ids(subset.to_vec());

	let mut signers: BTreeMap<PartyId, Signer<Point>> = subset
		.iter()
		.enumerate()
		.map(|(index, id)| {
			let result = &dkg_results[id];
			let mut rng = seeded_rng(seed_offset + index as u8);

			let homo = match homo_kind {
				HomoKind::Paillier =>
					HomoKeypair::Paillier(paillier::Keypair::generate_unchecked(&mut rng, 1024)),
				HomoKind::Cl => HomoKeypair::cl_with_parameters::<Scalar>(&mut rng, 516, 40),
			};

			let bks = subset
				.iter()
				.map(|id| (id.clone(), result.bks[id].clone()))
				.collect();

			let signer = Signer::new(
				network.peer_manager(id),
				result.public_key,
				homo,
				result.share.clone(),
				bks,
				MESSAGE,
				Box::new(RecordingListener::default()),
				rng,
			)
			.unwrap();
			(id.clone(), signer)
		})
		.collect();

	for signer in signers.values_mut() {
		signer.start();
	}

	network.pump(|to, message| {
		let _ = signers.get_mut(to).unwrap().add_message(message);
	});

	let signatures: Vec<Signature<Point>> = signers
		.values()
		.map(|signer| {
			assert_eq!(
				signer.get_state(),
				ProtocolState::Done,
				"signing failed: {:?}",
				signer.failure_reason()
			);
			signer.get_result().unwrap()
		})
		.collect();

	for signature in &signatures {
		assert_eq!(signature, &signatures[0]);
	}

	signatures[0].clone()
}

fn assert_signature_is_valid(
	dkg_results: &BTreeMap<PartyId, DkgResult<Point>>,
	signature: &Signature<Point>,
) {
	use crate::signing::{message_to_scalar, verify_ecdsa};

	let public_key = dkg_results.values().next().unwrap().public_key;
	assert!(verify_ecdsa(
		&public_key,
		&message_to_scalar::<Point>(MESSAGE),
		&signature.r,
		&signature.s
	));
	assert!(signature.s.to_biguint() <= Scalar::group_order() >> 1);
}

#[test]
fn dkg_then_sign_with_zero_ranks() {
	let dkg_results = crate::helpers::run_dkg(3, &[0, 0, 0], 160);

	let subset: Vec<PartyId> = dkg_results.keys().cloned().collect();
	let signature = sign_with_subset(&dkg_results, &subset, HomoKind::Paillier, 170);

	assert_signature_is_valid(&dkg_results, &signature);
}

#[test]
fn dkg_then_sign_with_mixed_ranks_and_subsets() {
	let dkg_results = crate::helpers::run_dkg(3, &[0, 0, 0, 1, 1], 180);

	// Subsets exercising all-zero, mixed and mostly-ranked signers
	for (offset, subset_indices) in [(190u8, [0, 1, 2]), (200, [0, 1, 3]), (210, [2, 3, 4])] {
		let subset: Vec<PartyId> = subset_indices.iter().map(|i| get_id(*i)).collect();
		let signature = sign_with_subset(&dkg_results, &subset, HomoKind::Cl, offset);

		assert_signature_is_valid(&dkg_results, &signature);
	}
}

/// The public constructors, end to end: full-size Paillier keys over a
/// two-party DKG
#[test]
fn dkg_then_sign_with_production_paillier_keys() {
	let dkg_results = crate::helpers::run_dkg(2, &[0, 0], 220);

	let subset: Vec<PartyId> = dkg_results.keys().cloned().collect();

	let network = Network::with_ids(subset.clone());

	let mut signers: BTreeMap<PartyId, Signer<Point>> = subset
		.iter()
		.enumerate()
		.map(|(index, id)| {
			let result = &dkg_results[id];
			let mut rng = seeded_rng(230 + index as u8);

			let homo = HomoKeypair::paillier(&mut rng, 2048).unwrap();

			let signer = Signer::new(
				network.peer_manager(id),
				result.public_key,
				homo,
				result.share.clone(),
				result.bks.clone(),
				MESSAGE,
				Box::new(RecordingListener::default()),
				rng,
			)
			.unwrap();
			(id.clone(), signer)
		})
		.collect();

	for signer in signers.values_mut() {
		signer.start();
	}

	network.pump(|to, message| {
		let _ = signers.get_mut(to).unwrap().add_message(message);
	});

	for signer in signers.values() {
		assert_eq!(signer.get_state(), ProtocolState::Done);
	}
}

#[test]
fn signer_rejects_subset_below_threshold() {
	let dkg_results = crate::helpers::run_dkg(3, &[0, 0, 0], 240);

	// Two holders of a threshold-3 dealing: their weighted shares
	// cannot sum to the private key, so the public key check in the
	// first stage must abort the ceremony for everyone
	let subset: Vec<PartyId> = dkg_results.keys().take(2).cloned().collect();

	let network = Network::with_ids(subset.clone());

	let mut signers: BTreeMap<PartyId, Signer<Point>> = subset
		.iter()
		.enumerate()
		.map(|(index, id)| {
			let result = &dkg_results[id];
			let mut rng = seeded_rng(250 + index as u8);
			let homo =
				HomoKeypair::Paillier(paillier::Keypair::generate_unchecked(&mut rng, 1024));

			let bks = subset
				.iter()
				.map(|id| (id.clone(), result.bks[id].clone()))
				.collect();

			let signer = Signer::new(
				network.peer_manager(id),
				result.public_key,
				homo,
				result.share.clone(),
				bks,
				MESSAGE,
				Box::new(RecordingListener::default()),
				rng,
			)
			.unwrap();
			(id.clone(), signer)
		})
		.collect();

	for signer in signers.values_mut() {
		signer.start();
	}

	network.pump(|to, message| {
		let _ = signers.get_mut(to).unwrap().add_message(message);
	});

	// Two parties cannot reconstruct a threshold-3 secret: their
	// weighted shares do not sum to the key and everyone aborts
	for signer in signers.values() {
		assert_eq!(signer.get_state(), ProtocolState::Failed);
		assert_eq!(signer.get_result().err(), Some(Error::NotReady));
	}
}
