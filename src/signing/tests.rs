use std::collections::BTreeMap;

use super::{
	signing_detail::{message_to_scalar, verify_ecdsa},
	*,
};
use crate::{
	crypto::{birkhoff::BkParameter, ECScalar},
	helpers::{get_id, seeded_rng, Network, Point, RecordingListener, Scalar},
	homo::{paillier, HomoKeypair},
	p2p::TssData,
};

const MESSAGE: &[u8] = &[1, 2, 3];

/// (x, share, rank) triples of a known dealing: the first set lies on
/// f(x) = 1 + x + x^2 (secret 1), the second on
/// f(x) = 2089765 + 19998x + 23x^2 with derivative shares (secret
/// 2089765)
const SHAMIR_SHARES: [(u32, u32, u32); 3] = [(1, 3, 0), (10, 111, 0), (20, 421, 0)];
const MIXED_RANK_SHARES: [(u32, u32, u32); 3] = [(108, 4517821, 0), (344, 35822, 1), (756, 46, 2)];

fn make_keypair(kind: HomoKind, rng: &mut crate::Rng) -> HomoKeypair {
	match kind {
		HomoKind::Paillier =>
			HomoKeypair::Paillier(paillier::Keypair::generate_unchecked(rng, 1024)),
		HomoKind::Cl => HomoKeypair::cl_with_parameters::<Scalar>(rng, 516, 40),
	}
}

#[derive(Clone, Copy)]
enum HomoKind {
	Paillier,
	Cl,
}

fn make_signers(
	shares: &[(u32, u32, u32)],
	expected_secret: u32,
	homo_kind: HomoKind,
	seed_offset: u8,
	network: &Network,
) -> (BTreeMap<crate::PartyId, Signer<Point>>, Point) {
	let expected_pubkey = Point::from_scalar(&Scalar::from(expected_secret));

	let bks: BTreeMap<_, _> = shares
		.iter()
		.enumerate()
		.map(|(index, (x, _, rank))| {
			(get_id(index), BkParameter::new(Scalar::from(*x), *rank))
		})
		.collect();

	let signers = shares
		.iter()
		.enumerate()
		.map(|(index, (_, share, _))| {
			let id = get_id(index);
			let mut rng = seeded_rng(seed_offset + index as u8);
			let homo = make_keypair(homo_kind, &mut rng);

			let signer = Signer::new(
				network.peer_manager(&id),
				expected_pubkey,
				homo,
				Scalar::from(*share),
				bks.clone(),
				MESSAGE,
				Box::new(RecordingListener::default()),
				rng,
			)
			.unwrap();
			(id, signer)
		})
		.collect();

	(signers, expected_pubkey)
}

fn run_signing(
	shares: &[(u32, u32, u32)],
	expected_secret: u32,
	homo_kind: HomoKind,
	seed_offset: u8,
) -> (BTreeMap<crate::PartyId, Signature<Point>>, Point) {
	let network = Network::new(shares.len());
	let (mut signers, expected_pubkey) =
		make_signers(shares, expected_secret, homo_kind, seed_offset, &network);

	for signer in signers.values_mut() {
		assert_eq!(signer.get_result().err(), Some(Error::NotReady));
		signer.start();
	}

	network.pump(|to, message| {
		let _ = signers.get_mut(to).unwrap().add_message(message);
	});

	let signatures = signers
		.into_iter()
		.map(|(id, signer)| {
			assert_eq!(
				signer.get_state(),
				ProtocolState::Done,
				"signing did not complete for {id} ({:?})",
				signer.failure_reason()
			);
			(id, signer.get_result().unwrap())
		})
		.collect();

	(signatures, expected_pubkey)
}

fn assert_valid_and_identical(
	signatures: &BTreeMap<crate::PartyId, Signature<Point>>,
	public_key: &Point,
) {
	let any = signatures.values().next().unwrap();
	for signature in signatures.values() {
		assert_eq!(signature, any);
	}

	let msg_scalar = message_to_scalar::<Point>(MESSAGE);
	assert!(verify_ecdsa(public_key, &msg_scalar, &any.r, &any.s));

	// Low-s normalization
	assert!(any.s.to_biguint() <= Scalar::group_order() >> 1);
}

#[test]
fn signing_with_paillier() {
	let (signatures, public_key) = run_signing(&SHAMIR_SHARES, 1, HomoKind::Paillier, 100);
	assert_valid_and_identical(&signatures, &public_key);
}

#[test]
fn signing_with_cl() {
	let (signatures, public_key) = run_signing(&SHAMIR_SHARES, 1, HomoKind::Cl, 110);
	assert_valid_and_identical(&signatures, &public_key);
}

#[test]
fn signing_with_mixed_rank_shares() {
	let (signatures, public_key) =
		run_signing(&MIXED_RANK_SHARES, 2089765, HomoKind::Cl, 120);
	assert_valid_and_identical(&signatures, &public_key);
}

#[test]
fn rejects_missing_bk_for_participant() {
	let network = Network::new(3);
	let expected_pubkey = Point::from_scalar(&Scalar::from(1));

	// Only t - 1 parameters: the constructor must refuse
	let bks: BTreeMap<_, _> = SHAMIR_SHARES
		.iter()
		.take(2)
		.enumerate()
		.map(|(index, (x, _, rank))| {
			(get_id(index), BkParameter::new(Scalar::from(*x), *rank))
		})
		.collect();

	let mut rng = seeded_rng(130);
	let homo = HomoKeypair::Paillier(paillier::Keypair::generate_unchecked(&mut rng, 1024));

	assert_eq!(
		Signer::new(
			network.peer_manager(&get_id(2)),
			expected_pubkey,
			homo,
			Scalar::from(421),
			bks,
			MESSAGE,
			Box::new(RecordingListener::default()),
			rng,
		)
		.err(),
		Some(Error::MissingBk(get_id(2)))
	);
}

#[test]
fn rejects_duplicate_evaluation_points() {
	let network = Network::new(3);
	let expected_pubkey = Point::from_scalar(&Scalar::from(1));

	let bks: BTreeMap<_, _> = (0..3)
		.map(|index| {
			// Two parties share x = 1
			let x = if index == 0 { 1 } else { index as u32 };
			(get_id(index), BkParameter::new(Scalar::from(x), 0))
		})
		.collect();

	let mut rng = seeded_rng(140);
	let homo = HomoKeypair::Paillier(paillier::Keypair::generate_unchecked(&mut rng, 1024));

	assert_eq!(
		Signer::new(
			network.peer_manager(&get_id(0)),
			expected_pubkey,
			homo,
			Scalar::from(3),
			bks,
			MESSAGE,
			Box::new(RecordingListener::default()),
			rng,
		)
		.err(),
		Some(Error::InvalidBks(crate::crypto::birkhoff::BkError::DuplicateX))
	);
}

#[test]
fn honest_parties_reject_a_tampered_signature_share() {
	let network = Network::new(3);
	let (mut signers, _) = make_signers(&SHAMIR_SHARES, 1, HomoKind::Paillier, 150, &network);

	for signer in signers.values_mut() {
		signer.start();
	}

	let corrupt_id = get_id(0);
	network.pump(|to, mut message| {
		if message.id == corrupt_id {
			if let TssData::Signing(SigningData::Si(si)) = &mut message.data {
				si.s = si.s.clone() + Scalar::from(1);
			}
		}
		let _ = signers.get_mut(to).unwrap().add_message(message);
	});

	for (id, signer) in &signers {
		if id == &corrupt_id {
			// The cheater sees only honest shares and still completes
			assert_eq!(signer.get_state(), ProtocolState::Done);
		} else {
			assert_eq!(signer.get_state(), ProtocolState::Failed);
			assert_eq!(signer.failure_reason(), Some(&SigningFailureReason::InvalidSignature));
			assert_eq!(signer.get_result().err(), Some(Error::NotReady));
		}
	}
}
