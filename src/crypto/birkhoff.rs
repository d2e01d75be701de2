//! Birkhoff interpolation parameters. A party's evaluation point is an
//! arbitrary non-zero field element `x` together with a derivative order
//! `rank`: a rank-0 holder knows `f(x)` (classical Shamir), a rank-m
//! holder knows the m-th derivative `f^(m)(x)`. Interpolating the secret
//! `f(0)` from such a mixed set requires the generalized (Birkhoff)
//! Vandermonde matrix to be invertible, which unlike Lagrange
//! interpolation is not guaranteed by distinct evaluation points alone.

use itertools::Itertools;
use rayon::iter::{ParallelBridge, ParallelIterator};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ECScalar;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BkParameter<Scalar: ECScalar> {
	#[serde(bound = "")]
	pub x: Scalar,
	pub rank: u32,
}

impl<Scalar: ECScalar> BkParameter<Scalar> {
	pub fn new(x: Scalar, rank: u32) -> Self {
		BkParameter { x, rank }
	}
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum BkError {
	#[error("evaluation point must be non-zero")]
	ZeroX,
	#[error("evaluation points must be pairwise distinct")]
	DuplicateX,
	#[error("got {got} parameters, but at least {required} are required")]
	NotEnoughParties { got: u32, required: u32 },
	/// The rank profile cannot support interpolation of the secret
	/// (e.g. no rank-0 holder in some threshold subset)
	#[error("not enough ranks")]
	NotEnoughRanks,
	#[error("a threshold subset has a singular interpolation matrix")]
	SingularSubset,
}

/// Check that a set of parameters can reconstruct a secret shared with
/// the given threshold: evaluation points are non-zero and pairwise
/// distinct, there are at least `threshold` of them, and *every*
/// threshold-sized subset has an invertible Birkhoff matrix.
pub fn check_valid<Scalar: ECScalar>(
	bks: &[BkParameter<Scalar>],
	threshold: u32,
) -> Result<(), BkError> {
	if (bks.len() as u32) < threshold {
		return Err(BkError::NotEnoughParties { got: bks.len() as u32, required: threshold })
	}

	for (i, bk) in bks.iter().enumerate() {
		if bk.x == Scalar::zero() {
			return Err(BkError::ZeroX)
		}
		if bks[..i].iter().any(|other| other.x == bk.x) {
			return Err(BkError::DuplicateX)
		}
	}

	// Quick necessary condition on the rank profile: when sorted, the
	// i-th smallest rank must not exceed i (otherwise no column pivot
	// exists for it in any subset matrix)
	let sorted_ranks: Vec<_> = bks.iter().map(|bk| bk.rank).sorted().collect();
	if sorted_ranks.iter().take(threshold as usize).enumerate().any(|(i, &rank)| rank > i as u32) {
		return Err(BkError::NotEnoughRanks)
	}

	let all_subsets_invertible = bks
		.iter()
		.combinations(threshold as usize)
		.par_bridge()
		.all(|subset| determinant(birkhoff_matrix(&subset, threshold)) != Scalar::zero());

	if all_subsets_invertible {
		Ok(())
	} else {
		Err(BkError::SingularSubset)
	}
}

/// Compute the interpolation coefficients for a signing set of exactly
/// `threshold` parameters (in the given order): scalars `c_i` such that
/// `sum_i c_i * y_i = f(0)` where `y_i` is the value held by party `i`.
/// These generalize the Lagrange coefficients used in classical Shamir
/// reconstruction and are the first row of the inverse Birkhoff matrix.
pub fn compute_coefficients<Scalar: ECScalar>(
	bks: &[&BkParameter<Scalar>],
	threshold: u32,
) -> Result<Vec<Scalar>, BkError> {
	assert_eq!(bks.len(), threshold as usize);

	let matrix = birkhoff_matrix(bks, threshold);

	// The first row of M^-1 is the solution of the transposed system
	// M^T * c = e_0
	let transposed: Vec<Vec<Scalar>> = (0..bks.len())
		.map(|col| matrix.iter().map(|row| row[col].clone()).collect())
		.collect();

	let mut rhs: Vec<Scalar> = vec![Scalar::zero(); bks.len()];
	rhs[0] = Scalar::from(1);

	solve(transposed, rhs).ok_or(BkError::SingularSubset)
}

/// The matrix whose (i, k) entry is the rank_i-th derivative of x^k
/// evaluated at x_i
fn birkhoff_matrix<Scalar: ECScalar>(
	bks: &[&BkParameter<Scalar>],
	threshold: u32,
) -> Vec<Vec<Scalar>> {
	bks.iter()
		.map(|bk| {
			let mut row = Vec::with_capacity(threshold as usize);
			for k in 0..threshold {
				if k < bk.rank {
					row.push(Scalar::zero());
				} else {
					let factor = (0..bk.rank).fold(Scalar::from(1), |acc, j| acc * Scalar::from(k - j));
					let power =
						(0..k - bk.rank).fold(Scalar::from(1), |acc, _| acc * bk.x.clone());
					row.push(factor * power);
				}
			}
			row
		})
		.collect()
}

fn determinant<Scalar: ECScalar>(mut m: Vec<Vec<Scalar>>) -> Scalar {
	let n = m.len();
	let mut det = Scalar::from(1);

	for col in 0..n {
		let pivot_row = match (col..n).find(|&row| m[row][col] != Scalar::zero()) {
			Some(row) => row,
			None => return Scalar::zero(),
		};
		if pivot_row != col {
			m.swap(col, pivot_row);
			det = Scalar::zero() - det;
		}

		let pivot = m[col][col].clone();
		let pivot_inv = pivot.invert().expect("pivot is non-zero");
		det = det * pivot;

		for row in col + 1..n {
			let factor = m[row][col].clone() * &pivot_inv;
			if factor == Scalar::zero() {
				continue
			}
			for k in col..n {
				m[row][k] = m[row][k].clone() - factor.clone() * &m[col][k];
			}
		}
	}

	det
}

/// Solve `m * x = rhs` over the field by Gauss-Jordan elimination.
/// Returns `None` when the matrix is singular.
fn solve<Scalar: ECScalar>(mut m: Vec<Vec<Scalar>>, mut rhs: Vec<Scalar>) -> Option<Vec<Scalar>> {
	let n = m.len();

	for col in 0..n {
		let pivot_row = (col..n).find(|&row| m[row][col] != Scalar::zero())?;
		if pivot_row != col {
			m.swap(col, pivot_row);
			rhs.swap(col, pivot_row);
		}

		let pivot_inv = m[col][col].clone().invert().expect("pivot is non-zero");
		for k in col..n {
			m[col][k] = m[col][k].clone() * &pivot_inv;
		}
		rhs[col] = rhs[col].clone() * &pivot_inv;

		for row in 0..n {
			if row == col || m[row][col] == Scalar::zero() {
				continue
			}
			let factor = m[row][col].clone();
			for k in col..n {
				m[row][k] = m[row][k].clone() - factor.clone() * &m[col][k];
			}
			rhs[row] = rhs[row].clone() - factor * &rhs[col];
		}
	}

	Some(rhs)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::crypto::{polynomial::Polynomial, secp256k1::Scalar, Rng};
	use rand::SeedableRng;

	fn bk(x: u32, rank: u32) -> BkParameter<Scalar> {
		BkParameter::new(Scalar::from(x), rank)
	}

	#[test]
	fn rejects_zero_and_duplicate_x() {
		assert_eq!(check_valid(&[bk(0, 0), bk(2, 0)], 2), Err(BkError::ZeroX));
		assert_eq!(check_valid(&[bk(7, 0), bk(7, 0), bk(2, 0)], 2), Err(BkError::DuplicateX));
	}

	#[test]
	fn rejects_undersized_sets() {
		assert_eq!(
			check_valid(&[bk(1, 0), bk(2, 0)], 3),
			Err(BkError::NotEnoughParties { got: 2, required: 3 })
		);
	}

	#[test]
	fn rejects_rank_profiles_that_cannot_interpolate() {
		// No rank-0 holder: f(0) cannot be recovered
		assert_eq!(check_valid(&[bk(1, 1), bk(2, 1), bk(3, 2)], 3), Err(BkError::NotEnoughRanks));
		// A pair of rank-1 holders cannot form a threshold-2 subset
		assert_eq!(check_valid(&[bk(1, 0), bk(2, 1), bk(3, 1)], 2), Err(BkError::SingularSubset));
	}

	#[test]
	fn accepts_shamir_and_mixed_rank_sets() {
		assert!(check_valid(&[bk(1, 0), bk(10, 0), bk(20, 0)], 3).is_ok());
		assert!(check_valid(&[bk(1, 0), bk(2, 0), bk(3, 0), bk(4, 1), bk(5, 1)], 3).is_ok());
	}

	#[test]
	fn coefficients_recover_the_constant_term() {
		let mut rng = Rng::from_seed([9; 32]);

		let threshold = 3;
		let poly = Polynomial::<Scalar>::random(&mut rng, threshold - 1);

		for bks in [
			vec![bk(1, 0), bk(10, 0), bk(20, 0)],
			vec![bk(108, 0), bk(344, 1), bk(756, 2)],
			vec![bk(53, 0), bk(24, 1), bk(96, 0)],
		] {
			let values: Vec<Scalar> =
				bks.iter().map(|bk| poly.evaluate_derivative(&bk.x, bk.rank)).collect();

			let refs: Vec<&BkParameter<Scalar>> = bks.iter().collect();
			let coefficients = compute_coefficients(&refs, threshold).unwrap();

			let interpolated: Scalar =
				coefficients.into_iter().zip(values).map(|(c, y)| c * y).sum();

			assert_eq!(&interpolated, poly.constant_term());
		}
	}

	#[test]
	fn coefficients_match_lagrange_for_rank_zero() {
		// With all ranks zero the coefficients must equal the classical
		// Lagrange coefficients at x = 0
		let bks = [bk(1, 0), bk(2, 0), bk(3, 0)];
		let refs: Vec<_> = bks.iter().collect();
		let coefficients = compute_coefficients(&refs, 3).unwrap();

		let lagrange: Vec<Scalar> = (0..3)
			.map(|i| {
				let mut num = Scalar::from(1);
				let mut den = Scalar::from(1);
				for j in 0..3 {
					if i != j {
						num = num * bks[j].x.clone();
						den = den * (bks[j].x.clone() - bks[i].x.clone());
					}
				}
				num * den.invert().unwrap()
			})
			.collect();

		assert_eq!(coefficients, lagrange);
	}
}
