use super::{ECScalar, Rng};

/// Evaluate polynomial f(x) = c0 + c1 * x + c2 * x^2 + ... (expressed as
/// an iterator over its coefficients [c0, c1, c2, ...]) at `x`. This is
/// generic over the coefficient type so that the same code can evaluate
/// a commitment polynomial "in the exponent" (coefficients are points).
pub fn evaluate_polynomial<'a, T, I, Scalar: ECScalar>(coefficients: I, x: &Scalar) -> T
where
	T: 'a + Clone,
	T: for<'b> std::ops::Mul<&'b Scalar, Output = T>,
	T: std::ops::Add<T, Output = T>,
	I: DoubleEndedIterator<Item = &'a T>,
{
	coefficients
		.rev()
		.cloned()
		.reduce(|acc, coefficient| acc * x + coefficient)
		.expect("polynomial must have at least one coefficient")
}

/// Evaluate the `order`-th derivative of the polynomial at `x`:
/// f^(m)(x) = sum_{k >= m} c_k * k!/(k-m)! * x^(k-m). Returns zero when
/// the derivative order exceeds the polynomial degree.
pub fn evaluate_polynomial_derivative<T, Scalar: ECScalar>(
	coefficients: &[T],
	x: &Scalar,
	order: u32,
) -> T
where
	T: Clone,
	T: for<'b> std::ops::Mul<&'b Scalar, Output = T>,
	T: std::ops::Add<T, Output = T>,
	T: std::iter::Sum,
{
	let scaled: Vec<T> = coefficients
		.iter()
		.enumerate()
		.skip(order as usize)
		.map(|(k, c)| c.clone() * &falling_factorial::<Scalar>(k as u32, order))
		.collect();

	scaled
		.into_iter()
		.rev()
		.reduce(|acc, coefficient| acc * x + coefficient)
		.unwrap_or_else(|| std::iter::empty::<T>().sum())
}

/// k * (k - 1) * ... * (k - m + 1) as a field element (1 when m = 0)
fn falling_factorial<Scalar: ECScalar>(k: u32, m: u32) -> Scalar {
	(0..m).fold(Scalar::from(1), |acc, j| acc * Scalar::from(k - j))
}

/// Sharing polynomial of degree `t - 1` over the scalar field. The
/// constant term is the party's secret contribution to the aggregate key.
#[derive(Debug)]
pub struct Polynomial<Scalar: ECScalar> {
	coefficients: Vec<Scalar>,
}

impl<Scalar: ECScalar> Polynomial<Scalar> {
	/// Sample a random polynomial of the given degree. The leading
	/// coefficient is non-zero (as is every other one: random scalars
	/// are sampled from [1, N)), so the degree is exact.
	pub fn random(rng: &mut Rng, degree: u32) -> Self {
		Polynomial { coefficients: (0..=degree).map(|_| Scalar::random(rng)).collect() }
	}

	pub fn coefficients(&self) -> &[Scalar] {
		&self.coefficients
	}

	/// f(0), the secret being shared
	pub fn constant_term(&self) -> &Scalar {
		&self.coefficients[0]
	}

	pub fn evaluate(&self, x: &Scalar) -> Scalar {
		evaluate_polynomial(self.coefficients.iter(), x)
	}

	/// Evaluate the `order`-th derivative at `x` (used when the receiving
	/// party holds a birkhoff parameter with rank > 0)
	pub fn evaluate_derivative(&self, x: &Scalar, order: u32) -> Scalar {
		evaluate_polynomial_derivative(&self.coefficients, x, order)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::crypto::secp256k1::Scalar;

	#[test]
	fn test_simple_polynomial() {
		// f(x) = 4 + 5x + 2x^2
		let coefficients = [Scalar::from(4), Scalar::from(5), Scalar::from(2)];

		// f(3) = 4 + 15 + 18 = 37
		let value: Scalar = evaluate_polynomial(coefficients.iter(), &Scalar::from(3));
		assert_eq!(value, Scalar::from(37));
	}

	#[test]
	fn test_polynomial_derivatives() {
		// f(x) = 4 + 5x + 2x^2
		let coefficients = [Scalar::from(4), Scalar::from(5), Scalar::from(2)];

		// f'(x) = 5 + 4x; f'(3) = 17
		let first: Scalar = evaluate_polynomial_derivative(&coefficients, &Scalar::from(3), 1);
		assert_eq!(first, Scalar::from(17));

		// f''(x) = 4
		let second: Scalar = evaluate_polynomial_derivative(&coefficients, &Scalar::from(3), 2);
		assert_eq!(second, Scalar::from(4));

		// f'''(x) = 0
		let third: Scalar = evaluate_polynomial_derivative(&coefficients, &Scalar::from(3), 3);
		assert_eq!(third, Scalar::zero());
	}

	#[test]
	fn derivative_of_order_zero_is_plain_evaluation() {
		use rand::SeedableRng;
		let mut rng = Rng::from_seed([5; 32]);

		let poly = Polynomial::<Scalar>::random(&mut rng, 3);
		let x = Scalar::random(&mut rng);

		assert_eq!(poly.evaluate(&x), poly.evaluate_derivative(&x, 0));
	}
}
