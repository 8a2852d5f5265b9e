//! Deterministic random source for breaking ties between coincident nodes.

const MUL: u64 = 1_664_525;
const INC: u64 = 1_013_904_223;
const MODULUS: u64 = 1 << 32;

/// Linear congruential generator with a 2^32 period.
#[derive(Clone, Debug)]
pub struct Lcg {
	state: u64,
}

impl Lcg {
	pub fn new(seed: u64) -> Self {
		Self {
			state: seed % MODULUS,
		}
	}

	/// Next value in `[0, 1)`.
	pub fn next_f64(&mut self) -> f64 {
		self.state = (MUL * self.state + INC) % MODULUS;
		self.state as f64 / MODULUS as f64
	}

	/// A tiny non-zero offset used when two positions coincide exactly.
	pub fn jiggle(&mut self) -> f64 {
		(self.next_f64() - 0.5) * 1e-6
	}
}

impl Default for Lcg {
	fn default() -> Self {
		Self::new(1)
	}
}
