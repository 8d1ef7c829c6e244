//! Step metering for dispatched operations.
//!
//! Every operation body charges its cost before touching state, so running
//! out of steps can never leave a half-applied mutation behind.

use super::DispatchFailure;

/// Step costs charged by dispatched operations.
pub mod costs {
	/// Fixed overhead of entering a dispatched call.
	pub const CALL_BASE: u64 = 700;
	/// Decoding one 32-byte word of payload.
	pub const PAYLOAD_WORD: u64 = 3;
	/// Reading one stored value (a balance or an approval).
	pub const STORAGE_READ: u64 = 2_100;
	/// Writing one stored value.
	pub const STORAGE_WRITE: u64 = 5_000;
	/// Publishing one event.
	pub const EVENT: u64 = 1_500;
}

/// Running step account for one dispatch.
#[derive(Debug, Clone)]
pub struct StepMeter {
	limit: u64,
	used: u64,
}

impl StepMeter {
	pub fn new(limit: u64) -> Self {
		Self { limit, used: 0 }
	}

	/// Meter for direct calls, which are not step-bounded.
	pub fn unlimited() -> Self {
		Self::new(u64::MAX)
	}

	/// Charges `steps`, failing without recording them if the limit would be exceeded.
	pub fn charge(&mut self, steps: u64) -> Result<(), DispatchFailure> {
		let required = self.used.saturating_add(steps);
		if required > self.limit {
			tracing::debug!(limit = self.limit, required, "Step limit exceeded");
			return Err(DispatchFailure::OutOfSteps {
				limit: self.limit,
				required,
			});
		}
		self.used = required;
		Ok(())
	}

	/// Charges the decode cost of a payload of `len` bytes.
	pub fn charge_payload(&mut self, len: usize) -> Result<(), DispatchFailure> {
		let words = len.div_ceil(32) as u64;
		self.charge(words.saturating_mul(costs::PAYLOAD_WORD))
	}

	pub fn used(&self) -> u64 {
		self.used
	}

	pub fn remaining(&self) -> u64 {
		self.limit - self.used
	}
}
