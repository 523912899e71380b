// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for chain invocations.
#[derive(Debug, Default)]
pub struct ChainMetrics {
	fresh_runs: AtomicU64,
	refreshes: AtomicU64,
	rederived_steps: AtomicU64,
	failures: AtomicU64,
}
impl ChainMetrics {
	/// Returns the number of fresh runs started.
	pub fn fresh_runs(&self) -> u64 {
		self.fresh_runs.load(Ordering::Relaxed)
	}

	/// Returns the number of leaf refreshes started (including ones that made no call).
	pub fn refreshes(&self) -> u64 {
		self.refreshes.load(Ordering::Relaxed)
	}

	/// Returns the number of steps re-derived by refreshes.
	pub fn rederived_steps(&self) -> u64 {
		self.rederived_steps.load(Ordering::Relaxed)
	}

	/// Returns the number of failed runs and refreshes.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_fresh_run(&self) {
		self.fresh_runs.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh(&self) {
		self.refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rederived_step(&self) {
		self.rederived_steps.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
