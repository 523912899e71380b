//! Optional observability helpers for chain operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `mc_auth_chain.chain` with the `operation`
//!   and `leaf` (leaf step name) fields, plus step-level progress events.
//! - Enable `metrics` to increment the `mc_auth_chain_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod counter;
mod span;

pub use counter::*;
pub use span::*;

/// Chain operations observed by the runner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChainOperation {
	/// Full derivation from the root.
	RunFresh,
	/// Leaf refresh with partial re-derivation.
	RefreshLeaf,
	/// Backoff-driven remote call.
	Retry,
}
impl ChainOperation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ChainOperation::RunFresh => "run_fresh",
			ChainOperation::RefreshLeaf => "refresh_leaf",
			ChainOperation::Retry => "retry",
		}
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChainOutcome {
	/// Entry to a chain operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl ChainOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ChainOutcome::Attempt => "attempt",
			ChainOutcome::Success => "success",
			ChainOutcome::Failure => "failure",
		}
	}
}
