//! Server-directed retry executor.
//!
//! Some collaborators answer "come back in N seconds" instead of failing. Operations report that
//! as [`Attempt::Retry`] and [`with_backoff`] sleeps for the requested time before calling them
//! again. There is no attempt cap; only cancellation or a real error ends the loop.

// self
use crate::{
	_prelude::*,
	cancel::Cancellation,
	obs::{self, ChainOperation, ChainOutcome},
};

/// Server-specified wait before the next attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetrySignal {
	/// Wait in whole seconds.
	pub wait_seconds: u64,
}
impl RetrySignal {
	/// Creates a signal asking for `wait_seconds` seconds of backoff.
	pub const fn after_seconds(wait_seconds: u64) -> Self {
		Self { wait_seconds }
	}

	/// Wait as a [`std::time::Duration`] for timers.
	pub const fn wait(self) -> std::time::Duration {
		std::time::Duration::from_secs(self.wait_seconds)
	}
}

/// Result of one attempt of a deferrable operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Attempt<T> {
	/// The operation produced its value.
	Ready(T),
	/// The collaborator asked to try again later.
	Retry(RetrySignal),
}

/// Runs `operation` until it is ready, sleeping between attempts as the collaborator directs.
///
/// Errors from `operation` propagate immediately. Cancellation during a wait fails with
/// [`Error::Cancelled`] naming `operation_name`. Each call owns its own timer, so concurrent
/// invocations never wait on each other.
pub async fn with_backoff<T, F, Fut>(
	cancellation: &Cancellation,
	operation_name: &str,
	mut operation: F,
) -> Result<T>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<Attempt<T>>>,
{
	let mut attempts = 0_u64;

	loop {
		attempts += 1;

		obs::record_chain_outcome(ChainOperation::Retry, ChainOutcome::Attempt);

		let signal = match operation().await {
			Ok(Attempt::Ready(value)) => {
				obs::record_chain_outcome(ChainOperation::Retry, ChainOutcome::Success);

				return Ok(value);
			},
			Ok(Attempt::Retry(signal)) => signal,
			Err(e) => {
				obs::record_chain_outcome(ChainOperation::Retry, ChainOutcome::Failure);

				return Err(e);
			},
		};

		obs::info(
			operation_name,
			format_args!("Attempt {attempts} deferred; retrying in {}s", signal.wait_seconds),
		);

		tokio::select! {
			_ = tokio::time::sleep(signal.wait()) => {},
			_ = cancellation.cancelled() => {
				obs::record_chain_outcome(ChainOperation::Retry, ChainOutcome::Failure);

				return Err(Error::Cancelled { step: operation_name.to_owned() });
			},
		}
	}
}
