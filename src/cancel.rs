//! Cooperative cancellation for interactive waits and backoff sleeps.

// crates.io
use tokio::sync::watch;
// self
use crate::_prelude::*;

/// Cloneable cancellation handle; every clone observes the same flag.
#[derive(Clone, Debug)]
pub struct Cancellation(Arc<watch::Sender<bool>>);
impl Cancellation {
	/// Creates a handle that is not cancelled.
	pub fn new() -> Self {
		let (sender, _) = watch::channel(false);

		Self(Arc::new(sender))
	}

	/// Requests cancellation; waiters wake immediately.
	pub fn cancel(&self) {
		self.0.send_replace(true);
	}

	/// Returns `true` once [`cancel`](Self::cancel) was called on any clone.
	pub fn is_cancelled(&self) -> bool {
		*self.0.borrow()
	}

	/// Resolves once cancellation is requested.
	pub async fn cancelled(&self) {
		let mut receiver = self.0.subscribe();

		// The sender lives as long as `self`, so the wait only ends on cancellation.
		let _ = receiver.wait_for(|cancelled| *cancelled).await;
	}
}
impl Default for Cancellation {
	fn default() -> Self {
		Self::new()
	}
}
