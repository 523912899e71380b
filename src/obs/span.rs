// self
use crate::{_prelude::*, obs::ChainOperation};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedChain<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedChain<F> = F;

/// A span builder used by chain operations.
#[derive(Clone, Debug)]
pub struct ChainSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl ChainSpan {
	/// Creates a new span tagged with the operation and the chain's leaf step.
	pub fn new(operation: ChainOperation, leaf: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("mc_auth_chain.chain", operation = operation.as_str(), leaf);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (operation, leaf);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedChain<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a step-level progress event (when tracing is enabled).
pub fn info(step: &str, message: impl Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(step, "{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (step, message);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn info_noop_without_tracing() {
		info("msaToken", "Refreshing token");
	}

	#[tokio::test]
	async fn instrument_passes_output_through() {
		let span = ChainSpan::new(ChainOperation::RunFresh, "mcToken");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
