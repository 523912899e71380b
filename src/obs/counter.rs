// self
use crate::obs::{ChainOperation, ChainOutcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_chain_outcome(operation: ChainOperation, outcome: ChainOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"mc_auth_chain_operation_total",
			"operation" => operation.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (operation, outcome);
	}
}
