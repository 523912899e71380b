//! Chain runner: fresh derivation from the root and leaf refresh with partial re-derivation.
//!
//! A [`Chain`] owns its steps root first; the previous step of index `i` is index `i - 1`. The
//! [`ChainResult`] it produces holds one artifact per step in the same order, so refresh can walk
//! from the leaf index down to the first valid artifact and re-derive forward from there without
//! touching anything below it.

pub mod presets;

mod document;
mod metrics;

pub use metrics::ChainMetrics;

// std
use std::collections::HashSet;
// self
use crate::{
	_prelude::*,
	error::ValidationError,
	obs::{self, ChainOperation, ChainOutcome, ChainSpan},
	step::{Artifact, ArtifactPayload, InitialInput, Step, StepContext, StepInput},
};

/// Fixed, validated sequence of steps.
#[derive(Clone)]
pub struct Chain {
	steps: Vec<Arc<dyn Step>>,
	metrics: Arc<ChainMetrics>,
}
impl Chain {
	/// Starts an empty [`ChainBuilder`].
	pub fn builder() -> ChainBuilder {
		ChainBuilder::default()
	}

	/// Number of steps.
	pub fn len(&self) -> usize {
		self.steps.len()
	}

	/// Always `false` for a built chain.
	pub fn is_empty(&self) -> bool {
		self.steps.is_empty()
	}

	/// Step names, root first.
	pub fn step_names(&self) -> impl Iterator<Item = &str> {
		self.steps.iter().map(|step| step.name())
	}

	/// The step producing the final artifact.
	pub fn leaf(&self) -> &dyn Step {
		self.steps[self.steps.len() - 1].as_ref()
	}

	/// Counters shared by every clone of this chain.
	pub fn metrics(&self) -> &ChainMetrics {
		&self.metrics
	}

	/// Applies every step from the root to the leaf, threading each artifact into the next step.
	///
	/// Any failure aborts the run; the error names the failing step.
	pub async fn run_fresh(&self, ctx: &StepContext, initial: InitialInput) -> Result<ChainResult> {
		const OPERATION: ChainOperation = ChainOperation::RunFresh;

		let span = ChainSpan::new(OPERATION, self.leaf().name());

		obs::record_chain_outcome(OPERATION, ChainOutcome::Attempt);
		self.metrics.record_fresh_run();

		let result = span
			.instrument(async move {
				let root = &self.steps[0];
				let mut artifacts = Vec::with_capacity(self.steps.len());
				let artifact = root
					.apply(ctx, StepInput::Initial(initial))
					.await
					.map_err(|e| e.in_step(root.name()))?;

				artifacts.push(Arc::new(artifact));

				for step in &self.steps[1..] {
					let previous = Arc::clone(&artifacts[artifacts.len() - 1]);
					let artifact = step
						.apply(ctx, StepInput::Previous(&previous))
						.await
						.map_err(|e| e.in_step(step.name()))?;

					obs::info(step.name(), "Derived");
					artifacts.push(Arc::new(artifact));
				}

				Ok(ChainResult { artifacts })
			})
			.await;

		self.finish(OPERATION, result)
	}

	/// Returns a result whose leaf is valid, re-deriving only the expired tail of `cached`.
	///
	/// A valid leaf is returned unchanged without any remote call. Otherwise the walk goes from
	/// the leaf toward the root while artifacts are expired and stops at the first valid one;
	/// every step above it is refreshed on top of its (possibly new) ancestor. The first failing
	/// step aborts the refresh and deeper steps are not attempted. Unchanged ancestors are shared
	/// with `cached`.
	pub async fn refresh_leaf(&self, ctx: &StepContext, cached: &ChainResult) -> Result<ChainResult> {
		const OPERATION: ChainOperation = ChainOperation::RefreshLeaf;

		self.check_depth(cached)?;

		let span = ChainSpan::new(OPERATION, self.leaf().name());

		obs::record_chain_outcome(OPERATION, ChainOutcome::Attempt);
		self.metrics.record_refresh();

		let result = span
			.instrument(async move {
				let first_stale = cached.first_stale_index(ctx.now());

				if first_stale == cached.len() {
					return Ok(cached.clone());
				}

				let mut artifacts = cached.artifacts[..first_stale].to_vec();

				for (index, step) in self.steps.iter().enumerate().skip(first_stale) {
					let ancestor = index.checked_sub(1).map(|previous| artifacts[previous].as_ref());
					let artifact = step
						.refresh(ctx, &cached.artifacts[index], ancestor)
						.await
						.map_err(|e| e.in_step(step.name()))?;

					obs::info(step.name(), "Re-derived");
					self.metrics.record_rederived_step();
					artifacts.push(Arc::new(artifact));
				}

				Ok(ChainResult { artifacts })
			})
			.await;

		self.finish(OPERATION, result)
	}

	fn check_depth(&self, result: &ChainResult) -> Result<()> {
		if result.len() != self.len() {
			return Err(ValidationError::DepthMismatch {
				expected: self.len(),
				actual: result.len(),
			}
			.into());
		}

		Ok(())
	}

	fn finish(&self, operation: ChainOperation, result: Result<ChainResult>) -> Result<ChainResult> {
		match &result {
			Ok(_) => obs::record_chain_outcome(operation, ChainOutcome::Success),
			Err(_) => {
				obs::record_chain_outcome(operation, ChainOutcome::Failure);
				self.metrics.record_failure();
			},
		}

		result
	}
}
impl Debug for Chain {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Chain")
			.field("steps", &self.step_names().collect::<Vec<_>>())
			.field("metrics", &self.metrics)
			.finish()
	}
}

/// Collects steps root first and validates them into a [`Chain`].
#[derive(Default)]
pub struct ChainBuilder {
	steps: Vec<Arc<dyn Step>>,
}
impl ChainBuilder {
	/// Appends `step` after the steps added so far.
	pub fn step<S>(mut self, step: S) -> Self
	where
		S: Step,
	{
		self.steps.push(Arc::new(step));

		self
	}

	/// Appends an already shared step.
	pub fn shared_step(mut self, step: Arc<dyn Step>) -> Self {
		self.steps.push(step);

		self
	}

	/// Validates that the chain is non-empty and step names are non-empty and unique.
	pub fn build(self) -> Result<Chain> {
		if self.steps.is_empty() {
			return Err(ValidationError::EmptyChain.into());
		}

		let mut seen = HashSet::with_capacity(self.steps.len());

		for step in &self.steps {
			let name = step.name();

			if name.trim().is_empty() {
				return Err(ValidationError::EmptyStepName.into());
			}
			if !seen.insert(name) {
				return Err(ValidationError::DuplicateStepName { name: name.to_owned() }.into());
			}
		}

		Ok(Chain { steps: self.steps, metrics: Default::default() })
	}
}
impl Debug for ChainBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_list().entries(self.steps.iter().map(|step| step.name())).finish()
	}
}

/// Artifacts of one chain invocation, root first, one per step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainResult {
	artifacts: Vec<Arc<Artifact>>,
}
impl ChainResult {
	/// Builds a result from root-first artifacts, e.g. restored by other means than a document.
	pub fn from_artifacts<I>(artifacts: I) -> Result<Self>
	where
		I: IntoIterator<Item = Artifact>,
	{
		let artifacts = artifacts.into_iter().map(Arc::new).collect::<Vec<_>>();

		if artifacts.is_empty() {
			return Err(ValidationError::EmptyChain.into());
		}

		Ok(Self { artifacts })
	}

	/// Number of artifacts (the chain depth).
	pub fn len(&self) -> usize {
		self.artifacts.len()
	}

	/// Always `false` for a result produced by a chain.
	pub fn is_empty(&self) -> bool {
		self.artifacts.is_empty()
	}

	/// Final artifact.
	pub fn leaf(&self) -> &Artifact {
		&self.artifacts[self.artifacts.len() - 1]
	}

	/// Artifact at `index` (0 is the root).
	pub fn get(&self, index: usize) -> Option<&Artifact> {
		self.artifacts.get(index).map(AsRef::as_ref)
	}

	/// Artifacts, root first.
	pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
		self.artifacts.iter().map(AsRef::as_ref)
	}

	/// Closest-to-leaf artifact of kind `P`.
	pub fn find<P>(&self) -> Option<&P>
	where
		P: ArtifactPayload,
	{
		self.artifacts.iter().rev().find_map(|artifact| artifact.payload::<P>())
	}

	/// Returns `true` when both results hold the very same artifact allocation at `index`.
	pub fn shares_artifact(&self, other: &Self, index: usize) -> bool {
		match (self.artifacts.get(index), other.artifacts.get(index)) {
			(Some(a), Some(b)) => Arc::ptr_eq(a, b),
			_ => false,
		}
	}

	/// Returns `true` when the leaf is expired at `now`.
	pub fn is_expired_at(&self, now: crate::clock::Timestamp) -> bool {
		self.leaf().is_expired_at(now)
	}

	// Lowest index such that every artifact from it to the leaf is expired; `len()` when the
	// leaf is valid.
	fn first_stale_index(&self, now: crate::clock::Timestamp) -> usize {
		let mut index = self.artifacts.len();

		while index > 0 && self.artifacts[index - 1].is_expired_at(now) {
			index -= 1;
		}

		index
	}
}
