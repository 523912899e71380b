//! Nested document codec for whole chain results.
//!
//! The leaf's fields sit at the top level and the previous step's document is nested under the
//! previous step's name, down to the root:
//!
//! ```json
//! {
//!   "expireTimeMs": 1700086400000,
//!   "accessToken": "...",
//!   "tokenType": "Bearer",
//!   "xblXstsToken": {
//!     "expireTimeMs": 1700057600000,
//!     "...": "...",
//!     "xblUserToken": { "...": "..." }
//!   }
//! }
//! ```

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	chain::{Chain, ChainResult},
	error::{ParseError, ValidationError},
	step::Document,
};

impl Chain {
	/// Encodes `result` as one nested document.
	pub fn to_document(&self, result: &ChainResult) -> Result<Document> {
		self.check_depth(result)?;

		let mut nested: Option<(&str, Document)> = None;

		for (step, artifact) in self.steps.iter().zip(result.artifacts()) {
			let mut document = step.to_document(artifact).map_err(|e| e.in_step(step.name()))?;

			if let Some((previous, ancestor)) = nested.take() {
				document.insert(previous.to_owned(), Value::Object(ancestor));
			}

			nested = Some((step.name(), document));
		}

		nested.map(|(_, document)| document).ok_or_else(|| ValidationError::EmptyChain.into())
	}

	/// Restores a result from a document produced by [`Chain::to_document`].
	///
	/// Fails with [`ParseError::Document`] naming the step (and JSON path) whose fields are
	/// malformed, or [`ParseError::MissingAncestor`] when a nested ancestor object is absent.
	pub fn parse_document(&self, document: &Document) -> Result<ChainResult> {
		let mut artifacts = Vec::with_capacity(self.steps.len());
		let mut current = document;

		for (index, step) in self.steps.iter().enumerate().rev() {
			artifacts.push(step.parse_document(current).map_err(|e| e.in_step(step.name()))?);

			let Some(previous) = index.checked_sub(1).map(|previous| self.steps[previous].name())
			else {
				break;
			};

			current = match current.get(previous) {
				Some(Value::Object(ancestor)) => ancestor,
				_ =>
					return Err(Error::from(ParseError::MissingAncestor {
						step: step.name().to_owned(),
						key: previous.to_owned(),
					})
					.in_step(step.name())),
			};
		}

		artifacts.reverse();

		ChainResult::from_artifacts(artifacts)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		clock::Timestamp,
		step::{
			MsaCode, MsaCodeStep, MsaToken, MsaTokenStep, Secret, XblUserToken, XblUserTokenStep,
		},
	};

	fn chain() -> Chain {
		Chain::builder()
			.step(MsaCodeStep)
			.step(MsaTokenStep)
			.step(XblUserTokenStep)
			.build()
			.expect("Chain should validate.")
	}

	fn result() -> ChainResult {
		ChainResult::from_artifacts([
			MsaCode::new("M.C507_BAY.2.U").into(),
			MsaToken {
				expire_time_ms: Timestamp::from_epoch_millis(1_700_003_600_000),
				access_token: Secret::new("msa-access"),
				refresh_token: None,
			}
			.into(),
			XblUserToken {
				expire_time_ms: Timestamp::from_epoch_millis(1_701_209_600_000),
				token: Secret::new("user-token"),
				user_hash: "uhs".into(),
			}
			.into(),
		])
		.expect("Artifacts should form a result.")
	}

	#[test]
	fn ancestors_nest_under_previous_step_names() {
		let document = chain().to_document(&result()).expect("Result should encode.");
		let msa = &document["msaToken"];

		assert_eq!(document["userHash"], "uhs");
		assert_eq!(document["expireTimeMs"], 1_701_209_600_000_i64);
		assert_eq!(msa["refreshToken"], Value::Null);
		assert_eq!(msa["msaCode"]["code"], "M.C507_BAY.2.U");
		assert_eq!(msa["msaCode"]["codeVerifier"], Value::Null);
	}

	#[test]
	fn documents_round_trip_both_ways() {
		let chain = chain();
		let document = chain.to_document(&result()).expect("Result should encode.");
		let restored = chain.parse_document(&document).expect("Document should decode.");

		assert_eq!(restored, result());
		assert_eq!(chain.to_document(&restored).expect("Result should encode."), document);
	}

	#[test]
	fn missing_ancestor_names_the_step() {
		let chain = chain();
		let mut document = chain.to_document(&result()).expect("Result should encode.");

		document.remove("msaToken");

		let err = chain.parse_document(&document).expect_err("Ancestor is missing.");

		assert_eq!(err.step(), Some("xblUserToken"));
		assert!(matches!(
			err.root(),
			Error::Parse(ParseError::MissingAncestor { key, .. }) if key == "msaToken"
		));
	}
}
