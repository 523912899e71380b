//! Root step accepting an authorization code obtained out of band.

// self
use crate::{
	_prelude::*,
	error::ValidationError,
	step::{
		Artifact, Document, Expiry, InitialInput, Secret, Step, StepContext, StepFuture, StepInput,
		decode_document, encode_document,
	},
};

/// Name of [`MsaCodeStep`].
pub const MSA_CODE: &str = "msaCode";

/// Authorization code ready to be exchanged at the token endpoint.
///
/// Codes are single use; once exchanged, renewal relies on the refresh token of the
/// [`MsaToken`](crate::step::MsaToken) derived from it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsaCode {
	/// Authorization code.
	pub code: Secret,
	/// Redirect URI the code was issued for, when it differs from the context's.
	pub redirect_uri: Option<String>,
	/// PKCE verifier for the authorize request that produced the code.
	pub code_verifier: Option<Secret>,
}
impl MsaCode {
	/// Wraps a bare code issued for the context's redirect URI.
	pub fn new(code: impl Into<String>) -> Self {
		Self { code: Secret::new(code), redirect_uri: None, code_verifier: None }
	}

	/// Authorization codes carry no expiry of their own.
	pub fn expiry(&self) -> Expiry {
		Expiry::Never
	}
}

/// Root step turning [`InitialInput::AuthorizationCode`] into an [`MsaCode`].
#[derive(Clone, Copy, Debug, Default)]
pub struct MsaCodeStep;
impl Step for MsaCodeStep {
	fn name(&self) -> &str {
		MSA_CODE
	}

	fn apply<'a>(
		&'a self,
		_ctx: &'a StepContext,
		input: StepInput<'a>,
	) -> StepFuture<'a, Artifact> {
		Box::pin(async move {
			match input {
				StepInput::Initial(InitialInput::AuthorizationCode(input))
					if !input.code.trim().is_empty() =>
					Ok(MsaCode {
						code: Secret::new(input.code),
						redirect_uri: input.redirect_uri,
						code_verifier: input.code_verifier.map(Secret::new),
					}
					.into()),
				_ => Err(ValidationError::UnexpectedInitialInput {
					step: self.name().to_owned(),
					expected: "a non-empty authorization code",
				}
				.into()),
			}
		})
	}

	fn to_document(&self, artifact: &Artifact) -> Result<Document> {
		encode_document::<MsaCode>(self.name(), artifact)
	}

	fn parse_document(&self, document: &Document) -> Result<Artifact> {
		decode_document::<MsaCode>(self.name(), document)
	}
}
