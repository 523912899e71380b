//! Microsoft account access token step.

// self
use crate::{
	_prelude::*,
	clock::Timestamp,
	oauth::{self, TokenGrant},
	obs,
	step::{
		Artifact, Document, Expiry, MsaCode, Secret, Step, StepContext, StepFuture, StepInput,
		decode_document, encode_document, expire_after, previous,
	},
};

/// Name of [`MsaTokenStep`].
pub const MSA_TOKEN: &str = "msaToken";

/// Microsoft account access token plus its renewal credential.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsaToken {
	/// Expiry instant.
	pub expire_time_ms: Timestamp,
	/// Access token presented to Xbox Live.
	pub access_token: Secret,
	/// Refresh token; without it an expired token cannot be renewed.
	pub refresh_token: Option<Secret>,
}
impl MsaToken {
	/// Expires at [`expire_time_ms`](Self::expire_time_ms).
	pub fn expiry(&self) -> Expiry {
		Expiry::At(self.expire_time_ms)
	}
}

/// Exchanges an [`MsaCode`] at the token endpoint; renews with the refresh-token grant.
///
/// The authorization code is single use, so an expired token without refresh token fails with
/// [`Error::RestartRequired`] instead of re-applying the ancestor.
#[derive(Clone, Copy, Debug, Default)]
pub struct MsaTokenStep;
impl MsaTokenStep {
	fn token(&self, ctx: &StepContext, grant: TokenGrant, previous: Option<&Secret>) -> Result<Artifact> {
		let expire_time_ms = expire_after(self.name(), ctx.now(), grant.expires_in)?;

		Ok(MsaToken {
			expire_time_ms,
			access_token: grant.access_token,
			refresh_token: grant.refresh_token.or_else(|| previous.cloned()),
		}
		.into())
	}
}
impl Step for MsaTokenStep {
	fn name(&self) -> &str {
		MSA_TOKEN
	}

	fn apply<'a>(&'a self, ctx: &'a StepContext, input: StepInput<'a>) -> StepFuture<'a, Artifact> {
		Box::pin(async move {
			let code = previous::<MsaCode>(self.name(), input)?;
			let grant = oauth::exchange_code(ctx, self.name(), code).await?;

			self.token(ctx, grant, None)
		})
	}

	fn refresh<'a>(
		&'a self,
		ctx: &'a StepContext,
		current: &'a Artifact,
		_ancestor: Option<&'a Artifact>,
	) -> StepFuture<'a, Artifact> {
		Box::pin(async move {
			if !current.is_expired_at(ctx.now()) {
				return Ok(current.clone());
			}

			let token = current.payload::<MsaToken>().ok_or_else(|| {
				crate::error::ValidationError::UnexpectedArtifact {
					step: self.name().to_owned(),
					expected: MSA_TOKEN,
				}
			})?;
			let Some(refresh_token) = &token.refresh_token else {
				return Err(Error::RestartRequired { step: self.name().to_owned() });
			};

			obs::info(self.name(), "Renewing with the refresh token");

			let grant = oauth::exchange_refresh_token(ctx, self.name(), refresh_token).await?;

			self.token(ctx, grant, Some(refresh_token))
		})
	}

	fn to_document(&self, artifact: &Artifact) -> Result<Document> {
		encode_document::<MsaToken>(self.name(), artifact)
	}

	fn parse_document(&self, document: &Document) -> Result<Artifact> {
		decode_document::<MsaToken>(self.name(), document)
	}
}
