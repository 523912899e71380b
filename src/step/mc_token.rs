//! Minecraft services login step.

// crates.io
use oauth2::http::Method;
// self
use crate::{
	_prelude::*,
	clock::Timestamp,
	http::{self, handler},
	step::{
		Artifact, Document, Expiry, Secret, Step, StepContext, StepFuture, StepInput, XblXstsToken,
		decode_document, encode_document, expire_after, previous,
	},
};

/// Name of [`McTokenStep`].
pub const MC_TOKEN: &str = "mcToken";

/// Minecraft services access token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McToken {
	/// Expiry instant.
	pub expire_time_ms: Timestamp,
	/// Access token for Minecraft services.
	pub access_token: Secret,
	/// Token type, used as the `Authorization` scheme.
	pub token_type: String,
}
impl McToken {
	/// Expires at [`expire_time_ms`](Self::expire_time_ms).
	pub fn expiry(&self) -> Expiry {
		Expiry::At(self.expire_time_ms)
	}

	/// `Authorization` header value: `{token_type} {access_token}`.
	pub fn authorization_header(&self) -> String {
		format!("{} {}", self.token_type, self.access_token.expose())
	}
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
	access_token: String,
	token_type: String,
	expires_in: i64,
}

/// Logs in to Minecraft services with an XSTS token for `rp://api.minecraftservices.com/`.
#[derive(Clone, Copy, Debug, Default)]
pub struct McTokenStep;
impl Step for McTokenStep {
	fn name(&self) -> &str {
		MC_TOKEN
	}

	fn apply<'a>(&'a self, ctx: &'a StepContext, input: StepInput<'a>) -> StepFuture<'a, Artifact> {
		Box::pin(async move {
			let xsts = previous::<XblXstsToken>(self.name(), input)?;
			let body = serde_json::json!({ "identityToken": xsts.authorization_header() });
			let request = http::json_request(
				self.name(),
				Method::POST,
				&ctx.app.endpoints.mc_login,
				&[],
				Some(&body),
			)?;
			let body = handler::minecraft(ctx.send(request).await?)?;
			let response: LoginResponse = handler::read_json(self.name(), Some(200), &body)?;

			Ok(McToken {
				expire_time_ms: expire_after(self.name(), ctx.now(), response.expires_in)?,
				access_token: Secret::new(response.access_token),
				token_type: response.token_type,
			}
			.into())
		})
	}

	fn to_document(&self, artifact: &Artifact) -> Result<Document> {
		encode_document::<McToken>(self.name(), artifact)
	}

	fn parse_document(&self, document: &Document) -> Result<Artifact> {
		decode_document::<McToken>(self.name(), document)
	}
}
